use thiserror::Error;

use super::xstypes::QName;

/// Hard errors raised while mapping schema XML into the component graph.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("expected a <{expected}> element, found <{found}>")]
    UnexpectedElement { expected: String, found: String },

    #[error("missing required attribute {attribute:?} on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("<{element}> must contain a <{expected}> child")]
    MissingChild { element: String, expected: String },

    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),

    #[error("unresolved reference to {0}")]
    UnresolvedReference(QName),

    #[error("duplicate definition of {0}")]
    DuplicateDefinition(QName),

    #[error("invalid value {value:?} for attribute {attribute:?}")]
    InvalidValue { attribute: String, value: String },
}
