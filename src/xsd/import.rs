use std::path::PathBuf;

use roxmltree::Node;
use thiserror::Error;

use super::error::ReadError;

/// This structure represents the `import` element; it is not a schema
/// component.
///
/// Note that an import is allowed to have neither a `schemaLocation` nor a
/// `namespace` attribute.
#[derive(Clone, Debug)]
pub struct Import {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

impl Import {
    pub const TAG_NAME: &'static str = "import";

    pub fn map_from_xml(import: Node) -> Self {
        Import {
            namespace: import.attribute("namespace").map(str::to_string),
            schema_location: import.attribute("schemaLocation").map(str::to_string),
        }
    }

    /// The key imports are deduplicated under: the target namespace when
    /// present, the location otherwise.
    pub(crate) fn dedup_key(&self) -> Option<String> {
        self.namespace
            .clone()
            .or_else(|| self.schema_location.clone())
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the resolver does not support the import")]
    UnsupportedImport,
    #[error("failed to load the schema text: {0}")]
    Load(#[from] std::io::Error),
    #[error("the schema failed to parse: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("the schema could not be mapped: {0}")]
    Read(#[from] Box<ReadError>),
}

/// Turns an `import` element into schema text for the reader to map.
///
/// Resolvers are consulted in order; returning
/// [`ImportError::UnsupportedImport`] passes the import on to the next
/// resolver in the chain.
pub trait ImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<String, ImportError>;
}

/// Resolves imports whose `schemaLocation` names a file, relative to a base
/// directory (usually the directory of the importing schema).
pub struct FileImportResolver {
    base_dir: PathBuf,
}

impl FileImportResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ImportResolver for FileImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<String, ImportError> {
        let Some(location) = import.schema_location.as_deref() else {
            return Err(ImportError::UnsupportedImport);
        };
        let path = self.base_dir.join(location);
        Ok(std::fs::read_to_string(path)?)
    }
}
