use super::{
    components::{Component, Named},
    schema::SchemaId,
    shared::TypeDefinition,
    xstypes::{AnyURI, NCName, QName},
};

/// Schema Component: Element Declaration, a kind of [Term](super::shared::Term)
#[derive(Clone, Debug)]
pub struct ElementDeclaration {
    pub name: NCName,
    pub target_namespace: Option<AnyURI>,
    /// The schema this declaration belongs to.
    pub schema: SchemaId,
    /// The declared type; `None` if the declaration carries neither a `type`
    /// attribute nor an inline type definition.
    pub type_definition: Option<TypeDefinition>,
    pub scope: ScopeVariety,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeVariety {
    Global,
    Local,
}

impl Component for ElementDeclaration {
    const DISPLAY_NAME: &'static str = "ElementDeclaration";
}

impl Named for ElementDeclaration {
    fn name(&self) -> Option<QName> {
        Some(QName::with_optional_namespace(
            self.target_namespace.clone(),
            self.name.clone(),
        ))
    }
}
