use super::{
    components::{Component, Named},
    schema::SchemaId,
    simple_type_def::SimpleTypeDefinition,
    xstypes::{AnyURI, NCName, QName},
    Ref,
};

/// Schema Component: Attribute Declaration
///
/// Attributes never become classes themselves; their simple-type value
/// domains may (see the enumeration rules of the generator).
#[derive(Clone, Debug)]
pub struct AttributeDeclaration {
    pub name: NCName,
    pub target_namespace: Option<AnyURI>,
    /// The schema this declaration belongs to.
    pub schema: SchemaId,
    /// The attribute's simple type; `None` means any simple type.
    pub simple_type: Option<Ref<SimpleTypeDefinition>>,
}

impl Component for AttributeDeclaration {
    const DISPLAY_NAME: &'static str = "AttributeDeclaration";
}

impl Named for AttributeDeclaration {
    fn name(&self) -> Option<QName> {
        Some(QName::with_optional_namespace(
            self.target_namespace.clone(),
            self.name.clone(),
        ))
    }
}
