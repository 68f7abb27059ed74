use super::{
    attribute_decl::AttributeDeclaration,
    components::{Component, Named},
    particle::Particle,
    schema::SchemaId,
    simple_type_def::SimpleTypeDefinition,
    xstypes::{AnyURI, NCName, QName, Set},
    Ref,
};

/// Schema Component: Complex Type Definition
#[derive(Clone, Debug)]
pub struct ComplexTypeDefinition {
    /// `None` for a type defined inline at its point of use.
    pub name: Option<NCName>,
    pub target_namespace: Option<AnyURI>,
    /// The schema this definition belongs to.
    pub schema: SchemaId,
    pub attribute_declarations: Set<Ref<AttributeDeclaration>>,
    pub content_type: ContentType,
}

/// Property Record: Content Type
#[derive(Clone, Debug)]
pub struct ContentType {
    pub variety: ContentTypeVariety,
    /// The content model; present when the variety is element-only or mixed.
    /// Its term is the type's implicit top-level group.
    pub particle: Option<Ref<Particle>>,
    /// The simple-content subtype; present when the variety is simple.
    pub simple_type_definition: Option<Ref<SimpleTypeDefinition>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentTypeVariety {
    Empty,
    Simple,
    ElementOnly,
    Mixed,
}

impl ContentType {
    pub fn empty() -> Self {
        Self {
            variety: ContentTypeVariety::Empty,
            particle: None,
            simple_type_definition: None,
        }
    }
}

impl ComplexTypeDefinition {
    /// Named complex types are exactly the ones declared at schema top level.
    pub fn is_top_level(&self) -> bool {
        self.name.is_some()
    }
}

impl Component for ComplexTypeDefinition {
    const DISPLAY_NAME: &'static str = "ComplexTypeDefinition";
}

impl Named for ComplexTypeDefinition {
    fn name(&self) -> Option<QName> {
        self.name.as_ref().map(|name| {
            QName::with_optional_namespace(self.target_namespace.clone(), name.clone())
        })
    }
}
