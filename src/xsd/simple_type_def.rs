use super::{
    attribute_decl::AttributeDeclaration,
    components::{Component, ComponentTable, Named},
    constraining_facet::{ConstrainingFacet, Enumeration},
    element_decl::ElementDeclaration,
    schema::SchemaId,
    xstypes::{AnyURI, NCName, QName, Set},
    Ref,
};

/// Schema Component: Simple Type Definition
#[derive(Clone, Debug)]
pub struct SimpleTypeDefinition {
    /// `None` for a type defined inline at its point of use.
    pub name: Option<NCName>,
    pub target_namespace: Option<AnyURI>,
    /// The schema this definition belongs to.
    pub schema: SchemaId,
    /// The restriction base; `None` for builtins and list/union varieties.
    pub base_type_definition: Option<Ref<SimpleTypeDefinition>>,
    pub facets: Set<Ref<ConstrainingFacet>>,
    pub variety: Variety,
    /// For anonymous definitions, the component the type was defined inside.
    /// Used to derive a class name when one is needed.
    pub context: Option<Context>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Variety {
    Atomic,
    List,
    Union,
}

#[derive(Copy, Clone, Debug)]
pub enum Context {
    Attribute(Ref<AttributeDeclaration>),
    Element(Ref<ElementDeclaration>),
}

impl SimpleTypeDefinition {
    pub fn is_builtin(&self) -> bool {
        self.schema == SchemaId::BUILTINS
    }

    /// The enumeration facet, if the type carries one.
    pub fn enumeration<'a>(&self, table: &'a impl ComponentTable) -> Option<&'a Enumeration> {
        self.facets
            .iter()
            .find_map(|facet| facet.get(table).enumeration())
    }

    pub fn has_enumeration(&self, table: &impl ComponentTable) -> bool {
        self.enumeration(table).is_some()
    }
}

impl Component for SimpleTypeDefinition {
    const DISPLAY_NAME: &'static str = "SimpleTypeDefinition";
}

impl Named for SimpleTypeDefinition {
    fn name(&self) -> Option<QName> {
        self.name.as_ref().map(|name| {
            QName::with_optional_namespace(self.target_namespace.clone(), name.clone())
        })
    }
}
