use super::{
    attribute_decl::AttributeDeclaration,
    complex_type_def::ComplexTypeDefinition,
    components::SchemaComponentTable,
    element_decl::ElementDeclaration,
    model_group_def::ModelGroupDefinition,
    simple_type_def::SimpleTypeDefinition,
    xstypes::{AnyURI, Sequence},
    Ref,
};

/// Identity of a [`Schema`] within a [`SchemaSet`].
///
/// Imported schemas are shared by id, never copied; the id is also what the
/// generator's visited-schema guard is keyed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaId(pub(crate) u32);

impl SchemaId {
    /// The pseudo-schema owning the builtin simple types.
    pub const BUILTINS: SchemaId = SchemaId(0);
}

/// Schema Component: Schema
///
/// Holds the top-level declarations in document order, plus the ids of the
/// schemas it imports.
#[derive(Clone, Debug)]
pub struct Schema {
    pub id: SchemaId,
    pub target_namespace: Option<AnyURI>,
    /// Where the schema text came from, when known. Consulted by
    /// location-to-package binding mappings.
    pub schema_location: Option<String>,
    pub element_declarations: Sequence<Ref<ElementDeclaration>>,
    pub complex_type_definitions: Sequence<Ref<ComplexTypeDefinition>>,
    pub simple_type_definitions: Sequence<Ref<SimpleTypeDefinition>>,
    pub model_group_definitions: Sequence<Ref<ModelGroupDefinition>>,
    pub attribute_declarations: Sequence<Ref<AttributeDeclaration>>,
    pub imports: Vec<SchemaId>,
}

impl Schema {
    pub(crate) fn empty(id: SchemaId) -> Self {
        Self {
            id,
            target_namespace: None,
            schema_location: None,
            element_declarations: vec![],
            complex_type_definitions: vec![],
            simple_type_definitions: vec![],
            model_group_definitions: vec![],
            attribute_declarations: vec![],
            imports: vec![],
        }
    }
}

/// A finished set of schemas: every schema read in one reader session
/// (the requested one plus everything reached through imports) together with
/// the frozen component table they all index into.
pub struct SchemaSet {
    pub(crate) schemas: Vec<Schema>,
    pub(crate) components: SchemaComponentTable,
}

impl SchemaSet {
    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id.0 as usize)
    }

    /// Retrieves a schema by id; panics if the id does not belong to this set.
    pub fn schema(&self, id: SchemaId) -> &Schema {
        &self.schemas[id.0 as usize]
    }

    pub fn components(&self) -> &SchemaComponentTable {
        &self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }
}
