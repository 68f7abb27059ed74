use super::{
    components::{Component, Named},
    model_group::ModelGroup,
    schema::SchemaId,
    xstypes::{AnyURI, NCName, QName},
    Ref,
};

/// Schema Component: Model Group Definition, a named top-level group that
/// content models refer to via `group ref=`.
#[derive(Clone, Debug)]
pub struct ModelGroupDefinition {
    pub name: NCName,
    pub target_namespace: Option<AnyURI>,
    /// The schema this definition belongs to.
    pub schema: SchemaId,
    pub model_group: Ref<ModelGroup>,
}

impl Component for ModelGroupDefinition {
    const DISPLAY_NAME: &'static str = "ModelGroupDefinition";
}

impl Named for ModelGroupDefinition {
    fn name(&self) -> Option<QName> {
        Some(QName::with_optional_namespace(
            self.target_namespace.clone(),
            self.name.clone(),
        ))
    }
}
