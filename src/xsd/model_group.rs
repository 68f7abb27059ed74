use super::{components::Component, particle::Particle, xstypes::Sequence, Ref};

/// Schema Component: Model Group, a kind of [Term](super::shared::Term)
#[derive(Clone, Debug)]
pub struct ModelGroup {
    pub compositor: Compositor,
    pub particles: Sequence<Ref<Particle>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compositor {
    All,
    Choice,
    Sequence,
}

impl Component for ModelGroup {
    const DISPLAY_NAME: &'static str = "ModelGroup";
}
