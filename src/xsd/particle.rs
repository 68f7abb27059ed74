use super::{components::Component, shared::Term};

/// Schema Component: Particle, an occurrence-constrained [`Term`] inside a
/// content model.
#[derive(Clone, Debug)]
pub struct Particle {
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    pub term: Term,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

impl Particle {
    /// True when the particle admits more than one occurrence.
    pub fn is_many(&self) -> bool {
        match self.max_occurs {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Count(n) => n > 1,
        }
    }

    /// True when the particle admits zero occurrences (but at most one).
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0 && !self.is_many()
    }
}

impl Component for Particle {
    const DISPLAY_NAME: &'static str = "Particle";
}
