use super::{
    components::Component,
    xstypes::{Sequence, Set},
};

/// Constraining facet of a [simple type](super::SimpleTypeDefinition).
///
/// Only the facets the generator and reader consume are modelled; the less
/// common ones are collapsed into their common value shapes.
#[derive(Clone, Debug)]
pub enum ConstrainingFacet {
    Length(Length),
    MinLength(Length),
    MaxLength(Length),
    Pattern(Pattern),
    Enumeration(Enumeration),
    WhiteSpace(WhiteSpace),
    MaxInclusive(MinMax),
    MaxExclusive(MinMax),
    MinExclusive(MinMax),
    MinInclusive(MinMax),
}

/// Common type for the length, minLength and maxLength facets
#[derive(Clone, Debug)]
pub struct Length {
    pub value: u64,
    pub fixed: bool,
}

#[derive(Clone, Debug)]
pub struct Pattern {
    /// Multiple `<pattern>` elements are mapped to a single facet.
    pub value: Set<String>,
}

#[derive(Clone, Debug)]
pub struct Enumeration {
    /// Multiple `<enumeration>` elements are mapped to a single facet, in
    /// document order.
    pub value: Sequence<String>,
}

#[derive(Clone, Debug)]
pub struct WhiteSpace {
    pub value: WhiteSpaceValue,
    pub fixed: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WhiteSpaceValue {
    Preserve,
    Replace,
    Collapse,
}

/// Common type for the maxInclusive, maxExclusive, minExclusive and
/// minInclusive facets. The value is kept in its lexical form.
#[derive(Clone, Debug)]
pub struct MinMax {
    pub value: String,
    pub fixed: bool,
}

impl ConstrainingFacet {
    pub fn enumeration(&self) -> Option<&Enumeration> {
        match self {
            Self::Enumeration(enumeration) => Some(enumeration),
            _ => None,
        }
    }
}

impl Component for ConstrainingFacet {
    const DISPLAY_NAME: &'static str = "ConstrainingFacet";
}
