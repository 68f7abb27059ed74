use super::{
    complex_type_def::ComplexTypeDefinition,
    components::{ComponentTable, Named, RefNamed},
    element_decl::ElementDeclaration,
    model_group::ModelGroup,
    model_group_def::ModelGroupDefinition,
    simple_type_def::SimpleTypeDefinition,
    xstypes::QName,
    Ref,
};

/// Supertype of [simple](SimpleTypeDefinition) and
/// [complex](ComplexTypeDefinition) type definition
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDefinition {
    Simple(Ref<SimpleTypeDefinition>),
    Complex(Ref<ComplexTypeDefinition>),
}

impl TypeDefinition {
    pub fn simple(self) -> Option<Ref<SimpleTypeDefinition>> {
        match self {
            Self::Simple(simple) => Some(simple),
            Self::Complex(_) => None,
        }
    }

    pub fn complex(self) -> Option<Ref<ComplexTypeDefinition>> {
        match self {
            Self::Complex(complex) => Some(complex),
            Self::Simple(_) => None,
        }
    }
}

impl RefNamed for TypeDefinition {
    fn name(&self, table: &impl ComponentTable) -> Option<QName> {
        match self {
            Self::Simple(s) => s.get(table).name(),
            Self::Complex(c) => c.get(table).name(),
        }
    }
}

/// The thing a [Particle](super::Particle) stands for.
///
/// Declarations and references to declarations are distinct variants: a
/// reference designates a component declared (and generated) elsewhere, and
/// the generator treats the two cases differently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Term {
    /// An element declared in place.
    Element(Ref<ElementDeclaration>),
    /// A reference (`ref=`) to an element declared at schema top level.
    ElementRef(Ref<ElementDeclaration>),
    /// An anonymous group given in place.
    Group(Ref<ModelGroup>),
    /// A reference (`ref=`) to a named model group definition.
    GroupRef(Ref<ModelGroupDefinition>),
}
