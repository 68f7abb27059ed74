use std::rc::Rc;

use crate::xsd::{
    ComplexTypeDefinition, ElementDeclaration, ModelGroup, ModelGroupDefinition, Ref,
    SimpleTypeDefinition,
};

/// One node of the schema component graph, as seen by the generator.
///
/// Identity (`Eq`/`Hash`) is reference identity: two values are equal exactly
/// when they designate the same graph node. This is the key of the
/// generation memo.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SchemaStructure {
    Element(Ref<ElementDeclaration>),
    ComplexType(Ref<ComplexTypeDefinition>),
    SimpleType(Ref<SimpleTypeDefinition>),
    Group(Ref<ModelGroup>),
    GroupDefinition(Ref<ModelGroupDefinition>),
}

/// Identity of a produced [`ClassDef`]. Unique per
/// [`ClassFactory`](super::factory::ClassFactory); the emitted-class
/// bookkeeping is keyed on it because several schema structures may share one
/// artifact.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u32);

/// A produced class definition: the compiler's output unit.
///
/// Immutable once built; shared by reference wherever more than one schema
/// structure resolves to it.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub package: Option<String>,
    pub documentation: Option<String>,
    pub body: ClassBody,
}

#[derive(Clone, Debug)]
pub enum ClassBody {
    Struct { fields: Vec<Field> },
    Enum { variants: Vec<EnumVariant> },
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub occurs: Occurs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Occurs {
    One,
    Optional,
    Many,
}

impl Occurs {
    /// The occurrence shape of a field hoisted out of a nested particle:
    /// the outer constraint weakens the inner one, never the other way round.
    pub(crate) fn combine(self, inner: Occurs) -> Occurs {
        match (self, inner) {
            (Occurs::Many, _) | (_, Occurs::Many) => Occurs::Many,
            (Occurs::Optional, _) | (_, Occurs::Optional) => Occurs::Optional,
            (Occurs::One, Occurs::One) => Occurs::One,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnumVariant {
    pub name: String,
    /// The lexical enumeration value the variant stands for.
    pub value: String,
}

/// The record tying a schema structure to the class it resolved to.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub structure: SchemaStructure,
    pub class: Rc<ClassDef>,
}
