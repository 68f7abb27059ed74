use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::{NonZeroU32, NonZeroUsize};

use super::xstypes::QName;
use super::{
    AttributeDeclaration, ComplexTypeDefinition, ConstrainingFacet, ElementDeclaration, ModelGroup,
    ModelGroupDefinition, Particle, SimpleTypeDefinition, TypeDefinition,
};

/// Trait implemented by all concrete schema components.
pub trait Component {
    const DISPLAY_NAME: &'static str;
}

/// Type on which internal component traits are implemented.
///
/// This type is used to prevent leaking internal functions into the
/// [`Component`] trait.
pub struct ComponentTraits;

/// A component referencable via [`Ref`]. Intended for internal use.
pub trait HasArenaContainer<R: Component>: Sized {
    fn get_container_from_construction_component_table(
        table: &ConstructionComponentTable,
    ) -> &[Option<R>];
    fn get_container_from_construction_component_table_mut(
        table: &mut ConstructionComponentTable,
    ) -> &mut Vec<Option<R>>;
    fn get_container_from_schema_component_table(table: &SchemaComponentTable) -> &[R];
}

/// A reference to a [`Component`] stored in a [`ComponentTable`].
///
/// Two refs are equal exactly when they designate the same stored component;
/// this is the identity the generator's memoization is keyed on.
pub struct Ref<R>(NonZeroU32, PhantomData<R>)
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>;

impl<R> Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    const fn from_inner(inner: NonZeroU32) -> Self {
        Self(inner, PhantomData)
    }

    fn index(self) -> usize {
        let size: NonZeroUsize = self
            .0
            .try_into()
            .expect("Could not convert component reference to usize index");
        usize::from(size) - 1
    }

    pub fn get(self, table: &impl ComponentTable) -> &R {
        table.get(self)
    }
}

// derive(...) does not work if R itself does not derive the trait, even though
// it is only "used" in the PhantomData; hence the manual impls for Ref.

impl<R> Copy for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
}

impl<R> Clone for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> fmt::Debug for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{} #{}>", R::DISPLAY_NAME, self.0)
    }
}

impl<R> PartialEq for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<R> Eq for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
}

impl<R> Hash for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// An arena-like container for various [`Component`]s.
pub trait ComponentTable {
    /// Retrieves a component's value by reference from this component table.
    /// This function panics if the component value is not present in the table.
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>;
}

/// The [component table](ComponentTable) implementation that is used while a
/// schema set is being read and constructed.
///
/// The individual container `Vec`s contain the components wrapped in
/// `Option`s, since components often need to reference themselves, and thus
/// are constructed after the `Ref` itself.
#[derive(Default)]
pub struct ConstructionComponentTable {
    attribute_declarations: Vec<Option<AttributeDeclaration>>,
    complex_type_definitions: Vec<Option<ComplexTypeDefinition>>,
    constraining_facets: Vec<Option<ConstrainingFacet>>,
    element_declarations: Vec<Option<ElementDeclaration>>,
    model_group_definitions: Vec<Option<ModelGroupDefinition>>,
    model_groups: Vec<Option<ModelGroup>>,
    particles: Vec<Option<Particle>>,
    simple_type_definitions: Vec<Option<SimpleTypeDefinition>>,
}

impl ComponentTable for ConstructionComponentTable {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table(self);
        container
            .get(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
            .as_ref()
            .expect("Component is not present")
    }
}

impl ConstructionComponentTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Ref`] which points to an absent, reserved slot in the table.
    pub(crate) fn reserve<R>(&mut self) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table_mut(self);

        // Reserve a slot by inserting None
        container.push(None);

        // We use the size for the ref's ID, which is non-zero after the push
        let size = NonZeroUsize::new(container.len()).unwrap();
        let id: NonZeroU32 = size.try_into().expect("ID did not fit into 32-bit integer");

        Ref::from_inner(id)
    }

    /// Inserts the `value` into the slot pointed to by `ref_`. Returns `ref_`
    /// for convenience.
    pub(crate) fn insert<R>(&mut self, ref_: Ref<R>, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table_mut(self);

        let slot = container
            .get_mut(ref_.index())
            .expect("Invalid component reference (out-of-bounds)");

        *slot = Some(value);

        ref_
    }

    /// Shorthand for `insert(reserve(), value)`
    pub(crate) fn create<R>(&mut self, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let ref_ = self.reserve();
        self.insert(ref_, value)
    }

    /// Tries to convert this construction table to a
    /// [schema table](`SchemaComponentTable`). If a component value is absent,
    /// `None` is returned instead.
    pub(crate) fn convert_to_schema_table(self) -> Option<SchemaComponentTable> {
        Some(SchemaComponentTable {
            attribute_declarations: Self::convert_container(self.attribute_declarations)?,
            complex_type_definitions: Self::convert_container(self.complex_type_definitions)?,
            constraining_facets: Self::convert_container(self.constraining_facets)?,
            element_declarations: Self::convert_container(self.element_declarations)?,
            model_group_definitions: Self::convert_container(self.model_group_definitions)?,
            model_groups: Self::convert_container(self.model_groups)?,
            particles: Self::convert_container(self.particles)?,
            simple_type_definitions: Self::convert_container(self.simple_type_definitions)?,
        })
    }

    /// Helper for [`Self::convert_to_schema_table()`]
    fn convert_container<R>(container: Vec<Option<R>>) -> Option<Box<[R]>> {
        let mut result = Vec::<R>::with_capacity(container.len());
        for component in container {
            result.push(component?);
        }
        Some(result.into_boxed_slice())
    }
}

/// The [component table](ComponentTable) implementation that accompanies a
/// finished [`SchemaSet`](super::SchemaSet).
///
/// Components for which a [`Ref`] exists will always be present in this table.
///
/// Since this table is read-only, the components are stored in boxed slices,
/// which reduces the struct's size by one pointer per component type compared
/// to the `Vec` storage used in the [`ConstructionComponentTable`].
pub struct SchemaComponentTable {
    attribute_declarations: Box<[AttributeDeclaration]>,
    complex_type_definitions: Box<[ComplexTypeDefinition]>,
    constraining_facets: Box<[ConstrainingFacet]>,
    element_declarations: Box<[ElementDeclaration]>,
    model_group_definitions: Box<[ModelGroupDefinition]>,
    model_groups: Box<[ModelGroup]>,
    particles: Box<[Particle]>,
    simple_type_definitions: Box<[SimpleTypeDefinition]>,
}

impl ComponentTable for SchemaComponentTable {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_schema_component_table(self);
        container
            .get(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
    }
}

macro_rules! has_arena_container_impl {
    ($type_name:ty, $field_name:ident) => {
        impl HasArenaContainer<$type_name> for ComponentTraits {
            fn get_container_from_construction_component_table(
                table: &ConstructionComponentTable,
            ) -> &[Option<$type_name>] {
                &table.$field_name
            }

            fn get_container_from_construction_component_table_mut(
                table: &mut ConstructionComponentTable,
            ) -> &mut Vec<Option<$type_name>> {
                &mut table.$field_name
            }

            fn get_container_from_schema_component_table(
                table: &SchemaComponentTable,
            ) -> &[$type_name] {
                &table.$field_name
            }
        }
    };
}

has_arena_container_impl!(AttributeDeclaration, attribute_declarations);
has_arena_container_impl!(ComplexTypeDefinition, complex_type_definitions);
has_arena_container_impl!(ConstrainingFacet, constraining_facets);
has_arena_container_impl!(ElementDeclaration, element_declarations);
has_arena_container_impl!(ModelGroupDefinition, model_group_definitions);
has_arena_container_impl!(ModelGroup, model_groups);
has_arena_container_impl!(Particle, particles);
has_arena_container_impl!(SimpleTypeDefinition, simple_type_definitions);

/// A component that may have a [qualified name](QName)
pub trait Named: Component {
    /// The optional name.
    /// Some components (like [`ElementDeclaration`]) always have a name, and
    /// always return `Some`.
    fn name(&self) -> Option<QName>;
}

/// Any type that indirectly implements [`Named`], i.e. where first a [`Ref`]
/// has to be dereferenced to get to the name.
pub trait RefNamed {
    fn name(&self, table: &impl ComponentTable) -> Option<QName>;
}

impl<R> RefNamed for Ref<R>
where
    R: Named,
    ComponentTraits: HasArenaContainer<R>,
{
    fn name(&self, table: &impl ComponentTable) -> Option<QName> {
        self.get(table).name()
    }
}

/// Trait that allows components to be looked up by their
/// [qualified name](QName). `V` is the value type (usually `Ref<Component>` or
/// a wrapper like [`TypeDefinition`]).
pub(crate) trait Lookup<V: Copy> {
    /// Registers a value for lookup in its respective symbol space.
    /// Returns `true` if the name given by the `key` parameter was already
    /// associated with a value.
    fn register_value_for_lookup(&mut self, key: QName, value: V) -> bool;

    /// Looks up the value associated with the `key`; returns `None` if there
    /// is no such value.
    fn lookup_value(&self, key: &QName) -> Option<V>;
}

type LookupTable<T> = HashMap<QName, T>;

#[derive(Default)]
pub(crate) struct LookupTables {
    /// Shared symbol space for simple and complex type definitions
    type_definitions: LookupTable<TypeDefinition>,
    attribute_declarations: LookupTable<Ref<AttributeDeclaration>>,
    element_declarations: LookupTable<Ref<ElementDeclaration>>,
    model_group_definitions: LookupTable<Ref<ModelGroupDefinition>>,
}

macro_rules! impl_lookup {
    ($field_name:ident: $value_type:ty) => {
        impl Lookup<$value_type> for LookupTables {
            fn register_value_for_lookup(&mut self, key: QName, value: $value_type) -> bool {
                self.$field_name.insert(key, value).is_some()
            }

            fn lookup_value(&self, key: &QName) -> Option<$value_type> {
                self.$field_name.get(key).copied()
            }
        }
    };
}

impl_lookup!(type_definitions: TypeDefinition);
impl_lookup!(attribute_declarations: Ref<AttributeDeclaration>);
impl_lookup!(element_declarations: Ref<ElementDeclaration>);
impl_lookup!(model_group_definitions: Ref<ModelGroupDefinition>);

impl Lookup<Ref<SimpleTypeDefinition>> for LookupTables {
    fn register_value_for_lookup(&mut self, key: QName, value: Ref<SimpleTypeDefinition>) -> bool {
        self.type_definitions
            .insert(key, TypeDefinition::Simple(value))
            .is_some()
    }

    fn lookup_value(&self, key: &QName) -> Option<Ref<SimpleTypeDefinition>> {
        self.type_definitions
            .get(key)
            .and_then(|type_def| type_def.simple())
    }
}

impl Lookup<Ref<ComplexTypeDefinition>> for LookupTables {
    fn register_value_for_lookup(&mut self, key: QName, value: Ref<ComplexTypeDefinition>) -> bool {
        self.type_definitions
            .insert(key, TypeDefinition::Complex(value))
            .is_some()
    }

    fn lookup_value(&self, key: &QName) -> Option<Ref<ComplexTypeDefinition>> {
        self.type_definitions
            .get(key)
            .and_then(|type_def| type_def.complex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::model_group::{Compositor, ModelGroup};

    #[test]
    fn reserve_insert_get_roundtrip() {
        let mut table = ConstructionComponentTable::new();
        let ref_: Ref<ModelGroup> = table.reserve();
        table.insert(
            ref_,
            ModelGroup {
                compositor: Compositor::Sequence,
                particles: vec![],
            },
        );
        assert_eq!(ref_.get(&table).compositor, Compositor::Sequence);
    }

    #[test]
    fn refs_are_identity_not_structure() {
        let mut table = ConstructionComponentTable::new();
        let group = ModelGroup {
            compositor: Compositor::Choice,
            particles: vec![],
        };
        let a = table.create(group.clone());
        let b = table.create(group);
        // Structurally equal components still have distinct identities.
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn conversion_fails_on_absent_component() {
        let mut table = ConstructionComponentTable::new();
        let _dangling: Ref<ModelGroup> = table.reserve();
        assert!(table.convert_to_schema_table().is_none());
    }
}
