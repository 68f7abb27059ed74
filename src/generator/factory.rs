//! Builds [`ClassDef`]s from schema structures and registers them in the
//! generation state. The factory decides names, packages and field shapes;
//! the traversal decides *when* a structure is realized at all.

use std::rc::Rc;

use heck::{ToPascalCase, ToSnakeCase};

use crate::binding::BindingPolicy;
use crate::xsd::{
    complex_type_def::ContentTypeVariety,
    simple_type_def::Context,
    ComplexTypeDefinition, ElementDeclaration, ModelGroup, ModelGroupDefinition, Ref, SchemaId,
    SchemaSet, SimpleTypeDefinition, Term, TypeDefinition,
};

use super::class::{
    ClassBody, ClassDef, ClassId, ClassInfo, EnumVariant, Field, Occurs, SchemaStructure,
};
use super::state::GenerationState;
use super::CompileError;

pub struct ClassFactory {
    next_class_id: u32,
    anonymous_groups: u32,
}

impl ClassFactory {
    pub fn new() -> Self {
        Self {
            next_class_id: 0,
            anonymous_groups: 0,
        }
    }

    /// The class for an element declaration bound to a complex type.
    ///
    /// A named type shares one class between the type and every element bound
    /// to it; an anonymous type yields a class named from the element,
    /// registered under both the element and the inline type. The returned
    /// flag is `true` when a new class was built (as opposed to reused).
    pub(super) fn class_for_element(
        &mut self,
        set: &SchemaSet,
        policy: &BindingPolicy,
        element: Ref<ElementDeclaration>,
        complex: Ref<ComplexTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(ClassInfo, bool), CompileError> {
        if let Some(existing) = state.resolve(SchemaStructure::ComplexType(complex)) {
            let info = ClassInfo {
                structure: SchemaStructure::Element(element),
                class: Rc::clone(&existing.class),
            };
            state.register(info.clone())?;
            return Ok((info, false));
        }

        let declaration = element.get(set.components());
        let definition = complex.get(set.components());
        let (name, documentation) = match definition.name.as_deref() {
            Some(type_name) => (
                type_name.to_pascal_case(),
                format!("Generated from the complex type `{type_name}`."),
            ),
            None => (
                declaration.name.to_pascal_case(),
                format!("Generated from the element `{}`.", declaration.name),
            ),
        };
        let class = self.allocate(
            name,
            self.package_for(set, policy, definition.schema, state),
            Some(documentation),
            ClassBody::Struct {
                fields: self.fields_for_complex_type(set, complex),
            },
        );

        state.register(ClassInfo {
            structure: SchemaStructure::ComplexType(complex),
            class: Rc::clone(&class),
        })?;
        let info = ClassInfo {
            structure: SchemaStructure::Element(element),
            class,
        };
        state.register(info.clone())?;
        Ok((info, true))
    }

    /// The class for a complex type visited in its own right.
    pub(super) fn class_for_complex_type(
        &mut self,
        set: &SchemaSet,
        policy: &BindingPolicy,
        complex: Ref<ComplexTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(ClassInfo, bool), CompileError> {
        if let Some(existing) = state.resolve(SchemaStructure::ComplexType(complex)) {
            return Ok((existing.clone(), false));
        }

        let definition = complex.get(set.components());
        let name = match definition.name.as_deref() {
            Some(type_name) => type_name.to_pascal_case(),
            None => {
                self.anonymous_groups += 1;
                format!("AnonymousType{}", self.anonymous_groups)
            }
        };
        let documentation = definition
            .name
            .as_deref()
            .map(|type_name| format!("Generated from the complex type `{type_name}`."));
        let class = self.allocate(
            name,
            self.package_for(set, policy, definition.schema, state),
            documentation,
            ClassBody::Struct {
                fields: self.fields_for_complex_type(set, complex),
            },
        );

        let info = ClassInfo {
            structure: SchemaStructure::ComplexType(complex),
            class,
        };
        state.register(info.clone())?;
        Ok((info, true))
    }

    /// The class for a named model group definition.
    pub(super) fn class_for_group(
        &mut self,
        set: &SchemaSet,
        policy: &BindingPolicy,
        definition: Ref<ModelGroupDefinition>,
        state: &mut GenerationState,
    ) -> Result<(ClassInfo, bool), CompileError> {
        if let Some(existing) = state.resolve(SchemaStructure::GroupDefinition(definition)) {
            return Ok((existing.clone(), false));
        }

        let def = definition.get(set.components());
        let class = self.allocate(
            def.name.to_pascal_case(),
            self.package_for(set, policy, def.schema, state),
            Some(format!("Generated from the model group `{}`.", def.name)),
            ClassBody::Struct {
                fields: self.fields_for_group(set, def.model_group, Occurs::One),
            },
        );

        let info = ClassInfo {
            structure: SchemaStructure::GroupDefinition(definition),
            class,
        };
        state.register(info.clone())?;
        Ok((info, true))
    }

    /// The class for a bare anonymous group nested inside another group.
    pub(super) fn class_for_anonymous_group(
        &mut self,
        set: &SchemaSet,
        policy: &BindingPolicy,
        group: Ref<ModelGroup>,
        state: &mut GenerationState,
    ) -> Result<(ClassInfo, bool), CompileError> {
        if let Some(existing) = state.resolve(SchemaStructure::Group(group)) {
            return Ok((existing.clone(), false));
        }

        self.anonymous_groups += 1;
        let class = self.allocate(
            format!("Group{}", self.anonymous_groups),
            state.package_name().map(str::to_string),
            None,
            ClassBody::Struct {
                fields: self.fields_for_group(set, group, Occurs::One),
            },
        );

        let info = ClassInfo {
            structure: SchemaStructure::Group(group),
            class,
        };
        state.register(info.clone())?;
        Ok((info, true))
    }

    /// The enumeration class for a simple type carrying an enumeration facet.
    pub(super) fn class_for_enumeration(
        &mut self,
        set: &SchemaSet,
        policy: &BindingPolicy,
        simple: Ref<SimpleTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(ClassInfo, bool), CompileError> {
        if let Some(existing) = state.resolve(SchemaStructure::SimpleType(simple)) {
            return Ok((existing.clone(), false));
        }

        let definition = simple.get(set.components());
        let variants = definition
            .enumeration(set.components())
            .map(|enumeration| {
                enumeration
                    .value
                    .iter()
                    .map(|value| EnumVariant {
                        name: variant_name(value),
                        value: value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let name = enumeration_class_name(set, definition);
        let documentation = definition
            .name
            .as_deref()
            .map(|type_name| format!("Generated from the simple type `{type_name}`."));
        let class = self.allocate(
            name,
            self.package_for(set, policy, definition.schema, state),
            documentation,
            ClassBody::Enum { variants },
        );

        let info = ClassInfo {
            structure: SchemaStructure::SimpleType(simple),
            class,
        };
        state.register(info.clone())?;
        Ok((info, true))
    }

    fn allocate(
        &mut self,
        name: String,
        package: Option<String>,
        documentation: Option<String>,
        body: ClassBody,
    ) -> Rc<ClassDef> {
        self.next_class_id += 1;
        Rc::new(ClassDef {
            id: ClassId(self.next_class_id),
            name,
            package,
            documentation,
            body,
        })
    }

    fn package_for(
        &self,
        set: &SchemaSet,
        policy: &BindingPolicy,
        schema: SchemaId,
        state: &GenerationState,
    ) -> Option<String> {
        policy
            .package_for_schema(set.schema(schema))
            .map(str::to_string)
            .or_else(|| state.package_name().map(str::to_string))
    }

    fn fields_for_complex_type(
        &self,
        set: &SchemaSet,
        complex: Ref<ComplexTypeDefinition>,
    ) -> Vec<Field> {
        let definition = complex.get(set.components());
        let mut fields = Vec::new();

        for &attribute in &definition.attribute_declarations {
            let declaration = attribute.get(set.components());
            fields.push(Field {
                name: declaration.name.to_snake_case(),
                type_name: self.simple_type_name(set, declaration.simple_type),
                occurs: Occurs::One,
            });
        }

        if definition.content_type.variety == ContentTypeVariety::Simple {
            fields.push(Field {
                name: "value".to_string(),
                type_name: self.simple_type_name(set, definition.content_type.simple_type_definition),
                occurs: Occurs::One,
            });
        }

        if let Some(particle) = definition.content_type.particle {
            let particle = particle.get(set.components());
            match particle.term {
                Term::Group(group) => {
                    fields.extend(self.fields_for_group(set, group, particle_occurs(particle)));
                }
                Term::GroupRef(reference) => {
                    let def = reference.get(set.components());
                    fields.push(Field {
                        name: def.name.to_snake_case(),
                        type_name: def.name.to_pascal_case(),
                        occurs: particle_occurs(particle),
                    });
                }
                Term::Element(element) | Term::ElementRef(element) => {
                    fields.push(self.element_field(set, element, particle_occurs(particle)));
                }
            }
        }

        fields
    }

    /// Field derivation over a content model. Inline groups are flattened
    /// into their parent, with the outer occurrence constraint carried onto
    /// the hoisted fields; group references stay a single field of the named
    /// group's class.
    fn fields_for_group(
        &self,
        set: &SchemaSet,
        group: Ref<ModelGroup>,
        outer: Occurs,
    ) -> Vec<Field> {
        let group = group.get(set.components());
        let mut fields = Vec::new();
        for &particle in &group.particles {
            let particle = particle.get(set.components());
            let occurs = outer.combine(particle_occurs(particle));
            match particle.term {
                Term::Element(element) | Term::ElementRef(element) => {
                    fields.push(self.element_field(set, element, occurs));
                }
                Term::Group(nested) => {
                    fields.extend(self.fields_for_group(set, nested, occurs));
                }
                Term::GroupRef(reference) => {
                    let def = reference.get(set.components());
                    fields.push(Field {
                        name: def.name.to_snake_case(),
                        type_name: def.name.to_pascal_case(),
                        occurs,
                    });
                }
            }
        }
        fields
    }

    fn element_field(
        &self,
        set: &SchemaSet,
        element: Ref<ElementDeclaration>,
        occurs: Occurs,
    ) -> Field {
        let declaration = element.get(set.components());
        let type_name = match declaration.type_definition {
            None => "String".to_string(),
            Some(TypeDefinition::Simple(simple)) => self.simple_type_name(set, Some(simple)),
            Some(TypeDefinition::Complex(complex)) => {
                match complex.get(set.components()).name.as_deref() {
                    Some(type_name) => type_name.to_pascal_case(),
                    None => declaration.name.to_pascal_case(),
                }
            }
        };
        Field {
            name: declaration.name.to_snake_case(),
            type_name,
            occurs,
        }
    }

    /// The target type name for a simple-typed value: builtins map to
    /// primitive names, enumerations to their enum class, everything else to
    /// the builtin representation of its restriction base.
    fn simple_type_name(
        &self,
        set: &SchemaSet,
        simple: Option<Ref<SimpleTypeDefinition>>,
    ) -> String {
        let Some(simple) = simple else {
            return "String".to_string();
        };
        let definition = simple.get(set.components());
        if definition.is_builtin() {
            let name = definition.name.as_deref().unwrap_or("string");
            return builtin_type_name(name).to_string();
        }
        if definition.has_enumeration(set.components()) {
            return enumeration_class_name(set, definition);
        }
        // Walk the restriction chain down to a builtin. The chain is finite
        // by construction; the counter only guards hand-built graphs.
        let mut current = definition;
        for _ in 0..32 {
            match current.base_type_definition {
                Some(base) => {
                    let base = base.get(set.components());
                    if base.is_builtin() {
                        let name = base.name.as_deref().unwrap_or("string");
                        return builtin_type_name(name).to_string();
                    }
                    current = base;
                }
                None => break,
            }
        }
        "String".to_string()
    }
}

fn particle_occurs(particle: &crate::xsd::Particle) -> Occurs {
    if particle.is_many() {
        Occurs::Many
    } else if particle.is_optional() {
        Occurs::Optional
    } else {
        Occurs::One
    }
}

fn enumeration_class_name(set: &SchemaSet, definition: &SimpleTypeDefinition) -> String {
    if let Some(name) = definition.name.as_deref() {
        return name.to_pascal_case();
    }
    match definition.context {
        Some(Context::Attribute(attribute)) => {
            attribute.get(set.components()).name.to_pascal_case()
        }
        Some(Context::Element(element)) => element.get(set.components()).name.to_pascal_case(),
        None => "AnonymousEnum".to_string(),
    }
}

fn variant_name(value: &str) -> String {
    let name = value.to_pascal_case();
    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => name,
        _ => format!("V{name}"),
    }
}

/// Maps a builtin simple type's local name to the target type used for it.
/// The lexical-only builtins keep their string representation.
fn builtin_type_name(local_name: &str) -> &'static str {
    match local_name {
        "boolean" => "bool",
        "double" => "f64",
        "float" => "f32",
        "long" => "i64",
        "int" => "i32",
        "short" => "i16",
        "byte" => "i8",
        "unsignedLong" => "u64",
        "unsignedInt" => "u32",
        "unsignedShort" => "u16",
        "unsignedByte" => "u8",
        "integer" | "nonPositiveInteger" | "negativeInteger" => "i64",
        "nonNegativeInteger" | "positiveInteger" => "u64",
        _ => "String",
    }
}
