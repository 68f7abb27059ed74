//! Maps schema XML into the component graph.
//!
//! Reading happens in two phases per schema: first every top-level component
//! is reserved and registered in its symbol space, then each one is mapped in
//! full. This way forward references between top-level components resolve
//! without a separate patch-up pass. Imported schemas are read before the
//! importing schema's own content, into the same component table, so
//! cross-schema references resolve through the shared symbol spaces.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::diagnostics::DiagnosticHandler;

use super::{
    attribute_decl::AttributeDeclaration,
    builtins,
    complex_type_def::{ComplexTypeDefinition, ContentType, ContentTypeVariety},
    components::{ConstructionComponentTable, Lookup, LookupTables},
    constraining_facet::{
        ConstrainingFacet, Enumeration, Length, MinMax, Pattern, WhiteSpace, WhiteSpaceValue,
    },
    element_decl::{ElementDeclaration, ScopeVariety},
    error::ReadError,
    import::{Import, ImportError, ImportResolver},
    model_group::{Compositor, ModelGroup},
    model_group_def::ModelGroupDefinition,
    particle::{MaxOccurs, Particle},
    schema::{Schema, SchemaId, SchemaSet},
    shared::{Term, TypeDefinition},
    simple_type_def::{Context, SimpleTypeDefinition, Variety},
    xstypes::QName,
    Ref,
};

/// Reads the schema in `document` (and everything it imports) into a
/// [`SchemaSet`], returning the id of the requested schema.
///
/// A failed import is reported through `diagnostics` and skipped; the rest of
/// the set is still read. Structural problems in the requested schema itself
/// are hard errors.
pub fn read_schema_set(
    document: &Document,
    location: Option<String>,
    resolvers: &[Box<dyn ImportResolver>],
    diagnostics: &mut dyn DiagnosticHandler,
) -> Result<(SchemaId, SchemaSet), ReadError> {
    let mut context = ReadContext {
        components: ConstructionComponentTable::new(),
        lookups: LookupTables::default(),
        schemas: vec![Schema::empty(SchemaId::BUILTINS)],
        imports_seen: HashMap::new(),
        resolvers,
        diagnostics,
    };
    builtins::register_builtins(&mut context.components, &mut context.lookups);

    let root = context.read_schema(document.root_element(), location)?;

    let components = context
        .components
        .convert_to_schema_table()
        .expect("all reserved components are mapped by the reader");
    Ok((
        root,
        SchemaSet {
            schemas: context.schemas,
            components,
        },
    ))
}

struct ReadContext<'r, 'd> {
    components: ConstructionComponentTable,
    lookups: LookupTables,
    schemas: Vec<Schema>,
    /// Imports already read, keyed by namespace (or location), so that two
    /// schemas importing the same third one share it.
    imports_seen: HashMap<String, SchemaId>,
    resolvers: &'r [Box<dyn ImportResolver>],
    diagnostics: &'d mut dyn DiagnosticHandler,
}

/// A top-level component reserved in phase one, waiting to be mapped.
enum Reserved<'a, 'input> {
    Element(Node<'a, 'input>, Ref<ElementDeclaration>),
    ComplexType(Node<'a, 'input>, Ref<ComplexTypeDefinition>),
    SimpleType(Node<'a, 'input>, Ref<SimpleTypeDefinition>),
    Group(Node<'a, 'input>, Ref<ModelGroupDefinition>),
    Attribute(Node<'a, 'input>, Ref<AttributeDeclaration>),
}

impl ReadContext<'_, '_> {
    fn read_schema(
        &mut self,
        schema: Node,
        location: Option<String>,
    ) -> Result<SchemaId, ReadError> {
        if schema.tag_name().name() != "schema" {
            return Err(ReadError::UnexpectedElement {
                expected: "schema".into(),
                found: schema.tag_name().name().into(),
            });
        }

        // Reserve the slot now so the id is stable while imports are read.
        let id = SchemaId(self.schemas.len() as u32);
        self.schemas.push(Schema::empty(id));

        let target_namespace = schema.attribute("targetNamespace").map(str::to_string);

        let mut imports = Vec::new();
        for node in schema
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == Import::TAG_NAME)
        {
            let import = Import::map_from_xml(node);
            if let Some(existing) = import
                .dedup_key()
                .and_then(|key| self.imports_seen.get(&key).copied())
            {
                imports.push(existing);
                continue;
            }
            match self.resolve_import(&import) {
                Ok(imported) => {
                    if let Some(key) = import.dedup_key() {
                        self.imports_seen.insert(key, imported);
                    }
                    imports.push(imported);
                }
                Err(error) => {
                    let what = import
                        .namespace
                        .or(import.schema_location)
                        .unwrap_or_else(|| "<unnamed>".into());
                    self.diagnostics
                        .error(&format!("failed to resolve import of {what}: {error}"));
                }
            }
        }

        // Phase one: reserve and name-register every top-level component.
        let mut reserved = Vec::new();
        let mut elements = Vec::new();
        let mut complex_types = Vec::new();
        let mut simple_types = Vec::new();
        let mut groups = Vec::new();
        let mut attributes = Vec::new();
        for node in schema.children().filter(|c| c.is_element()) {
            match node.tag_name().name() {
                "element" => {
                    let name = self.top_level_name(node, &target_namespace)?;
                    let ref_ = self.components.reserve::<ElementDeclaration>();
                    self.register_top_level(name, ref_)?;
                    elements.push(ref_);
                    reserved.push(Reserved::Element(node, ref_));
                }
                "complexType" => {
                    let name = self.top_level_name(node, &target_namespace)?;
                    let ref_ = self.components.reserve::<ComplexTypeDefinition>();
                    self.register_top_level(name, ref_)?;
                    complex_types.push(ref_);
                    reserved.push(Reserved::ComplexType(node, ref_));
                }
                "simpleType" => {
                    let name = self.top_level_name(node, &target_namespace)?;
                    let ref_ = self.components.reserve::<SimpleTypeDefinition>();
                    self.register_top_level(name, ref_)?;
                    simple_types.push(ref_);
                    reserved.push(Reserved::SimpleType(node, ref_));
                }
                "group" => {
                    let name = self.top_level_name(node, &target_namespace)?;
                    let ref_ = self.components.reserve::<ModelGroupDefinition>();
                    self.register_top_level(name, ref_)?;
                    groups.push(ref_);
                    reserved.push(Reserved::Group(node, ref_));
                }
                "attribute" => {
                    let name = self.top_level_name(node, &target_namespace)?;
                    let ref_ = self.components.reserve::<AttributeDeclaration>();
                    self.register_top_level(name, ref_)?;
                    attributes.push(ref_);
                    reserved.push(Reserved::Attribute(node, ref_));
                }
                Import::TAG_NAME | "annotation" => {}
                other => {
                    self.diagnostics
                        .warning(&format!("skipping unsupported top-level <{other}>"));
                }
            }
        }

        // Phase two: map everything.
        for entry in reserved {
            match entry {
                Reserved::Element(node, ref_) => {
                    self.map_element(node, schema, id, ScopeVariety::Global, Some(ref_))?;
                }
                Reserved::ComplexType(node, ref_) => {
                    self.map_complex_type(node, schema, id, Some(ref_))?;
                }
                Reserved::SimpleType(node, ref_) => {
                    self.map_simple_type(node, schema, id, Some(ref_), None)?;
                }
                Reserved::Group(node, ref_) => {
                    self.map_group_definition(node, schema, id, ref_)?;
                }
                Reserved::Attribute(node, ref_) => {
                    self.map_attribute(node, schema, id, Some(ref_))?;
                }
            }
        }

        let slot = &mut self.schemas[id.0 as usize];
        slot.target_namespace = target_namespace;
        slot.schema_location = location;
        slot.element_declarations = elements;
        slot.complex_type_definitions = complex_types;
        slot.simple_type_definitions = simple_types;
        slot.model_group_definitions = groups;
        slot.attribute_declarations = attributes;
        slot.imports = imports;

        Ok(id)
    }

    fn resolve_import(&mut self, import: &Import) -> Result<SchemaId, ImportError> {
        let resolvers = self.resolvers;
        for resolver in resolvers {
            match resolver.resolve_import(import) {
                Err(ImportError::UnsupportedImport) => continue,
                Err(other) => return Err(other),
                Ok(text) => {
                    let document = Document::parse(&text)?;
                    let id = self
                        .read_schema(document.root_element(), import.schema_location.clone())
                        .map_err(Box::new)?;
                    return Ok(id);
                }
            }
        }
        Err(ImportError::UnsupportedImport)
    }

    fn top_level_name(
        &self,
        node: Node,
        target_namespace: &Option<String>,
    ) -> Result<QName, ReadError> {
        let name = required_attribute(node, "name")?;
        Ok(QName::with_optional_namespace(
            target_namespace.clone(),
            name,
        ))
    }

    fn register_top_level<V: Copy>(&mut self, name: QName, value: V) -> Result<(), ReadError>
    where
        LookupTables: Lookup<V>,
    {
        if self.lookups.register_value_for_lookup(name.clone(), value) {
            return Err(ReadError::DuplicateDefinition(name));
        }
        Ok(())
    }

    fn map_element(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
        scope: ScopeVariety,
        top_level: Option<Ref<ElementDeclaration>>,
    ) -> Result<Ref<ElementDeclaration>, ReadError> {
        let name = required_attribute(node, "name")?;
        let target_namespace = schema.attribute("targetNamespace").map(str::to_string);
        let ref_ = top_level.unwrap_or_else(|| self.components.reserve());

        let type_definition = if let Some(type_name) = node.attribute("type") {
            let qname = QName::parse(type_name, node)?;
            Some(self.lookup_type(qname)?)
        } else if let Some(child) = named_child(node, "complexType") {
            Some(TypeDefinition::Complex(self.map_complex_type(
                child, schema, schema_id, None,
            )?))
        } else if let Some(child) = named_child(node, "simpleType") {
            Some(TypeDefinition::Simple(self.map_simple_type(
                child,
                schema,
                schema_id,
                None,
                Some(Context::Element(ref_)),
            )?))
        } else {
            None
        };

        self.components.insert(
            ref_,
            ElementDeclaration {
                name,
                target_namespace,
                schema: schema_id,
                type_definition,
                scope,
            },
        );
        Ok(ref_)
    }

    fn map_complex_type(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
        top_level: Option<Ref<ComplexTypeDefinition>>,
    ) -> Result<Ref<ComplexTypeDefinition>, ReadError> {
        let ref_ = top_level.unwrap_or_else(|| self.components.reserve());
        let name = node.attribute("name").map(str::to_string);
        let target_namespace = schema.attribute("targetNamespace").map(str::to_string);
        let mixed = node.attribute("mixed") == Some("true");

        let mut attribute_declarations = Vec::new();
        let mut content_type = ContentType::empty();

        for child in node.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                "attribute" => {
                    attribute_declarations.push(self.map_attribute(child, schema, schema_id, None)?);
                }
                "sequence" | "choice" | "all" => {
                    let group = self.map_model_group(child, schema, schema_id)?;
                    let particle = self.map_occurrence_particle(child, Term::Group(group))?;
                    content_type = ContentType {
                        variety: if mixed {
                            ContentTypeVariety::Mixed
                        } else {
                            ContentTypeVariety::ElementOnly
                        },
                        particle: Some(particle),
                        simple_type_definition: None,
                    };
                }
                "group" => {
                    let reference = self.lookup_group_reference(child)?;
                    let particle =
                        self.map_occurrence_particle(child, Term::GroupRef(reference))?;
                    content_type = ContentType {
                        variety: if mixed {
                            ContentTypeVariety::Mixed
                        } else {
                            ContentTypeVariety::ElementOnly
                        },
                        particle: Some(particle),
                        simple_type_definition: None,
                    };
                }
                "simpleContent" => {
                    content_type =
                        self.map_simple_content(child, schema, schema_id, &mut attribute_declarations)?;
                }
                "annotation" => {}
                other => {
                    self.diagnostics.warning(&format!(
                        "skipping unsupported complex type child <{other}>"
                    ));
                }
            }
        }

        self.components.insert(
            ref_,
            ComplexTypeDefinition {
                name,
                target_namespace,
                schema: schema_id,
                attribute_declarations,
                content_type,
            },
        );
        Ok(ref_)
    }

    fn map_simple_content(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
        attribute_declarations: &mut Vec<Ref<AttributeDeclaration>>,
    ) -> Result<ContentType, ReadError> {
        let derivation = node
            .children()
            .find(|c| {
                c.is_element() && matches!(c.tag_name().name(), "extension" | "restriction")
            })
            .ok_or_else(|| ReadError::MissingChild {
                element: "simpleContent".into(),
                expected: "extension|restriction".into(),
            })?;

        let base = required_attribute(derivation, "base")?;
        let base = QName::parse(&base, derivation)?;
        let simple: Ref<SimpleTypeDefinition> = self
            .lookups
            .lookup_value(&base)
            .ok_or(ReadError::UnresolvedReference(base))?;

        for child in derivation
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == "attribute")
        {
            attribute_declarations.push(self.map_attribute(child, schema, schema_id, None)?);
        }

        Ok(ContentType {
            variety: ContentTypeVariety::Simple,
            particle: None,
            simple_type_definition: Some(simple),
        })
    }

    fn map_group_definition(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
        ref_: Ref<ModelGroupDefinition>,
    ) -> Result<Ref<ModelGroupDefinition>, ReadError> {
        let name = required_attribute(node, "name")?;
        let target_namespace = schema.attribute("targetNamespace").map(str::to_string);

        let compositor_node = node
            .children()
            .find(|c| {
                c.is_element()
                    && matches!(c.tag_name().name(), "sequence" | "choice" | "all")
            })
            .ok_or_else(|| ReadError::MissingChild {
                element: "group".into(),
                expected: "sequence|choice|all".into(),
            })?;
        let model_group = self.map_model_group(compositor_node, schema, schema_id)?;

        self.components.insert(
            ref_,
            ModelGroupDefinition {
                name,
                target_namespace,
                schema: schema_id,
                model_group,
            },
        );
        Ok(ref_)
    }

    fn map_model_group(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
    ) -> Result<Ref<ModelGroup>, ReadError> {
        let compositor = match node.tag_name().name() {
            "all" => Compositor::All,
            "choice" => Compositor::Choice,
            "sequence" => Compositor::Sequence,
            other => {
                return Err(ReadError::UnexpectedElement {
                    expected: "sequence|choice|all".into(),
                    found: other.into(),
                })
            }
        };

        let mut particles = Vec::new();
        for child in node.children().filter(|c| c.is_element()) {
            let term = match child.tag_name().name() {
                "element" => {
                    if let Some(reference) = child.attribute("ref") {
                        let qname = QName::parse(reference, child)?;
                        let element: Ref<ElementDeclaration> = self
                            .lookups
                            .lookup_value(&qname)
                            .ok_or(ReadError::UnresolvedReference(qname))?;
                        Term::ElementRef(element)
                    } else {
                        Term::Element(self.map_element(
                            child,
                            schema,
                            schema_id,
                            ScopeVariety::Local,
                            None,
                        )?)
                    }
                }
                "sequence" | "choice" | "all" => {
                    Term::Group(self.map_model_group(child, schema, schema_id)?)
                }
                "group" => Term::GroupRef(self.lookup_group_reference(child)?),
                "annotation" => continue,
                "any" => {
                    self.diagnostics
                        .warning("skipping wildcard particle <any>");
                    continue;
                }
                other => {
                    self.diagnostics
                        .warning(&format!("skipping unsupported particle <{other}>"));
                    continue;
                }
            };
            particles.push(self.map_occurrence_particle(child, term)?);
        }

        Ok(self.components.create(ModelGroup {
            compositor,
            particles,
        }))
    }

    fn lookup_group_reference(&self, node: Node) -> Result<Ref<ModelGroupDefinition>, ReadError> {
        let reference = required_attribute(node, "ref")?;
        let qname = QName::parse(&reference, node)?;
        self.lookups
            .lookup_value(&qname)
            .ok_or(ReadError::UnresolvedReference(qname))
    }

    fn map_occurrence_particle(
        &mut self,
        node: Node,
        term: Term,
    ) -> Result<Ref<Particle>, ReadError> {
        let min_occurs = match node.attribute("minOccurs") {
            Some(value) => value.parse().map_err(|_| ReadError::InvalidValue {
                attribute: "minOccurs".into(),
                value: value.into(),
            })?,
            None => 1,
        };
        let max_occurs = match node.attribute("maxOccurs") {
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(value) => MaxOccurs::Count(value.parse().map_err(|_| {
                ReadError::InvalidValue {
                    attribute: "maxOccurs".into(),
                    value: value.into(),
                }
            })?),
            None => MaxOccurs::Count(1),
        };
        Ok(self.components.create(Particle {
            min_occurs,
            max_occurs,
            term,
        }))
    }

    fn map_simple_type(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
        top_level: Option<Ref<SimpleTypeDefinition>>,
        context: Option<Context>,
    ) -> Result<Ref<SimpleTypeDefinition>, ReadError> {
        let ref_ = top_level.unwrap_or_else(|| self.components.reserve());
        let name = node.attribute("name").map(str::to_string);
        let target_namespace = schema.attribute("targetNamespace").map(str::to_string);

        let mut base_type_definition = None;
        let mut facets = Vec::new();
        let mut variety = Variety::Atomic;

        for child in node.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                "restriction" => {
                    if let Some(base) = child.attribute("base") {
                        let base = QName::parse(base, child)?;
                        let base_ref: Ref<SimpleTypeDefinition> = self
                            .lookups
                            .lookup_value(&base)
                            .ok_or(ReadError::UnresolvedReference(base))?;
                        base_type_definition = Some(base_ref);
                    }
                    facets = self.map_facets(child)?;
                }
                "list" => variety = Variety::List,
                "union" => variety = Variety::Union,
                "annotation" => {}
                other => {
                    self.diagnostics.warning(&format!(
                        "skipping unsupported simple type child <{other}>"
                    ));
                }
            }
        }

        self.components.insert(
            ref_,
            SimpleTypeDefinition {
                name,
                target_namespace,
                schema: schema_id,
                base_type_definition,
                facets,
                variety,
                context,
            },
        );
        Ok(ref_)
    }

    /// Maps the facet children of a `<restriction>`. The repeatable facet
    /// elements (`<enumeration>`, `<pattern>`) are each collapsed into a
    /// single facet component.
    fn map_facets(&mut self, restriction: Node) -> Result<Vec<Ref<ConstrainingFacet>>, ReadError> {
        let mut facets = Vec::new();
        let mut enumeration_values = Vec::new();
        let mut pattern_values = Vec::new();

        for child in restriction.children().filter(|c| c.is_element()) {
            let tag = child.tag_name().name();
            let fixed = child.attribute("fixed") == Some("true");
            match tag {
                "enumeration" => {
                    enumeration_values.push(required_attribute(child, "value")?);
                    continue;
                }
                "pattern" => {
                    pattern_values.push(required_attribute(child, "value")?);
                    continue;
                }
                "annotation" => continue,
                _ => {}
            }
            let facet = match tag {
                "length" | "minLength" | "maxLength" => {
                    let value = required_attribute(child, "value")?;
                    let value = value.parse().map_err(|_| ReadError::InvalidValue {
                        attribute: "value".into(),
                        value,
                    })?;
                    let length = Length { value, fixed };
                    match tag {
                        "length" => ConstrainingFacet::Length(length),
                        "minLength" => ConstrainingFacet::MinLength(length),
                        _ => ConstrainingFacet::MaxLength(length),
                    }
                }
                "whiteSpace" => {
                    let value = required_attribute(child, "value")?;
                    let value = match value.as_str() {
                        "preserve" => WhiteSpaceValue::Preserve,
                        "replace" => WhiteSpaceValue::Replace,
                        "collapse" => WhiteSpaceValue::Collapse,
                        _ => {
                            return Err(ReadError::InvalidValue {
                                attribute: "value".into(),
                                value,
                            })
                        }
                    };
                    ConstrainingFacet::WhiteSpace(WhiteSpace { value, fixed })
                }
                "minInclusive" | "maxInclusive" | "minExclusive" | "maxExclusive" => {
                    let value = required_attribute(child, "value")?;
                    let min_max = MinMax { value, fixed };
                    match tag {
                        "minInclusive" => ConstrainingFacet::MinInclusive(min_max),
                        "maxInclusive" => ConstrainingFacet::MaxInclusive(min_max),
                        "minExclusive" => ConstrainingFacet::MinExclusive(min_max),
                        _ => ConstrainingFacet::MaxExclusive(min_max),
                    }
                }
                other => {
                    self.diagnostics
                        .warning(&format!("skipping unsupported facet <{other}>"));
                    continue;
                }
            };
            facets.push(self.components.create(facet));
        }

        if !enumeration_values.is_empty() {
            facets.push(
                self.components
                    .create(ConstrainingFacet::Enumeration(Enumeration {
                        value: enumeration_values,
                    })),
            );
        }
        if !pattern_values.is_empty() {
            facets.push(self.components.create(ConstrainingFacet::Pattern(Pattern {
                value: pattern_values,
            })));
        }

        Ok(facets)
    }

    fn map_attribute(
        &mut self,
        node: Node,
        schema: Node,
        schema_id: SchemaId,
        top_level: Option<Ref<AttributeDeclaration>>,
    ) -> Result<Ref<AttributeDeclaration>, ReadError> {
        if top_level.is_none() {
            if let Some(reference) = node.attribute("ref") {
                // A reference reuses the top-level declaration.
                let qname = QName::parse(reference, node)?;
                return self
                    .lookups
                    .lookup_value(&qname)
                    .ok_or(ReadError::UnresolvedReference(qname));
            }
        }

        let name = required_attribute(node, "name")?;
        let target_namespace = schema.attribute("targetNamespace").map(str::to_string);
        let ref_ = top_level.unwrap_or_else(|| self.components.reserve());

        let simple_type = if let Some(type_name) = node.attribute("type") {
            let qname = QName::parse(type_name, node)?;
            Some(
                self.lookups
                    .lookup_value(&qname)
                    .ok_or(ReadError::UnresolvedReference(qname))?,
            )
        } else if let Some(child) = named_child(node, "simpleType") {
            Some(self.map_simple_type(
                child,
                schema,
                schema_id,
                None,
                Some(Context::Attribute(ref_)),
            )?)
        } else {
            None
        };

        self.components.insert(
            ref_,
            AttributeDeclaration {
                name,
                target_namespace,
                schema: schema_id,
                simple_type,
            },
        );
        Ok(ref_)
    }

    fn lookup_type(&self, name: QName) -> Result<TypeDefinition, ReadError> {
        self.lookups
            .lookup_value(&name)
            .ok_or(ReadError::UnresolvedReference(name))
    }
}

fn required_attribute(node: Node, attribute: &str) -> Result<String, ReadError> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or_else(|| ReadError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
        })
}

fn named_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}
