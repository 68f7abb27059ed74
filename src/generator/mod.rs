//! The traversal engine: walks the schema component graph depth-first under
//! the binding policy and hands each resolved class to the emission sink
//! exactly once.
//!
//! The walk is single-threaded and recursive. Cyclic schema structures
//! (self-referencing groups, mutually-referencing types) terminate because
//! every distinct structure is memoized in the [`GenerationState`] and
//! classes are emitted before (or independently of) the recursion into their
//! internals. Cooperative abort is a status flag checked at the top of every
//! entry point; it never unwinds the stack, it only turns the remaining work
//! into no-ops, so everything produced before the stop stays valid.

pub mod class;
pub mod factory;
pub mod sink;
pub mod state;

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::binding::BindingPolicy;
use crate::diagnostics::DiagnosticHandler;
use crate::xsd::{
    complex_type_def::ContentTypeVariety, ComplexTypeDefinition, ElementDeclaration, ModelGroup,
    ModelGroupDefinition, Ref, RefNamed, SchemaId, SchemaSet, SimpleTypeDefinition, Term,
    TypeDefinition,
};

pub use class::{ClassBody, ClassDef, ClassId, ClassInfo, EnumVariant, Field, Occurs, SchemaStructure};
pub use factory::ClassFactory;
pub use sink::{ClassSink, RenderedModule, RustSourceSink, SinkError, SinkResponse};
pub use state::{GenerationState, Status};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown schema id: {0:?}")]
    UnknownSchema(SchemaId),

    #[error("the builtin pseudo-schema cannot be generated")]
    BuiltinSchema,

    #[error("{0:?} is already bound to a different class")]
    MemoConflict(SchemaStructure),
}

/// The kind of container whose content model is being iterated. Decides
/// whether a nested bare group is realized as its own class.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentOwner {
    ComplexType,
    GroupDefinition,
    Group,
}

pub struct Compiler<'a> {
    policy: BindingPolicy,
    factory: ClassFactory,
    sink: &'a mut dyn ClassSink,
    diagnostics: &'a mut dyn DiagnosticHandler,
    generate_imports: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(
        policy: BindingPolicy,
        sink: &'a mut dyn ClassSink,
        diagnostics: &'a mut dyn DiagnosticHandler,
    ) -> Self {
        Self {
            policy,
            factory: ClassFactory::new(),
            sink,
            diagnostics,
            generate_imports: false,
        }
    }

    /// Whether imported schemas get classes generated too. Off by default;
    /// when off, every import produces a reminder warning instead.
    pub fn set_generate_imports(&mut self, generate: bool) {
        self.generate_imports = generate;
    }

    pub fn policy(&self) -> &BindingPolicy {
        &self.policy
    }

    /// Runs one generation over `root`, returning the completed state with
    /// the full memo and emitted-class set.
    pub fn compile(
        &mut self,
        set: &SchemaSet,
        root: SchemaId,
        package: Option<&str>,
    ) -> Result<GenerationState, CompileError> {
        let schema = set.get(root).ok_or(CompileError::UnknownSchema(root))?;
        if root == SchemaId::BUILTINS {
            return Err(CompileError::BuiltinSchema);
        }

        if let (Some(package), Some(location)) = (package, schema.schema_location.clone()) {
            self.policy.set_location_package(location, package);
        }

        let mut state = GenerationState::new(root, package.map(str::to_string));
        self.process_schema(set, root, &mut state)?;
        Ok(state)
    }

    /// Processes one schema: imports first (each at most once), then the
    /// top-level declarations in fixed order, then a flush of everything that
    /// was registered along the way but not yet emitted.
    pub fn process_schema(
        &mut self,
        set: &SchemaSet,
        schema: SchemaId,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        let schema = set.get(schema).ok_or(CompileError::UnknownSchema(schema))?;
        state.mark_schema_visited(schema.id);

        for &import in &schema.imports {
            if !self.generate_imports {
                let location = set
                    .schema(import)
                    .schema_location
                    .clone()
                    .or_else(|| set.schema(import).target_namespace.clone())
                    .unwrap_or_else(|| "<unnamed schema>".into());
                self.diagnostics.warning(&format!(
                    "do not forget to generate source code for the imported schema: {location}"
                ));
                continue;
            }
            if state.schema_visited(import) {
                continue;
            }
            // The import is generated under its own current-schema view; its
            // by-name results are folded into the importing schema's imported
            // index afterwards.
            let outer_schema = state.set_schema(import);
            let outer_sources = state.take_sources();
            self.process_schema(set, import, state)?;
            state.set_schema(outer_schema);
            let import_sources = state.replace_sources(outer_sources);
            state.merge_imported_sources(import_sources);
        }

        for &element in &schema.element_declarations {
            self.process_element(set, element, state)?;
        }
        for &complex in &schema.complex_type_definitions {
            self.process_complex_type(set, complex, state)?;
        }
        for &simple in &schema.simple_type_definitions {
            self.process_simple_type(set, simple, state)?;
        }
        for &group in &schema.model_group_definitions {
            self.process_group(set, group, state)?;
        }

        // A class can be fully resolved as a side effect of processing some
        // other structure before its own top-level visit; emit the stragglers
        // in registration order.
        let pending: Vec<ClassInfo> = state
            .class_infos()
            .filter(|info| !state.is_emitted(info.class.id))
            .cloned()
            .collect();
        for info in pending {
            self.emit(&info, state)?;
        }

        Ok(())
    }

    /// Processes one element declaration.
    ///
    /// Under a type-centric policy an element bound to a named type is
    /// skipped; only anonymous inline types are realized through their
    /// element. An absent type is a recoverable condition reported through
    /// the diagnostic channel.
    pub fn process_element(
        &mut self,
        set: &SchemaSet,
        element: Ref<ElementDeclaration>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        let declaration = element.get(set.components());
        let type_definition = declaration.type_definition;

        if self.policy.is_type_centric() {
            if let Some(type_definition) = type_definition {
                if type_definition.name(set.components()).is_some() {
                    return Ok(());
                }
            }
        }

        if let Some(info) = state.resolve(SchemaStructure::Element(element)) {
            if state.is_emitted(info.class.id) {
                return Ok(());
            }
        }

        let Some(type_definition) = type_definition else {
            self.diagnostics
                .warning(&format!("no type found for element: {}", declaration.name));
            return Ok(());
        };

        match type_definition {
            TypeDefinition::Complex(complex) => {
                let (info, built) =
                    self.factory
                        .class_for_element(set, &self.policy, element, complex, state)?;
                if !self.emit(&info, state)? {
                    return Ok(());
                }
                // A type imported from elsewhere is that schema's
                // responsibility; only locally declared types are walked.
                let declared_locally = complex.get(set.components()).schema == state.schema();
                if built && declared_locally {
                    self.process_type_internals(set, complex, state)?;
                }
            }
            TypeDefinition::Simple(simple) => {
                self.process_simple_type(set, simple, state)?;
            }
        }
        Ok(())
    }

    /// Processes one named model group definition. Empty groups (judged after
    /// dereferencing the definition) produce nothing.
    pub fn process_group(
        &mut self,
        set: &SchemaSet,
        definition: Ref<ModelGroupDefinition>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        let def = definition.get(set.components());
        if def.model_group.get(set.components()).particles.is_empty() {
            return Ok(());
        }
        // A group reached again through a reference chain is already being
        // (or has been) handled; this check is what terminates group cycles.
        if state
            .resolve(SchemaStructure::GroupDefinition(definition))
            .is_some()
        {
            return Ok(());
        }

        let (info, _) = self
            .factory
            .class_for_group(set, &self.policy, definition, state)?;
        self.process_content_model(set, def.model_group, ContentOwner::GroupDefinition, state)?;
        self.emit(&info, state)?;
        Ok(())
    }

    /// Processes one complex type definition.
    ///
    /// A type can be referenced (and memoized) before it is visited as a
    /// top-level declaration; the resolved-but-unemitted branch re-runs the
    /// attribute and content processing before emitting.
    pub fn process_complex_type(
        &mut self,
        set: &SchemaSet,
        complex: Ref<ComplexTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        match state.resolve(SchemaStructure::ComplexType(complex)) {
            None => {
                if complex.get(set.components()).is_top_level() {
                    let (info, _) =
                        self.factory
                            .class_for_complex_type(set, &self.policy, complex, state)?;
                    if !self.emit(&info, state)? {
                        return Ok(());
                    }
                }
                self.process_type_internals(set, complex, state)?;
            }
            Some(info) => {
                if !state.is_emitted(info.class.id) {
                    let info = info.clone();
                    self.process_type_internals(set, complex, state)?;
                    self.emit(&info, state)?;
                }
            }
        }
        Ok(())
    }

    /// Walks a complex type's attribute declarations, its simple-content
    /// subtype and its structural content model.
    fn process_type_internals(
        &mut self,
        set: &SchemaSet,
        complex: Ref<ComplexTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        self.process_attributes(set, complex, state)?;

        let definition = complex.get(set.components());
        if definition.content_type.variety == ContentTypeVariety::Simple {
            if let Some(simple) = definition.content_type.simple_type_definition {
                self.process_simple_type(set, simple, state)?;
            }
        }

        if let Some(particle) = definition.content_type.particle {
            match particle.get(set.components()).term {
                Term::Group(group) => {
                    self.process_content_model(set, group, ContentOwner::ComplexType, state)?;
                }
                Term::GroupRef(reference) => self.process_group(set, reference, state)?,
                Term::Element(element) => self.process_element(set, element, state)?,
                Term::ElementRef(_) => {}
            }
        }
        Ok(())
    }

    /// Resolves every attribute declaration's simple type. Attributes never
    /// become classes; their value domains (enumerations) might.
    pub fn process_attributes(
        &mut self,
        set: &SchemaSet,
        complex: Ref<ComplexTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        let attributes = &complex.get(set.components()).attribute_declarations;
        for &attribute in attributes {
            if let Some(simple) = attribute.get(set.components()).simple_type {
                self.process_simple_type(set, simple, state)?;
            }
        }
        Ok(())
    }

    /// Iterates a group's particle sequence. Element references are resolved
    /// elsewhere and never re-generated; group references recurse through
    /// [`Self::process_group`]; a bare anonymous group nested inside another
    /// bare group is additionally realized as its own class.
    pub fn process_content_model(
        &mut self,
        set: &SchemaSet,
        group: Ref<ModelGroup>,
        owner: ContentOwner,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        let particles = &group.get(set.components()).particles;
        for &particle in particles {
            match particle.get(set.components()).term {
                Term::Element(element) => self.process_element(set, element, state)?,
                Term::ElementRef(_) => {}
                Term::Group(nested) => {
                    self.process_content_model(set, nested, ContentOwner::Group, state)?;
                    if owner == ContentOwner::Group {
                        self.realize_anonymous_group(set, nested, state)?;
                    }
                }
                Term::GroupRef(reference) => self.process_group(set, reference, state)?,
            }
        }
        Ok(())
    }

    fn realize_anonymous_group(
        &mut self,
        set: &SchemaSet,
        group: Ref<ModelGroup>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        if group.get(set.components()).particles.is_empty() {
            return Ok(());
        }
        if state.resolve(SchemaStructure::Group(group)).is_some() {
            return Ok(());
        }
        let (info, _) =
            self.factory
                .class_for_anonymous_group(set, &self.policy, group, state)?;
        self.emit(&info, state)?;
        Ok(())
    }

    /// Processes one simple type definition. Types belonging to another
    /// schema are that schema's responsibility; a type is realized as a class
    /// only when it carries an enumeration facet.
    pub fn process_simple_type(
        &mut self,
        set: &SchemaSet,
        simple: Ref<SimpleTypeDefinition>,
        state: &mut GenerationState,
    ) -> Result<(), CompileError> {
        if state.is_stopped() {
            return Ok(());
        }
        let definition = simple.get(set.components());
        if definition.schema != state.schema() {
            return Ok(());
        }
        if !definition.has_enumeration(set.components()) {
            return Ok(());
        }

        let info = match state.resolve(SchemaStructure::SimpleType(simple)) {
            Some(info) => info.clone(),
            None => {
                let (info, _) =
                    self.factory
                        .class_for_enumeration(set, &self.policy, simple, state)?;
                info
            }
        };
        self.emit(&info, state)?;
        Ok(())
    }

    /// Hands a class to the sink, once per artifact. Returns `false` when the
    /// run should not continue (already stopped, or the sink requested the
    /// stop). A sink failure is a diagnostic, not a run failure: siblings are
    /// still attempted.
    fn emit(
        &mut self,
        info: &ClassInfo,
        state: &mut GenerationState,
    ) -> Result<bool, CompileError> {
        if state.is_stopped() {
            return Ok(false);
        }
        if state.is_emitted(info.class.id) {
            return Ok(true);
        }
        match self.sink.accept(&info.class) {
            Ok(SinkResponse::Continue) => {
                state.mark_emitted(info.class.id);
                state.add_source(std::rc::Rc::clone(&info.class));
                Ok(true)
            }
            Ok(SinkResponse::Stop) => {
                state.set_stop();
                Ok(false)
            }
            Err(error) => {
                self.diagnostics.error(&format!(
                    "failed to emit class {}: {error}",
                    info.class.name
                ));
                state.mark_emitted(info.class.id);
                Ok(true)
            }
        }
    }
}
