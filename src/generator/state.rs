//! The mutable state of one generation run: the structure-to-class memo, the
//! emitted-artifact set, the visited-schema guard and the run status. Created
//! fresh per top-level run and threaded through every traversal call as an
//! explicit `&mut` handle.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::xsd::SchemaId;

use super::class::{ClassDef, ClassId, ClassInfo, SchemaStructure};
use super::CompileError;

/// Run status. Once [`Status::Stop`] is observed, every traversal entry point
/// becomes a no-op; there is no transition back.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Stop,
}

pub struct GenerationState {
    /// The schema currently being generated; switched while an import is
    /// being processed.
    schema: SchemaId,
    package_name: Option<String>,
    memo: HashMap<SchemaStructure, ClassInfo>,
    /// Registration order, for deterministic flushing.
    memo_order: Vec<SchemaStructure>,
    emitted: HashSet<ClassId>,
    visited_schemas: HashSet<SchemaId>,
    status: Status,
    /// Classes produced for the schema currently being generated, by name.
    sources_by_name: HashMap<String, Rc<ClassDef>>,
    /// Classes produced by import runs, merged in so cross-schema references
    /// resolve without re-traversal.
    imported_sources_by_name: HashMap<String, Rc<ClassDef>>,
}

impl GenerationState {
    pub fn new(schema: SchemaId, package_name: Option<String>) -> Self {
        Self {
            schema,
            package_name,
            memo: HashMap::new(),
            memo_order: Vec::new(),
            emitted: HashSet::new(),
            visited_schemas: HashSet::new(),
            status: Status::Running,
            sources_by_name: HashMap::new(),
            imported_sources_by_name: HashMap::new(),
        }
    }

    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// Switches the current schema, returning the previous one so the caller
    /// can restore it after an import run.
    pub(crate) fn set_schema(&mut self, schema: SchemaId) -> SchemaId {
        std::mem::replace(&mut self.schema, schema)
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    /// Pure lookup into the memo; never mutates.
    pub fn resolve(&self, structure: SchemaStructure) -> Option<&ClassInfo> {
        self.memo.get(&structure)
    }

    /// Registers a structure's class. Entries are append-only: registering
    /// the same structure to the same class again is a no-op, registering it
    /// to a different class is an invariant violation.
    pub fn register(&mut self, info: ClassInfo) -> Result<(), CompileError> {
        match self.memo.get(&info.structure) {
            Some(existing) if existing.class.id == info.class.id => Ok(()),
            Some(_) => Err(CompileError::MemoConflict(info.structure)),
            None => {
                self.memo_order.push(info.structure);
                self.memo.insert(info.structure, info);
                Ok(())
            }
        }
    }

    pub fn is_emitted(&self, class: ClassId) -> bool {
        self.emitted.contains(&class)
    }

    pub(crate) fn mark_emitted(&mut self, class: ClassId) -> bool {
        self.emitted.insert(class)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_stopped(&self) -> bool {
        self.status == Status::Stop
    }

    /// Requests cooperative abort. Monotonic: once stopped, further calls
    /// change nothing.
    pub fn set_stop(&mut self) {
        self.status = Status::Stop;
    }

    pub fn schema_visited(&self, schema: SchemaId) -> bool {
        self.visited_schemas.contains(&schema)
    }

    pub(crate) fn mark_schema_visited(&mut self, schema: SchemaId) -> bool {
        self.visited_schemas.insert(schema)
    }

    pub(crate) fn add_source(&mut self, class: Rc<ClassDef>) {
        self.sources_by_name.insert(class.name.clone(), class);
    }

    pub(crate) fn take_sources(&mut self) -> HashMap<String, Rc<ClassDef>> {
        std::mem::take(&mut self.sources_by_name)
    }

    pub(crate) fn replace_sources(
        &mut self,
        sources: HashMap<String, Rc<ClassDef>>,
    ) -> HashMap<String, Rc<ClassDef>> {
        std::mem::replace(&mut self.sources_by_name, sources)
    }

    pub(crate) fn merge_imported_sources(&mut self, sources: HashMap<String, Rc<ClassDef>>) {
        self.imported_sources_by_name.extend(sources);
    }

    /// Classes produced for the run's own schema, by name.
    pub fn sources_by_name(&self) -> &HashMap<String, Rc<ClassDef>> {
        &self.sources_by_name
    }

    /// Classes contributed by imported schemas, by name.
    pub fn imported_sources_by_name(&self) -> &HashMap<String, Rc<ClassDef>> {
        &self.imported_sources_by_name
    }

    /// All registered class records, in registration order.
    pub fn class_infos(&self) -> impl Iterator<Item = &ClassInfo> {
        self.memo_order
            .iter()
            .map(|structure| &self.memo[structure])
    }

    /// Folds a completed run's results into this one, so an importing run can
    /// reuse them without re-traversal. Only meaningful for states produced
    /// by the same compiler (class identities must come from one factory).
    pub fn merge_completed(&mut self, other: &GenerationState) {
        for info in other.class_infos() {
            if !self.memo.contains_key(&info.structure) {
                self.memo_order.push(info.structure);
                self.memo.insert(info.structure, info.clone());
            }
        }
        self.emitted.extend(other.emitted.iter().copied());
        self.visited_schemas
            .extend(other.visited_schemas.iter().copied());
        for (name, class) in &other.sources_by_name {
            self.imported_sources_by_name
                .insert(name.clone(), Rc::clone(class));
        }
        for (name, class) in &other.imported_sources_by_name {
            self.imported_sources_by_name
                .insert(name.clone(), Rc::clone(class));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::class::{ClassBody, SchemaStructure};
    use crate::xsd::ModelGroup;

    fn class(id: u32, name: &str) -> Rc<ClassDef> {
        Rc::new(ClassDef {
            id: ClassId(id),
            name: name.to_string(),
            package: None,
            documentation: None,
            body: ClassBody::Struct { fields: vec![] },
        })
    }

    fn some_structure() -> SchemaStructure {
        let mut table = crate::xsd::ConstructionComponentTable::new();
        let group = table.create(ModelGroup {
            compositor: crate::xsd::model_group::Compositor::Sequence,
            particles: vec![],
        });
        SchemaStructure::Group(group)
    }

    #[test]
    fn re_registering_the_same_class_is_a_no_op() {
        let mut state = GenerationState::new(SchemaId::BUILTINS, None);
        let structure = some_structure();
        let shared = class(1, "A");
        state
            .register(ClassInfo {
                structure,
                class: Rc::clone(&shared),
            })
            .unwrap();
        state
            .register(ClassInfo {
                structure,
                class: shared,
            })
            .unwrap();
        assert_eq!(state.class_infos().count(), 1);
    }

    #[test]
    fn conflicting_registration_is_an_invariant_violation() {
        let mut state = GenerationState::new(SchemaId::BUILTINS, None);
        let structure = some_structure();
        state
            .register(ClassInfo {
                structure,
                class: class(1, "A"),
            })
            .unwrap();
        let conflict = state.register(ClassInfo {
            structure,
            class: class(2, "B"),
        });
        assert!(matches!(conflict, Err(CompileError::MemoConflict(_))));
    }

    #[test]
    fn emission_is_tracked_separately_from_the_memo() {
        let mut state = GenerationState::new(SchemaId::BUILTINS, None);
        let structure = some_structure();
        let shared = class(7, "Shared");
        state
            .register(ClassInfo {
                structure,
                class: Rc::clone(&shared),
            })
            .unwrap();
        assert!(!state.is_emitted(shared.id));
        assert!(state.mark_emitted(shared.id));
        assert!(!state.mark_emitted(shared.id));
        assert!(state.is_emitted(shared.id));
    }

    #[test]
    fn stop_is_monotonic() {
        let mut state = GenerationState::new(SchemaId::BUILTINS, None);
        assert_eq!(state.status(), Status::Running);
        state.set_stop();
        state.set_stop();
        assert_eq!(state.status(), Status::Stop);
        assert!(state.is_stopped());
    }
}
