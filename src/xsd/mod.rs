//! The schema component graph: arena-backed storage for the parsed schema's
//! types, elements, groups and attributes, plus the reader that maps schema
//! XML into it. The graph is read-only once a [`SchemaSet`] has been built;
//! the generator only ever borrows it.

pub mod attribute_decl;
pub mod builtins;
pub mod complex_type_def;
pub mod constraining_facet;
pub mod element_decl;
pub mod error;
pub mod import;
pub mod model_group;
pub mod model_group_def;
pub mod particle;
pub mod reader;
pub mod schema;
pub mod shared;
pub mod simple_type_def;
pub mod xstypes;

mod components;

pub use attribute_decl::AttributeDeclaration;
pub use complex_type_def::ComplexTypeDefinition;
pub use constraining_facet::ConstrainingFacet;
pub use element_decl::ElementDeclaration;
pub use model_group::ModelGroup;
pub use model_group_def::ModelGroupDefinition;
pub use particle::Particle;
pub use schema::{Schema, SchemaId, SchemaSet};
pub use shared::{Term, TypeDefinition};
pub use simple_type_def::SimpleTypeDefinition;

pub use components::{Component, ComponentTable, Named, Ref, RefNamed, SchemaComponentTable};

pub(crate) use components::ConstructionComponentTable;
