use lazy_static::lazy_static;

use super::{
    components::{ConstructionComponentTable, Lookup, LookupTables},
    simple_type_def::{SimpleTypeDefinition, Variety},
    xstypes::QName,
    SchemaId,
};

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

lazy_static! {
    pub static ref XS_ANY_TYPE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "anyType");
    pub static ref XS_ANY_SIMPLE_TYPE_NAME: QName =
        QName::with_namespace(XS_NAMESPACE, "anySimpleType");
    pub static ref XS_STRING_NAME: QName = QName::with_namespace(XS_NAMESPACE, "string");
}

/// The builtin simple types the reader registers ahead of mapping any schema.
///
/// They are all modelled as plain atomic simple types without facets; the
/// generator maps them to target type names by local name.
const BUILTIN_TYPE_NAMES: &[&str] = &[
    "anyType",
    "anySimpleType",
    "anyURI",
    "base64Binary",
    "boolean",
    "byte",
    "date",
    "dateTime",
    "decimal",
    "double",
    "duration",
    "float",
    "hexBinary",
    "int",
    "integer",
    "language",
    "long",
    "negativeInteger",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "normalizedString",
    "positiveInteger",
    "short",
    "string",
    "time",
    "token",
    "unsignedByte",
    "unsignedInt",
    "unsignedLong",
    "unsignedShort",
];

pub fn is_builtin_name(name: &QName) -> bool {
    name.namespace_name.as_deref() == Some(XS_NAMESPACE)
        && BUILTIN_TYPE_NAMES.contains(&name.local_name.as_str())
}

/// Creates the builtin simple types in `components` and registers them in the
/// type symbol space, owned by the reserved [`SchemaId::BUILTINS`]
/// pseudo-schema.
pub(crate) fn register_builtins(
    components: &mut ConstructionComponentTable,
    lookups: &mut LookupTables,
) {
    for &name in BUILTIN_TYPE_NAMES {
        let ref_ = components.create(SimpleTypeDefinition {
            name: Some(name.to_string()),
            target_namespace: Some(XS_NAMESPACE.to_string()),
            schema: SchemaId::BUILTINS,
            base_type_definition: None,
            facets: vec![],
            variety: Variety::Atomic,
            context: None,
        });
        lookups.register_value_for_lookup(QName::with_namespace(XS_NAMESPACE, name), ref_);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_recognized() {
        assert!(is_builtin_name(&XS_STRING_NAME));
        assert!(is_builtin_name(&QName::with_namespace(XS_NAMESPACE, "int")));
        assert!(!is_builtin_name(&QName::with_namespace(
            "urn:example",
            "string"
        )));
        assert!(!is_builtin_name(&QName::with_namespace(
            XS_NAMESPACE,
            "Person"
        )));
    }

    #[test]
    fn builtins_register_into_the_type_symbol_space() {
        let mut components = ConstructionComponentTable::new();
        let mut lookups = LookupTables::default();
        register_builtins(&mut components, &mut lookups);

        let string_ref: Option<crate::xsd::Ref<SimpleTypeDefinition>> =
            lookups.lookup_value(&XS_STRING_NAME);
        let string_ref = string_ref.expect("xs:string must be registered");
        let string = string_ref.get(&components);
        assert!(string.is_builtin());
        assert_eq!(string.name.as_deref(), Some("string"));
    }
}
