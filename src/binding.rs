//! The binding policy: the decision table the traversal consults at each
//! branching point. Constructed once per generation session, read-only during
//! traversal.

use std::collections::HashMap;

use crate::xsd::Schema;

/// Whether schema elements or schema types are the unit of class generation.
/// [`BindingMode::Default`] behaves like [`BindingMode::ElementCentric`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BindingMode {
    #[default]
    Default,
    ElementCentric,
    TypeCentric,
}

pub struct BindingPolicy {
    mode: BindingMode,
    /// Directory that relative schema locations are resolved against.
    current_dir: String,
    namespace_packages: HashMap<String, String>,
    location_packages: HashMap<String, String>,
}

impl BindingPolicy {
    pub fn new(mode: BindingMode, current_dir: impl Into<String>) -> Self {
        Self {
            mode,
            current_dir: current_dir.into().replace('\\', "/"),
            namespace_packages: HashMap::new(),
            location_packages: HashMap::new(),
        }
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    pub fn is_type_centric(&self) -> bool {
        self.mode == BindingMode::TypeCentric
    }

    pub fn is_element_centric(&self) -> bool {
        !self.is_type_centric()
    }

    /// Maps a namespace to a package. Last write wins.
    pub fn set_namespace_package(
        &mut self,
        namespace: impl Into<String>,
        package: impl Into<String>,
    ) {
        self.namespace_packages
            .insert(namespace.into(), package.into());
    }

    /// Maps a schema location to a package. Relative locations are resolved
    /// against the current directory before insertion. Last write wins.
    pub fn set_location_package(
        &mut self,
        location: impl AsRef<str>,
        package: impl Into<String>,
    ) {
        let location = self.canonical_location(location.as_ref());
        self.location_packages.insert(location, package.into());
    }

    pub fn package_for_namespace(&self, namespace: &str) -> Option<&str> {
        self.namespace_packages.get(namespace).map(String::as_str)
    }

    pub fn package_for_location(&self, location: &str) -> Option<&str> {
        let location = self.canonical_location(location);
        self.location_packages.get(&location).map(String::as_str)
    }

    /// The package for classes generated from `schema`. When both a namespace
    /// and a location mapping could apply, the namespace mapping wins.
    pub fn package_for_schema(&self, schema: &Schema) -> Option<&str> {
        schema
            .target_namespace
            .as_deref()
            .and_then(|namespace| self.package_for_namespace(namespace))
            .or_else(|| {
                schema
                    .schema_location
                    .as_deref()
                    .and_then(|location| self.package_for_location(location))
            })
    }

    fn canonical_location(&self, location: &str) -> String {
        let location = location.replace('\\', "/");
        if let Some(rest) = location.strip_prefix("./") {
            format!("{}/{}", self.current_dir, rest)
        } else if let Some(rest) = location.strip_prefix("../") {
            let parent = match self.current_dir.rfind('/') {
                Some(last) => &self.current_dir[..=last],
                None => "",
            };
            format!("{parent}{rest}")
        } else {
            location
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::SchemaId;

    fn policy() -> BindingPolicy {
        BindingPolicy::new(BindingMode::Default, "/work/schemas")
    }

    #[test]
    fn default_mode_is_element_centric() {
        assert!(policy().is_element_centric());
        assert!(!policy().is_type_centric());
        let typed = BindingPolicy::new(BindingMode::TypeCentric, "/work");
        assert!(typed.is_type_centric());
        assert!(!typed.is_element_centric());
    }

    #[test]
    fn last_namespace_mapping_wins() {
        let mut policy = policy();
        policy.set_namespace_package("urn:a", "first");
        policy.set_namespace_package("urn:a", "second");
        assert_eq!(policy.package_for_namespace("urn:a"), Some("second"));
    }

    #[test]
    fn relative_locations_resolve_against_the_current_dir() {
        let mut policy = policy();
        policy.set_location_package("./person.xsd", "com.example.person");
        assert_eq!(
            policy.package_for_location("/work/schemas/person.xsd"),
            Some("com.example.person")
        );

        policy.set_location_package("../shared.xsd", "com.example.shared");
        assert_eq!(
            policy.package_for_location("/work/shared.xsd"),
            Some("com.example.shared")
        );
    }

    #[test]
    fn relative_lookups_resolve_too() {
        let mut policy = policy();
        policy.set_location_package("/work/schemas/person.xsd", "com.example.person");
        assert_eq!(
            policy.package_for_location("./person.xsd"),
            Some("com.example.person")
        );
    }

    #[test]
    fn namespace_mapping_takes_precedence_over_location() {
        let mut policy = policy();
        policy.set_namespace_package("urn:a", "by.namespace");
        policy.set_location_package("/work/a.xsd", "by.location");

        let mut schema = crate::xsd::Schema::empty(SchemaId::BUILTINS);
        schema.target_namespace = Some("urn:a".into());
        schema.schema_location = Some("/work/a.xsd".into());
        assert_eq!(policy.package_for_schema(&schema), Some("by.namespace"));

        schema.target_namespace = None;
        assert_eq!(policy.package_for_schema(&schema), Some("by.location"));
    }
}
