//! Packages: named groups of related capabilities (e.g. `search`, `math`).

use std::collections::HashSet;

use super::capability::Capability;
use super::RegistryError;

/// A named grouping of capabilities.
///
/// Owns its capability list and assigns each member its qualified
/// `package.name` at construction. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    capabilities: Vec<Capability>,
}

impl Package {
    /// Build a package, qualifying every capability under `name`.
    ///
    /// Fails if the package or any capability name is not a valid segment, if
    /// a description spans several lines, or if two capabilities share a name.
    pub fn new(
        name: impl Into<String>,
        capabilities: Vec<Capability>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        validate_segment(&name)?;

        let mut seen = HashSet::new();
        let mut qualified = Vec::with_capacity(capabilities.len());
        for mut capability in capabilities {
            validate_segment(capability.name())?;
            if capability.description().contains(['\n', '\r']) {
                return Err(RegistryError::MultilineDescription {
                    capability: format!("{}.{}", name, capability.name()),
                });
            }
            if !seen.insert(capability.name().to_string()) {
                return Err(RegistryError::DuplicateCapability {
                    package: name,
                    capability: capability.name().to_string(),
                });
            }
            capability.qualify(&name);
            qualified.push(capability);
        }

        Ok(Self {
            name,
            capabilities: qualified,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capabilities in registration order.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Look up a capability by its qualified `package.name`.
    pub fn lookup(&self, qualified_name: &str) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|c| c.qualified_name() == qualified_name)
    }
}

/// A name segment must be non-empty and free of dots and whitespace, so that
/// `package.name` splits unambiguously.
fn validate_segment(segment: &str) -> Result<(), RegistryError> {
    if segment.is_empty() || segment.contains('.') || segment.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName {
            name: segment.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(name: &str) -> Capability {
        Capability::new(name, format!("{} capability", name), |a: &str| {
            Ok(a.to_string())
        })
    }

    #[test]
    fn test_package_qualifies_members() {
        let package = Package::new("math", vec![cap("solve"), cap("plot")]).unwrap();
        let names: Vec<_> = package
            .capabilities()
            .iter()
            .map(|c| c.qualified_name())
            .collect();
        assert_eq!(names, vec!["math.solve", "math.plot"]);
    }

    #[test]
    fn test_lookup_requires_qualified_name() {
        let package = Package::new("math", vec![cap("solve")]).unwrap();
        assert!(package.lookup("math.solve").is_some());
        assert!(package.lookup("solve").is_none());
        assert!(package.lookup("search.solve").is_none());
    }

    #[test]
    fn test_duplicate_capability_rejected() {
        let err = Package::new("math", vec![cap("solve"), cap("solve")]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateCapability { ref package, ref capability }
                if package == "math" && capability == "solve"
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(matches!(
            Package::new("ma.th", vec![]),
            Err(RegistryError::InvalidName { .. })
        ));
        assert!(matches!(
            Package::new("math", vec![cap("")]),
            Err(RegistryError::InvalidName { .. })
        ));
        assert!(matches!(
            Package::new("math", vec![cap("z3 solve")]),
            Err(RegistryError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_multiline_description_rejected() {
        let two_lines = Capability::new("solve", "Solves\nthings", |a: &str| Ok(a.to_string()));
        let err = Package::new("math", vec![two_lines]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MultilineDescription { ref capability } if capability == "math.solve"
        ));

        let carriage = Capability::new("solve", "Solves\r", |a: &str| Ok(a.to_string()));
        assert!(Package::new("math", vec![carriage]).is_err());
    }
}
