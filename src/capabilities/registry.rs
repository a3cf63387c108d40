//! Capability Registry: the immutable catalog the resolver selects from.
//!
//! Assembled once at startup from explicitly constructed packages. Rendering
//! and lookup are pure, so the registry is shared as `Arc<Registry>` and read
//! from any number of dispatch tasks without locking.
//!
//! Resolution is by qualified name: `registry.lookup("search.google")`

use std::collections::HashSet;

use super::capability::Capability;
use super::package::Package;
use super::RegistryError;

/// Ordered set of packages.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    packages: Vec<Package>,
}

impl Registry {
    /// Build a registry from packages in registration order.
    ///
    /// Package names must be unique; together with per-package uniqueness
    /// this makes every qualified name unique registry-wide.
    pub fn new(packages: Vec<Package>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for package in &packages {
            if !seen.insert(package.name()) {
                return Err(RegistryError::DuplicatePackage {
                    package: package.name().to_string(),
                });
            }
        }
        Ok(Self { packages })
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Every capability, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.packages.iter().flat_map(|p| p.capabilities().iter())
    }

    /// Get the total number of registered capabilities.
    pub fn len(&self) -> usize {
        self.packages.iter().map(|p| p.capabilities().len()).sum()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One line per capability: `<qualified> -- "<description>"`.
    pub fn render_basic(&self) -> String {
        self.iter()
            .map(Capability::render_basic)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full documentation for a single capability.
    pub fn render_full(&self, capability: &Capability) -> String {
        capability.render_full()
    }

    /// Resolve a capability by its qualified name. First match wins.
    pub fn lookup(&self, qualified_name: &str) -> Option<&Capability> {
        self.packages
            .iter()
            .find_map(|package| package.lookup(qualified_name))
    }
}
