//! # Capability Registry
//!
//! The catalog of actions the bot can take. Capabilities are grouped into
//! packages and addressed by qualified `package.name`:
//!
//! ```text
//! search.google -- "Searches Google for a query"
//! math.solve -- "Evaluates arithmetic and solves equations"
//! ```
//!
//! ## Lifecycle
//!
//! 1. Each package is built from capability literals (`Package::new`)
//! 2. `Registry::new` assembles all packages once at startup
//! 3. The resolver renders the catalog into prompts and looks up the
//!    model's answer with `Registry::lookup`
//!
//! Nothing registers itself and nothing is added after construction.

pub mod capability;
pub mod package;
pub mod registry;

use thiserror::Error;

pub use capability::{Capability, CapabilityHandler, DEFAULT_INPUT_SPEC};
pub use package::Package;
pub use registry::Registry;

/// Errors raised while assembling packages and the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two capabilities in one package share a name.
    #[error("capability '{capability}' is registered twice in package '{package}'")]
    DuplicateCapability { package: String, capability: String },

    /// Two packages share a name.
    #[error("package '{package}' is registered twice")]
    DuplicatePackage { package: String },

    /// A description would break the one-line catalog rendering.
    #[error("description of '{capability}' must be a single line")]
    MultilineDescription { capability: String },

    /// A package or capability name is empty or contains '.' or whitespace.
    #[error("invalid name segment '{name}'")]
    InvalidName { name: String },
}
