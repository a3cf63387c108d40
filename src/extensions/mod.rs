//! Built-in capability packages.
//!
//! Every package is assembled from literals by [`default_registry`]; nothing
//! registers itself at load time.

pub mod chat;
pub mod format;
pub mod math;
pub mod search;

use crate::capabilities::{Registry, RegistryError};

/// Build the registry the server ships with: `search`, `math`, `chat`,
/// `format`, in that order.
pub fn default_registry() -> Result<Registry, RegistryError> {
    Registry::new(vec![
        search::package()?,
        math::package()?,
        chat::package()?,
        format::package()?,
    ])
}
