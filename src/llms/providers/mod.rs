//! Native completion providers.

pub mod mistral;

pub use mistral::MistralCompletion;
