//! `format` package.

use crate::capabilities::{Capability, Package, RegistryError};

/// Return the synthesized markdown document as the reply body.
pub fn markdown(document: &str) -> anyhow::Result<String> {
    let document = document.trim();
    if document.is_empty() {
        anyhow::bail!("markdown document is empty");
    }
    Ok(document.to_string())
}

pub fn package() -> Result<Package, RegistryError> {
    Package::new(
        "format",
        vec![Capability::new("markdown", "Formats a markdown document", markdown)
            .with_input_spec("Markdown document content")
            .with_example(
                "user: Make me a schedule for studying rust this week\n\
                 assistant: # Rust study plan\n\n\
                 | Day | Topic |\n\
                 |-----|-------|\n\
                 | Mon | Ownership |\n\
                 | Tue | Traits |\n\
                 | Wed | Error handling |",
            )
            .with_counter_example(
                "user: Make me a schedule for studying rust this week\n\
                 assistant: Sure! Here is a schedule you could use: ...",
            )],
    )
}
