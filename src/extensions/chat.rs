//! `chat` package: plain conversational replies.

use crate::capabilities::{Capability, Package, RegistryError};

/// The synthesized argument already is the reply.
pub fn greet(message: &str) -> anyhow::Result<String> {
    Ok(message.trim().to_string())
}

pub fn package() -> Result<Package, RegistryError> {
    Package::new(
        "chat",
        vec![Capability::new(
            "greet",
            "Replies to a greeting or small talk",
            greet,
        )
        .with_input_spec("A message for the user")
        .with_example("user: Hey bot guy\nassistant: Hello!")
        .with_example("user: good morning!\nassistant: Good morning! How can I help?")
        .with_counter_example(
            "user: Hey bot guy\nassistant: The user greeted me, so I should say hello",
        )],
    )
}
