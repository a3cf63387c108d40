//! Capability definition: the unit of invokable bot functionality.
//!
//! A capability is a documented action:
//! - A short name (qualified by its package once registered)
//! - A one-line description used in the selection prompt
//! - Examples and counterexamples used in the argument prompt
//! - A free-text input spec describing the expected argument shape
//! - A bound handler that turns one string argument into a reply

use std::fmt;
use std::sync::Arc;

/// Default input spec when a capability does not describe its argument.
pub const DEFAULT_INPUT_SPEC: &str = "string";

/// The action bound to a capability.
///
/// Any `Fn(&str) -> anyhow::Result<String>` closure implements this trait,
/// so most capabilities are registered as plain functions.
pub trait CapabilityHandler: Send + Sync {
    /// Invoke the capability with its synthesized argument.
    fn invoke(&self, argument: &str) -> anyhow::Result<String>;
}

impl<F> CapabilityHandler for F
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        self(argument)
    }
}

/// A named, documented, invokable capability.
///
/// Built with [`Capability::new`] and the `with_*` builders, then handed to a
/// [`Package`](super::package::Package), which assigns the qualified name.
/// Immutable once registered.
#[derive(Clone)]
pub struct Capability {
    name: String,
    qualified_name: String,
    description: String,
    examples: Vec<String>,
    counter_examples: Vec<String>,
    input_spec: String,
    handler: Arc<dyn CapabilityHandler>,
}

impl Capability {
    /// Create a capability with no examples and the default input spec.
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            qualified_name: name.clone(),
            name,
            description: description.into(),
            examples: Vec::new(),
            counter_examples: Vec::new(),
            input_spec: DEFAULT_INPUT_SPEC.to_string(),
            handler: Arc::new(handler),
        }
    }

    /// Append a positive demonstration.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Append a demonstration of a disallowed answer shape.
    pub fn with_counter_example(mut self, counter_example: impl Into<String>) -> Self {
        self.counter_examples.push(counter_example.into());
        self
    }

    /// Describe the expected argument.
    pub fn with_input_spec(mut self, input_spec: impl Into<String>) -> Self {
        self.input_spec = input_spec.into();
        self
    }

    pub(crate) fn qualify(&mut self, package: &str) {
        self.qualified_name = format!("{}.{}", package, self.name);
    }

    /// Short name, unique within the owning package.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `package.name`, unique within the registry.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn counter_examples(&self) -> &[String] {
        &self.counter_examples
    }

    pub fn input_spec(&self) -> &str {
        &self.input_spec
    }

    /// A shared handle to the bound action, for invocation off the caller's task.
    pub fn handler(&self) -> Arc<dyn CapabilityHandler> {
        Arc::clone(&self.handler)
    }

    /// Invoke the bound action directly.
    pub fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        self.handler.invoke(argument)
    }

    /// One-line form used in the selection catalog.
    pub fn render_basic(&self) -> String {
        format!("{} -- \"{}\"", self.qualified_name, self.description)
    }

    /// Full documentation block embedded in the argument-synthesis prompt.
    pub fn render_full(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n", self.qualified_name));
        out.push_str(&format!("{}\n\n", self.description));
        out.push_str("## Input\n");
        out.push_str(&format!("{}\n\n", self.input_spec));
        out.push_str("## Examples and counterexamples\n");

        for (index, example) in self.examples.iter().enumerate() {
            out.push_str(&format!("\n### Example {}:\n{}\n", index + 1, example.trim()));
        }
        for (index, counter_example) in self.counter_examples.iter().enumerate() {
            out.push_str(&format!(
                "\n### Counterexample {}, do NOT do this:\n{}\n",
                index + 1,
                counter_example.trim()
            ));
        }

        out
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("qualified_name", &self.qualified_name)
            .field("description", &self.description)
            .field("examples", &self.examples.len())
            .field("counter_examples", &self.counter_examples.len())
            .field("input_spec", &self.input_spec)
            .finish_non_exhaustive()
    }
}
