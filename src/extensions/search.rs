//! `search` package.

use anyhow::Context;

use crate::capabilities::{Capability, Package, RegistryError};

const SEARCH_BASE: &str = "https://lmgtfy.app/";

/// Build a search link for `query`.
pub fn google(query: &str) -> anyhow::Result<String> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("search query is empty");
    }
    let url = reqwest::Url::parse_with_params(SEARCH_BASE, &[("q", query)])
        .context("failed to build search URL")?;
    Ok(url.to_string())
}

pub fn package() -> Result<Package, RegistryError> {
    Package::new(
        "search",
        vec![Capability::new("google", "Searches Google for a query", google)
            .with_input_spec("A string query")
            .with_example(
                "user: Can you tell me about Python?\n\
                 assistant: python programming",
            )
            .with_example(
                "user: Hey who's the CEO of microsoft?\n\
                 assistant: microsoft ceo",
            )
            .with_counter_example(
                "user: Can you tell me about Python?\n\
                 assistant: You should search for 'python programming' because ...",
            )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_encodes_query() {
        assert_eq!(
            google("weather today").unwrap(),
            "https://lmgtfy.app/?q=weather+today"
        );
        assert_eq!(
            google(" c++ & rust ").unwrap(),
            "https://lmgtfy.app/?q=c%2B%2B+%26+rust"
        );
    }

    #[test]
    fn test_google_rejects_empty() {
        assert!(google("  ").is_err());
    }

    #[test]
    fn test_package_shape() {
        let package = package().unwrap();
        let cap = package.lookup("search.google").unwrap();
        assert_eq!(cap.input_spec(), "A string query");
        assert_eq!(cap.examples().len(), 2);
    }
}
