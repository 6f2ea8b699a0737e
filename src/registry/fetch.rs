// src/registry/fetch.rs
// =============================================================================
// This module loads the member registry.
//
// Strategy:
// - If the source looks like an http(s) URL, GET it
// - Otherwise treat it as a path on disk
// - Either way the body must decode as a JSON array of {name, url}
//
// Any failure here is fatal: without a registry there is nothing to check,
// so we stop before any browser work starts.
// =============================================================================

use super::MemberEntry;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Where the bucket webring publishes its member list
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/bucketfishy/bucket-webring/master/webring.json";

// Loads the member list from a URL or a file path
//
// Returns: members in registry order
pub async fn load_registry(source: &str) -> Result<Vec<MemberEntry>> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        fetch_file(&client, source).await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read registry file {}", source))?
    };

    let members = parse_registry(&body)
        .with_context(|| format!("Registry at {} is not a valid member list", source))?;

    tracing::info!(source = %source, members = members.len(), "loaded registry");
    Ok(members)
}

// Decodes the registry JSON
fn parse_registry(body: &str) -> Result<Vec<MemberEntry>> {
    let members: Vec<MemberEntry> = serde_json::from_str(body)?;
    Ok(members)
}

// Fetches content from a URL
//
// Non-2xx responses are errors: a 404 page is not a registry
async fn fetch_file(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to fetch {}: HTTP {}",
            url,
            response.status()
        ));
    }

    let content = response.text().await?;
    Ok(content)
}
