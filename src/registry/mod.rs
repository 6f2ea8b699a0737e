// src/registry/mod.rs
// =============================================================================
// This module knows where the list of webring members comes from.
//
// The registry is a JSON array maintained by the ring:
//   [{"name": "alice", "url": "https://alice.example"}, ...]
//
// It can be fetched over HTTP (the normal case) or read from a local file
// (handy for testing a change to the registry before publishing it).
// =============================================================================

mod fetch;

use serde::{Deserialize, Serialize};

// Re-export the loader
pub use fetch::{load_registry, DEFAULT_REGISTRY_URL};

/// One member of the ring, exactly as listed in the registry.
///
/// `name` is the key the ring uses in its redirect and embed URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub name: String,
    pub url: String,
}
