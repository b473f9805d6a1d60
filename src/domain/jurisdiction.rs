//! Jurisdiction domain model

use serde::{Deserialize, Serialize};

/// Public-health jurisdiction that owns the exported patients
///
/// Only the precomputed ancestry path is used by the documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    /// Ancestry names joined by ", " (e.g. `"USA, State 1, County 2"`)
    pub path: String,
}

impl Jurisdiction {
    /// Creates a jurisdiction from its precomputed path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a jurisdiction from its ancestry names, root first
    pub fn from_ancestry<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self { path }
    }

    /// Returns the jurisdiction path
    pub fn path(&self) -> &str {
        &self.path
    }
}
