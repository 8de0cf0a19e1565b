//! Status buckets and convergence classification.

use std::collections::BTreeSet;
use std::fmt;

/// Synthetic status reported when the fetched object does not exist.
///
/// Deletion waits declare it as their only target status.
pub const NOT_FOUND_STATUS: &str = "not-found";

/// An ordered set of remote status strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSet(BTreeSet<String>);

impl StatusSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `status` belongs to the set.
    pub fn contains(&self, status: &str) -> bool {
        self.0.contains(status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Statuses present in both sets.
    pub fn overlap(&self, other: &StatusSet) -> Vec<String> {
        self.0.intersection(&other.0).cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for StatusSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|s| format!("{s:?}")).collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}

/// Convergence status of a polled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Resource reached a target status.
    Converged,

    /// Resource reported a declared pending status.
    Converging,

    /// Resource reached a declared error status.
    Diverged,

    /// Status belongs to no declared bucket; polling continues.
    Unknown,
}

impl ConvergenceStatus {
    /// Returns true if the resource has converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }

    /// Returns true if the resource is still converging.
    pub fn is_converging(&self) -> bool {
        matches!(self, Self::Converging)
    }

    /// Returns true if this status ends a wait.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Diverged)
    }
}
