// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Reserved command names hidden from the operator timeline

use std::collections::BTreeSet;

/// Agent-internal command used to ship results back to the server
pub const RETURN_RESULTS_COMMAND: &str = "return_results";

/// Predicate deciding which ledger entries the operator sees
///
/// Reserved entries stay in the ledger and are still polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    reserved: BTreeSet<String>,
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self {
            reserved: BTreeSet::from([RETURN_RESULTS_COMMAND.to_string()]),
        }
    }
}

impl VisibilityFilter {
    /// Default reserved set extended with `extra`
    pub fn with_reserved<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::default();
        filter.reserved.extend(
            extra
                .into_iter()
                .map(Into::into)
                .map(|name: String| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        );
        filter
    }

    pub fn is_reserved(&self, command: &str) -> bool {
        self.reserved.contains(command.trim())
    }

    pub fn is_visible(&self, command: &str) -> bool {
        !self.is_reserved(command)
    }

    pub fn reserved(&self) -> impl Iterator<Item = &str> {
        self.reserved.iter().map(String::as_str)
    }
}
