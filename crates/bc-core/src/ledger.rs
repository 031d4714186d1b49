// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-agent command history
//!
//! The ledger is an ordered, newest-first sequence of [`CommandEntry`] keyed
//! by command id. It is shared between the dispatch client and the polling
//! scheduler behind a single [`tokio::sync::RwLock`]; every mutation goes
//! through the write lock.
//!
//! Each ledger instance carries an *epoch*. A new epoch is assigned whenever
//! a ledger is created, so a fetch tagged with an older epoch can be detected
//! and dropped after the operator switched agents.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bc_domain_types::{CommandEntry, CommandUpdate, TerminalPolicy};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::visibility::VisibilityFilter;

/// Ledger shared between dispatch and polling
pub type SharedLedger = Arc<RwLock<CommandLedger>>;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Result of [`CommandLedger::merge_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The entry changed
    Applied,
    /// The update matched the current state
    Unchanged,
    /// No entry with that id
    UnknownId,
    /// The entry already holds a terminal status and was left alone
    AlreadyTerminal,
}

#[derive(Debug, Clone)]
pub struct CommandLedger {
    agent_id: String,
    epoch: u64,
    policy: TerminalPolicy,
    visibility: VisibilityFilter,
    entries: Vec<CommandEntry>,
}

impl CommandLedger {
    pub fn new(
        agent_id: impl Into<String>,
        policy: TerminalPolicy,
        visibility: VisibilityFilter,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
            policy,
            visibility,
            entries: Vec::new(),
        }
    }

    /// Empty ledger not bound to any agent
    pub fn detached(policy: TerminalPolicy, visibility: VisibilityFilter) -> Self {
        Self::new(String::new(), policy, visibility)
    }

    pub fn shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn is_detached(&self) -> bool {
        self.agent_id.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn policy(&self) -> TerminalPolicy {
        self.policy
    }

    pub fn visibility(&self) -> &VisibilityFilter {
        &self.visibility
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// All entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<CommandEntry> {
        self.entries.clone()
    }

    /// Replace the contents with server history
    ///
    /// Entries are ordered newest-first by creation time; on duplicate ids
    /// the first occurrence wins.
    pub fn seed(&mut self, history: impl IntoIterator<Item = CommandEntry>) {
        let mut seen = HashSet::new();
        let mut entries: Vec<CommandEntry> = history
            .into_iter()
            .filter(|entry| seen.insert(entry.id().to_string()))
            .collect();
        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        self.entries = entries;
    }

    /// Add a freshly submitted entry at the head
    pub fn insert(&mut self, entry: CommandEntry) -> CoreResult<()> {
        if self.get(entry.id()).is_some() {
            return Err(CoreError::DuplicateId(entry.id().to_string()));
        }
        self.entries.insert(0, entry);
        Ok(())
    }

    /// Merge a fetched update into the entry with `id`, keeping its position
    pub fn merge_update(&mut self, id: &str, update: &CommandUpdate) -> MergeOutcome {
        let policy = self.policy;
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id() == id) else {
            return MergeOutcome::UnknownId;
        };
        if entry.is_terminal(policy) {
            return MergeOutcome::AlreadyTerminal;
        }
        if entry.apply(update) {
            MergeOutcome::Applied
        } else {
            MergeOutcome::Unchanged
        }
    }

    /// Entries still expecting updates, in ledger order
    ///
    /// Recomputed on every call, so entries merged to a terminal status drop
    /// out of the next enumeration.
    pub fn non_terminal(&self) -> impl Iterator<Item = &CommandEntry> {
        let policy = self.policy;
        self.entries.iter().filter(move |entry| !entry.is_terminal(policy))
    }

    /// Entries the operator may see, in ledger order
    pub fn visible(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter().filter(|entry| self.visibility.is_visible(entry.command()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_domain_types::{CommandType, StatusCode};
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 12, minute, 0).unwrap()
    }

    fn entry(id: &str, command: &str, status: &str, minute: u32) -> CommandEntry {
        CommandEntry::new(id, command, CommandType::Shell, StatusCode::parse(status), at(minute))
    }

    fn ledger() -> CommandLedger {
        CommandLedger::new("agent-1", TerminalPolicy::default(), VisibilityFilter::default())
    }

    fn ids<'a>(entries: impl Iterator<Item = &'a CommandEntry>) -> Vec<&'a str> {
        entries.map(CommandEntry::id).collect()
    }

    #[test]
    fn insert_prepends_and_rejects_duplicates() {
        let mut ledger = ledger();
        ledger.insert(entry("a", "whoami", "cs_pndg", 0)).unwrap();
        ledger.insert(entry("b", "uptime", "cs_pndg", 1)).unwrap();
        assert_eq!(ids(ledger.entries()), ["b", "a"]);

        let err = ledger.insert(entry("a", "again", "cs_pndg", 2)).unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("a".to_string()));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn merge_by_unknown_id_is_noop() {
        let mut ledger = ledger();
        ledger.insert(entry("a", "whoami", "cs_pndg", 0)).unwrap();
        let before = ledger.snapshot();

        let outcome = ledger.merge_update("zzz", &CommandUpdate::status("cs_cmpltd"));
        assert_eq!(outcome, MergeOutcome::UnknownId);
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn merge_is_idempotent_and_stops_at_terminal() {
        let mut ledger = ledger();
        ledger.insert(entry("a", "whoami", "cs_pndg", 0)).unwrap();

        let running = CommandUpdate::status("cs_rng");
        assert_eq!(ledger.merge_update("a", &running), MergeOutcome::Applied);
        assert_eq!(ledger.merge_update("a", &running), MergeOutcome::Unchanged);

        let done = CommandUpdate::status("cs_cmpltd").with_result("root", Some("text"));
        assert_eq!(ledger.merge_update("a", &done), MergeOutcome::Applied);

        let late = CommandUpdate::status("cs_rng");
        assert_eq!(ledger.merge_update("a", &late), MergeOutcome::AlreadyTerminal);
        assert_eq!(ledger.get("a").unwrap().status(), &StatusCode::COMPLETED);
    }

    #[test]
    fn non_terminal_is_recomputed_after_merge() {
        let mut ledger = ledger();
        ledger.insert(entry("a", "whoami", "cs_pndg", 0)).unwrap();
        ledger.insert(entry("b", "uptime", "cs_rng", 1)).unwrap();
        ledger.insert(entry("c", "id", "cs_fld", 2)).unwrap();
        assert_eq!(ids(ledger.non_terminal()), ["b", "a"]);

        ledger.merge_update("b", &CommandUpdate::status("cs_cmpltd"));
        assert_eq!(ids(ledger.non_terminal()), ["a"]);
    }

    #[test]
    fn cancelled_entries_keep_polling_under_strict_policy() {
        let mut strict =
            CommandLedger::new("agent-1", TerminalPolicy::Strict, VisibilityFilter::default());
        strict.insert(entry("a", "sleep 60", "cs_clld", 0)).unwrap();
        assert_eq!(ids(strict.non_terminal()), ["a"]);

        let mut default = ledger();
        default.insert(entry("a", "sleep 60", "cs_clld", 0)).unwrap();
        assert_eq!(default.non_terminal().count(), 0);
    }

    #[test]
    fn reserved_commands_are_tracked_but_hidden() {
        let mut ledger = ledger();
        ledger.insert(entry("a", "whoami", "cs_pndg", 0)).unwrap();
        ledger.insert(entry("b", "return_results", "cs_pndg", 1)).unwrap();

        assert_eq!(ids(ledger.visible()), ["a"]);
        assert_eq!(ids(ledger.non_terminal()), ["b", "a"]);
    }

    #[test]
    fn seed_orders_newest_first_and_drops_duplicates() {
        let mut ledger = ledger();
        ledger.insert(entry("stale", "old", "cs_pndg", 0)).unwrap();

        ledger.seed(vec![
            entry("x", "first", "cs_cmpltd", 1),
            entry("y", "second", "cs_cmpltd", 5),
            entry("x", "duplicate", "cs_fld", 9),
            entry("z", "third", "cs_rng", 3),
        ]);

        assert_eq!(ids(ledger.entries()), ["y", "z", "x"]);
        assert_eq!(ledger.get("x").unwrap().command(), "first");
        assert!(ledger.get("stale").is_none());
    }

    #[test]
    fn every_ledger_gets_a_fresh_epoch() {
        let a = ledger();
        let b = ledger();
        assert_ne!(a.epoch(), b.epoch());
        assert!(CommandLedger::detached(TerminalPolicy::Strict, VisibilityFilter::default())
            .is_detached());
    }

    const STATUSES: &[&str] = &["cs_pndg", "cs_rng", "cs_cmpltd", "cs_fld", "cs_clld", "queued"];

    proptest! {
        #[test]
        fn merges_never_reorder_entries(
            count in 1usize..12,
            merges in proptest::collection::vec((0usize..16, 0usize..6), 0..40),
        ) {
            let mut ledger = ledger();
            for i in 0..count {
                ledger.insert(entry(&format!("c-{i}"), "cmd", "cs_pndg", i as u32)).unwrap();
            }
            let order: Vec<String> = ledger.entries().map(|e| e.id().to_string()).collect();

            for (target, status) in merges {
                let id = format!("c-{target}");
                let outcome = ledger.merge_update(&id, &CommandUpdate::status(STATUSES[status]));
                if target >= count {
                    prop_assert_eq!(outcome, MergeOutcome::UnknownId);
                }
            }

            let after: Vec<String> = ledger.entries().map(|e| e.id().to_string()).collect();
            prop_assert_eq!(after, order);
            prop_assert_eq!(ledger.len(), count);
            for e in ledger.non_terminal() {
                prop_assert!(!e.is_terminal(ledger.policy()));
            }
        }
    }
}
