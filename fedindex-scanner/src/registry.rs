//! The seen registry: every instance identifier observed during a crawl and
//! what became of it.

use crate::error::FetchError;
use std::collections::HashMap;
use std::fmt;

/// Reason given to entries whose task never got to resolve them.
pub const ABANDONED_REASON: &str = "crawl task ended before resolution";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Routing needed a proxy that is not available.
    Configuration,
    /// Connection, DNS, proxy or timeout failure.
    Transport,
    /// Bad status, bad body or a malformed identifier.
    Protocol,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Transport => "transport",
            FailureKind::Protocol => "protocol",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A task has been scheduled and has not finished yet.
    Unresolved,
    Alive,
    Dead { kind: FailureKind, reason: String },
}

impl Outcome {
    pub fn dead(err: &FetchError) -> Self {
        Outcome::Dead {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Outcome::Unresolved)
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, Outcome::Alive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub outcome: Outcome,
    /// Hops from the seed at first sighting. Informational only.
    pub depth: usize,
}

/// Map from raw identifier (as first observed) to its outcome.
///
/// Entries are only ever added, and a resolved entry is never changed again.
/// The crawl engine keeps this behind a single lock so that the
/// test-and-insert in [`SeenRegistry::insert_if_absent`] and the task spawn that
/// follows it happen as one step.
#[derive(Debug, Default, Clone)]
pub struct SeenRegistry {
    entries: HashMap<String, Entry>,
}

impl SeenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` as `Unresolved`. Returns false if it was already present.
    pub fn insert_if_absent(&mut self, id: &str, depth: usize) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        self.entries.insert(
            id.to_string(),
            Entry {
                outcome: Outcome::Unresolved,
                depth,
            },
        );
        true
    }

    /// Record the final outcome of `id`.
    ///
    /// Only `Unresolved -> Alive | Dead` is accepted; anything else (unknown
    /// id, already resolved, or resolving to `Unresolved`) is refused and
    /// returns false.
    pub fn resolve(&mut self, id: &str, outcome: Outcome) -> bool {
        if !outcome.is_resolved() {
            return false;
        }
        match self.entries.get_mut(id) {
            Some(entry) if !entry.outcome.is_resolved() => {
                entry.outcome = outcome;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| !e.outcome.is_resolved())
            .count()
    }

    pub fn alive_count(&self) -> usize {
        self.entries.values().filter(|e| e.outcome.is_alive()).count()
    }

    /// Mark every still-unresolved entry dead. Only meaningful once no task
    /// is running; returns how many entries were affected.
    pub fn abandon_unresolved(&mut self) -> usize {
        let mut abandoned = 0;
        for entry in self.entries.values_mut() {
            if !entry.outcome.is_resolved() {
                entry.outcome = Outcome::Dead {
                    kind: FailureKind::Transport,
                    reason: ABANDONED_REASON.to_string(),
                };
                abandoned += 1;
            }
        }
        abandoned
    }
}
