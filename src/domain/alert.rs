//! # Alert State Machine
//!
//! Turns a noisy per-cycle availability signal into at most one
//! notification per availability streak.
//!
//! | state       | verdict              | action | next        |
//! |-------------|----------------------|--------|-------------|
//! | NotAlerted  | Available            | notify | Alerted     |
//! | NotAlerted  | Unavailable, Unknown | -      | NotAlerted  |
//! | Alerted     | Available            | -      | Alerted     |
//! | Alerted     | Unavailable          | -      | NotAlerted  |
//! | Alerted     | Unknown              | -      | Alerted     |
//!
//! UNKNOWN never resets an active alert and never raises a new one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::availability::Availability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    #[default]
    NotAlerted,
    Alerted,
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotAlerted => "NOT_ALERTED",
            Self::Alerted => "ALERTED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    None,
    Notify,
}

/// Outcome of feeding one verdict into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTransition {
    pub previous: AlertState,
    pub next: AlertState,
    pub action: AlertAction,
}

impl AlertTransition {
    #[must_use]
    pub fn should_notify(&self) -> bool {
        self.action == AlertAction::Notify
    }

    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.next
    }
}

/// Pure transition function
#[must_use]
pub const fn transition(state: AlertState, availability: Availability) -> AlertTransition {
    let (next, action) = match (state, availability) {
        (AlertState::NotAlerted, Availability::Available) => {
            (AlertState::Alerted, AlertAction::Notify)
        }
        (AlertState::NotAlerted, Availability::Unavailable | Availability::Unknown) => {
            (AlertState::NotAlerted, AlertAction::None)
        }
        (AlertState::Alerted, Availability::Available | Availability::Unknown) => {
            (AlertState::Alerted, AlertAction::None)
        }
        (AlertState::Alerted, Availability::Unavailable) => {
            (AlertState::NotAlerted, AlertAction::None)
        }
    };

    AlertTransition {
        previous: state,
        next,
        action,
    }
}

/// Per-product alert entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertRecord {
    pub state: AlertState,
}

/// Alert records keyed by product name.
///
/// Lives in process memory only; a restart forgets every alert.
#[derive(Debug, Default, Clone)]
pub struct AlertStore {
    records: HashMap<String, AlertRecord>,
}

impl AlertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `NotAlerted` for products never seen
    #[must_use]
    pub fn state(&self, product_name: &str) -> AlertState {
        self.records
            .get(product_name)
            .map(|record| record.state)
            .unwrap_or_default()
    }

    /// Feed one verdict for one product and record the resulting state
    pub fn apply(&mut self, product_name: &str, availability: Availability) -> AlertTransition {
        let record = self.records.entry(product_name.to_string()).or_default();
        let result = transition(record.state, availability);
        record.state = result.next;
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of all records, sorted by product name
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, AlertRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(name, record)| (name.clone(), *record))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::alert::AlertState::{Alerted, NotAlerted};
    use crate::domain::availability::Availability::{Available, Unavailable, Unknown};

    #[rstest]
    #[case(NotAlerted, Available, Alerted, AlertAction::Notify)]
    #[case(NotAlerted, Unavailable, NotAlerted, AlertAction::None)]
    #[case(NotAlerted, Unknown, NotAlerted, AlertAction::None)]
    #[case(Alerted, Available, Alerted, AlertAction::None)]
    #[case(Alerted, Unavailable, NotAlerted, AlertAction::None)]
    #[case(Alerted, Unknown, Alerted, AlertAction::None)]
    fn transition_table(
        #[case] state: AlertState,
        #[case] availability: Availability,
        #[case] next: AlertState,
        #[case] action: AlertAction,
    ) {
        let result = transition(state, availability);
        assert_eq!(result.previous, state);
        assert_eq!(result.next, next);
        assert_eq!(result.action, action);
    }

    fn notifications(store: &mut AlertStore, name: &str, verdicts: &[Availability]) -> usize {
        verdicts
            .iter()
            .filter(|v| store.apply(name, **v).should_notify())
            .count()
    }

    #[test]
    fn repeated_available_notifies_once() {
        let mut store = AlertStore::new();
        assert_eq!(notifications(&mut store, "p", &[Available; 5]), 1);
        assert_eq!(store.state("p"), Alerted);
    }

    #[test]
    fn recovery_sequence_notifies_twice() {
        let mut store = AlertStore::new();
        assert_eq!(
            notifications(&mut store, "p", &[Available, Unavailable, Available]),
            2
        );
    }

    #[test]
    fn unknown_reads_keep_an_active_alert() {
        let mut store = AlertStore::new();
        store.apply("p", Available);

        for verdict in [Unknown, Unknown, Available] {
            let result = store.apply("p", verdict);
            assert!(!result.should_notify());
            assert_eq!(result.next, Alerted);
        }
    }

    #[test]
    fn products_are_tracked_independently() {
        let mut store = AlertStore::new();
        assert!(store.apply("a", Available).should_notify());
        assert!(store.apply("b", Available).should_notify());
        store.apply("a", Unavailable);

        assert_eq!(store.state("a"), NotAlerted);
        assert_eq!(store.state("b"), Alerted);
        assert_eq!(store.state("never-seen"), NotAlerted);
    }

    #[test]
    fn snapshot_is_sorted_by_product_name() {
        let mut store = AlertStore::new();
        store.apply("zeta", Available);
        store.apply("alpha", Unavailable);

        let names: Vec<_> = store.snapshot().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn changed_reports_state_moves_only() {
        assert!(transition(NotAlerted, Available).changed());
        assert!(transition(Alerted, Unavailable).changed());
        assert!(!transition(Alerted, Unknown).changed());
        assert!(!transition(NotAlerted, Unavailable).changed());
    }
}
