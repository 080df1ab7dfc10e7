//! This module provides non-fatal checks over a built transition table. A table that builds is
//! always runnable; the findings here point at machines that probably do not do what their
//! author meant, such as states the machine can never enter.

use crate::table::TransitionTable;
use crate::types::Action;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// A finding about a transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// States with rules that cannot be reached from the start state.
    UnreachableStates(Vec<String>),
    /// No transition halts, so every run ends undetermined.
    NoHaltingTransition,
    /// No transition accepts, so no input can be accepted.
    NoAcceptingTransition,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnreachableStates(states) => write!(
                f,
                "States unreachable from the start state: {}",
                states.join(", ")
            ),
            Diagnostic::NoHaltingTransition => {
                write!(f, "No transition halts; every run will exhaust its step budget")
            }
            Diagnostic::NoAcceptingTransition => {
                write!(f, "No transition accepts; no input can be accepted")
            }
        }
    }
}

/// Analyzes a transition table and returns every finding, in a fixed order.
///
/// # Arguments
///
/// * `table` - The table to analyze.
///
/// # Returns
///
/// * An empty vector if nothing looks suspicious.
pub fn analyze(table: &TransitionTable) -> Vec<Diagnostic> {
    [check_reachable_states, check_halting, check_accepting]
        .iter()
        .filter_map(|check| check(table))
        .collect()
}

/// Returns the states reachable from the start state, in discovery order.
pub fn reachable_states(table: &TransitionTable) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([table.start_state()]);

    while let Some(state) = queue.pop_front() {
        if !seen.insert(state) {
            continue;
        }
        order.push(state);

        for symbol in table.alphabet() {
            let Some(transition) = table.get(state, symbol) else {
                continue;
            };
            let next = transition.next_state.as_str();
            if !transition.action.is_halting() && !seen.contains(next) {
                queue.push_back(next);
            }
        }
    }

    order
}

/// Checks for states that no run can enter.
///
/// A halting transition still names a next state, but the machine stops there, so only
/// non-halting transitions make their target reachable.
fn check_reachable_states(table: &TransitionTable) -> Option<Diagnostic> {
    let reachable: HashSet<&str> = reachable_states(table).into_iter().collect();
    let unreachable: Vec<String> = table
        .states()
        .iter()
        .filter(|state| !reachable.contains(state.as_str()))
        .cloned()
        .collect();

    (!unreachable.is_empty()).then_some(Diagnostic::UnreachableStates(unreachable))
}

/// Checks that at least one transition halts.
fn check_halting(table: &TransitionTable) -> Option<Diagnostic> {
    let halts = table
        .entries()
        .any(|(_, _, transition)| transition.action.is_halting());

    (!halts).then_some(Diagnostic::NoHaltingTransition)
}

/// Checks that at least one transition accepts, for machines that do halt.
fn check_accepting(table: &TransitionTable) -> Option<Diagnostic> {
    let actions: Vec<Action> = table
        .entries()
        .map(|(_, _, transition)| transition.action)
        .collect();
    let halts = actions.iter().any(Action::is_halting);
    let accepts = actions.contains(&Action::HaltAccept);

    (halts && !accepts).then_some(Diagnostic::NoAcceptingTransition)
}
