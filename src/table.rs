//! This module builds the deterministic transition table from a parsed specification.
//!
//! Building expands wildcard rules, then checks that the table is total (every known state has
//! exactly one transition for every alphabet symbol) and closed (every state and symbol a
//! transition produces is itself known). A table that exists has passed both checks.

use crate::parser::parse;
use crate::types::{Action, InputPattern, MachineError, MachineSpec, RawRule, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a resolved transition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// An explicit rule for this exact symbol.
    Explicit,
    /// The state's wildcard rule.
    Wildcard,
}

/// A resolved entry of the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine enters.
    pub next_state: Symbol,
    /// The symbol written under the head.
    pub write: Symbol,
    /// What happens after writing.
    pub action: Action,
    /// Whether the entry came from an explicit or a wildcard rule.
    pub origin: Origin,
    /// The specification line of the rule that produced this entry.
    pub line: usize,
}

/// A validated, immutable transition table keyed by `(state, symbol)`.
///
/// Entries are stored densely: state-major in order of first appearance, then alphabet order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionTable {
    alphabet: Vec<Symbol>,
    states: Vec<Symbol>,
    entries: Vec<Transition>,
    #[serde(skip)]
    state_index: HashMap<Symbol, usize>,
    #[serde(skip)]
    symbol_index: HashMap<Symbol, usize>,
}

/// The rules declared for one state, split by kind.
#[derive(Default)]
struct StateRules<'a> {
    explicit: HashMap<&'a str, &'a RawRule>,
    wildcard: Option<&'a RawRule>,
}

impl TransitionTable {
    /// Parses specification text and builds its transition table.
    pub fn parse(input: &str) -> Result<Self, MachineError> {
        Self::build(&parse(input)?)
    }

    /// Builds the table for a parsed specification.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionTable)` if the rules are unambiguous, total and closed.
    /// * `Err(MachineError::ConflictingWildcard)` if a state has more than one wildcard rule.
    /// * `Err(MachineError::DuplicateTransition)` if two explicit rules cover the same pair.
    /// * `Err(MachineError::MissingTransition)` if a state leaves an alphabet symbol uncovered.
    /// * `Err(MachineError::UnknownState)` / `Err(MachineError::UnknownSymbol)` if a rule
    ///   refers to something outside the known states or the alphabet.
    pub fn build(spec: &MachineSpec) -> Result<Self, MachineError> {
        if spec.alphabet.is_empty() {
            return Err(MachineError::MalformedSpec(
                "alphabet must declare at least one symbol".to_string(),
            ));
        }
        if spec.rules.is_empty() {
            return Err(MachineError::MalformedSpec(
                "at least one rule is required".to_string(),
            ));
        }

        let symbol_index = index_of(&spec.alphabet);
        let states = collect_states(&spec.rules);
        let state_index = index_of(&states);

        let by_state = partition_rules(&spec.rules, &symbol_index)?;

        let mut entries = Vec::with_capacity(states.len() * spec.alphabet.len());
        for state in &states {
            let rules = &by_state[state.as_str()];
            for symbol in &spec.alphabet {
                let (rule, origin) = match rules.explicit.get(symbol.as_str()) {
                    Some(rule) => (*rule, Origin::Explicit),
                    None => match rules.wildcard {
                        Some(rule) => (rule, Origin::Wildcard),
                        None => {
                            return Err(MachineError::MissingTransition {
                                state: state.clone(),
                                symbol: symbol.clone(),
                            })
                        }
                    },
                };

                entries.push(Transition {
                    next_state: rule.state_to.clone(),
                    write: rule.input_to.clone(),
                    action: rule.action,
                    origin,
                    line: rule.line,
                });
            }
        }

        check_closure(&entries, &state_index, &symbol_index)?;

        log::debug!(
            "built transition table: {} states x {} symbols, start state '{}'",
            states.len(),
            spec.alphabet.len(),
            states[0]
        );

        Ok(Self {
            alphabet: spec.alphabet.clone(),
            states,
            entries,
            state_index,
            symbol_index,
        })
    }

    /// Looks up the transition for `state` reading `symbol`.
    pub fn get(&self, state: &str, symbol: &str) -> Option<&Transition> {
        let state = *self.state_index.get(state)?;
        let symbol = *self.symbol_index.get(symbol)?;
        self.entries.get(state * self.alphabet.len() + symbol)
    }

    /// Returns the declared alphabet.
    pub fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    /// Returns the known states in order of first appearance.
    pub fn states(&self) -> &[Symbol] {
        &self.states
    }

    /// Returns the start state: the `state_from` of the first rule.
    pub fn start_state(&self) -> &str {
        &self.states[0]
    }

    /// Returns the default symbol: the first alphabet symbol.
    pub fn default_symbol(&self) -> &str {
        &self.alphabet[0]
    }

    /// Returns the index of `state` in [`TransitionTable::states`].
    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.state_index.get(state).copied()
    }

    /// Returns the index of `symbol` in [`TransitionTable::alphabet`].
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbol_index.get(symbol).copied()
    }

    /// Iterates over every `(state, symbol, transition)` entry in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &Transition)> + '_ {
        self.entries.iter().enumerate().map(move |(i, transition)| {
            let state = &self.states[i / self.alphabet.len()];
            let symbol = &self.alphabet[i % self.alphabet.len()];
            (state.as_str(), symbol.as_str(), transition)
        })
    }

    /// Returns the number of resolved entries (states times symbols).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A built table always has at least one entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps each item to its position.
fn index_of(items: &[Symbol]) -> HashMap<Symbol, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.clone(), i))
        .collect()
}

/// Collects the distinct `state_from` values in order of first appearance.
///
/// States that only ever appear as a `state_to` are not known states.
fn collect_states(rules: &[RawRule]) -> Vec<Symbol> {
    let mut states: Vec<Symbol> = Vec::new();
    for rule in rules {
        if !states.contains(&rule.state_from) {
            states.push(rule.state_from.clone());
        }
    }
    states
}

/// Groups rules by state into explicit entries and a single wildcard.
fn partition_rules<'a>(
    rules: &'a [RawRule],
    symbol_index: &HashMap<Symbol, usize>,
) -> Result<HashMap<&'a str, StateRules<'a>>, MachineError> {
    let mut by_state: HashMap<&str, StateRules> = HashMap::new();

    for rule in rules {
        let entry = by_state.entry(rule.state_from.as_str()).or_default();

        match &rule.input_from {
            InputPattern::Any => {
                if let Some(first) = entry.wildcard {
                    return Err(MachineError::ConflictingWildcard {
                        state: rule.state_from.clone(),
                        first: first.line,
                        second: rule.line,
                    });
                }
                entry.wildcard = Some(rule);
            }
            InputPattern::Symbol(symbol) => {
                if !symbol_index.contains_key(symbol) {
                    return Err(MachineError::UnknownSymbol {
                        symbol: symbol.clone(),
                        line: rule.line,
                    });
                }
                if entry.explicit.insert(symbol.as_str(), rule).is_some() {
                    return Err(MachineError::DuplicateTransition {
                        state: rule.state_from.clone(),
                        symbol: symbol.clone(),
                        line: rule.line,
                    });
                }
            }
        }
    }

    Ok(by_state)
}

/// Checks that every resolved transition targets a known state and writes an alphabet symbol.
fn check_closure(
    entries: &[Transition],
    state_index: &HashMap<Symbol, usize>,
    symbol_index: &HashMap<Symbol, usize>,
) -> Result<(), MachineError> {
    for transition in entries {
        if !state_index.contains_key(&transition.next_state) {
            return Err(MachineError::UnknownState {
                state: transition.next_state.clone(),
                line: transition.line,
            });
        }
        if !symbol_index.contains_key(&transition.write) {
            return Err(MachineError::UnknownSymbol {
                symbol: transition.write.clone(),
                line: transition.line,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_ONES: &str = "zero one
s0 zero s0 zero halt_accept
s0 one s1 one right
s1 zero s2 one right
s1 one s2 one right
s2 * s2 one halt_accept
";

    #[test]
    fn test_build_is_total() {
        let table = TransitionTable::parse(THREE_ONES).unwrap();

        assert_eq!(table.states(), ["s0", "s1", "s2"]);
        assert_eq!(table.start_state(), "s0");
        assert_eq!(table.default_symbol(), "zero");
        assert_eq!(table.len(), 6);

        for state in table.states() {
            for symbol in table.alphabet() {
                assert!(table.get(state, symbol).is_some(), "{state}/{symbol}");
            }
        }
    }

    #[test]
    fn test_explicit_rule_takes_precedence_over_wildcard() {
        let input = "a b c
q a q c left
q * q a right
";
        let table = TransitionTable::parse(input).unwrap();

        let explicit = table.get("q", "a").unwrap();
        assert_eq!(explicit.write, "c");
        assert_eq!(explicit.action, Action::MoveLeft);
        assert_eq!(explicit.origin, Origin::Explicit);

        for symbol in ["b", "c"] {
            let wildcard = table.get("q", symbol).unwrap();
            assert_eq!(wildcard.write, "a");
            assert_eq!(wildcard.action, Action::MoveRight);
            assert_eq!(wildcard.origin, Origin::Wildcard);
            assert_eq!(wildcard.line, 3);
        }
    }

    #[test]
    fn test_entries_follow_table_order() {
        let table = TransitionTable::parse(THREE_ONES).unwrap();
        let keys: Vec<_> = table
            .entries()
            .map(|(state, symbol, _)| format!("{state}/{symbol}"))
            .collect();

        assert_eq!(
            keys,
            ["s0/zero", "s0/one", "s1/zero", "s1/one", "s2/zero", "s2/one"]
        );
        assert_eq!(table.state_index("s2"), Some(2));
        assert_eq!(table.symbol_index("one"), Some(1));
        assert_eq!(table.get("s3", "one"), None);
        assert_eq!(table.get("s0", "two"), None);
    }

    #[test]
    fn test_missing_transition() {
        let input = "zero one
s0 zero s0 zero halt_accept
s0 one s1 one right
s1 zero s1 zero halt_reject
";
        let error = TransitionTable::parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::MissingTransition {
                state: "s1".into(),
                symbol: "one".into()
            }
        );
    }

    #[test]
    fn test_target_only_state_must_have_rules() {
        // `done` is only ever entered, never left.
        let input = "zero one
s0 zero done zero right
s0 one done one right
";
        let error = TransitionTable::parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::UnknownState {
                state: "done".into(),
                line: 2
            }
        );
    }

    #[test]
    fn test_duplicate_transition() {
        let input = "zero one
s0 zero s0 zero halt_accept
s0 one s0 one right
s0 zero s0 one left
";
        let error = TransitionTable::parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::DuplicateTransition {
                state: "s0".into(),
                symbol: "zero".into(),
                line: 4
            }
        );
    }

    #[test]
    fn test_conflicting_wildcards() {
        let input = "zero one
s0 * s0 zero halt_accept
s0 * s0 one halt_reject
";
        let error = TransitionTable::parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::ConflictingWildcard {
                state: "s0".into(),
                first: 2,
                second: 3
            }
        );
    }

    #[test]
    fn test_unknown_read_symbol() {
        let input = "zero one
s0 zero s0 zero halt_accept
s0 two s0 one right
s0 one s0 one right
";
        let error = TransitionTable::parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::UnknownSymbol {
                symbol: "two".into(),
                line: 3
            }
        );
    }

    #[test]
    fn test_unknown_written_symbol() {
        let input = "zero one
s0 zero s0 two halt_accept
s0 one s0 one right
";
        let error = TransitionTable::parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::UnknownSymbol {
                symbol: "two".into(),
                line: 2
            }
        );
    }

    #[test]
    fn test_build_rejects_empty_spec() {
        let spec = MachineSpec {
            alphabet: Vec::new(),
            rules: Vec::new(),
        };
        assert!(matches!(
            TransitionTable::build(&spec),
            Err(MachineError::MalformedSpec(_))
        ));

        let spec = MachineSpec {
            alphabet: vec!["zero".into()],
            rules: Vec::new(),
        };
        assert!(matches!(
            TransitionTable::build(&spec),
            Err(MachineError::MalformedSpec(_))
        ));
    }
}
