//! This module defines the core data structures shared by the parser, the rule table builder,
//! the execution engine and the encoder: symbols, actions, raw rules, verdicts and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Rule;

/// A tape symbol or state name. Both share the `[A-Za-z0-9_]+` token grammar.
pub type Symbol = String;

/// The literal accepted in a rule's input field to match any otherwise uncovered symbol.
pub const WILDCARD: &str = "*";
/// The maximum allowed size for a machine specification in bytes.
pub const MAX_SPEC_SIZE: usize = 65536; // 64KB
/// The default number of steps executed before a run is reported as undetermined.
pub const DEFAULT_MAX_STEPS: u64 = 500;

/// What the machine does after writing a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move the head one cell to the left.
    #[serde(rename = "left")]
    MoveLeft,
    /// Move the head one cell to the right.
    #[serde(rename = "right")]
    MoveRight,
    /// Stop and accept the input.
    #[serde(rename = "halt_accept")]
    HaltAccept,
    /// Stop and reject the input.
    #[serde(rename = "halt_reject")]
    HaltReject,
    /// Count the step but leave the head where it is.
    #[serde(rename = "noop")]
    NoOp,
}

impl Action {
    /// All actions in encoding order.
    pub const ALL: [Action; 5] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::HaltAccept,
        Action::HaltReject,
        Action::NoOp,
    ];

    /// Returns the literal used for this action in specification files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::MoveLeft => "left",
            Action::MoveRight => "right",
            Action::HaltAccept => "halt_accept",
            Action::HaltReject => "halt_reject",
            Action::NoOp => "noop",
        }
    }

    /// Returns `true` for the two terminal actions.
    pub fn is_halting(&self) -> bool {
        matches!(self, Action::HaltAccept | Action::HaltReject)
    }

    /// The 3-bit code used by the binary encoding.
    pub fn code(&self) -> u8 {
        match self {
            Action::MoveLeft => 0b000,
            Action::MoveRight => 0b001,
            Action::HaltAccept => 0b010,
            Action::HaltReject => 0b011,
            Action::NoOp => 0b100,
        }
    }

    /// Inverse of [`Action::code`].
    pub fn from_code(code: u8) -> Option<Action> {
        Action::ALL.into_iter().find(|action| action.code() == code)
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The input field of a rule: a concrete symbol or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputPattern {
    /// Matches exactly this symbol.
    Symbol(Symbol),
    /// Matches every alphabet symbol without an explicit rule for the same state.
    Any,
}

impl fmt::Display for InputPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputPattern::Symbol(symbol) => f.write_str(symbol),
            InputPattern::Any => f.write_str(WILDCARD),
        }
    }
}

/// A rule line as written in the specification, before wildcard expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRule {
    /// The state this rule applies to.
    pub state_from: Symbol,
    /// The symbol (or wildcard) under the head this rule applies to.
    pub input_from: InputPattern,
    /// The state entered after the step.
    pub state_to: Symbol,
    /// The symbol written under the head.
    pub input_to: Symbol,
    /// What happens after writing.
    pub action: Action,
    /// The 1-based line of the specification this rule was read from.
    pub line: usize,
}

/// The parsed, not yet validated contents of a specification file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Declared alphabet; the first symbol is the default (blank) symbol.
    pub alphabet: Vec<Symbol>,
    /// Rules in file order. The first rule's `state_from` is the start state.
    pub rules: Vec<RawRule>,
}

impl MachineSpec {
    /// Returns the default symbol used to fill unwritten tape cells.
    pub fn default_symbol(&self) -> Option<&str> {
        self.alphabet.first().map(String::as_str)
    }

    /// Returns the start state, by convention the `state_from` of the first rule.
    pub fn start_state(&self) -> Option<&str> {
        self.rules.first().map(|rule| rule.state_from.as_str())
    }
}

/// The outcome of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// A `halt_accept` action was taken.
    Accepted,
    /// A `halt_reject` action was taken.
    Rejected,
    /// The step budget ran out before any halting action.
    Undetermined,
}

impl Verdict {
    /// Collapses the verdict to the accepted flag, with `None` for undetermined runs.
    pub fn accepted(&self) -> Option<bool> {
        match self {
            Verdict::Accepted => Some(true),
            Verdict::Rejected => Some(false),
            Verdict::Undetermined => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Accepted => "accepted",
            Verdict::Rejected => "rejected",
            Verdict::Undetermined => "undetermined",
        })
    }
}

/// Represents the errors that can occur while parsing, validating, running or encoding a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// The specification as a whole does not have the required shape.
    #[error("Malformed specification: {0}")]
    MalformedSpec(String),
    /// A token does not match `[A-Za-z0-9_]+`.
    #[error("Invalid token '{token}' on line {line}")]
    InvalidToken { line: usize, token: String },
    /// The alphabet declares the same symbol twice.
    #[error("Duplicate symbol '{symbol}' in alphabet on line {line}")]
    DuplicateSymbol { line: usize, symbol: Symbol },
    /// A rule line does not have exactly five fields.
    #[error("Malformed rule on line {line}: expected 5 fields, found {found}")]
    MalformedRule { line: usize, found: usize },
    /// The action field is not one of the five action literals.
    #[error("Unknown action '{action}' on line {line}")]
    UnknownAction { line: usize, action: String },
    /// A state declares more than one wildcard rule.
    #[error("State '{state}' has more than one wildcard rule (lines {first} and {second})")]
    ConflictingWildcard {
        state: Symbol,
        first: usize,
        second: usize,
    },
    /// Two explicit rules cover the same state and symbol.
    #[error("Duplicate transition for state '{state}' and symbol '{symbol}' on line {line}")]
    DuplicateTransition {
        state: Symbol,
        symbol: Symbol,
        line: usize,
    },
    /// A known state has no rule for an alphabet symbol.
    #[error("No transition for state '{state}' and symbol '{symbol}'")]
    MissingTransition { state: Symbol, symbol: Symbol },
    /// A rule moves to a state that has no rules of its own.
    #[error("Unknown state '{state}' referenced on line {line}")]
    UnknownState { state: Symbol, line: usize },
    /// A rule reads or writes a symbol outside the alphabet.
    #[error("Unknown symbol '{symbol}' referenced on line {line}")]
    UnknownSymbol { symbol: Symbol, line: usize },
    /// The input string contains a symbol outside the alphabet.
    #[error("Input symbol '{symbol}' at position {position} is not in the alphabet")]
    UnknownInputSymbol { symbol: String, position: usize },
    /// The input text is not a single line of symbols.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// Binary encoding needs two symbols to act as bit literals.
    #[error("Binary encoding needs at least 2 alphabet symbols, found {0}")]
    AlphabetTooSmall(usize),
    /// The engine found a gap a validated table cannot have.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    /// A bit-literal stream does not follow the encoding layout.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// Indicates an error during the parsing of the specification text.
    ///
    /// The line grammar accepts any text, so specification and input parsing never return
    /// this today; structural problems are reported by the variants above.
    #[error("Specification parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to reading specification or input files.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_literals() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert!("halt".parse::<Action>().is_err());
        assert!("LEFT".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::MoveLeft.code(), 0b000);
        assert_eq!(Action::MoveRight.code(), 0b001);
        assert_eq!(Action::HaltAccept.code(), 0b010);
        assert_eq!(Action::HaltReject.code(), 0b011);
        assert_eq!(Action::NoOp.code(), 0b100);
        assert_eq!(Action::from_code(0b011), Some(Action::HaltReject));
        assert_eq!(Action::from_code(0b101), None);
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&Action::HaltAccept).unwrap();
        assert_eq!(json, "\"halt_accept\"");

        let action: Action = serde_json::from_str("\"noop\"").unwrap();
        assert_eq!(action, Action::NoOp);
    }

    #[test]
    fn test_verdict_accepted_flag() {
        assert_eq!(Verdict::Accepted.accepted(), Some(true));
        assert_eq!(Verdict::Rejected.accepted(), Some(false));
        assert_eq!(Verdict::Undetermined.accepted(), None);
        assert_eq!(
            serde_json::to_string(&Verdict::Undetermined).unwrap(),
            "\"undetermined\""
        );
    }

    #[test]
    fn test_error_display() {
        let error = MachineError::MissingTransition {
            state: "s1".to_string(),
            symbol: "one".to_string(),
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("No transition"));
        assert!(error_msg.contains("s1"));
        assert!(error_msg.contains("one"));
    }
}
