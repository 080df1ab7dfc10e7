//! This crate provides the core logic for a single-tape deterministic Turing machine.
//! It includes modules for parsing machine specifications, building validated transition tables,
//! simulating execution on an unbounded tape, encoding machines as bit strings, analyzing tables
//! for suspicious structure, and a small set of built-in machines.

pub mod analyzer;
pub mod config;
pub mod encoder;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod table;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `Diagnostic` enum from the analyzer module.
pub use analyzer::{analyze, Diagnostic};
/// Re-exports the simulation settings.
pub use config::SimulationConfig;
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{decode, encode, encode_machine, EncodedMachine};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the execution engine.
pub use machine::{simulate, Frame, Halt, RunResult, Simulation, Step, TuringMachine};
/// Re-exports the parsing functions from the parser module.
pub use parser::{is_valid_token, parse, parse_input};
/// Re-exports `Program`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{Program, ProgramManager, PROGRAMS};
/// Re-exports the validated transition table.
pub use table::{Transition, TransitionTable};
/// Re-exports the tape and its rendering.
pub use tape::{Rendering, Tape};
/// Re-exports the types shared by every stage.
pub use types::{
    Action, InputPattern, MachineError, MachineSpec, RawRule, Symbol, Verdict,
    DEFAULT_MAX_STEPS, MAX_SPEC_SIZE, WILDCARD,
};
