//! This module defines the `TuringMachine` struct, which executes a validated transition table
//! against an input. It owns the tape for the duration of a run, applies one transition per step
//! and reports the verdict, the step count and the final tape.

use crate::config::SimulationConfig;
use crate::table::TransitionTable;
use crate::tape::{Rendering, Tape};
use crate::types::{Action, MachineError, Symbol, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a step and can continue.
    Continue,
    /// The machine took a halting action.
    Halt(Halt),
}

/// How a machine halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    Accept,
    Reject,
}

/// A snapshot of the machine taken before a step (and once after the run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Number of steps executed before this frame was taken.
    pub step: u64,
    /// Current state.
    pub state: Symbol,
    /// Absolute head position.
    pub head: i64,
    /// Two-line picture of the tape.
    pub rendering: Rendering,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rendering)
    }
}

/// The final report of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Accepted, rejected, or undetermined when the budget ran out.
    pub verdict: Verdict,
    /// Steps executed, including the halting step.
    pub step_count: u64,
    /// The state the machine ended in.
    pub state: Symbol,
    /// The tape at the end of the run.
    pub tape: Tape,
}

impl RunResult {
    /// Returns `Some(true)` / `Some(false)` for accept / reject and `None` when undetermined.
    pub fn accepted(&self) -> Option<bool> {
        self.verdict.accepted()
    }
}

/// A finished run together with the frames collected along the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub result: RunResult,
    /// Empty when tracing is disabled.
    pub frames: Vec<Frame>,
}

/// A single-tape deterministic Turing machine running a [`TransitionTable`].
pub struct TuringMachine<'a> {
    table: &'a TransitionTable,
    input: Vec<Symbol>,
    state: Symbol,
    tape: Tape,
    step_count: u64,
    halt: Option<Halt>,
}

impl<'a> TuringMachine<'a> {
    /// Creates a machine in the table's start state with `input` on the tape and the head on
    /// the first input cell.
    ///
    /// # Arguments
    ///
    /// * `table` - The validated transition table to run.
    /// * `input` - The initial tape contents, starting at position 0.
    pub fn new(table: &'a TransitionTable, input: Vec<Symbol>) -> Self {
        Self {
            table,
            state: table.start_state().to_string(),
            tape: Tape::new(input.clone(), table.default_symbol().to_string()),
            input,
            step_count: 0,
            halt: None,
        }
    }

    /// Executes a single step: read, look up, write, then move or halt.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if the machine moved (or stayed put) and can continue.
    /// * `Ok(Step::Halt(_))` if the machine took a halting action, now or earlier.
    /// * `Err(MachineError::InvariantViolation)` if the table has no entry for the current
    ///   configuration, which a table built by [`TransitionTable::build`] rules out.
    pub fn step(&mut self) -> Result<Step, MachineError> {
        if let Some(halt) = self.halt {
            return Ok(Step::Halt(halt));
        }

        let table = self.table;
        let symbol = self.tape.read().ok_or_else(|| {
            MachineError::InvariantViolation(format!(
                "head at {} is outside the tape window [{}, {})",
                self.tape.head(),
                self.tape.lo(),
                self.tape.hi()
            ))
        })?;
        let transition = table.get(&self.state, symbol).ok_or_else(|| {
            MachineError::InvariantViolation(format!(
                "no transition for state '{}' and symbol '{}'",
                self.state, symbol
            ))
        })?;

        log::trace!(
            "step {}: ({}, {}) -> ({}, {}, {})",
            self.step_count + 1,
            self.state,
            symbol,
            transition.next_state,
            transition.write,
            transition.action
        );

        self.state.clone_from(&transition.next_state);
        self.tape.write(transition.write.clone());

        match transition.action {
            Action::MoveLeft => self.tape.move_left(),
            Action::MoveRight => self.tape.move_right(),
            Action::NoOp => {}
            Action::HaltAccept => self.halt = Some(Halt::Accept),
            Action::HaltReject => self.halt = Some(Halt::Reject),
        }

        self.step_count += 1;

        Ok(match self.halt {
            Some(halt) => Step::Halt(halt),
            None => Step::Continue,
        })
    }

    /// Runs until the machine halts or `config.max_steps` steps have been executed.
    ///
    /// When tracing is enabled, `observer` receives a frame before every step and one final
    /// frame after the loop ends, however it ended.
    pub fn run<F>(
        &mut self,
        config: &SimulationConfig,
        mut observer: F,
    ) -> Result<RunResult, MachineError>
    where
        F: FnMut(&Frame),
    {
        while self.halt.is_none() && self.step_count < config.max_steps {
            if config.trace {
                observer(&self.frame());
            }
            self.step()?;
        }

        if config.trace {
            observer(&self.frame());
        }

        let result = self.result();
        log::debug!(
            "run finished: {} after {} steps in state '{}'",
            result.verdict,
            result.step_count,
            result.state
        );

        Ok(result)
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the tape.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the total number of steps executed.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Returns `true` once a halting action has been taken.
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Returns the verdict so far: undetermined until a halting action is taken.
    pub fn verdict(&self) -> Verdict {
        match self.halt {
            Some(Halt::Accept) => Verdict::Accepted,
            Some(Halt::Reject) => Verdict::Rejected,
            None => Verdict::Undetermined,
        }
    }

    /// Takes a snapshot of the current configuration.
    pub fn frame(&self) -> Frame {
        Frame {
            step: self.step_count,
            state: self.state.clone(),
            head: self.tape.head(),
            rendering: self.tape.render(&self.state),
        }
    }

    /// Builds the report for the current configuration.
    pub fn result(&self) -> RunResult {
        RunResult {
            verdict: self.verdict(),
            step_count: self.step_count,
            state: self.state.clone(),
            tape: self.tape.clone(),
        }
    }

    /// Resets the machine to its start state, initial tape and a zero step count.
    pub fn reset(&mut self) {
        self.state = self.table.start_state().to_string();
        self.tape = Tape::new(self.input.clone(), self.table.default_symbol().to_string());
        self.step_count = 0;
        self.halt = None;
    }
}

/// Runs `table` on `input` and collects the trace frames.
pub fn simulate(
    table: &TransitionTable,
    input: &[Symbol],
    config: &SimulationConfig,
) -> Result<Simulation, MachineError> {
    let mut frames = Vec::new();
    let mut machine = TuringMachine::new(table, input.to_vec());
    let result = machine.run(config, |frame| frames.push(frame.clone()))?;

    Ok(Simulation { result, frames })
}
