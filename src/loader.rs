//! This module provides the `MachineLoader` struct, responsible for reading machine
//! specifications and input strings from files and strings.

use crate::parser::{parse, parse_input};
use crate::table::TransitionTable;
use crate::types::{MachineError, MachineSpec, Symbol};
use std::fs;
use std::path::Path;

/// `MachineLoader` is a utility struct for loading machine specifications and their inputs.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads and parses a specification file without building its table.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineSpec)` if the file is read and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read.
    /// * Any parser error if the content is not a valid specification.
    pub fn load_spec(path: &Path) -> Result<MachineSpec, MachineError> {
        parse(&read(path)?)
    }

    /// Loads a specification file and builds its transition table.
    pub fn load_table(path: &Path) -> Result<TransitionTable, MachineError> {
        let table = TransitionTable::build(&Self::load_spec(path)?)?;
        log::debug!("loaded machine from {}", path.display());
        Ok(table)
    }

    /// Builds a transition table from specification text, e.g. from user input.
    pub fn load_table_from_string(content: &str) -> Result<TransitionTable, MachineError> {
        TransitionTable::parse(content)
    }

    /// Loads an input file: a single line of symbols from `alphabet`.
    pub fn load_input(path: &Path, alphabet: &[Symbol]) -> Result<Vec<Symbol>, MachineError> {
        parse_input(&read(path)?, alphabet)
    }
}

/// Reads a whole file, naming the path in the error.
fn read(path: &Path) -> Result<String, MachineError> {
    fs::read_to_string(path).map_err(|e| {
        MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}
