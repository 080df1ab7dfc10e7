use crate::table::TransitionTable;
use crate::types::MachineError;

// Embedded machines: (name, description, source)
const PROGRAM_TEXTS: [(&str, &str, &str); 5] = [
    (
        "three_ones",
        "Rewrites the input so that it starts with three ones",
        include_str!("../machines/three_ones.tm"),
    ),
    (
        "parity",
        "Accepts inputs with an even number of ones",
        include_str!("../machines/parity.tm"),
    ),
    (
        "binary_increment",
        "Adds one to a binary number written most significant bit first",
        include_str!("../machines/binary_increment.tm"),
    ),
    (
        "busy_beaver_2",
        "The two-state busy beaver: writes four ones in six steps",
        include_str!("../machines/busy_beaver_2.tm"),
    ),
    (
        "walker",
        "Walks right forever; every run exhausts its step budget",
        include_str!("../machines/walker.tm"),
    ),
];

/// A built-in machine together with its validated table.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    pub table: TransitionTable,
}

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<Program> = PROGRAM_TEXTS
        .iter()
        .filter_map(|&(name, description, source)| match TransitionTable::parse(source) {
            Ok(table) => Some(Program { name, description, source, table }),
            Err(e) => {
                log::error!("Failed to build built-in program '{}': {}", name, e);
                None
            }
        })
        .collect();
}

pub struct ProgramManager;

impl ProgramManager {
    /// List all program names, in registry order
    pub fn names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|program| program.name).collect()
    }

    /// Get a program by its name
    pub fn program(name: &str) -> Result<&'static Program, MachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name == name)
            .ok_or_else(|| {
                MachineError::FileError(format!(
                    "Program '{}' not found (available: {})",
                    name,
                    Self::names().join(", ")
                ))
            })
    }

    /// Get the transition table of a program by its name
    pub fn get(name: &str) -> Result<TransitionTable, MachineError> {
        Self::program(name).map(|program| program.table.clone())
    }
}
