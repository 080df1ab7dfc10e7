//! This module encodes a transition table as a stream of two symbols, reusing the first two
//! alphabet symbols as the bit literals `0` and `1`, and decodes such streams back.
//!
//! Layout, in order:
//! - word size `w`: one pair per bit, most significant first (`00` = 0, `01` = 1), closed by `11`
//! - number of states as a `w`-bit big-endian word (all zeros means `2^w`)
//! - one record per table entry in table order: `state_from`, `input_from`, `state_to` and
//!   `input_to` indices as `w`-bit words, then a 3-bit action code

use crate::table::TransitionTable;
use crate::types::{Action, MachineError, Symbol};
use serde::{Deserialize, Serialize};

const ACTION_BITS: usize = 3;

/// One table entry as indices into the state list and the alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRule {
    pub state_from: usize,
    pub input_from: usize,
    pub state_to: usize,
    pub input_to: usize,
    pub action: Action,
}

/// The structured content of an encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedMachine {
    pub word_size: usize,
    pub state_count: usize,
    pub records: Vec<EncodedRule>,
}

/// Returns the number of bits needed to index every state and every symbol, at least 1.
pub fn word_size(states: usize, symbols: usize) -> usize {
    let count = states.max(symbols);
    let mut size = 1;
    while (1usize << size) < count {
        size += 1;
    }
    size
}

/// Encodes `table` as a stream of its first two alphabet symbols.
///
/// # Returns
///
/// * `Ok(Vec<Symbol>)` with every element equal to `alphabet[0]` or `alphabet[1]`.
/// * `Err(MachineError::AlphabetTooSmall)` if the alphabet has fewer than two symbols.
pub fn encode(table: &TransitionTable) -> Result<Vec<Symbol>, MachineError> {
    let machine = encode_machine(table)?;
    let alphabet = table.alphabet();
    Ok(machine.to_symbols(&alphabet[0], &alphabet[1]))
}

/// Converts `table` into index records in table order.
pub fn encode_machine(table: &TransitionTable) -> Result<EncodedMachine, MachineError> {
    let alphabet = table.alphabet();
    if alphabet.len() < 2 {
        return Err(MachineError::AlphabetTooSmall(alphabet.len()));
    }

    let state_index = |state: &str| {
        table.state_index(state).ok_or_else(|| {
            MachineError::InvariantViolation(format!("state '{state}' is not in the table"))
        })
    };
    let symbol_index = |symbol: &str| {
        table.symbol_index(symbol).ok_or_else(|| {
            MachineError::InvariantViolation(format!("symbol '{symbol}' is not in the alphabet"))
        })
    };

    let records = table
        .entries()
        .map(|(state, symbol, transition)| {
            Ok(EncodedRule {
                state_from: state_index(state)?,
                input_from: symbol_index(symbol)?,
                state_to: state_index(&transition.next_state)?,
                input_to: symbol_index(&transition.write)?,
                action: transition.action,
            })
        })
        .collect::<Result<Vec<_>, MachineError>>()?;

    let machine = EncodedMachine {
        word_size: word_size(table.states().len(), alphabet.len()),
        state_count: table.states().len(),
        records,
    };

    log::debug!(
        "encoding {} records with word size {}",
        machine.records.len(),
        machine.word_size
    );

    Ok(machine)
}

impl EncodedMachine {
    /// Returns the encoding as bits.
    pub fn to_bits(&self) -> Vec<bool> {
        let mut bits = Vec::new();

        let size_bits = usize::BITS - self.word_size.leading_zeros();
        for i in (0..size_bits).rev() {
            bits.push(false);
            bits.push((self.word_size >> i) & 1 == 1);
        }
        bits.extend([true, true]);

        push_word(&mut bits, self.state_count, self.word_size);
        for record in &self.records {
            push_word(&mut bits, record.state_from, self.word_size);
            push_word(&mut bits, record.input_from, self.word_size);
            push_word(&mut bits, record.state_to, self.word_size);
            push_word(&mut bits, record.input_to, self.word_size);
            push_word(&mut bits, record.action.code() as usize, ACTION_BITS);
        }

        bits
    }

    /// Returns the encoding spelled with `zero` and `one` as the bit literals.
    pub fn to_symbols(&self, zero: &str, one: &str) -> Vec<Symbol> {
        self.to_bits()
            .into_iter()
            .map(|bit| (if bit { one } else { zero }).to_string())
            .collect()
    }
}

/// Appends the low `width` bits of `value`, most significant first.
fn push_word(bits: &mut Vec<bool>, value: usize, width: usize) {
    for i in (0..width).rev() {
        bits.push(i < usize::BITS as usize && (value >> i) & 1 == 1);
    }
}

/// Decodes a stream produced by [`encode`], given the two bit-literal symbols.
///
/// # Returns
///
/// * `Ok(EncodedMachine)` if the stream follows the layout.
/// * `Err(MachineError::DecodeError)` for foreign symbols, a malformed header or a truncated
///   or unknown record.
pub fn decode(symbols: &[Symbol], zero: &str, one: &str) -> Result<EncodedMachine, MachineError> {
    let bits = symbols
        .iter()
        .enumerate()
        .map(|(position, symbol)| match symbol.as_str() {
            s if s == zero => Ok(false),
            s if s == one => Ok(true),
            s => Err(MachineError::DecodeError(format!(
                "symbol '{s}' at position {position} is not a bit literal"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    decode_bits(&bits)
}

/// Decodes a bit stream produced by [`EncodedMachine::to_bits`].
pub fn decode_bits(bits: &[bool]) -> Result<EncodedMachine, MachineError> {
    let mut reader = BitReader { bits, position: 0 };

    let mut word_size = 0usize;
    loop {
        match (reader.bit(), reader.bit()) {
            (Some(true), Some(true)) => break,
            (Some(false), Some(bit)) => {
                if word_size >= usize::BITS as usize {
                    return Err(MachineError::DecodeError(
                        "word size header is too long".to_string(),
                    ));
                }
                word_size = (word_size << 1) | bit as usize;
            }
            (Some(true), Some(false)) => {
                return Err(MachineError::DecodeError(
                    "unexpected pair '10' in word size header".to_string(),
                ))
            }
            _ => {
                return Err(MachineError::DecodeError(
                    "word size header is not terminated".to_string(),
                ))
            }
        }
    }
    if word_size == 0 || word_size >= usize::BITS as usize {
        return Err(MachineError::DecodeError(format!(
            "unsupported word size {word_size}"
        )));
    }

    let state_count = match reader.word(word_size) {
        Some(0) => 1usize << word_size,
        Some(count) => count,
        None => {
            return Err(MachineError::DecodeError(
                "stream ends before the state count".to_string(),
            ))
        }
    };

    let record_bits = 4 * word_size + ACTION_BITS;
    if reader.remaining() % record_bits != 0 {
        return Err(MachineError::DecodeError(format!(
            "{} trailing bits do not form whole {}-bit records",
            reader.remaining(),
            record_bits
        )));
    }

    let mut records = Vec::with_capacity(reader.remaining() / record_bits);
    while reader.remaining() > 0 {
        let mut words = [0usize; 4];
        for word in &mut words {
            *word = reader.word(word_size).unwrap_or_default();
        }
        let code = reader.word(ACTION_BITS).unwrap_or_default();
        let action = Action::from_code(code as u8).ok_or_else(|| {
            MachineError::DecodeError(format!(
                "unknown action code {code:03b} in record {}",
                records.len()
            ))
        })?;

        let [state_from, input_from, state_to, input_to] = words;
        records.push(EncodedRule {
            state_from,
            input_from,
            state_to,
            input_to,
            action,
        });
    }

    Ok(EncodedMachine {
        word_size,
        state_count,
        records,
    })
}

/// Sequential reader over a bit slice.
struct BitReader<'a> {
    bits: &'a [bool],
    position: usize,
}

impl BitReader<'_> {
    fn bit(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.position).copied()?;
        self.position += 1;
        Some(bit)
    }

    fn word(&mut self, width: usize) -> Option<usize> {
        if self.remaining() < width {
            return None;
        }
        (0..width).try_fold(0usize, |word, _| Some((word << 1) | self.bit()? as usize))
    }

    fn remaining(&self) -> usize {
        self.bits.len() - self.position
    }
}
