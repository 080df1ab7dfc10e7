//! This module provides the parser for machine specifications and input strings, utilizing the
//! `pest` crate. The grammar in `grammar.pest` splits text into lines of blank-separated tokens;
//! the functions here check the alphabet and rule structure on top of that.

use crate::types::{
    Action, InputPattern, MachineError, MachineSpec, RawRule, Symbol, MAX_SPEC_SIZE, WILDCARD,
};
use lazy_static::lazy_static;
use pest::Parser as PestParser;
use pest_derive::Parser as PestParser;
use regex::Regex;
use std::collections::HashSet;

/// Derives a `PestParser` for the line/token grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct SpecParser;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"^[A-Za-z0-9_]+$").expect("token pattern is valid");
}

/// A non-empty source line and its tokens.
struct Line<'i> {
    number: usize,
    tokens: Vec<&'i str>,
}

/// Returns `true` if `token` is a valid symbol or state name: non-empty and made only of
/// ASCII letters, digits and underscores.
pub fn is_valid_token(token: &str) -> bool {
    TOKEN.is_match(token)
}

/// Parses specification text into its alphabet and raw rules.
///
/// The first non-empty line declares the alphabet; every following non-empty line is a rule
/// of the form `state_from input_from state_to input_to action`. Blank lines are ignored.
/// Rules are returned in file order, which determines the start state.
///
/// # Arguments
///
/// * `input` - The full specification text.
///
/// # Returns
///
/// * `Ok(MachineSpec)` if the text is structurally valid.
/// * `Err(MachineError)` describing the first offending line otherwise.
pub fn parse(input: &str) -> Result<MachineSpec, MachineError> {
    if input.len() > MAX_SPEC_SIZE {
        return Err(MachineError::MalformedSpec(format!(
            "specification is {} bytes, the limit is {} bytes",
            input.len(),
            MAX_SPEC_SIZE
        )));
    }

    let lines = parse_lines(input)?;
    if lines.len() < 3 {
        return Err(MachineError::MalformedSpec(format!(
            "expected an alphabet line and at least 2 rule lines, found {} non-empty line(s)",
            lines.len()
        )));
    }

    let alphabet = parse_alphabet(&lines[0])?;
    let rules = lines[1..]
        .iter()
        .map(parse_rule)
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "parsed specification with {} symbols and {} rules",
        alphabet.len(),
        rules.len()
    );

    Ok(MachineSpec { alphabet, rules })
}

/// Parses an input string: a single line of blank-separated alphabet symbols.
///
/// Empty text yields an empty input. More than one non-empty line is rejected.
pub fn parse_input(input: &str, alphabet: &[Symbol]) -> Result<Vec<Symbol>, MachineError> {
    let lines = parse_lines(input)?;

    let line = match lines.as_slice() {
        [] => return Ok(Vec::new()),
        [line] => line,
        _ => {
            return Err(MachineError::MalformedInput(format!(
                "expected a single line of symbols, found {} lines",
                lines.len()
            )))
        }
    };

    line.tokens
        .iter()
        .enumerate()
        .map(|(position, token)| {
            if alphabet.iter().any(|symbol| symbol.as_str() == *token) {
                Ok(token.to_string())
            } else {
                Err(MachineError::UnknownInputSymbol {
                    symbol: token.to_string(),
                    position,
                })
            }
        })
        .collect()
}

/// Runs the grammar over `input` and keeps the lines that contain at least one token.
///
/// The grammar yields one `line` pair per source line, blank or not, so line numbers are
/// counted while iterating.
fn parse_lines(input: &str) -> Result<Vec<Line<'_>>, MachineError> {
    let document = SpecParser::parse(Rule::document, input)
        .map_err(|e| MachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| MachineError::MalformedSpec("empty document".to_string()))?;

    let lines = document
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::line)
        .enumerate()
        .map(|(index, pair)| {
            let number = index + 1;
            let tokens = pair
                .into_inner()
                .filter(|token| token.as_rule() == Rule::token)
                .map(|token| token.as_str())
                .collect();

            Line { number, tokens }
        })
        .filter(|line| !line.tokens.is_empty())
        .collect();

    Ok(lines)
}

/// Parses the alphabet line, rejecting invalid and duplicated symbols.
fn parse_alphabet(line: &Line) -> Result<Vec<Symbol>, MachineError> {
    let mut seen = HashSet::new();
    let mut alphabet = Vec::with_capacity(line.tokens.len());

    for &token in &line.tokens {
        let symbol = check_token(token, line.number)?;
        if !seen.insert(token) {
            return Err(MachineError::DuplicateSymbol {
                line: line.number,
                symbol,
            });
        }
        alphabet.push(symbol);
    }

    Ok(alphabet)
}

/// Parses a single five-field rule line.
fn parse_rule(line: &Line) -> Result<RawRule, MachineError> {
    let &[state_from, input_from, state_to, input_to, action] = line.tokens.as_slice() else {
        return Err(MachineError::MalformedRule {
            line: line.number,
            found: line.tokens.len(),
        });
    };

    let state_from = check_token(state_from, line.number)?;
    let input_from = match input_from {
        WILDCARD => InputPattern::Any,
        symbol => InputPattern::Symbol(check_token(symbol, line.number)?),
    };
    let state_to = check_token(state_to, line.number)?;
    let input_to = check_token(input_to, line.number)?;
    let action = action
        .parse::<Action>()
        .map_err(|_| MachineError::UnknownAction {
            line: line.number,
            action: action.to_string(),
        })?;

    Ok(RawRule {
        state_from,
        input_from,
        state_to,
        input_to,
        action,
        line: line.number,
    })
}

/// Checks a token against the symbol grammar and returns it as an owned `Symbol`.
fn check_token(token: &str, line: usize) -> Result<Symbol, MachineError> {
    if is_valid_token(token) {
        Ok(token.to_string())
    } else {
        Err(MachineError::InvalidToken {
            line,
            token: token.to_string(),
        })
    }
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

    fn alphabet(symbols: &[&str]) -> Vec<Symbol> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_token_grammar() {
        assert!(is_valid_token("zero"));
        assert!(is_valid_token("s_0"));
        assert!(is_valid_token("_"));
        assert!(is_valid_token("42"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("*"));
        assert!(!is_valid_token("a-b"));
        assert!(!is_valid_token("caf\u{e9}"));
    }

    #[test]
    fn test_parse_simple_spec() {
        let spec = parse(THREE_ONES).unwrap();

        assert_eq!(spec.alphabet, alphabet(&["zero", "one"]));
        assert_eq!(spec.rules.len(), 5);
        assert_eq!(spec.start_state(), Some("s0"));
        assert_eq!(spec.default_symbol(), Some("zero"));
        assert_eq!(
            spec.rules[0],
            RawRule {
                state_from: "s0".into(),
                input_from: InputPattern::Symbol("zero".into()),
                state_to: "s0".into(),
                input_to: "zero".into(),
                action: Action::HaltAccept,
                line: 2,
            }
        );
        assert_eq!(spec.rules[4].input_from, InputPattern::Any);
        assert_eq!(spec.rules[4].line, 6);
    }

    #[test]
    fn test_parse_ignores_blank_lines_and_extra_blanks() {
        let input = "\n  zero\tone  \n\ns0 zero s0 zero halt_accept\n\n\n s0   one s0 one    noop\n";
        let spec = parse(input).unwrap();

        assert_eq!(spec.alphabet, alphabet(&["zero", "one"]));
        assert_eq!(spec.rules.len(), 2);
        assert_eq!(spec.rules[0].line, 4);
        assert_eq!(spec.rules[1].line, 7);
        assert_eq!(spec.rules[1].action, Action::NoOp);
    }

    #[test]
    fn test_parse_windows_line_endings() {
        let input = THREE_ONES.replace('\n', "\r\n");
        let spec = parse(&input).unwrap();

        assert_eq!(spec.rules.len(), 5);
        assert_eq!(spec.rules[1].line, 3);
    }

    #[test]
    fn test_parse_counts_lines_across_many_blank_lines() {
        let blanks = MAX_SPEC_SIZE - 100;
        let input = format!(
            "zero one\n{}s0 zero s0 zero halt_accept\ns0 one s0 one right\n",
            "\n".repeat(blanks)
        );
        let spec = parse(&input).unwrap();

        assert_eq!(spec.rules[0].line, blanks + 2);
        assert_eq!(spec.rules[1].line, blanks + 3);
    }

    #[test]
    fn test_parse_old_mac_line_endings() {
        let input = THREE_ONES.replace('\n', "\r");
        let spec = parse(&input).unwrap();

        assert_eq!(spec.rules.len(), 5);
        assert_eq!(spec.rules[4].line, 6);
    }

    #[test]
    fn test_any_text_tokenizes() {
        // Every character sequence splits into lines and tokens; rejection happens afterwards.
        let symbols = alphabet(&["zero", "one"]);
        let error = parse_input("\u{0}\u{e9} \t\r\n", &symbols).unwrap_err();

        assert_eq!(
            error,
            MachineError::UnknownInputSymbol {
                symbol: "\u{0}\u{e9}".to_string(),
                position: 0
            }
        );
    }

    #[test]
    fn test_parse_too_few_lines() {
        let error = parse("zero one\ns0 * s0 zero halt_accept\n\n").unwrap_err();
        assert!(matches!(error, MachineError::MalformedSpec(_)));

        let error = parse("").unwrap_err();
        assert!(matches!(error, MachineError::MalformedSpec(_)));
    }

    #[test]
    fn test_parse_oversized_spec() {
        let input = "a ".repeat(MAX_SPEC_SIZE);
        let error = parse(&input).unwrap_err();
        assert!(matches!(error, MachineError::MalformedSpec(_)));
    }

    #[test]
    fn test_parse_duplicate_symbol() {
        let input = "zero one zero\ns0 zero s0 zero halt_accept\ns0 one s0 one halt_accept\n";
        let error = parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::DuplicateSymbol {
                line: 1,
                symbol: "zero".into()
            }
        );
    }

    #[test]
    fn test_parse_invalid_alphabet_token() {
        let input = "zero o-ne\ns0 zero s0 zero halt_accept\ns0 * s0 zero halt_accept\n";
        let error = parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::InvalidToken {
                line: 1,
                token: "o-ne".into()
            }
        );
        assert!(error.to_string().contains("o-ne"));
    }

    #[test]
    fn test_parse_wildcard_only_allowed_as_input() {
        let input = "zero one\ns0 zero s0 zero halt_accept\ns0 one * one right\n";
        let error = parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::InvalidToken {
                line: 3,
                token: "*".into()
            }
        );
    }

    #[test]
    fn test_parse_malformed_rule() {
        let input = "zero one\ns0 zero s0 zero halt_accept\ns0 one s1 right\n";
        let error = parse(input).unwrap_err();

        assert_eq!(error, MachineError::MalformedRule { line: 3, found: 4 });
        assert_eq!(
            error.to_string(),
            "Malformed rule on line 3: expected 5 fields, found 4"
        );

        let input = "zero one\ns0 zero s0 zero halt_accept extra\ns0 one s1 one right\n";
        let error = parse(input).unwrap_err();
        assert_eq!(error, MachineError::MalformedRule { line: 2, found: 6 });
    }

    #[test]
    fn test_parse_unknown_action() {
        let input = "zero one\ns0 zero s0 zero halt\ns0 one s1 one right\n";
        let error = parse(input).unwrap_err();

        assert_eq!(
            error,
            MachineError::UnknownAction {
                line: 2,
                action: "halt".into()
            }
        );
    }

    #[test]
    fn test_parse_input() {
        let symbols = alphabet(&["zero", "one"]);

        assert_eq!(
            parse_input("one zero\n", &symbols).unwrap(),
            alphabet(&["one", "zero"])
        );
        assert_eq!(
            parse_input("  one\t one  ", &symbols).unwrap(),
            alphabet(&["one", "one"])
        );
        assert!(parse_input("", &symbols).unwrap().is_empty());
        assert!(parse_input("\n\n", &symbols).unwrap().is_empty());
    }

    #[test]
    fn test_parse_input_unknown_symbol() {
        let symbols = alphabet(&["zero", "one"]);
        let error = parse_input("one two zero", &symbols).unwrap_err();

        assert_eq!(
            error,
            MachineError::UnknownInputSymbol {
                symbol: "two".into(),
                position: 1
            }
        );
    }

    #[test]
    fn test_parse_input_multiple_lines() {
        let symbols = alphabet(&["zero", "one"]);
        let error = parse_input("one\nzero\n", &symbols).unwrap_err();

        assert!(matches!(error, MachineError::MalformedInput(_)));
    }
}
