use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tmrun::{
    analyze, encode, encode_machine, parse_input, InputPattern, MachineLoader, ProgramManager,
    SimulationConfig, Symbol, TransitionTable, TuringMachine, Verdict, DEFAULT_MAX_STEPS,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a machine on an input and print its trace
    Run {
        #[clap(flatten)]
        machine: MachineArgs,

        /// File holding the input symbols on a single line
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Input symbols given inline, e.g. --text "one zero"
        #[clap(short, long, conflicts_with = "input")]
        text: Option<String>,

        /// Steps executed before the run is reported as undetermined
        #[clap(short, long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: u64,

        /// Only print the verdict and step count
        #[clap(short, long)]
        quiet: bool,

        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },
    /// Print the binary encoding of a machine
    Encode {
        #[clap(flatten)]
        machine: MachineArgs,

        /// Print the decoded records as JSON instead of the bit stream
        #[clap(long)]
        json: bool,
    },
    /// Build a machine's table and report suspicious structure
    Check {
        #[clap(flatten)]
        machine: MachineArgs,
    },
    /// List the built-in machines
    List,
}

#[derive(Args)]
struct MachineArgs {
    /// The machine specification file, or `-` to read it from stdin
    #[clap(required_unless_present = "builtin")]
    spec: Option<PathBuf>,

    /// Use a built-in machine instead of a file
    #[clap(short, long, conflicts_with = "spec")]
    builtin: Option<String>,
}

impl MachineArgs {
    /// Returns `true` when the specification itself is read from stdin.
    fn spec_from_stdin(&self) -> bool {
        self.builtin.is_none() && self.spec.as_deref() == Some(Path::new("-"))
    }

    fn load(&self) -> Result<TransitionTable> {
        match (&self.spec, &self.builtin) {
            (_, Some(name)) => Ok(ProgramManager::get(name)?),
            (Some(_), None) if self.spec_from_stdin() => {
                let text = read_stdin()?;
                MachineLoader::load_table_from_string(&text)
                    .context("Invalid machine on stdin")
            }
            (Some(path), None) => MachineLoader::load_table(path)
                .with_context(|| format!("Invalid machine in {}", path.display())),
            (None, None) => bail!("either a specification file or --builtin is required"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn execute(command: Command) -> Result<ExitCode> {
    match command {
        Command::Run {
            machine,
            input,
            text,
            max_steps,
            quiet,
            json,
        } => {
            let table = machine.load()?;
            let symbols = read_symbols(
                input.as_deref(),
                text.as_deref(),
                !machine.spec_from_stdin(),
                table.alphabet(),
            )?;
            let config = SimulationConfig::default()
                .with_max_steps(max_steps)
                .with_trace(!quiet && !json);

            let mut machine = TuringMachine::new(&table, symbols);
            let mut last_frame = None;
            let result = machine.run(&config, |frame| {
                if let Some(previous) = last_frame.replace(frame.clone()) {
                    println!("{}", previous);
                }
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let accepted = match result.verdict {
                    Verdict::Accepted => "true",
                    Verdict::Rejected => "false",
                    Verdict::Undetermined => "undetermined",
                };
                println!("Accepted: {}", accepted);
                println!("Steps: {}", result.step_count);
                if let Some(frame) = last_frame {
                    println!("{}", frame);
                }
            }

            Ok(match result.verdict {
                Verdict::Accepted => ExitCode::SUCCESS,
                Verdict::Rejected => ExitCode::from(1),
                Verdict::Undetermined => ExitCode::from(2),
            })
        }
        Command::Encode { machine, json } => {
            let table = machine.load()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&encode_machine(&table)?)?);
            } else {
                println!("{}", encoded_stream(&table)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { machine } => {
            let table = match (&machine.spec, machine.spec_from_stdin()) {
                (Some(path), false) if machine.builtin.is_none() => {
                    let spec = MachineLoader::load_spec(path)
                        .with_context(|| format!("Invalid machine in {}", path.display()))?;
                    let wildcards = spec
                        .rules
                        .iter()
                        .filter(|rule| rule.input_from == InputPattern::Any)
                        .count();
                    println!("{} rules ({} wildcard)", spec.rules.len(), wildcards);
                    TransitionTable::build(&spec)
                        .with_context(|| format!("Invalid machine in {}", path.display()))?
                }
                _ => machine.load()?,
            };
            println!(
                "OK: {} states, {} symbols, {} transitions",
                table.states().len(),
                table.alphabet().len(),
                table.len()
            );
            for diagnostic in analyze(&table) {
                log::warn!("{}", diagnostic);
                println!("warning: {}", diagnostic);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::List => {
            for program in tmrun::PROGRAMS.iter() {
                println!("{:<18} {}", program.name, program.description);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Reads the input symbols from a file, the inline text, or piped stdin, in that order.
///
/// Stdin is only consulted when `use_stdin` is set and stdin is not a terminal; otherwise the
/// input is empty.
fn read_symbols(
    path: Option<&Path>,
    text: Option<&str>,
    use_stdin: bool,
    alphabet: &[Symbol],
) -> Result<Vec<Symbol>> {
    if let Some(path) = path {
        return MachineLoader::load_input(path, alphabet)
            .with_context(|| format!("Invalid input in {}", path.display()));
    }
    if let Some(text) = text {
        return Ok(parse_input(text, alphabet)?);
    }
    if use_stdin && atty::isnt(atty::Stream::Stdin) {
        return Ok(parse_input(&read_stdin()?, alphabet)?);
    }
    Ok(Vec::new())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

/// Spells the binary encoding with the first two alphabet symbols, separated by blanks.
fn encoded_stream(table: &TransitionTable) -> Result<String> {
    Ok(encode(table)?.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_encoded_stream_uses_alphabet_symbols() {
        let table = ProgramManager::get("three_ones").unwrap();
        let stream = encoded_stream(&table).unwrap();

        // Word size 2 (`01 00`), the header terminator, then a state count of 3.
        assert!(stream.starts_with("zero one zero zero one one one one "));
        assert!(stream
            .split(' ')
            .all(|symbol| symbol == "zero" || symbol == "one"));
        assert_eq!(stream.split(' ').count(), 6 + 2 + 6 * 11);
    }

    #[test]
    fn test_encoded_stream_needs_two_symbols() {
        let table = MachineLoader::load_table_from_string(
            "mark\nq mark q mark right\nq * q mark halt_accept\n",
        )
        .unwrap();
        assert!(encoded_stream(&table).is_err());
    }

    #[test]
    fn test_read_symbols_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.txt");
        File::create(&path)
            .unwrap()
            .write_all(b"one zero\n")
            .unwrap();

        let table = ProgramManager::get("three_ones").unwrap();
        let symbols = read_symbols(Some(&path), None, false, table.alphabet()).unwrap();
        assert_eq!(symbols, ["one", "zero"]);
    }

    #[test]
    fn test_read_symbols_reports_file_problems() {
        let dir = tempdir().unwrap();
        let table = ProgramManager::get("three_ones").unwrap();

        let missing = dir.path().join("missing.txt");
        let error = read_symbols(Some(&missing), None, false, table.alphabet()).unwrap_err();
        assert!(format!("{:#}", error).contains("missing.txt"));

        let path = dir.path().join("input.txt");
        File::create(&path).unwrap().write_all(b"one two\n").unwrap();
        let error = read_symbols(Some(&path), None, false, table.alphabet()).unwrap_err();
        assert!(format!("{:#}", error).contains("'two'"));
    }

    #[test]
    fn test_read_symbols_from_text() {
        let table = ProgramManager::get("parity").unwrap();

        let symbols = read_symbols(None, Some("one blank"), false, table.alphabet()).unwrap();
        assert_eq!(symbols, ["one", "blank"]);

        let symbols = read_symbols(None, None, false, table.alphabet()).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn test_cli_accepts_builtin_with_input_flag() {
        let cli = Cli::try_parse_from(["tmrun", "run", "--builtin", "walker", "-i", "in.txt"])
            .unwrap();
        let Command::Run { machine, input, .. } = cli.command else {
            panic!("expected the run subcommand");
        };
        assert_eq!(machine.builtin.as_deref(), Some("walker"));
        assert!(machine.spec.is_none());
        assert_eq!(input.as_deref(), Some(Path::new("in.txt")));
    }

    #[test]
    fn test_cli_reads_spec_from_stdin_marker() {
        let cli = Cli::try_parse_from(["tmrun", "check", "-"]).unwrap();
        let Command::Check { machine } = cli.command else {
            panic!("expected the check subcommand");
        };
        assert!(machine.spec_from_stdin());
    }
}
