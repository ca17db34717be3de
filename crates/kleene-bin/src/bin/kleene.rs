use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use kleene::automaton::{AutomatonJson, DfaJson, NfaJson};
use kleene::{
    Automaton, ConvertOptions, Dfa, DfaToRegexRequest, Nfa, NfaToDfaRequest, NfaToRegexRequest,
    RegexToDfaRequest,
};
use log::{debug, warn};
use petgraph::dot::{Config, Dot};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts between regular expressions and finite automata.
///
/// Requests and responses are JSON. Input is read from FILE, or from stdin
/// when FILE is absent or `-`.
#[derive(Parser, Debug)]
#[command(name = "kleene", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: Common,
}

#[derive(Args, Debug)]
struct Common {
    /// Fail once the constructed DFA would exceed this many states
    #[arg(long, global = true, value_name = "N")]
    max_states: Option<usize>,

    /// Leave the step trace out of the response
    #[arg(long, global = true)]
    no_steps: bool,

    /// Print the resulting automaton as Graphviz DOT instead of JSON
    #[arg(long, global = true)]
    dot: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Regex to DFA by direct construction
    RegexToDfa {
        /// The regex; when absent a `{"regex": ...}` request is read instead
        #[arg(short, long)]
        regex: Option<String>,
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// NFA to DFA by subset construction
    NfaToDfa {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// DFA to regex by state elimination
    DfaToRegex {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// NFA to regex by state elimination
    NfaToRegex {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Runs words through an automaton. A `startState` field selects DFA
    /// semantics, otherwise the automaton is treated as an NFA.
    Accepts {
        #[arg(value_name = "FILE")]
        automaton: PathBuf,
        #[arg(value_name = "WORD")]
        words: Vec<String>,
        /// Print the DFA execution trace of each word
        #[arg(long)]
        trace: bool,
    },
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn parse_request<T: DeserializeOwned>(path: Option<&Path>) -> Result<T> {
    let text = read_input(path)?;
    serde_json::from_str(&text).context("malformed request")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

fn render_dot(automaton: &AutomatonJson) -> String {
    let fa = Automaton::from(automaton);
    let graph = fa.to_graph();
    let body = format!("{:?}", Dot::with_config(&graph, &[Config::GraphContentOnly]));
    format!("digraph {{\n{}{}}}", body, final_state_attrs(&fa))
}

// final states drawn as double circles
fn final_state_attrs(fa: &Automaton) -> String {
    fa.states()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_final)
        .map(|(i, _)| format!("    {} [ shape = doublecircle ]\n", i))
        .collect()
}

impl Common {
    fn apply(&self, options: &mut ConvertOptions) {
        if let Some(limit) = self.max_states {
            options.max_dfa_states = Some(limit);
        }
        if self.no_steps {
            options.record_steps = false;
        }
    }

    fn emit_dfa(&self, response: &kleene::DfaResponse) -> Result<()> {
        match (&response.dfa, self.dot) {
            (Some(dfa), true) => println!("{}", render_dot(dfa)),
            _ => print_json(response, self.pretty)?,
        }
        Self::check(response.success, response.error.as_deref())
    }

    fn emit_regex(&self, response: &kleene::RegexResponse) -> Result<()> {
        if self.dot {
            warn!("--dot has no effect when the result is a regex");
        }
        print_json(response, self.pretty)?;
        Self::check(response.success, response.error.as_deref())
    }

    fn check(success: bool, error: Option<&str>) -> Result<()> {
        if success {
            Ok(())
        } else {
            bail!("conversion failed: {}", error.unwrap_or("unknown error"))
        }
    }
}

fn accepts(path: &Path, words: &[String], trace: bool, pretty: bool) -> Result<()> {
    let text = read_input(Some(path))?;
    let value: serde_json::Value = serde_json::from_str(&text).context("malformed automaton")?;

    if value.get("startState").is_some() {
        let json: DfaJson = serde_json::from_value(value).context("malformed DFA")?;
        let dfa = Dfa::from_json(&json)?;
        for word in words {
            println!("{}: {}", word, verdict(dfa.accepts(word)));
            if trace {
                print_json(&dfa.execution_trace(word), pretty)?;
            }
        }
    } else {
        let json: NfaJson = serde_json::from_value(value).context("malformed NFA")?;
        let nfa = Nfa::from_json(&json)?;
        if trace {
            warn!("--trace is only available for DFAs");
        }
        for word in words {
            println!("{}: {}", word, verdict(nfa.accepts(word)));
        }
    }
    Ok(())
}

fn verdict(accepted: bool) -> &'static str {
    if accepted {
        "accepted"
    } else {
        "rejected"
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("{:?}", cli);
    let common = &cli.common;

    match &cli.command {
        Command::RegexToDfa { regex, input } => {
            let mut request = match regex {
                Some(regex) => RegexToDfaRequest::new(regex.as_str()),
                None => parse_request(input.as_deref())?,
            };
            common.apply(&mut request.options);
            common.emit_dfa(&request.convert())
        }
        Command::NfaToDfa { input } => {
            let mut request: NfaToDfaRequest = parse_request(input.as_deref())?;
            common.apply(&mut request.options);
            common.emit_dfa(&request.convert())
        }
        Command::DfaToRegex { input } => {
            let mut request: DfaToRegexRequest = parse_request(input.as_deref())?;
            common.apply(&mut request.options);
            common.emit_regex(&request.convert())
        }
        Command::NfaToRegex { input } => {
            let mut request: NfaToRegexRequest = parse_request(input.as_deref())?;
            common.apply(&mut request.options);
            common.emit_regex(&request.convert())
        }
        Command::Accepts { automaton, words, trace } => {
            accepts(automaton, words, *trace, common.pretty)
        }
    }
}
