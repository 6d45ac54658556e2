use std::collections::{HashMap, VecDeque};

use tabled::Tabled;
use thiserror::Error;

use crate::model::types::{NonTerminal, Symbol, Terminal};

/// One cell of the predictive table: apply the i-th alternative of the
/// row's non-terminal, or synchronize during panic-mode recovery. Absent
/// keys are empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCell {
    Produce(usize),
    Sync,
}

pub type ParseTable = HashMap<(NonTerminal, Terminal), TableCell>;

/// Recoverable syntax errors recorded while parsing. None of them abort
/// the run; any of them marks it as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Unexpected '{found}', expected '{expected}'")]
    UnexpectedToken { found: Terminal, expected: Terminal },

    #[error("No rule for '{non_terminal}' with token '{found}', entering panic mode")]
    NoRuleForToken {
        non_terminal: NonTerminal,
        found: Terminal,
    },

    #[error("Synchronized: abandoned '{non_terminal}' at token '{found}'")]
    SyncCell {
        non_terminal: NonTerminal,
        found: Terminal,
    },
}

/// A snapshot of the parser at one step, copied before the step's action
/// is decided.
#[derive(Debug, Clone)]
pub struct ParseStep {
    pub stack: Vec<Symbol>,
    pub input: VecDeque<Terminal>,
    pub action: String,
}

#[derive(Tabled)]
pub struct TraceRow {
    #[tabled(rename = "Step")]
    pub step: usize,

    #[tabled(rename = "Stack")]
    pub stack: String,

    #[tabled(rename = "Input")]
    pub input: String,

    #[tabled(rename = "Action")]
    pub action: String,
}
