//! Stack-based predictive parser.
//!
//! The stack starts as `[$, start]`; each step looks at the stack top and
//! the current token and either accepts, matches, expands via the
//! predictive table, or recovers. Recovery never aborts: a terminal
//! mismatch skips one token, a SYNC cell abandons the non-terminal, and an
//! empty cell enters panic mode, skipping tokens until one lies in
//! FOLLOW(top). Every step either pops the stack or advances the cursor,
//! so the parser terminates on every finite input.

use std::collections::VecDeque;

use tabled::Table;
use tracing::debug;

use crate::builder::common::{
    calculate_all_first_sets, calculate_all_follow_sets, FollowSets,
};
use crate::builder::ll1::build_parse_table;
use crate::model::{
    grammar::Grammar,
    types::{render_alternative, Symbol, Terminal},
};
use crate::parser::tree::{NodeId, ParseTree};
use crate::parser::types::{ParseStep, ParseTable, SyntaxError, TableCell, TraceRow};

/// Everything one parse produces. `succeeded` holds iff no error was
/// recorded, the stack emptied, and every token was consumed.
#[derive(Debug)]
pub struct ParseRun {
    pub succeeded: bool,
    pub errors: Vec<SyntaxError>,
    pub tree: ParseTree,
    pub trace: Vec<ParseStep>,
}

pub struct Ll1Parser<'g> {
    grammar: &'g Grammar,
    table: ParseTable,
    follow_sets: FollowSets,
}

impl<'g> Ll1Parser<'g> {
    /// Builds the predictive table and FOLLOW sets from the (normalized)
    /// grammar.
    pub fn new(grammar: &'g Grammar) -> Self {
        let first_sets = calculate_all_first_sets(grammar);
        let follow_sets = calculate_all_follow_sets(grammar, &first_sets);
        let (table, _) = build_parse_table(grammar, &first_sets, &follow_sets);

        Ll1Parser {
            grammar,
            table,
            follow_sets,
        }
    }

    /// Reuses a table and FOLLOW sets that were already built, so the
    /// driver can dump them without computing everything twice.
    pub fn with_table(grammar: &'g Grammar, table: ParseTable, follow_sets: FollowSets) -> Self {
        Ll1Parser {
            grammar,
            table,
            follow_sets,
        }
    }

    /// Parses the token stream (without trailing `$`; it is appended here)
    /// and returns the derivation tree, the error list and the step trace.
    pub fn parse(&self, input: &[Terminal]) -> ParseRun {
        let mut tree = ParseTree::new(Symbol::NonTerminal(self.grammar.start.clone()));
        let mut stack: Vec<(Symbol, Option<NodeId>)> = vec![
            (Symbol::Terminal(Terminal::Eof), None),
            (
                Symbol::NonTerminal(self.grammar.start.clone()),
                Some(tree.root()),
            ),
        ];

        let mut tokens: Vec<Terminal> = input.to_vec();
        tokens.push(Terminal::Eof);

        let mut cursor = 0usize;
        let mut errors: Vec<SyntaxError> = Vec::new();
        let mut trace: Vec<ParseStep> = Vec::new();
        let mut accepted = false;

        loop {
            let Some((top, node)) = stack.last().cloned() else {
                break;
            };
            if cursor >= tokens.len() {
                break;
            }
            let current = tokens[cursor].clone();

            trace.push(ParseStep {
                stack: stack.iter().map(|(symbol, _)| symbol.clone()).collect(),
                input: tokens[cursor..].iter().cloned().collect::<VecDeque<_>>(),
                action: String::new(),
            });

            match top {
                Symbol::Terminal(expected) => {
                    if expected == current {
                        if expected == Terminal::Eof {
                            set_action(&mut trace, "Accept".to_string());
                            stack.pop();
                            cursor += 1;
                            accepted = true;
                            break;
                        }
                        set_action(&mut trace, format!("Match '{}'", expected));
                        stack.pop();
                        cursor += 1;
                    } else {
                        // One-token skip: keep expecting the terminal.
                        let error = SyntaxError::UnexpectedToken {
                            found: current,
                            expected,
                        };
                        set_action(&mut trace, error.to_string());
                        errors.push(error);
                        cursor += 1;
                    }
                }
                Symbol::NonTerminal(nt) => {
                    match self.table.get(&(nt.clone(), current.clone())) {
                        Some(TableCell::Produce(index)) => {
                            let alternative =
                                self.grammar.productions[&nt].alternatives[*index].clone();
                            set_action(
                                &mut trace,
                                format!("Expand {} -> {}", nt, render_alternative(&alternative)),
                            );
                            stack.pop();

                            let mut pushed: Vec<(Symbol, Option<NodeId>)> = Vec::new();
                            if let Some(parent) = node {
                                for symbol in &alternative {
                                    let id = tree.add_child(parent, symbol.clone());
                                    if !symbol.is_epsilon() {
                                        pushed.push((symbol.clone(), Some(id)));
                                    }
                                }
                            }
                            for entry in pushed.into_iter().rev() {
                                stack.push(entry);
                            }
                        }
                        Some(TableCell::Sync) => {
                            let error = SyntaxError::SyncCell {
                                non_terminal: nt,
                                found: current,
                            };
                            set_action(&mut trace, error.to_string());
                            errors.push(error);
                            stack.pop();
                        }
                        None => {
                            let error = SyntaxError::NoRuleForToken {
                                non_terminal: nt.clone(),
                                found: current,
                            };
                            set_action(&mut trace, error.to_string());
                            errors.push(error);

                            let follow = self.follow_sets.get(&nt);
                            while cursor < tokens.len()
                                && !follow.is_some_and(|f| f.contains(&tokens[cursor]))
                            {
                                cursor += 1;
                            }
                            stack.pop();
                        }
                    }
                }
            }
        }

        let succeeded =
            accepted && errors.is_empty() && stack.is_empty() && cursor == tokens.len();
        debug!(
            steps = trace.len(),
            errors = errors.len(),
            succeeded,
            "predictive parse finished"
        );

        ParseRun {
            succeeded,
            errors,
            tree,
            trace,
        }
    }
}

fn set_action(trace: &mut [ParseStep], action: String) {
    if let Some(step) = trace.last_mut() {
        step.action = action;
    }
}

/// Renders the step trace the way the grammar tables are rendered.
pub fn trace_as_table(trace: &[ParseStep]) -> Table {
    let rows: Vec<TraceRow> = trace
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let stack_str = step
                .stack
                .iter()
                .rev()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" ");

            let input_str = step
                .input
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" ");

            TraceRow {
                step: i + 1,
                stack: stack_str,
                input: input_str,
                action: step.action.clone(),
            }
        })
        .collect();

    Table::new(rows)
}
