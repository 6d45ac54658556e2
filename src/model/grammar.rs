use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use indexmap::{IndexMap, IndexSet};
use tabled::{builder, Table};

use crate::error::FrontError;
use crate::model::types::{Alternative, NonTerminal, Production, Symbol, Terminal};

/// A context-free grammar: an insertion-ordered mapping from non-terminal to
/// its production, plus the designated start symbol (the first left-hand
/// side of the grammar file).
///
/// The grammar is loaded once, rewritten in place by the normalization pass,
/// and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub start: NonTerminal,
    pub productions: IndexMap<NonTerminal, Production>,
}

impl Grammar {
    /// Builds the grammar by reading its definition from a file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, FrontError> {
        let contents = fs::read_to_string(path).map_err(|source| FrontError::FileOpen {
            path: path.to_owned(),
            source,
        })?;

        Grammar::from_source(&contents)
    }

    /// Builds the grammar from source text. Each non-empty line must have
    /// the form `LHS -> alt | alt | …`, with symbols separated by spaces.
    /// Two consecutive pipes `||` are a literal symbol, not a delimiter.
    pub fn from_source(source: &str) -> Result<Self, FrontError> {
        let mut rules: Vec<(&str, &str)> = Vec::new();

        for l in source.lines() {
            let line = l.trim();
            if line.is_empty() {
                continue;
            }

            let (lhs, rhs) = line
                .split_once("->")
                .ok_or_else(|| FrontError::GrammarSyntax(line.to_string()))?;

            let lhs = lhs.trim();
            if lhs.is_empty() || lhs.split_whitespace().count() != 1 {
                return Err(FrontError::GrammarSyntax(line.to_string()));
            }
            rules.push((lhs, rhs));
        }

        let Some(&(first_lhs, _)) = rules.first() else {
            return Err(FrontError::GrammarSyntax(
                "grammar file contains no rules".to_string(),
            ));
        };

        // Symbols are classified by left-hand-side membership: a name is a
        // non-terminal iff some rule defines it.
        let lhs_names: HashSet<&str> = rules.iter().map(|(lhs, _)| *lhs).collect();

        let mut productions = IndexMap::new();
        for (lhs, rhs) in &rules {
            let mut alternatives: Vec<Alternative> = Vec::new();

            for alt in split_alternatives(rhs) {
                let symbols: Alternative = alt
                    .split_whitespace()
                    .map(|name| classify(name, &lhs_names))
                    .collect();

                if symbols.is_empty() {
                    return Err(FrontError::GrammarSyntax(format!(
                        "empty alternative in rule for {} (use an explicit ε)",
                        lhs
                    )));
                }
                alternatives.push(symbols);
            }

            let lhs = NonTerminal::new(lhs);
            productions.insert(
                lhs.clone(),
                Production { lhs, alternatives },
            );
        }

        Ok(Grammar {
            start: NonTerminal::new(first_lhs),
            productions,
        })
    }

    /// All distinct lexeme terminals, in first-appearance order.
    pub fn terminals(&self) -> IndexSet<Terminal> {
        let mut terminals = IndexSet::new();
        for production in self.productions.values() {
            for alternative in &production.alternatives {
                for symbol in alternative {
                    if let Symbol::Terminal(t @ Terminal::Lexeme(_)) = symbol {
                        terminals.insert(t.clone());
                    }
                }
            }
        }
        terminals
    }

    pub fn has_epsilon_rules(&self) -> bool {
        self.productions.values().any(|p| {
            p.alternatives
                .iter()
                .any(|alt| alt.iter().any(Symbol::is_epsilon))
        })
    }

    fn display_non_terminals(&self) -> String {
        if self.productions.is_empty() {
            "None".to_string()
        } else {
            self.productions
                .keys()
                .map(|nt| nt.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn display_terminals(&self) -> String {
        let terminals = self.terminals();
        if terminals.is_empty() {
            "None".to_string()
        } else {
            terminals
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    pub fn to_vertical_table(&self) -> Table {
        let mut builder = builder::Builder::default();

        let headers = ["Start Symbol", "Has ε-Rules", "Non-Terminals", "Terminals"];
        let headers_values = [
            self.start.to_string(),
            self.has_epsilon_rules().to_string(),
            self.display_non_terminals(),
            self.display_terminals(),
        ];

        for (header, value) in headers.iter().zip(headers_values.iter()) {
            builder.push_record([header.to_string(), value.to_string()]);
        }

        for (lhs, production) in &self.productions {
            builder.push_record([format!("Production for {}", lhs), production.to_string()]);
        }

        builder.build()
    }

    /// Writes the grammar back out in rule-per-line form, the format
    /// `from_source` reads.
    pub fn write_rules<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for production in self.productions.values() {
            writeln!(out, "{}", production)?;
        }
        Ok(())
    }
}

/// Splits a right-hand side on single `|` delimiters, keeping `||` intact as
/// a literal symbol.
fn split_alternatives(rhs: &str) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut chars = rhs.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '|' {
            if chars.peek() == Some(&'|') {
                chars.next();
                current.push_str("||");
            } else {
                alternatives.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    alternatives.push(current);
    alternatives
}

fn classify(name: &str, lhs_names: &HashSet<&str>) -> Symbol {
    match name {
        "ε" => Symbol::Terminal(Terminal::Epsilon),
        "$" => Symbol::Terminal(Terminal::Eof),
        _ if lhs_names.contains(name) => Symbol::NonTerminal(NonTerminal::new(name)),
        _ => Symbol::Terminal(Terminal::lexeme(name)),
    }
}
