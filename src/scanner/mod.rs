//! Table-driven lexical scanner.
//!
//! Source text is pre-segmented on ASCII whitespace and the hard delimiters
//! `$ , ; ( )`, and each resulting run is pushed through a classification
//! cascade: Keyword → Identifier → Number → Punctuation → Operator. Every
//! attempt first splits off the part of the candidate that cannot belong to
//! the attempted class, validates the head against that class's DFA, and
//! re-classifies the tail recursively. Candidates that survive no classifier
//! are reported as invalid; the scanner never aborts the stream.

mod dfa;
mod split;
mod token;

use std::collections::HashSet;
use std::io::{self, Write};

use ecow::EcoString;
use tabled::{Table, Tabled};
use tracing::debug;

pub use token::{InvalidLexeme, Token, TokenClass};

/// Reserved words of the source language.
const KEYWORDS: &[&str] = &[
    "loop", "agar", "magar", "asm", "else", "new", "this", "auto",
    "enum", "operator", "throw", "bool", "explicit", "private", "true",
    "break", "export", "protected", "try", "case", "extern", "public",
    "typedef", "catch", "false", "register", "typeid", "char", "float",
    "typename", "class", "for", "return", "union", "const", "friend",
    "short", "unsigned", "goto", "signed", "using", "continue", "if",
    "sizeof", "virtual", "default", "inline", "static", "void", "delete",
    "int", "volatile", "do", "long", "struct", "double", "mutable",
    "switch", "while", "namespace",
];

/// Characters that end a candidate lexeme and are consumed silently.
const HARD_DELIMITERS: [char; 5] = ['$', ',', ';', '(', ')'];

/// Per-class token tallies for the run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenCounts {
    pub keywords: usize,
    pub identifiers: usize,
    pub numbers: usize,
    pub punctuation: usize,
    pub operators: usize,
    pub invalid: usize,
}

impl TokenCounts {
    pub fn total_valid(&self) -> usize {
        self.keywords + self.identifiers + self.numbers + self.punctuation + self.operators
    }

    fn bump(&mut self, class: TokenClass) {
        match class {
            TokenClass::Keyword => self.keywords += 1,
            TokenClass::Identifier => self.identifiers += 1,
            TokenClass::Number => self.numbers += 1,
            TokenClass::Punctuation => self.punctuation += 1,
            TokenClass::Operator => self.operators += 1,
            TokenClass::Invalid => self.invalid += 1,
        }
    }

    fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "Token Count Summary")?;
        writeln!(out, "{:<24}{}", "Keywords:", self.keywords)?;
        writeln!(out, "{:<24}{}", "Identifiers:", self.identifiers)?;
        writeln!(out, "{:<24}{}", "Numbers:", self.numbers)?;
        writeln!(out, "{:<24}{}", "Punctuations:", self.punctuation)?;
        writeln!(out, "{:<24}{}", "Operators:", self.operators)?;
        writeln!(out, "{:<24}{}", "Invalid:", self.invalid)?;
        writeln!(out, "{:<24}{}", "Total Tokens (Valid):", self.total_valid())
    }
}

/// Everything one scan produces: the valid tokens in emission order, the
/// invalid lexemes in encounter order, and the class tallies.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub tokens: Vec<Token>,
    pub invalid: Vec<InvalidLexeme>,
    pub counts: TokenCounts,
}

pub struct Scanner {
    keywords: HashSet<&'static str>,
    next_index: u32,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            keywords: KEYWORDS.iter().copied().collect(),
            next_index: 0,
        }
    }

    /// Scans the whole source, producing tokens in source order with
    /// strictly increasing indices and non-decreasing line numbers.
    pub fn scan(&mut self, source: &str) -> ScanReport {
        let mut report = ScanReport::default();

        for (line_idx, line) in source.lines().enumerate() {
            let line_no = line_idx as u32 + 1;
            let runs = line
                .split(|c: char| c.is_ascii_whitespace() || HARD_DELIMITERS.contains(&c))
                .filter(|run| !run.is_empty());
            for candidate in runs {
                self.classify(candidate, line_no, &mut report);
            }
        }

        debug!(
            valid = report.counts.total_valid(),
            invalid = report.counts.invalid,
            "lexical analysis complete"
        );
        report
    }

    fn classify(&mut self, candidate: &str, line: u32, report: &mut ScanReport) {
        let (head, tail) = split::keyword(candidate);
        if self.keywords.contains(head) {
            self.emit(head, TokenClass::Keyword, line, report);
            if !tail.is_empty() {
                self.classify(tail, line, report);
            }
            return;
        }

        let (head, tail) = split::identifier(candidate);
        if dfa::identifier(head) {
            self.emit(head, TokenClass::Identifier, line, report);
            if !tail.is_empty() {
                self.classify(tail, line, report);
            }
            return;
        }

        let (head, tail) = split::number(candidate);
        if dfa::number(head) {
            self.emit(head, TokenClass::Number, line, report);
            if !tail.is_empty() {
                self.classify(tail, line, report);
            }
            return;
        }

        let (head, tail) = split::punctuation(candidate);
        if head.chars().count() == 1 && dfa::punctuation(head) {
            self.emit(head, TokenClass::Punctuation, line, report);
            if !tail.is_empty() {
                self.classify(tail, line, report);
            }
            return;
        }

        let (head, tail) = split::operator(candidate);
        if dfa::operator(head) {
            self.emit(head, TokenClass::Operator, line, report);
            if !tail.is_empty() {
                self.classify(tail.as_str(), line, report);
            }
            return;
        }

        report.counts.bump(TokenClass::Invalid);
        report.invalid.push(InvalidLexeme {
            lexeme: EcoString::from(candidate),
            line,
        });
    }

    fn emit(&mut self, lexeme: &str, class: TokenClass, line: u32, report: &mut ScanReport) {
        report.counts.bump(class);
        report.tokens.push(Token {
            lexeme: EcoString::from(lexeme),
            class,
            line,
            index: self.next_index,
        });
        self.next_index += 1;
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Scanner::new()
    }
}

/// Writes the token file the parser consumes: two header lines, then one
/// record per line whose first field is the lexeme.
pub fn write_token_file<W: Write>(report: &ScanReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "{:<20}{:<20}", "Token Value", "Token Type")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for token in &report.tokens {
        writeln!(out, "{:<20}{:<20}", token.lexeme, token.class)?;
    }
    Ok(())
}

#[derive(Tabled)]
struct SymbolRow {
    #[tabled(rename = "Token Value")]
    lexeme: String,

    #[tabled(rename = "Token Type")]
    class: String,

    #[tabled(rename = "Line No")]
    line: u32,

    #[tabled(rename = "Token No")]
    index: u32,
}

/// Writes the symbol table: one record per valid token, plus the count
/// summary.
pub fn write_symbol_table<W: Write>(report: &ScanReport, out: &mut W) -> io::Result<()> {
    let rows: Vec<SymbolRow> = report
        .tokens
        .iter()
        .map(|token| SymbolRow {
            lexeme: token.lexeme.to_string(),
            class: token.class.to_string(),
            line: token.line,
            index: token.index,
        })
        .collect();

    writeln!(out, "{}", Table::new(rows))?;
    report.counts.write_summary(out)
}

/// Writes one diagnostic line per invalid lexeme, plus the invalid tally.
pub fn write_errors<W: Write>(report: &ScanReport, out: &mut W) -> io::Result<()> {
    for invalid in &report.invalid {
        writeln!(out, "{}", invalid)?;
    }
    writeln!(out)?;
    writeln!(out, "{:<24}{}", "Invalid:", report.counts.invalid)?;
    writeln!(
        out,
        "{:<24}{}",
        "Total Tokens:",
        report.counts.total_valid() + report.counts.invalid
    )
}
