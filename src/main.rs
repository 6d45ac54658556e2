//! Front end for a small imperative language: a table-driven lexical
//! scanner feeding an LL(1) predictive parser with panic-mode recovery.
//!
//! The pipeline runs in phases, each completing before the next begins:
//! scan the source into a token report, load and normalize the grammar,
//! compute FIRST/FOLLOW, synthesize the predictive table, then drive the
//! parser over the token file and emit the derivation tree.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use camino::Utf8PathBuf;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::{debug, warn};

mod builder;
mod error;
mod model;
mod parser;
mod paths;
mod scanner;

use crate::builder::common::{
    calculate_all_first_sets, calculate_all_follow_sets, to_first_set_table, to_follow_set_table,
    write_first_sets, write_follow_sets,
};
use crate::builder::ll1::{build_parse_table, is_ll1, to_printable_table, write_parse_table_file};
use crate::builder::normalize::normalize;
use crate::error::FrontError;
use crate::model::grammar::Grammar;
use crate::parser::ll1::{trace_as_table, Ll1Parser};
use crate::parser::read_token_stream;
use crate::paths::OutputPaths;
use crate::scanner::Scanner;

/// Lexical and syntactic analysis for the toy language.
#[derive(Debug, Parser)]
#[command(name = "lexsyn")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file to scan
    #[arg(default_value = "test_code.txt")]
    source: Utf8PathBuf,

    /// Context-free grammar file
    #[arg(long, default_value = "cfg_rules.txt")]
    grammar: Utf8PathBuf,

    /// Directory the report files are written to
    #[arg(long, default_value = ".")]
    out_dir: Utf8PathBuf,
}

fn main() -> Result<()> {
    // Initialize the tracing subscriber only if RUST_LOG is explicitly set,
    // so report files and console tables stay uncluttered by default.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    let cli = Cli::parse();
    let out = OutputPaths::new(cli.out_dir.clone());
    run(&cli, &out)
}

fn run(cli: &Cli, out: &OutputPaths) -> Result<()> {
    // Lexical phase.
    let source = fs::read_to_string(&cli.source).map_err(|source| FrontError::FileOpen {
        path: cli.source.clone(),
        source,
    })?;

    let mut scanner = Scanner::new();
    let report = scanner.scan(&source);

    let mut token_file = create(out.tokens())?;
    scanner::write_token_file(&report, &mut token_file).into_diagnostic()?;
    token_file.flush().into_diagnostic()?;
    drop(token_file);

    let mut symbol_file = create(out.symbol_table())?;
    scanner::write_symbol_table(&report, &mut symbol_file).into_diagnostic()?;

    let mut error_file = create(out.errors())?;
    scanner::write_errors(&report, &mut error_file).into_diagnostic()?;

    println!(
        "Lexical analysis done: {} valid tokens, {} invalid. See {} and {}",
        report.counts.total_valid(),
        report.counts.invalid,
        out.tokens(),
        out.symbol_table(),
    );

    // Grammar phase: load, normalize, freeze.
    let mut grammar = Grammar::from_path(&cli.grammar)?;
    println!("{}", grammar.to_vertical_table());

    let residual = normalize(&mut grammar);
    if !residual.is_clean() {
        return Err(FrontError::GrammarStillAmbiguous {
            left_recursive: residual.left_recursive,
            left_factorable: residual.left_factorable,
        }
        .into());
    }
    grammar
        .write_rules(&mut create(out.normalized_grammar())?)
        .into_diagnostic()?;
    if !is_ll1(&grammar) {
        warn!("normalized grammar is not LL(1); table conflicts resolve last-writer-wins");
    }

    let first_sets = calculate_all_first_sets(&grammar);
    let follow_sets = calculate_all_follow_sets(&grammar, &first_sets);
    write_first_sets(&grammar, &first_sets, &mut create(out.first_sets())?).into_diagnostic()?;
    write_follow_sets(&grammar, &follow_sets, &mut create(out.follow_sets())?)
        .into_diagnostic()?;
    println!("{}", to_first_set_table(&grammar, &first_sets));
    println!("{}", to_follow_set_table(&grammar, &follow_sets));

    let (table, conflicts) = build_parse_table(&grammar, &first_sets, &follow_sets);
    if conflicts > 0 {
        debug!(conflicts, "predictive table built with conflicts");
    }
    println!("{}", to_printable_table(&grammar, &table));
    write_parse_table_file(&grammar, &table, &mut create(out.parse_table())?)
        .into_diagnostic()?;

    // Syntactic phase: consume the token file the scanner just wrote.
    let token_input = File::open(out.tokens()).map_err(|source| FrontError::FileOpen {
        path: out.tokens(),
        source,
    })?;
    let tokens = read_token_stream(BufReader::new(token_input)).into_diagnostic()?;

    let ll1 = Ll1Parser::with_table(&grammar, table, follow_sets);
    let outcome = ll1.parse(&tokens);

    writeln!(
        create(out.parse_trace())?,
        "{}",
        trace_as_table(&outcome.trace)
    )
    .into_diagnostic()?;
    outcome
        .tree
        .write_to(&mut create(out.parse_tree())?)
        .into_diagnostic()?;

    if !outcome.errors.is_empty() {
        writeln!(error_file).into_diagnostic()?;
        writeln!(error_file, "Syntactic errors from parsing").into_diagnostic()?;
        for error in &outcome.errors {
            writeln!(error_file, "{}", error).into_diagnostic()?;
        }
    }

    if outcome.succeeded {
        println!("Input successfully parsed. Parse tree in {}", out.parse_tree());
    } else {
        println!(
            "Parsing failed with {} errors. See {}",
            outcome.errors.len(),
            out.errors(),
        );
    }

    Ok(())
}

fn create(path: Utf8PathBuf) -> Result<BufWriter<File>, FrontError> {
    File::create(&path)
        .map(BufWriter::new)
        .map_err(|source| FrontError::FileOpen { path, source })
}
