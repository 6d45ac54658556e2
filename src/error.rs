use std::io;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Infrastructure failures that abort a phase.
///
/// Input-level problems never surface here: invalid lexemes and syntax
/// errors are logged to the error sink and the run continues, so the
/// diagnostic report stays as complete as possible.
#[derive(Debug, Error, Diagnostic)]
pub enum FrontError {
    #[error("unable to open {path}")]
    #[diagnostic(code(lexsyn::file_open))]
    FileOpen {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed grammar rule: {0}")]
    #[diagnostic(
        code(lexsyn::grammar_syntax),
        help("each rule must read `LHS -> alt | alt`, one per line")
    )]
    GrammarSyntax(String),

    #[error(
        "grammar is still ambiguous after normalization \
         (left recursive: {left_recursive}, left factorable: {left_factorable})"
    )]
    #[diagnostic(
        code(lexsyn::grammar_ambiguous),
        help("the grammar cannot be parsed LL(1); rewrite the offending rules")
    )]
    GrammarStillAmbiguous {
        left_recursive: bool,
        left_factorable: bool,
    },
}
