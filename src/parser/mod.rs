pub mod ll1;
pub mod tree;
pub mod types;

use std::io::{self, BufRead};

use tracing::warn;

use crate::model::types::Terminal;

/// Reads the token stream the scanner emitted: two header lines to skip,
/// then one record per line whose first whitespace-delimited field is the
/// lexeme. Any further fields are ignored.
pub fn read_token_stream<R: BufRead>(reader: R) -> io::Result<Vec<Terminal>> {
    let mut terminals = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line_no < 2 {
            continue;
        }
        match line.split_whitespace().next() {
            Some(first) => terminals.push(Terminal::lexeme(first)),
            None => warn!(line = line_no + 1, "token file line is empty, skipping"),
        }
    }

    Ok(terminals)
}
