use std::collections::HashSet;
use std::io::{self, Write};

use tabled::Table;
use tracing::warn;

use crate::builder::common::{
    calculate_all_first_sets, calculate_all_follow_sets, calculate_first_of_sequence, FirstSets,
    FollowSets,
};
use crate::model::{
    grammar::Grammar,
    types::{render_alternative, NonTerminal, Terminal},
};
use crate::parser::types::{ParseTable, TableCell};

/// By definition, a grammar is LL(1) if the director symbol sets of each
/// non-terminal's alternatives are pairwise disjoint. In the absence of
/// ε-rules the director sets collapse to the starter sets, so checking the
/// director sets covers both cases.
pub fn is_ll1(grammar: &Grammar) -> bool {
    if grammar.productions.is_empty() {
        return false;
    }

    let all_first_sets = calculate_all_first_sets(grammar);
    let all_follow_sets = calculate_all_follow_sets(grammar, &all_first_sets);

    for lhs in grammar.productions.keys() {
        let dss = director_sets(grammar, lhs, &all_first_sets, &all_follow_sets);

        for i in 0..dss.len() {
            for j in (i + 1)..dss.len() {
                if !dss[i].is_disjoint(&dss[j]) {
                    return false;
                }
            }
        }
    }

    true
}

/// Synthesizes the predictive table. For each production `A → γ`, FIRST(γ)
/// minus ε selects the FIRST cells; if γ is nullable, every terminal of
/// FOLLOW(A) selects it too. Remaining empty FOLLOW cells get the SYNC
/// marker that panic-mode recovery keys on.
///
/// A cell claimed twice means the grammar is not LL(1); the later
/// production wins and the collision is logged and counted.
pub fn build_parse_table(
    grammar: &Grammar,
    first_sets: &FirstSets,
    follow_sets: &FollowSets,
) -> (ParseTable, usize) {
    let mut table: ParseTable = ParseTable::new();
    let mut conflicts = 0;

    for (non_terminal, production) in &grammar.productions {
        for (alternative_index, alternative) in production.alternatives.iter().enumerate() {
            let (mut first_of_alternative, is_nullable) =
                calculate_first_of_sequence(alternative, first_sets);
            first_of_alternative.remove(&Terminal::Epsilon);

            let mut selectors: Vec<Terminal> = first_of_alternative.into_iter().collect();
            if is_nullable {
                if let Some(follow) = follow_sets.get(non_terminal) {
                    selectors.extend(follow.iter().cloned());
                }
            }

            for terminal in selectors {
                let key = (non_terminal.clone(), terminal);
                if let Some(TableCell::Produce(previous)) = table.get(&key) {
                    if *previous != alternative_index {
                        conflicts += 1;
                        warn!(
                            non_terminal = %key.0,
                            terminal = %key.1,
                            "parse-table conflict, keeping the later production"
                        );
                    }
                }
                table.insert(key, TableCell::Produce(alternative_index));
            }
        }

        if let Some(follow) = follow_sets.get(non_terminal) {
            for terminal in follow {
                table
                    .entry((non_terminal.clone(), terminal.clone()))
                    .or_insert(TableCell::Sync);
            }
        }
    }

    (table, conflicts)
}

fn director_sets(
    grammar: &Grammar,
    lhs: &NonTerminal,
    all_first_sets: &FirstSets,
    all_follow_sets: &FollowSets,
) -> Vec<HashSet<Terminal>> {
    let Some(production) = grammar.productions.get(lhs) else {
        return Vec::new();
    };

    let mut sets: Vec<HashSet<Terminal>> = Vec::new();

    for alternative in &production.alternatives {
        let (mut first_alpha, is_nullable) =
            calculate_first_of_sequence(alternative, all_first_sets);

        first_alpha.remove(&Terminal::Epsilon);

        if is_nullable {
            if let Some(follow) = all_follow_sets.get(lhs) {
                first_alpha.extend(follow.iter().cloned());
            }
        }

        sets.push(first_alpha);
    }

    sets
}

/// Column order of the rendered table: the grammar's lexeme terminals
/// sorted by display, then `$`.
fn column_terminals(grammar: &Grammar) -> Vec<Terminal> {
    let mut terminals: Vec<Terminal> = grammar.terminals().into_iter().collect();
    terminals.sort();
    terminals.push(Terminal::Eof);
    terminals
}

fn render_cell(grammar: &Grammar, nt: &NonTerminal, cell: Option<&TableCell>) -> String {
    match cell {
        Some(TableCell::Produce(index)) => {
            let alternative = &grammar.productions[nt].alternatives[*index];
            format!("{} -> {}", nt, render_alternative(alternative))
        }
        Some(TableCell::Sync) => "sync".to_string(),
        None => "-".to_string(),
    }
}

/// Lays the table out with one column per terminal and one row per
/// non-terminal; empty cells render as `-`.
pub fn to_printable_table(grammar: &Grammar, table: &ParseTable) -> Table {
    let terminals = column_terminals(grammar);

    let mut builder = tabled::builder::Builder::default();

    let mut header = vec!["PARSING TABLE (NT/T)".to_string()];
    header.extend(terminals.iter().map(|t| t.to_string()));
    builder.push_record(header);

    for nt in grammar.productions.keys() {
        let mut row = vec![nt.to_string()];
        for terminal in &terminals {
            row.push(render_cell(
                grammar,
                nt,
                table.get(&(nt.clone(), terminal.clone())),
            ));
        }
        builder.push_record(row);
    }

    builder.build()
}

/// Writes the rendered table prefixed with the UTF-8 BOM, so editors pick
/// the right encoding for the ε and arrow glyphs.
pub fn write_parse_table_file<W: Write>(
    grammar: &Grammar,
    table: &ParseTable,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(&[0xEF, 0xBB, 0xBF])?;
    writeln!(out, "{}", to_printable_table(grammar, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::normalize::normalize;

    fn tables_for(source: &str) -> (Grammar, ParseTable, FollowSets, usize) {
        let grammar = Grammar::from_source(source).unwrap();
        let first_sets = calculate_all_first_sets(&grammar);
        let follow_sets = calculate_all_follow_sets(&grammar, &first_sets);
        let (table, conflicts) = build_parse_table(&grammar, &first_sets, &follow_sets);
        (grammar, table, follow_sets, conflicts)
    }

    #[test]
    fn normalized_expression_grammar_fills_the_expected_cells() {
        let mut grammar = Grammar::from_source("E -> E + T | T").unwrap();
        assert!(normalize(&mut grammar).is_clean());

        let first_sets = calculate_all_first_sets(&grammar);
        let follow_sets = calculate_all_follow_sets(&grammar, &first_sets);
        let (table, conflicts) = build_parse_table(&grammar, &first_sets, &follow_sets);

        assert_eq!(conflicts, 0);

        let e_prime = NonTerminal::new("E'");
        // E' -> + T E' is alternative 0, E' -> ε is alternative 1.
        assert_eq!(
            table.get(&(e_prime.clone(), Terminal::lexeme("+"))),
            Some(&TableCell::Produce(0))
        );
        assert_eq!(
            table.get(&(e_prime, Terminal::Eof)),
            Some(&TableCell::Produce(1))
        );
    }

    #[test]
    fn every_follow_cell_left_empty_becomes_sync() {
        let (grammar, table, follow_sets, _) = tables_for(
            "
                S -> id = E ;
                E -> T E'
                E' -> + T E' | ε
                T -> id | num
            ",
        );

        for nt in grammar.productions.keys() {
            for terminal in &follow_sets[nt] {
                assert!(
                    table.contains_key(&(nt.clone(), terminal.clone())),
                    "({}, {}) should hold a production or sync",
                    nt,
                    terminal
                );
            }
        }
    }

    #[test]
    fn sync_marks_recovery_cells_without_productions() {
        let (_, table, _, _) = tables_for(
            "
                S -> id = E ;
                E -> id
            ",
        );

        // ';' follows E but selects no E-production.
        assert_eq!(
            table.get(&(NonTerminal::new("E"), Terminal::lexeme(";"))),
            Some(&TableCell::Sync)
        );
    }

    #[test]
    fn detects_ll1_and_non_ll1_grammars() {
        let ll1 = Grammar::from_source(
            "
                S -> A C
                A -> a | ε
                C -> b | ε
            ",
        )
        .unwrap();
        assert!(is_ll1(&ll1));

        let non_ll1 = Grammar::from_source("S -> a b | a c").unwrap();
        assert!(!is_ll1(&non_ll1));
    }

    #[test]
    fn conflicting_cells_are_counted_and_last_writer_wins() {
        let (_, table, _, conflicts) = tables_for("S -> a b | a c");

        assert_eq!(conflicts, 1);
        assert_eq!(
            table.get(&(NonTerminal::new("S"), Terminal::lexeme("a"))),
            Some(&TableCell::Produce(1))
        );
    }

    #[test]
    fn printable_table_renders_dashes_for_empty_cells() {
        let (grammar, table, _, _) = tables_for("S -> a | ε");

        let rendered = to_printable_table(&grammar, &table).to_string();
        assert!(rendered.contains("PARSING TABLE (NT/T)"));
        assert!(rendered.contains("S -> a"));
        assert!(rendered.contains("$"));
    }

    #[test]
    fn parse_table_file_starts_with_utf8_bom() {
        let (grammar, table, _, _) = tables_for("S -> a");

        let mut out = Vec::new();
        write_parse_table_file(&grammar, &table, &mut out).unwrap();
        assert_eq!(&out[..3], &[0xEF, 0xBB, 0xBF]);
    }
}
