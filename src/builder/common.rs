use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use tabled::Table;

use crate::model::{
    grammar::Grammar,
    types::{NonTerminal, Symbol, Terminal},
};

/// FIRST sets with nullability, keyed by non-terminal. The terminal set may
/// contain ε; the flag mirrors it for cheap sequence walks.
pub type FirstSets = HashMap<NonTerminal, (HashSet<Terminal>, bool)>;

/// FOLLOW sets keyed by non-terminal. ε is never a member; `$` belongs to
/// the start symbol's set.
pub type FollowSets = HashMap<NonTerminal, HashSet<Terminal>>;

/// Computes the least fixed point of FIRST over all non-terminals.
pub fn calculate_all_first_sets(grammar: &Grammar) -> FirstSets {
    let mut first_sets: FirstSets = grammar
        .productions
        .keys()
        .map(|nt| (nt.clone(), (HashSet::new(), false)))
        .collect();

    let mut changed = true;

    while changed {
        changed = false;

        for (nt, production) in &grammar.productions {
            let (current_set, is_nullable) = &first_sets[nt];
            let old_size = current_set.len();
            let old_nullable = *is_nullable;

            let mut new_first_set = current_set.clone();
            let mut new_is_nullable = old_nullable;

            for alternative in &production.alternatives {
                let (first_of_alternative, alternative_nullable) =
                    calculate_first_of_sequence(alternative, &first_sets);

                new_first_set.extend(first_of_alternative);

                if alternative_nullable {
                    new_is_nullable = true;
                }
            }

            if new_first_set.len() > old_size || new_is_nullable != old_nullable {
                changed = true;
                first_sets.insert(nt.clone(), (new_first_set, new_is_nullable));
            }
        }
    }

    first_sets
}

/// FIRST of a symbol sequence under the current (possibly still growing)
/// FIRST sets: terminals cut the walk short, nullable non-terminals let it
/// continue, and a fully nullable sequence contributes ε.
pub fn calculate_first_of_sequence(
    sequence: &[Symbol],
    current_first_sets: &FirstSets,
) -> (HashSet<Terminal>, bool) {
    let mut terminals: HashSet<Terminal> = HashSet::new();
    let mut is_sequence_nullable = true;

    for x_i in sequence {
        match x_i {
            Symbol::Terminal(terminal) => {
                terminals.insert(terminal.clone());
                if *terminal != Terminal::Epsilon {
                    is_sequence_nullable = false;
                    break;
                }
            }
            Symbol::NonTerminal(non_terminal) => {
                if let Some((first_xi, is_nullable)) = current_first_sets.get(non_terminal) {
                    terminals.extend(
                        first_xi
                            .iter()
                            .filter(|t| **t != Terminal::Epsilon)
                            .cloned(),
                    );
                    if !is_nullable {
                        is_sequence_nullable = false;
                        break;
                    }
                } else {
                    is_sequence_nullable = false;
                    break;
                }
            }
        }
    }

    if is_sequence_nullable {
        terminals.insert(Terminal::Epsilon);
    }

    (terminals, is_sequence_nullable)
}

/// Computes the fixed point of FOLLOW. `$` seeds the start symbol; for each
/// occurrence `A → α B β`, FIRST(β)\{ε} flows into FOLLOW(B), and FOLLOW(A)
/// follows it whenever β is empty or nullable.
pub fn calculate_all_follow_sets(grammar: &Grammar, all_first_sets: &FirstSets) -> FollowSets {
    let mut follow_sets: FollowSets = grammar
        .productions
        .keys()
        .map(|nt| (nt.clone(), HashSet::new()))
        .collect();

    follow_sets
        .entry(grammar.start.clone())
        .or_default()
        .insert(Terminal::Eof);

    let mut changed = true;

    while changed {
        changed = false;

        for (b, production) in &grammar.productions {
            for alternative in &production.alternatives {
                for (i, symbol_a) in alternative.iter().enumerate() {
                    let Symbol::NonTerminal(a) = symbol_a else {
                        continue;
                    };

                    let mut new_symbols: HashSet<Terminal> = HashSet::new();
                    let beta = &alternative[i + 1..];

                    if !beta.is_empty() {
                        let (first_beta, beta_nullable) =
                            calculate_first_of_sequence(beta, all_first_sets);

                        new_symbols.extend(
                            first_beta
                                .iter()
                                .filter(|t| **t != Terminal::Epsilon)
                                .cloned(),
                        );

                        if beta_nullable {
                            if let Some(follow_b) = follow_sets.get(b) {
                                new_symbols.extend(follow_b.iter().cloned());
                            }
                        }
                    } else if let Some(follow_b) = follow_sets.get(b) {
                        new_symbols.extend(follow_b.iter().cloned());
                    }

                    let follow_a = follow_sets.entry(a.clone()).or_default();
                    let initial_size = follow_a.len();

                    follow_a.extend(new_symbols);

                    if follow_a.len() > initial_size {
                        changed = true;
                    }
                }
            }
        }
    }

    follow_sets
}

fn sorted_terminals(set: &HashSet<Terminal>) -> Vec<String> {
    let mut terminals: Vec<String> = set.iter().map(|t| t.to_string()).collect();
    terminals.sort();
    terminals
}

pub fn to_first_set_table(grammar: &Grammar, first_sets: &FirstSets) -> Table {
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(["FIRST SET OF", "TERMINALS"]);

    for nt in grammar.productions.keys() {
        let Some((set, is_nullable)) = first_sets.get(nt) else {
            continue;
        };
        builder.push_record([
            format!("FIRST({})", nt),
            format!(
                "{} (is_nullable: {})",
                sorted_terminals(set).join(" "),
                is_nullable
            ),
        ]);
    }

    builder.build()
}

pub fn to_follow_set_table(grammar: &Grammar, follow_sets: &FollowSets) -> Table {
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(["FOLLOW SET OF", "TERMINALS"]);

    for nt in grammar.productions.keys() {
        let Some(set) = follow_sets.get(nt) else {
            continue;
        };
        builder.push_record([
            format!("FOLLOW({})", nt),
            sorted_terminals(set).join(" "),
        ]);
    }

    builder.build()
}

/// Writes `FIRST(X) = { ... }` lines, one per non-terminal in grammar order.
pub fn write_first_sets<W: Write>(
    grammar: &Grammar,
    first_sets: &FirstSets,
    out: &mut W,
) -> io::Result<()> {
    for nt in grammar.productions.keys() {
        let Some((set, _)) = first_sets.get(nt) else {
            continue;
        };
        writeln!(out, "FIRST({}) = {{ {} }}", nt, sorted_terminals(set).join(" "))?;
    }
    Ok(())
}

/// Writes `FOLLOW(X) = { ... }` lines, one per non-terminal in grammar order.
pub fn write_follow_sets<W: Write>(
    grammar: &Grammar,
    follow_sets: &FollowSets,
    out: &mut W,
) -> io::Result<()> {
    for nt in grammar.productions.keys() {
        let Some(set) = follow_sets.get(nt) else {
            continue;
        };
        writeln!(out, "FOLLOW({}) = {{ {} }}", nt, sorted_terminals(set).join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_of(grammar: &Grammar, name: &str) -> (HashSet<Terminal>, bool) {
        calculate_all_first_sets(grammar)[&NonTerminal::new(name)].clone()
    }

    #[test]
    fn calculates_first_set_with_no_epsilon() {
        let grammar = Grammar::from_source(
            "
                S -> A C
                A -> a C | B
                B -> b
                C -> b
            ",
        )
        .unwrap();

        let (first_set, is_nullable) = first_of(&grammar, "S");

        assert_eq!(
            first_set,
            HashSet::from([Terminal::lexeme("a"), Terminal::lexeme("b")])
        );
        assert!(!is_nullable);
    }

    #[test]
    fn calculates_first_set_and_nullability_with_explicit_epsilon() {
        let grammar = Grammar::from_source(
            "
                S -> A C
                A -> a | ε
                B -> b
                C -> B | ε
            ",
        )
        .unwrap();

        let (a_first, a_nullable) = first_of(&grammar, "A");
        assert_eq!(
            a_first,
            HashSet::from([Terminal::lexeme("a"), Terminal::Epsilon])
        );
        assert!(a_nullable);

        let (b_first, b_nullable) = first_of(&grammar, "B");
        assert_eq!(b_first, HashSet::from([Terminal::lexeme("b")]));
        assert!(!b_nullable);

        let (s_first, s_nullable) = first_of(&grammar, "S");
        assert_eq!(
            s_first,
            HashSet::from([
                Terminal::lexeme("a"),
                Terminal::lexeme("b"),
                Terminal::Epsilon
            ])
        );
        assert!(s_nullable);
    }

    #[test]
    fn calculates_follow_sets_with_explicit_epsilon() {
        let grammar = Grammar::from_source(
            "
                S -> A C
                A -> a | ε
                B -> b
                C -> B | ε
            ",
        )
        .unwrap();

        let first_sets = calculate_all_first_sets(&grammar);
        let follow = calculate_all_follow_sets(&grammar, &first_sets);

        assert_eq!(
            follow[&NonTerminal::new("S")],
            HashSet::from([Terminal::Eof])
        );
        assert_eq!(
            follow[&NonTerminal::new("A")],
            HashSet::from([Terminal::lexeme("b"), Terminal::Eof])
        );
        assert_eq!(
            follow[&NonTerminal::new("B")],
            HashSet::from([Terminal::Eof])
        );
        assert_eq!(
            follow[&NonTerminal::new("C")],
            HashSet::from([Terminal::Eof])
        );
    }

    #[test]
    fn follow_sets_never_contain_epsilon() {
        let grammar = Grammar::from_source(
            "
                S -> A b A
                A -> a | ε
            ",
        )
        .unwrap();

        let first_sets = calculate_all_first_sets(&grammar);
        let follow = calculate_all_follow_sets(&grammar, &first_sets);

        for set in follow.values() {
            assert!(!set.contains(&Terminal::Epsilon));
        }
    }

    #[test]
    fn first_and_follow_are_fixed_points() {
        let grammar = Grammar::from_source(
            "
                E -> T E'
                E' -> + T E' | ε
                T -> id | num
            ",
        )
        .unwrap();

        let first_once = calculate_all_first_sets(&grammar);
        let first_twice = calculate_all_first_sets(&grammar);
        assert_eq!(first_once, first_twice);

        let follow_once = calculate_all_follow_sets(&grammar, &first_once);
        let follow_twice = calculate_all_follow_sets(&grammar, &first_once);
        assert_eq!(follow_once, follow_twice);
    }

    #[test]
    fn first_of_sequence_skips_nullable_prefixes() {
        let grammar = Grammar::from_source(
            "
                S -> A B c
                A -> a | ε
                B -> b | ε
            ",
        )
        .unwrap();

        let first_sets = calculate_all_first_sets(&grammar);
        let sequence = &grammar.productions[&NonTerminal::new("S")].alternatives[0];

        let (first, nullable) = calculate_first_of_sequence(sequence, &first_sets);

        assert_eq!(
            first,
            HashSet::from([
                Terminal::lexeme("a"),
                Terminal::lexeme("b"),
                Terminal::lexeme("c")
            ])
        );
        assert!(!nullable);
    }

    #[test]
    fn set_files_use_grammar_order_and_braces() {
        let grammar = Grammar::from_source("S -> a A\nA -> b").unwrap();
        let first_sets = calculate_all_first_sets(&grammar);
        let follow_sets = calculate_all_follow_sets(&grammar, &first_sets);

        let mut out = Vec::new();
        write_first_sets(&grammar, &first_sets, &mut out).unwrap();
        let first_text = String::from_utf8(out).unwrap();
        assert_eq!(first_text, "FIRST(S) = { a }\nFIRST(A) = { b }\n");

        let mut out = Vec::new();
        write_follow_sets(&grammar, &follow_sets, &mut out).unwrap();
        let follow_text = String::from_utf8(out).unwrap();
        assert_eq!(follow_text, "FOLLOW(S) = { $ }\nFOLLOW(A) = { $ }\n");
    }
}
