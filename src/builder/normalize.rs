//! Grammar normalization: immediate left-recursion elimination followed by
//! first-symbol left factoring. Both rewrites introduce fresh non-terminals
//! named by appending prime markers to the parent's name.
//!
//! Only the immediate form of left recursion is handled, and factoring
//! groups alternatives by their first symbol only; longer common prefixes
//! fall out of repeated factoring passes.

use indexmap::IndexMap;

use crate::model::grammar::Grammar;
use crate::model::types::{Alternative, NonTerminal, Production, Symbol, Terminal};

/// Residual ambiguity after normalization. Either flag set means the
/// grammar cannot be driven through the LL(1) pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalization {
    pub left_recursive: bool,
    pub left_factorable: bool,
}

impl Normalization {
    pub fn is_clean(&self) -> bool {
        !self.left_recursive && !self.left_factorable
    }
}

/// Rewrites the grammar in place, left recursion first, then left
/// factoring to a fixed point, and reports what survived.
pub fn normalize(grammar: &mut Grammar) -> Normalization {
    if has_left_recursion(grammar) {
        remove_left_recursion(grammar);
    }

    // One factoring pass splits off a single shared symbol; alternatives
    // sharing a longer prefix need another round for the fresh non-terminal.
    let mut passes = grammar.productions.len();
    while has_left_factoring(grammar) && passes > 0 {
        remove_left_factoring(grammar);
        passes -= 1;
    }

    Normalization {
        left_recursive: has_left_recursion(grammar),
        left_factorable: has_left_factoring(grammar),
    }
}

/// True if some production `A → A α` exists.
pub fn has_left_recursion(grammar: &Grammar) -> bool {
    grammar.productions.iter().any(|(lhs, production)| {
        production
            .alternatives
            .iter()
            .any(|alt| starts_with(alt, lhs))
    })
}

/// True if some non-terminal has two alternatives sharing a first symbol.
pub fn has_left_factoring(grammar: &Grammar) -> bool {
    for production in grammar.productions.values() {
        let mut seen = Vec::new();
        for alternative in &production.alternatives {
            let Some(first) = alternative.first() else {
                continue;
            };
            if seen.contains(&first) {
                return true;
            }
            seen.push(first);
        }
    }
    false
}

/// For each `A → A α₁ | … | A αₘ | β₁ | … | βₙ` introduces a fresh `A'` and
/// rewrites to `A → βⱼ A'` and `A' → αᵢ A' | ε`. Non-recursive rules are
/// left untouched.
pub fn remove_left_recursion(grammar: &mut Grammar) {
    let originals: Vec<NonTerminal> = grammar.productions.keys().cloned().collect();

    for lhs in originals {
        let (alpha, beta): (Vec<Alternative>, Vec<Alternative>) = grammar.productions[&lhs]
            .alternatives
            .iter()
            .cloned()
            .partition(|alt| starts_with(alt, &lhs));

        if alpha.is_empty() {
            continue;
        }

        let fresh = fresh_non_terminal(grammar, &lhs);

        let mut base_alternatives = Vec::with_capacity(beta.len());
        for mut b in beta {
            b.push(Symbol::NonTerminal(fresh.clone()));
            base_alternatives.push(b);
        }

        let mut recursive_alternatives = Vec::with_capacity(alpha.len() + 1);
        for a in alpha {
            let mut rest: Alternative = a[1..].to_vec();
            rest.push(Symbol::NonTerminal(fresh.clone()));
            recursive_alternatives.push(rest);
        }
        recursive_alternatives.push(vec![Symbol::Terminal(Terminal::Epsilon)]);

        grammar.productions[&lhs].alternatives = base_alternatives;
        grammar.productions.insert(
            fresh.clone(),
            Production {
                lhs: fresh,
                alternatives: recursive_alternatives,
            },
        );
    }
}

/// Groups each non-terminal's alternatives by first symbol; every group of
/// two or more sharing a symbol `x` becomes `A → x A'` with `A'` holding the
/// remainders (ε for an exhausted remainder). Singleton groups pass through.
pub fn remove_left_factoring(grammar: &mut Grammar) {
    let originals: Vec<NonTerminal> = grammar.productions.keys().cloned().collect();

    for lhs in originals {
        let alternatives = grammar.productions[&lhs].alternatives.clone();

        let mut groups: IndexMap<Symbol, Vec<Alternative>> = IndexMap::new();
        for alternative in &alternatives {
            let Some(first) = alternative.first() else {
                continue;
            };
            groups
                .entry(first.clone())
                .or_default()
                .push(alternative.clone());
        }

        if groups.len() == alternatives.len() {
            continue;
        }

        let mut rebuilt = Vec::new();
        for (prefix, group) in groups {
            if group.len() == 1 {
                rebuilt.extend(group);
                continue;
            }

            let fresh = fresh_non_terminal(grammar, &lhs);
            rebuilt.push(vec![prefix, Symbol::NonTerminal(fresh.clone())]);

            let remainders: Vec<Alternative> = group
                .into_iter()
                .map(|alternative| {
                    let rest: Alternative = alternative[1..].to_vec();
                    if rest.is_empty() {
                        vec![Symbol::Terminal(Terminal::Epsilon)]
                    } else {
                        rest
                    }
                })
                .collect();

            grammar.productions.insert(
                fresh.clone(),
                Production {
                    lhs: fresh,
                    alternatives: remainders,
                },
            );
        }

        grammar.productions[&lhs].alternatives = rebuilt;
    }
}

fn starts_with(alternative: &Alternative, lhs: &NonTerminal) -> bool {
    matches!(alternative.first(), Some(Symbol::NonTerminal(nt)) if nt == lhs)
}

/// Appends prime markers to the base name until the result collides with no
/// existing non-terminal.
fn fresh_non_terminal(grammar: &Grammar, base: &NonTerminal) -> NonTerminal {
    let mut candidate = NonTerminal(ecow::eco_format!("{}'", base.0));
    while grammar.productions.contains_key(&candidate) {
        candidate.0.push('\'');
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::render_alternative;

    fn alternatives_of(grammar: &Grammar, name: &str) -> Vec<String> {
        grammar.productions[&NonTerminal::new(name)]
            .alternatives
            .iter()
            .map(|alt| render_alternative(alt))
            .collect()
    }

    #[test]
    fn rewrites_immediately_left_recursive_rule() {
        let mut grammar = Grammar::from_source("E -> E + T | T").unwrap();

        assert!(has_left_recursion(&grammar));
        remove_left_recursion(&mut grammar);

        assert!(!has_left_recursion(&grammar));
        assert_eq!(alternatives_of(&grammar, "E"), vec!["T E'"]);
        assert_eq!(alternatives_of(&grammar, "E'"), vec!["+ T E'", "ε"]);
    }

    #[test]
    fn leaves_non_recursive_rules_untouched() {
        let mut grammar = Grammar::from_source("S -> a S | b").unwrap();
        let before = grammar.productions.clone();

        remove_left_recursion(&mut grammar);

        assert_eq!(grammar.productions, before);
    }

    #[test]
    fn factors_alternatives_sharing_a_first_symbol() {
        let mut grammar = Grammar::from_source("A -> a B | a C | b").unwrap();

        assert!(has_left_factoring(&grammar));
        remove_left_factoring(&mut grammar);

        assert!(!has_left_factoring(&grammar));
        assert_eq!(alternatives_of(&grammar, "A"), vec!["a A'", "b"]);
        assert_eq!(alternatives_of(&grammar, "A'"), vec!["B", "C"]);
    }

    #[test]
    fn factoring_an_exhausted_remainder_yields_epsilon() {
        let mut grammar = Grammar::from_source("A -> a B | a").unwrap();

        remove_left_factoring(&mut grammar);

        assert_eq!(alternatives_of(&grammar, "A'"), vec!["B", "ε"]);
    }

    #[test]
    fn fresh_names_stay_unique_across_rewrites() {
        let mut grammar =
            Grammar::from_source("A -> a B | a C\nA' -> d").unwrap();

        remove_left_factoring(&mut grammar);

        // A' was taken, so the rewrite appends a second prime.
        assert_eq!(alternatives_of(&grammar, "A"), vec!["a A''"]);
        assert_eq!(alternatives_of(&grammar, "A''"), vec!["B", "C"]);
    }

    #[test]
    fn normalize_runs_factoring_to_a_fixed_point() {
        // The alternatives share a two-symbol prefix; one pass leaves the
        // fresh non-terminal factorable again.
        let mut grammar = Grammar::from_source("A -> a b c | a b d").unwrap();

        let residual = normalize(&mut grammar);

        assert!(residual.is_clean());
        assert!(!has_left_factoring(&grammar));
        assert_eq!(alternatives_of(&grammar, "A"), vec!["a A'"]);
        assert_eq!(alternatives_of(&grammar, "A'"), vec!["b A''"]);
        assert_eq!(alternatives_of(&grammar, "A''"), vec!["c", "d"]);
    }

    #[test]
    fn normalize_reports_residual_ambiguity() {
        // Indirect left recursion is out of scope for the rewrite, so the
        // recursion detector stays quiet while factoring stays clean.
        let mut grammar = Grammar::from_source("S -> A a\nA -> S b | c").unwrap();

        let residual = normalize(&mut grammar);

        assert!(residual.is_clean());
        assert!(!has_left_recursion(&grammar));
    }

    #[test]
    fn epsilon_beta_keeps_its_place_in_the_rewrite() {
        let mut grammar = Grammar::from_source("A -> A a | ε").unwrap();

        remove_left_recursion(&mut grammar);

        assert_eq!(alternatives_of(&grammar, "A"), vec!["ε A'"]);
        assert_eq!(alternatives_of(&grammar, "A'"), vec!["a A'", "ε"]);
    }
}
