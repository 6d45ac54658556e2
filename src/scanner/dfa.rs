//! The four deterministic finite automata behind the classifier cascade.
//!
//! Each machine is a fixed 2-D state-transition table indexed by
//! `(state, column)`, where a column mapper folds a character into one of a
//! handful of character classes. A negative entry rejects.

/// Transition entry that rejects the input.
const REJECT: i8 = -1;
/// Transition entry for states that accept only if no further input
/// arrives; any attempt to consume past them rejects.
const FINAL: i8 = -2;

pub(super) struct Dfa<const COLS: usize> {
    table: &'static [[i8; COLS]],
    accepting: &'static [i8],
    column: fn(char) -> usize,
}

impl<const COLS: usize> Dfa<COLS> {
    /// Runs the machine over `input` from state 0. Returns the final state
    /// when the whole input is consumed and the machine lands in an
    /// accepting state.
    pub(super) fn run(&self, input: &str) -> Option<i8> {
        let mut state: i8 = 0;
        for c in input.chars() {
            state = self.table[state as usize][(self.column)(c)];
            if state < 0 {
                return None;
            }
        }
        self.accepting.contains(&state).then_some(state)
    }
}

/// Identifier machine: a letter or `_` start, then letters, digits and `_`.
/// State 1 is "saw a leading underscore", which must be followed by at least
/// one more identifier character.
pub(super) static IDENTIFIER: Dfa<4> = Dfa {
    // Columns: letter, digit, '_', other
    table: &[
        [2, REJECT, 1, REJECT],
        [3, 3, 3, REJECT],
        [2, 2, 3, REJECT],
        [3, 3, 3, REJECT],
        [REJECT, REJECT, REJECT, REJECT],
    ],
    accepting: &[2, 3],
    column: identifier_column,
};

/// Number machine: optional sign, integer part, optional fraction, optional
/// exponent with its own optional sign. Accepting states are those reached
/// after at least one digit in the significand or exponent.
pub(super) static NUMBER: Dfa<5> = Dfa {
    // Columns: digit, sign, '.', e/E, other
    table: &[
        [2, 1, 3, REJECT, REJECT],
        [2, REJECT, 3, REJECT, REJECT],
        [2, REJECT, 4, 5, REJECT],
        [4, REJECT, REJECT, REJECT, REJECT],
        [4, REJECT, REJECT, 5, REJECT],
        [7, 6, REJECT, REJECT, REJECT],
        [7, REJECT, REJECT, REJECT, REJECT],
        [7, REJECT, REJECT, REJECT, REJECT],
    ],
    accepting: &[2, 4, 7],
    column: number_column,
};

/// Punctuation machine: exactly one bracket character, nothing after it.
pub(super) static PUNCTUATION: Dfa<7> = Dfa {
    // Columns: '[', '{', '<', '>', '}', ']', other
    table: &[
        [1, 1, 1, 1, 1, 1, REJECT],
        [FINAL, FINAL, FINAL, FINAL, FINAL, FINAL, FINAL],
    ],
    accepting: &[1],
    column: punctuation_column,
};

/// Operator machine. State 13 collects the two-character operators; the
/// single-character states 5–9 and 12 are accepting on their own, so `:`,
/// `*`, `+`, `/`, `-` and `%` stand alone while `!`, `<`, `>`, `=`, `&` and
/// `|` must combine.
pub(super) static OPERATOR: Dfa<13> = Dfa {
    // Columns: !, <, >, =, :, *, +, /, -, &, |, %, other
    table: &[
        [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, REJECT],
        [REJECT, REJECT, REJECT, 13, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, 13, 13, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, 13, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, 13, 13, 13, 4, REJECT, 13, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, 13, 13, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, 13, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, 13, REJECT, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, 13, REJECT, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, 13, REJECT, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, 13, REJECT],
        [REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT, REJECT],
    ],
    accepting: &[5, 6, 7, 8, 9, 12, 13],
    column: operator_column,
};

fn identifier_column(c: char) -> usize {
    if c.is_ascii_alphabetic() {
        0
    } else if c.is_ascii_digit() {
        1
    } else if c == '_' {
        2
    } else {
        3
    }
}

fn number_column(c: char) -> usize {
    if c.is_ascii_digit() {
        0
    } else if c == '+' || c == '-' {
        1
    } else if c == '.' {
        2
    } else if c == 'e' || c == 'E' {
        3
    } else {
        4
    }
}

pub(super) fn punctuation_column(c: char) -> usize {
    match c {
        '[' => 0,
        '{' => 1,
        '<' => 2,
        '>' => 3,
        '}' => 4,
        ']' => 5,
        _ => 6,
    }
}

pub(super) fn is_punctuation_char(c: char) -> bool {
    punctuation_column(c) < 6
}

fn operator_column(c: char) -> usize {
    match c {
        '!' => 0,
        '<' => 1,
        '>' => 2,
        '=' => 3,
        ':' => 4,
        '*' => 5,
        '+' => 6,
        '/' => 7,
        '-' => 8,
        '&' => 9,
        '|' => 10,
        '%' => 11,
        _ => 12,
    }
}

pub(super) fn identifier(token: &str) -> bool {
    IDENTIFIER.run(token).is_some()
}

pub(super) fn number(token: &str) -> bool {
    NUMBER.run(token).is_some()
}

pub(super) fn punctuation(token: &str) -> bool {
    PUNCTUATION.run(token).is_some()
}

pub(super) fn operator(token: &str) -> bool {
    OPERATOR.run(token).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_machine_accepts_legal_starts_only() {
        assert!(identifier("foo"));
        assert!(identifier("x"));
        assert!(identifier("_tmp1"));
        assert!(identifier("snake_case_9"));

        assert!(!identifier(""));
        assert!(!identifier("_"));
        assert!(!identifier("9lives"));
        assert!(!identifier("a-b"));
    }

    #[test]
    fn number_machine_accepts_significand_and_exponent_forms() {
        assert!(number("0"));
        assert!(number("42"));
        assert!(number("-7"));
        assert!(number("3.14"));
        assert!(number(".5"));
        assert!(number("3."));
        assert!(number("3.14e-2"));
        assert!(number("1E8"));

        assert!(!number(""));
        assert!(!number("+"));
        assert!(!number("."));
        assert!(!number("1e"));
        assert!(!number("1e+"));
        assert!(!number("12a"));
    }

    #[test]
    fn punctuation_machine_accepts_exactly_one_bracket() {
        for p in ["[", "{", "<", ">", "}", "]"] {
            assert!(punctuation(p), "expected '{}' to be punctuation", p);
        }
        assert!(!punctuation("[["));
        assert!(!punctuation("(,"));
        assert!(!punctuation(""));
    }

    #[test]
    fn operator_machine_matches_the_encoded_alphabet() {
        for op in [
            "!=", "<>", "<<", ">>", "==", "=>", "=<", "=+", "=:=", ":=", "::", ":", "*", "+",
            "++", "/", "-", "--", "%", "&&", "||",
        ] {
            assert!(operator(op), "expected '{}' to be an operator", op);
        }

        // Single '<', '>', '=', '!', '&', '|' never reach an accepting state.
        for not_op in ["<", ">", "=", "!", "&", "|", "<=", "=!", "abc", ""] {
            assert!(!operator(not_op), "expected '{}' to be rejected", not_op);
        }
    }
}
