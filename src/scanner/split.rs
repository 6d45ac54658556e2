//! Lexeme splitters: each peels off the part of a candidate that cannot
//! belong to the attempted class, leaving a head for DFA validation and a
//! tail that gets re-classified.

use ecow::EcoString;

use super::dfa;

fn is_identifier_like(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// If the candidate ends in a non-alphabetic character, the head is
/// everything but that last character.
pub(super) fn keyword(candidate: &str) -> (&str, &str) {
    match candidate.chars().next_back() {
        Some(last) if !last.is_ascii_alphabetic() => {
            candidate.split_at(candidate.len() - last.len_utf8())
        }
        _ => (candidate, ""),
    }
}

/// The head is the longest prefix ending at the last alphanumeric-or-`_`
/// character; anything after it is the tail.
pub(super) fn identifier(candidate: &str) -> (&str, &str) {
    let mut pos = candidate.len();
    for (idx, c) in candidate.char_indices().rev() {
        if is_identifier_like(c) {
            break;
        }
        pos = idx;
    }
    candidate.split_at(pos)
}

/// The head is the longest prefix ending at a digit, `.`, `e` or `E`.
pub(super) fn number(candidate: &str) -> (&str, &str) {
    let mut pos = candidate.len();
    for (idx, c) in candidate.char_indices().rev() {
        if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' {
            break;
        }
        pos = idx;
    }
    candidate.split_at(pos)
}

/// Scans from the front for a punctuation character. If it leads the
/// candidate, it becomes the head and the remainder the tail; if it is
/// preceded by other characters, those become the head (and will fail
/// punctuation validation, sending the cascade onward).
pub(super) fn punctuation(candidate: &str) -> (&str, &str) {
    for (idx, c) in candidate.char_indices() {
        if dfa::is_punctuation_char(c) {
            return if idx == 0 {
                candidate.split_at(c.len_utf8())
            } else {
                candidate.split_at(idx)
            };
        }
    }
    (candidate, "")
}

/// Peels runs of identifier-like characters from both ends. If both ends
/// are identifier-like the whole candidate is the head (and will fail
/// operator validation); otherwise the interior is the head and the
/// stripped characters, concatenated, are the tail.
pub(super) fn operator(candidate: &str) -> (&str, EcoString) {
    let mut start = 0;
    for (idx, c) in candidate.char_indices() {
        if !is_identifier_like(c) {
            start = idx;
            break;
        }
        start = idx + c.len_utf8();
    }

    let mut end = candidate.len();
    for (idx, c) in candidate[start..].char_indices().rev() {
        if !is_identifier_like(c) {
            end = start + idx + c.len_utf8();
            break;
        }
        end = start + idx;
    }

    let has_start = start > 0;
    let has_end = end < candidate.len();
    if has_start && has_end {
        return (candidate, EcoString::new());
    }

    let mut tail = EcoString::from(&candidate[..start]);
    tail.push_str(&candidate[end..]);
    (&candidate[start..end], tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_splitter_peels_one_trailing_non_letter() {
        assert_eq!(keyword("while"), ("while", ""));
        assert_eq!(keyword("while{"), ("while", "{"));
        assert_eq!(keyword("if9"), ("if", "9"));
        assert_eq!(keyword("x"), ("x", ""));
    }

    #[test]
    fn identifier_splitter_trims_trailing_non_identifier_run() {
        assert_eq!(identifier("foo"), ("foo", ""));
        assert_eq!(identifier("foo=="), ("foo", "=="));
        assert_eq!(identifier("a1_!"), ("a1_", "!"));
        assert_eq!(identifier("=="), ("", "=="));
    }

    #[test]
    fn number_splitter_trims_trailing_non_number_run() {
        assert_eq!(number("3.14e-2x"), ("3.14e-2", "x"));
        assert_eq!(number("42"), ("42", ""));
        assert_eq!(number("1.5!!"), ("1.5", "!!"));
        assert_eq!(number("!!"), ("", "!!"));
    }

    #[test]
    fn punctuation_splitter_cuts_at_first_bracket() {
        assert_eq!(punctuation("[rest"), ("[", "rest"));
        assert_eq!(punctuation("ab[cd"), ("ab", "[cd"));
        assert_eq!(punctuation("abc"), ("abc", ""));
        assert_eq!(punctuation("{"), ("{", ""));
    }

    #[test]
    fn operator_splitter_extracts_the_interior() {
        let (head, tail) = operator("x++");
        assert_eq!(head, "++");
        assert_eq!(tail, "x");

        let (head, tail) = operator("--y");
        assert_eq!(head, "--");
        assert_eq!(tail, "y");

        let (head, tail) = operator("=:=");
        assert_eq!(head, "=:=");
        assert_eq!(tail, "");

        // Identifier-like runs on both ends keep the candidate whole.
        let (head, tail) = operator("a+b");
        assert_eq!(head, "a+b");
        assert_eq!(tail, "");
    }
}
