use std::fmt::Display;

use ecow::EcoString;

/// A terminal symbol: a literal lexeme of the source language, the empty
/// string ε, or the end-of-input marker `$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Lexeme(EcoString),
    Epsilon,
    Eof,
}

impl Terminal {
    pub fn lexeme(s: &str) -> Self {
        Terminal::Lexeme(EcoString::from(s))
    }
}

impl Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminal::Lexeme(s) => write!(f, "{}", s),
            Terminal::Epsilon => write!(f, "ε"),
            Terminal::Eof => write!(f, "$"),
        }
    }
}

impl TryFrom<Symbol> for Terminal {
    type Error = String;

    fn try_from(value: Symbol) -> Result<Self, Self::Error> {
        match value {
            Symbol::Terminal(t) => Ok(t),
            Symbol::NonTerminal(nt) => {
                Err(format!("Cannot convert NonTerminal {:?} to Terminal", nt))
            }
        }
    }
}

/// A non-terminal, named by the left-hand side it appears on. Fresh
/// non-terminals introduced by grammar rewriting carry prime markers
/// appended to the parent's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonTerminal(pub EcoString);

impl NonTerminal {
    pub fn new(s: &str) -> Self {
        NonTerminal(EcoString::from(s))
    }
}

impl Display for NonTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Symbol> for NonTerminal {
    type Error = String;

    fn try_from(value: Symbol) -> Result<Self, Self::Error> {
        match value {
            Symbol::NonTerminal(nt) => Ok(nt),
            Symbol::Terminal(t) => Err(format!("Cannot convert Terminal {:?} to NonTerminal", t)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Terminal(Terminal::Epsilon))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "{}", t),
            Symbol::NonTerminal(nt) => write!(f, "{}", nt),
        }
    }
}

/// One ordered right-hand side. The empty production is the single symbol ε.
pub type Alternative = Vec<Symbol>;

/// Renders an alternative the way it appears in grammar files, symbols
/// separated by single spaces.
pub fn render_alternative(alternative: &[Symbol]) -> String {
    if alternative.is_empty() {
        return "ε".to_string();
    }
    alternative
        .iter()
        .map(|sym| sym.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: NonTerminal,
    pub alternatives: Vec<Alternative>,
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let alts_str: Vec<String> = self
            .alternatives
            .iter()
            .map(|alt| render_alternative(alt))
            .collect();

        let rhs = if alts_str.is_empty() {
            "ε".to_string()
        } else {
            alts_str.join(" | ")
        };

        write!(f, "{} -> {}", self.lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_meta_terminals_with_their_markers() {
        assert_eq!(Terminal::Epsilon.to_string(), "ε");
        assert_eq!(Terminal::Eof.to_string(), "$");
        assert_eq!(Terminal::lexeme("while").to_string(), "while");
    }

    #[test]
    fn converts_symbol_into_terminal_or_non_terminal() {
        let t = Symbol::Terminal(Terminal::lexeme("id"));
        let nt = Symbol::NonTerminal(NonTerminal::new("<expr>"));

        assert_eq!(Terminal::try_from(t.clone()), Ok(Terminal::lexeme("id")));
        assert!(Terminal::try_from(nt.clone()).is_err());
        assert_eq!(NonTerminal::try_from(nt), Ok(NonTerminal::new("<expr>")));
        assert!(NonTerminal::try_from(t).is_err());
    }

    #[test]
    fn renders_production_with_alternatives_and_epsilon() {
        let production = Production {
            lhs: NonTerminal::new("<stmt>"),
            alternatives: vec![
                vec![
                    Symbol::Terminal(Terminal::lexeme("id")),
                    Symbol::NonTerminal(NonTerminal::new("<rest>")),
                ],
                vec![Symbol::Terminal(Terminal::Epsilon)],
            ],
        };

        assert_eq!(production.to_string(), "<stmt> -> id <rest> | ε");
    }
}
