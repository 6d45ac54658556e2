//! The derivation tree, stored as a flat arena of nodes addressed by
//! integer ids so repeated occurrences of the same non-terminal stay
//! distinct.

use std::io::{self, Write};

use crate::model::types::Symbol;

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    pub symbol: Symbol,
    pub children: Vec<NodeId>,
}

/// Rooted ordered tree. The root is the start symbol; interior nodes are
/// expanded non-terminals; leaves are terminals or ε.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    pub fn new(root: Symbol) -> Self {
        ParseTree {
            nodes: vec![Node {
                symbol: root,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a new leaf under `parent` and returns its id. Order of
    /// insertion is the order of the applied production's symbols.
    pub fn add_child(&mut self, parent: NodeId, symbol: Symbol) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            symbol,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Prints the tree depth-first, four spaces of indentation per level,
    /// each line prefixed with the tree marker.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_node(out, self.root(), 0)
    }

    fn write_node<W: Write>(&self, out: &mut W, id: NodeId, depth: usize) -> io::Result<()> {
        writeln!(out, "{}|====> {}", "    ".repeat(depth), self.nodes[id].symbol)?;
        for &child in &self.nodes[id].children {
            self.write_node(out, child, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{NonTerminal, Terminal};

    fn nt(name: &str) -> Symbol {
        Symbol::NonTerminal(NonTerminal::new(name))
    }

    fn t(name: &str) -> Symbol {
        Symbol::Terminal(Terminal::lexeme(name))
    }

    #[test]
    fn keeps_repeated_non_terminal_occurrences_distinct() {
        let mut tree = ParseTree::new(nt("S"));
        let left = tree.add_child(tree.root(), nt("A"));
        let right = tree.add_child(tree.root(), nt("A"));
        tree.add_child(left, t("a"));
        tree.add_child(right, t("b"));

        assert_ne!(left, right);
        assert_eq!(tree.node(left).children.len(), 1);
        assert_eq!(tree.node(right).children.len(), 1);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn renders_depth_first_with_indent_and_marker() {
        let mut tree = ParseTree::new(nt("S"));
        let a = tree.add_child(tree.root(), nt("A"));
        tree.add_child(a, t("x"));
        tree.add_child(tree.root(), t(";"));

        let mut out = Vec::new();
        tree.write_to(&mut out).unwrap();
        let rendered = String::from_utf8(out).unwrap();

        assert_eq!(
            rendered,
            "|====> S\n    |====> A\n        |====> x\n    |====> ;\n"
        );
    }

    #[test]
    fn epsilon_leaf_renders_with_its_marker() {
        let mut tree = ParseTree::new(nt("A"));
        tree.add_child(tree.root(), Symbol::Terminal(Terminal::Epsilon));

        let mut out = Vec::new();
        tree.write_to(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "|====> A\n    |====> ε\n");
    }
}
