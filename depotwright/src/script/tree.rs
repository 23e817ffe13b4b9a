//! Script tree construction.

use std::fmt;

use super::substitute::Variables;
use super::token::{Token, TokenKind};
use super::ScriptError;

/// A named node with ordered children.
///
/// `"key" "value"` becomes a node `key` with a single child `value`;
/// `"key" { ... }` becomes a node `key` whose children are the block's keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptNode {
    name: String,
    children: Vec<ScriptNode>,
}

impl ScriptNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ScriptNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[ScriptNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First child, which holds the value of a `"key" "value"` pair.
    pub fn first(&self) -> Option<&ScriptNode> {
        self.children.first()
    }

    /// Value of the first child, if any.
    pub fn value(&self) -> Option<&str> {
        self.first().map(ScriptNode::name)
    }

    /// First child whose name matches `name`, ignoring case.
    pub fn child(&self, name: &str) -> Option<&ScriptNode> {
        self.children
            .iter()
            .find(|child| child.name.eq_ignore_ascii_case(name))
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{:?}", "", self.name, indent = depth * 2)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ScriptNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Builds the tree below a root named `root_name`.
///
/// Values alternate between keys and values: the first value opens a key, the
/// next one becomes its value and closes it. Line ends and `{` reset the
/// alternation; `}` closes the current scope. Unclosed scopes at the end of the
/// input are accepted.
pub(crate) fn build_tree(
    file: &str,
    root_name: &str,
    tokens: &[Token],
    variables: &Variables,
) -> Result<ScriptNode, ScriptError> {
    // Nodes are addressed by their index path from the root
    let mut root = ScriptNode::new(root_name);
    let mut stack: Vec<Vec<usize>> = Vec::new();
    let mut key: Vec<usize> = Vec::new();
    let mut has_key = false;

    for token in tokens {
        match token.kind {
            TokenKind::Value => {
                let name = variables.expand(token.value_text());
                let parent = node_at(&mut root, &key);
                parent.children.push(ScriptNode::new(name));
                let child = parent.children.len() - 1;

                if !has_key {
                    stack.push(key.clone());
                    key.push(child);
                    has_key = true;
                } else {
                    // Always holds the entry pushed with the key
                    key = stack.pop().unwrap_or_default();
                    has_key = false;
                }
            }
            TokenKind::NewLine | TokenKind::BlockStart => has_key = false,
            TokenKind::BlockEnd => {
                key = stack.pop().ok_or_else(|| ScriptError::Syntax {
                    file: file.to_string(),
                    line: token.line + 1,
                    column: token.column + 1,
                    message: "unexpected '}'".to_string(),
                })?;
                has_key = false;
            }
            TokenKind::Comment | TokenKind::WhiteSpace => {}
        }
    }

    Ok(root)
}

fn node_at<'a>(root: &'a mut ScriptNode, path: &[usize]) -> &'a mut ScriptNode {
    let mut node = root;
    for &index in path {
        node = &mut node.children[index];
    }
    node
}
