use crate::ast::{Collection, Node, Tree};
use crate::validator::validate;
use serde::{Deserialize, Serialize};

/// Controls the layout of the text produced by [`to_sgf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgfFormat {
    /// Put each child tree on its own, indented line.
    pub new_line_between_trees: bool,
    /// Also put each node on its own line. Only honored together with
    /// `new_line_between_trees`.
    pub new_line_between_nodes: bool,
    /// Spaces per nesting level.
    pub indentation: usize,
}

impl SgfFormat {
    pub const DEFAULT: SgfFormat = SgfFormat {
        new_line_between_trees: true,
        new_line_between_nodes: true,
        indentation: 4,
    };

    /// Everything on a single line, the inverse of parsing.
    pub const NO_NEW_LINES: SgfFormat = SgfFormat {
        new_line_between_trees: false,
        new_line_between_nodes: false,
        indentation: 0,
    };
}

impl Default for SgfFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Converts the collection to SGF text.
///
/// Property idents are written as they are. Only idents made of uppercase
/// ASCII letters can be parsed back.
///
/// # Panics
///
/// Panics if the collection is not structurally valid: malformed structure
/// has no textual form.
#[must_use]
pub fn to_sgf(collection: &Collection, format: &SgfFormat) -> String {
    if let Err(violation) = validate(collection) {
        panic!("collection is not valid: {violation}");
    }

    let mut out = String::new();
    for root in collection.trees() {
        open_tree(&mut out, root, format, 0);

        // (tree, index of the next child to write); the stack depth is the
        // nesting level of the next child.
        let mut stack = vec![(root, 0usize)];
        while let Some((tree, next)) = stack.last_mut() {
            let tree: &Tree = *tree;
            match tree.children().get(*next) {
                Some(child) => {
                    *next += 1;
                    open_tree(&mut out, child, format, stack.len());
                    stack.push((child, 0));
                }
                None => {
                    out.push(')');
                    stack.pop();
                }
            }
        }
    }
    out
}

/// Writes everything up to the first child: the opening `(` and the nodes.
fn open_tree(out: &mut String, tree: &Tree, format: &SgfFormat, level: usize) {
    if format.new_line_between_trees && level > 0 {
        out.push('\n');
        indent(out, format, level);
    }

    out.push('(');

    for (i, node) in tree.nodes().iter().enumerate() {
        if format.new_line_between_trees && format.new_line_between_nodes && i > 0 {
            out.push('\n');
            indent(out, format, level);
            // Line up with the node after the opening '('.
            out.push(' ');
        }
        write_node(out, node);
    }
}

fn write_node(out: &mut String, node: &Node) {
    out.push(';');
    for property in node.properties() {
        out.push_str(&property.ident);
        for value in &property.values {
            out.push('[');
            escape_value(out, value);
            out.push(']');
        }
    }
}

fn escape_value(out: &mut String, value: &str) {
    for c in value.chars() {
        if c == '\\' || c == ']' {
            out.push('\\');
        }
        out.push(c);
    }
}

fn indent(out: &mut String, format: &SgfFormat, level: usize) {
    out.extend(std::iter::repeat(' ').take(format.indentation * level));
}
