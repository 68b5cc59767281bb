use crate::ast::{Collection, Node, Property, Tree};
use crate::error::{ParserError, SgfError};
use crate::lexer::{Lexer, Token, TokenType};
use miette::NamedSource;
use std::sync::Arc;

/// Where the parser is in the grammar:
///
/// ```text
/// collection := tree+
/// tree       := '(' node (node | tree)* ')'
/// node       := ';' property*
/// property   := IDENT value+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Between root trees; only `(` may follow.
    Collection,
    /// Right after `(`; only `;` may follow.
    TreeBody,
    /// Inside a node; properties, values, `;`, `(` and `)` may follow.
    Node,
    /// Right after a property ident; a value must follow.
    Value,
}

/// A deterministic state machine turning SGF tokens into a [`Collection`].
///
/// Nested trees are tracked on an explicit stack of unfinished parents rather
/// than by recursion, so deeply nested input cannot exhaust the call stack.
#[derive(Debug)]
pub struct Parser {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
}

/// Mutable state of one parse run.
struct Machine {
    state: ParserState,
    collection: Collection,
    /// Unfinished trees, innermost last. The innermost one receives nodes
    /// and children. Empty exactly in the `Collection` state.
    open: Vec<Tree>,
    /// Whether the last property of the last node may still take values.
    property_open: bool,
}

impl Parser {
    pub fn new(source_text: &str) -> Result<Self, SgfError> {
        Self::new_with_name(source_text, "source.sgf".to_string())
    }

    /// Lexes `source_text`; `name` is used in diagnostics.
    pub fn new_with_name(source_text: &str, name: String) -> Result<Self, SgfError> {
        let tokens = Lexer::new_with_name(source_text, name.clone()).lex()?;
        Ok(Self::from_tokens(tokens, name, source_text))
    }

    /// Builds a parser over an already lexed token sequence.
    /// `source_text` is only used to render diagnostics.
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>, name: String, source_text: &str) -> Self {
        Self {
            source: Arc::new(NamedSource::new(name, source_text.to_string())),
            tokens,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Consumes the tokens and returns the collection. The first grammar
    /// violation aborts; no partial tree is returned.
    ///
    /// An empty token sequence yields an empty collection.
    pub fn parse_collection(&self) -> Result<Collection, SgfError> {
        let mut machine = Machine {
            state: ParserState::Collection,
            collection: Collection::new(),
            open: Vec::new(),
            property_open: false,
        };

        for token in &self.tokens {
            let next = self.step(&mut machine, token)?;
            if next != machine.state {
                log::trace!(
                    "{:?} -> {:?} at line {}, column {}",
                    machine.state,
                    next,
                    token.line,
                    token.column
                );
            }
            machine.state = next;
        }

        if machine.state != ParserState::Collection {
            // Non-collection states are only reachable after a token.
            let last = self.tokens.last().map_or((1, 1, 0, 0), |t| {
                (t.line, t.column, t.pos_start, t.pos_end - t.pos_start)
            });
            return Err(ParserError::UnclosedTree {
                line: last.0,
                column: last.1,
                src: (*self.source).clone(),
                span: (last.2, last.3).into(),
            }
            .into());
        }

        log::debug!("parsed {} game tree(s)", machine.collection.len());
        Ok(machine.collection)
    }

    fn step(&self, m: &mut Machine, token: &Token) -> Result<ParserState, SgfError> {
        match m.state {
            ParserState::Collection => match token.ttype {
                TokenType::TreeStart => {
                    m.open.push(Tree::new());
                    Ok(ParserState::TreeBody)
                }
                _ => Err(self.error(token, ParserErrorKind::MissingTreeStart)),
            },

            ParserState::TreeBody => match token.ttype {
                TokenType::NodeStart => {
                    current_tree(m).add_node(Node::new());
                    Ok(ParserState::Node)
                }
                _ => Err(self.error(token, ParserErrorKind::MissingNodeStart)),
            },

            ParserState::Node => match &token.ttype {
                TokenType::PropertyIdent(ident) => {
                    current_node(m).add_property(Property::new(ident.clone(), Vec::<String>::new()));
                    m.property_open = true;
                    Ok(ParserState::Value)
                }
                TokenType::PropertyValue(value) => {
                    if !m.property_open {
                        return Err(self.error(token, ParserErrorKind::ValueWithoutIdent));
                    }
                    push_value(m, value);
                    Ok(ParserState::Node)
                }
                TokenType::NodeStart => {
                    current_tree(m).add_node(Node::new());
                    m.property_open = false;
                    Ok(ParserState::Node)
                }
                TokenType::TreeStart => {
                    m.property_open = false;
                    m.open.push(Tree::new());
                    Ok(ParserState::TreeBody)
                }
                TokenType::TreeEnd => {
                    m.property_open = false;
                    let finished = m
                        .open
                        .pop()
                        .expect("a tree is open in the Node state");
                    match m.open.last_mut() {
                        None => {
                            m.collection.add_tree(finished);
                            Ok(ParserState::Collection)
                        }
                        Some(parent) => {
                            parent.add_child(finished);
                            Ok(ParserState::Node)
                        }
                    }
                }
            },

            ParserState::Value => match &token.ttype {
                TokenType::PropertyValue(value) => {
                    push_value(m, value);
                    Ok(ParserState::Node)
                }
                _ => Err(self.error(token, ParserErrorKind::IdentWithoutValue)),
            },
        }
    }

    fn error(&self, token: &Token, kind: ParserErrorKind) -> SgfError {
        let line = token.line;
        let column = token.column;
        let src = (*self.source).clone();
        let span = (token.pos_start, token.pos_end - token.pos_start).into();
        match kind {
            ParserErrorKind::MissingTreeStart => ParserError::MissingTreeStart {
                line,
                column,
                src,
                span,
            },
            ParserErrorKind::MissingNodeStart => ParserError::MissingNodeStart {
                line,
                column,
                src,
                span,
            },
            ParserErrorKind::ValueWithoutIdent => ParserError::ValueWithoutIdent {
                line,
                column,
                src,
                span,
            },
            ParserErrorKind::IdentWithoutValue => ParserError::IdentWithoutValue {
                line,
                column,
                src,
                span,
            },
        }
        .into()
    }
}

#[derive(Debug, Clone, Copy)]
enum ParserErrorKind {
    MissingTreeStart,
    MissingNodeStart,
    ValueWithoutIdent,
    IdentWithoutValue,
}

// Broken state machine invariants are bugs in this module, not input errors.

fn current_tree(m: &mut Machine) -> &mut Tree {
    m.open
        .last_mut()
        .expect("a tree is open outside the Collection state")
}

fn current_node(m: &mut Machine) -> &mut Node {
    current_tree(m)
        .nodes_mut()
        .last_mut()
        .expect("the open tree has a node in the Node and Value states")
}

fn push_value(m: &mut Machine, value: &str) {
    current_node(m)
        .properties_mut()
        .last_mut()
        .expect("a property is open when a value is accepted")
        .values
        .push(value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::{GraphicalReportHandler, Report};

    // Renders either outcome, errors as a miette report.
    fn pretty_result(out: Result<Collection, SgfError>) -> String {
        match out {
            Ok(collection) => format!("{collection:#?}"),
            Err(err) => {
                let report: Report = Report::new(err);
                let handler = GraphicalReportHandler::new();
                let mut buffer = String::new();
                if handler.render_report(&mut buffer, &*report).is_err() {
                    return format!("{report:?}");
                }
                buffer
            }
        }
    }

    fn parse_ok(source: &str) -> Collection {
        let parser = Parser::new_with_name(source, "test.sgf".to_string()).unwrap();
        match parser.parse_collection() {
            Ok(collection) => collection,
            Err(err) => {
                let report = Report::from(err);
                panic!("{report:#}");
            }
        }
    }

    fn parse_err(source: &str) -> ParserError {
        match Parser::new(source).and_then(|p| p.parse_collection()) {
            Err(SgfError::Parser(err)) => err,
            other => panic!("expected a parser error for {source:?}, got {}", pretty_result(other)),
        }
    }

    fn props(node: &Node) -> Vec<(String, Vec<String>)> {
        node.properties()
            .iter()
            .map(|p| (p.ident.clone(), p.values.clone()))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let collection = parse_ok("");
        assert!(collection.is_empty());
    }

    #[test]
    fn test_minimal_tree() {
        let collection = parse_ok("(;)");
        assert_eq!(collection.len(), 1);
        let tree = &collection.trees()[0];
        assert_eq!(tree.nodes().len(), 1);
        assert!(tree.nodes()[0].properties().is_empty());
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_properties() {
        let collection = parse_ok("(;FF[4]GM[1])");
        assert_eq!(
            props(&collection.trees()[0].nodes()[0]),
            vec![
                ("FF".to_string(), vec!["4".to_string()]),
                ("GM".to_string(), vec!["1".to_string()]),
            ]
        );
    }

    #[test]
    fn test_multiple_values() {
        let collection = parse_ok("(;AW[bb][ee]\n[dc] B[cd])");
        assert_eq!(
            props(&collection.trees()[0].nodes()[0]),
            vec![
                ("AW".to_string(), vec!["bb".into(), "ee".into(), "dc".into()]),
                ("B".to_string(), vec!["cd".to_string()]),
            ]
        );
    }

    #[test]
    fn test_empty_nodes() {
        let collection = parse_ok("(;;)");
        assert_eq!(collection.trees()[0].nodes().len(), 2);
    }

    #[test]
    fn test_nested_trees() {
        let collection = parse_ok("(;FF[4](;B[qd];W[ob](;B[aa]))(;W[pe]))");
        let root = &collection.trees()[0];
        assert_eq!(root.nodes().len(), 1);
        assert_eq!(root.children().len(), 2);

        let first = &root.children()[0];
        assert_eq!(first.nodes().len(), 2);
        assert_eq!(first.children().len(), 1);
        assert_eq!(props(&first.children()[0].nodes()[0])[0].0, "B");

        let second = &root.children()[1];
        assert_eq!(props(&second.nodes()[0])[0].1, vec!["pe".to_string()]);
    }

    #[test]
    fn test_node_after_child_tree() {
        let collection = parse_ok("(;A[1](;B[2]);C[3])");
        let root = &collection.trees()[0];
        assert_eq!(root.nodes().len(), 2);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_multiple_root_trees() {
        let collection = parse_ok("(;FF[4])\n(;FF[3])");
        assert_eq!(collection.len(), 2);
        assert_eq!(props(&collection.trees()[1].nodes()[0])[0].1, vec!["3".to_string()]);
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 20_000;
        let source = format!("{}{}", "(;".repeat(depth), ")".repeat(depth));
        let collection = parse_ok(&source);
        assert_eq!(collection.len(), 1);
        assert!(collection.is_valid());
        assert_eq!(collection.to_sgf(&crate::SgfFormat::NO_NEW_LINES), source);
        drop(collection);
    }

    #[test]
    fn test_open_trees_are_closed_in_order() {
        let collection = parse_ok("(;A[1](;B[2](;C[3]));D[4])");
        let root = &collection.trees()[0];
        assert_eq!(root.nodes().len(), 2);
        let child = &root.children()[0];
        assert_eq!(props(&child.nodes()[0])[0].0, "B");
        assert_eq!(props(&child.children()[0].nodes()[0])[0].0, "C");
    }

    #[test]
    fn test_from_tokens() {
        let tokens = Lexer::new("(;C[x])").lex().unwrap();
        let parser = Parser::from_tokens(tokens, "pre-lexed".to_string(), "(;C[x])");
        assert_eq!(parser.tokens().len(), 5);
        assert_eq!(parser.parse_collection().unwrap().len(), 1);
    }

    #[test]
    fn test_collection_must_start_with_tree() {
        let err = parse_err("FF(;)");
        assert!(matches!(err, ParserError::MissingTreeStart { .. }));
        assert_eq!(err.location(), (1, 1));
    }

    #[test]
    fn test_node_must_follow_tree_start() {
        assert!(matches!(parse_err("(F"), ParserError::MissingNodeStart { .. }));
        assert!(matches!(parse_err("(;(C[1]))"), ParserError::MissingNodeStart { .. }));
    }

    #[test]
    fn test_value_without_ident() {
        let err = parse_err("(;[V]");
        assert!(matches!(err, ParserError::ValueWithoutIdent { .. }));
        assert_eq!(err.location(), (1, 3));
    }

    #[test]
    fn test_value_after_node_start_without_ident() {
        assert!(matches!(parse_err("(;A[1];[2])"), ParserError::ValueWithoutIdent { .. }));
    }

    #[test]
    fn test_ident_without_value() {
        assert!(matches!(parse_err("(;FF;"), ParserError::IdentWithoutValue { .. }));
        assert!(matches!(parse_err("(;FF)"), ParserError::IdentWithoutValue { .. }));
    }

    #[test]
    fn test_unclosed_tree() {
        let err = parse_err("(;\n(;B[aa])");
        assert!(matches!(err, ParserError::UnclosedTree { .. }));
        assert_eq!(err.location(), (2, 8));
        assert_eq!(err.to_string(), "Tree did not close properly [line 2, column 8]");
    }

    #[test]
    fn test_unclosed_tree_after_ident() {
        assert!(matches!(parse_err("(;"), ParserError::UnclosedTree { .. }));
        assert!(matches!(parse_err("("), ParserError::UnclosedTree { .. }));
    }

    #[test]
    fn test_lexer_errors_pass_through() {
        let result = Parser::new("(;ff[1])");
        assert!(matches!(result, Err(SgfError::Lexer(_))));
    }
}
