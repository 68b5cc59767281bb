use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SgfError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    /// The file adapter could not read its input. Never produced by the core.
    #[error("Could not read {path}")]
    #[diagnostic(code(sgf::io), help("Check that the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl SgfError {
    /// The 1-based line and column of a lexer or parser error.
    #[must_use]
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            SgfError::Lexer(err) => Some(err.location()),
            SgfError::Parser(err) => Some(err.location()),
            SgfError::Io { .. } => None,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexerError {
    #[error("Invalid character {ch:?} [line {line}, column {column}]")]
    #[diagnostic(
        code(lexer::invalid_character),
        help("Outside of values only '(', ')', ';', '[', whitespace and uppercase identifiers are allowed.")
    )]
    InvalidCharacter {
        ch: char,
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("unexpected character")]
        span: SourceSpan,
    },

    #[error("Value left open [line {line}, column {column}]")]
    #[diagnostic(
        code(lexer::value_left_open),
        help("Every '[' must be closed by an unescaped ']'.")
    )]
    ValueLeftOpen {
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this value is never closed")]
        span: SourceSpan,
    },
}

impl LexerError {
    #[must_use]
    pub fn location(&self) -> (usize, usize) {
        match self {
            LexerError::InvalidCharacter { line, column, .. }
            | LexerError::ValueLeftOpen { line, column, .. } => (*line, *column),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Collection must start with a new tree [line {line}, column {column}]")]
    #[diagnostic(
        code(parser::missing_tree_start),
        help("Every game tree in a collection begins with '('.")
    )]
    MissingTreeStart {
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("expected '(' here")]
        span: SourceSpan,
    },

    #[error("New node must follow the start of a tree [line {line}, column {column}]")]
    #[diagnostic(
        code(parser::missing_node_start),
        help("A tree opens with a node: write '(;' before any property or subtree.")
    )]
    MissingNodeStart {
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("expected ';' here")]
        span: SourceSpan,
    },

    #[error("Cannot have a property value without a property ident [line {line}, column {column}]")]
    #[diagnostic(
        code(parser::value_without_ident),
        help("Values belong to a property: write an identifier such as 'C' before '['.")
    )]
    ValueWithoutIdent {
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this value has no property")]
        span: SourceSpan,
    },

    #[error("A property ident must be followed by a value [line {line}, column {column}]")]
    #[diagnostic(
        code(parser::ident_without_value),
        help("Every property carries at least one '[value]'.")
    )]
    IdentWithoutValue {
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("expected '[' here")]
        span: SourceSpan,
    },

    #[error("Tree did not close properly [line {line}, column {column}]")]
    #[diagnostic(
        code(parser::unclosed_tree),
        help("Every '(' needs a matching ')'.")
    )]
    UnclosedTree {
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("input ended after this token")]
        span: SourceSpan,
    },
}

impl ParserError {
    #[must_use]
    pub fn location(&self) -> (usize, usize) {
        match self {
            ParserError::MissingTreeStart { line, column, .. }
            | ParserError::MissingNodeStart { line, column, .. }
            | ParserError::ValueWithoutIdent { line, column, .. }
            | ParserError::IdentWithoutValue { line, column, .. }
            | ParserError::UnclosedTree { line, column, .. } => (*line, *column),
        }
    }
}

/// The first structural violation found by [`crate::validator::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("collection does not contain any trees")]
    EmptyCollection,

    #[error("{tree} does not contain any nodes")]
    EmptyTree { tree: TreePath },

    #[error("{tree}, node {node}, property {property} has an empty ident")]
    EmptyIdent {
        tree: TreePath,
        node: usize,
        property: usize,
    },

    #[error("{tree}, node {node}, property {property} ({ident}) has no values")]
    MissingValues {
        tree: TreePath,
        node: usize,
        property: usize,
        ident: String,
    },
}

/// Position of a tree inside a collection: the root index followed by the
/// child index taken at each nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreePath(pub Vec<usize>);

impl std::fmt::Display for TreePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tree ")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}
