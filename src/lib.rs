//! Lexer, parser, tree editor and formatter for Smart Game Format (SGF)
//! game records.
//!
//! ```
//! use sgf_core::{parse, SgfFormat};
//!
//! let mut collection = parse("(;FF[4]GM[1](;B[qd])(;W[pe]))").unwrap();
//! let tree = &mut collection.trees_mut()[0];
//! tree.swap_children_at(0, 1);
//! assert_eq!(
//!     collection.to_sgf(&SgfFormat::NO_NEW_LINES),
//!     "(;FF[4]GM[1](;W[pe])(;B[qd]))"
//! );
//! ```

pub mod api;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod serialization;
pub mod validator;

pub use api::{parse, parse_file, parse_with_name, to_json, to_yaml};
pub use ast::{Collection, Node, NodeId, Property, PropertyId, Tree, TreeId};
pub use error::{LexerError, ParserError, SgfError, ValidationError};
pub use serialization::{to_sgf, SgfFormat};
pub use validator::{is_valid, validate};
