use crate::ast::Collection;
use crate::error::SgfError;
use crate::parser::Parser;
use std::path::Path;
use std::sync::Arc;

/// Parses SGF text into a [`Collection`].
///
/// This is the primary entry point. Whitespace between tokens is ignored;
/// an empty input yields an empty collection.
///
/// # Errors
///
/// Returns an `SgfError` if the text does not lex or does not follow the
/// grammar. The error carries the line and column of the offending token.
pub fn parse(source: &str) -> Result<Collection, SgfError> {
    parse_with_name(source, "source.sgf")
}

/// Same as [`parse`], with `file_name` shown in diagnostics.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_with_name(source: &str, file_name: &str) -> Result<Collection, SgfError> {
    Parser::new_with_name(source, file_name.to_string())?.parse_collection()
}

/// Reads `path` and parses its content.
///
/// # Errors
///
/// Returns `SgfError::Io` if the file cannot be read, otherwise see [`parse`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Collection, SgfError> {
    let path = path.as_ref();
    let display = path.to_string_lossy().to_string();
    log::debug!("reading {display}");
    let source = std::fs::read_to_string(path).map_err(|err| SgfError::Io {
        path: display.clone(),
        source: Arc::new(err),
    })?;
    parse_with_name(&source, &display)
}

/// Serializes the collection's structure into a pretty-printed JSON string.
///
/// # Errors
/// Returns a `serde_json::Error` if serialization fails.
pub fn to_json(collection: &Collection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(collection)
}

/// Serializes the collection's structure into a YAML string.
///
/// # Errors
/// Returns a `serde_yaml::Error` if serialization fails.
pub fn to_yaml(collection: &Collection) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::SgfFormat;

    #[test]
    fn test_parse_then_format() {
        let collection = parse("(;FF[4]GM[1](;B[qd];W[ob])(;W[pe]))").unwrap();
        assert_eq!(
            collection.to_sgf(&SgfFormat::DEFAULT),
            "(;FF[4]GM[1]\n    (;B[qd]\n     ;W[ob])\n    (;W[pe]))"
        );
    }

    #[test]
    fn test_to_json() {
        let collection = parse("(;FF[4](;B[qd]))").unwrap();
        let json: serde_json::Value = serde_json::from_str(&to_json(&collection).unwrap()).unwrap();
        let expected = serde_json::json!({
            "trees": [{
                "nodes": [{ "properties": [{ "ident": "FF", "values": ["4"] }] }],
                "children": [{
                    "nodes": [{ "properties": [{ "ident": "B", "values": ["qd"] }] }],
                    "children": []
                }]
            }]
        });
        assert_eq!(json, expected);
    }

    #[test]
    fn test_to_yaml() {
        let collection = parse("(;C[hi])").unwrap();
        let yaml = to_yaml(&collection).unwrap();
        assert!(yaml.contains("ident: C"));
        assert!(yaml.contains("- hi"));
    }
}
