use crate::ast::{Collection, Tree};
use crate::error::{TreePath, ValidationError};

/// Checks the structural invariants required before serialization.
///
/// A collection is not valid if:
/// - it does not have any trees,
/// - any tree (at any depth) does not have any nodes,
/// - any property has an empty ident or no values.
#[must_use]
pub fn is_valid(collection: &Collection) -> bool {
    validate(collection).is_ok()
}

/// Like [`is_valid`], but reports the first violation in document order.
pub fn validate(collection: &Collection) -> Result<(), ValidationError> {
    if collection.is_empty() {
        return Err(ValidationError::EmptyCollection);
    }

    let mut path = TreePath::default();
    for (index, root) in collection.trees().iter().enumerate() {
        path.0.push(index);
        validate_nodes(root, &path)?;

        // (tree, index of the next child to visit); `path` mirrors the stack.
        let mut stack = vec![(root, 0usize)];
        while let Some((tree, next)) = stack.last_mut() {
            let tree: &Tree = *tree;
            match tree.children().get(*next) {
                Some(child) => {
                    path.0.push(*next);
                    *next += 1;
                    validate_nodes(child, &path)?;
                    stack.push((child, 0));
                }
                None => {
                    stack.pop();
                    path.0.pop();
                }
            }
        }
    }
    Ok(())
}

fn validate_nodes(tree: &Tree, path: &TreePath) -> Result<(), ValidationError> {
    if tree.nodes().is_empty() {
        return Err(ValidationError::EmptyTree { tree: path.clone() });
    }

    for (node_index, node) in tree.nodes().iter().enumerate() {
        for (property_index, property) in node.properties().iter().enumerate() {
            if property.ident.is_empty() {
                return Err(ValidationError::EmptyIdent {
                    tree: path.clone(),
                    node: node_index,
                    property: property_index,
                });
            }
            if property.values.is_empty() {
                return Err(ValidationError::MissingValues {
                    tree: path.clone(),
                    node: node_index,
                    property: property_index,
                    ident: property.ident.clone(),
                });
            }
        }
    }
    Ok(())
}
