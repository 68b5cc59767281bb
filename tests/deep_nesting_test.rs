// Very deep variation chains must be usable end to end, not only parsed.
use sgf_core::{parse, validate, Collection, SgfFormat, Tree};

const DEPTH: usize = 20_000;

fn nested_source(depth: usize) -> String {
    format!("{}{}", "(;".repeat(depth), ")".repeat(depth))
}

fn parse_deep() -> Collection {
    parse(&nested_source(DEPTH)).unwrap()
}

fn depth_of(tree: &Tree) -> usize {
    let mut depth = 1;
    let mut current = tree;
    while let Some(child) = current.children().first() {
        depth += 1;
        current = child;
    }
    depth
}

#[test]
fn test_deep_collection_can_be_dropped() {
    let collection = parse_deep();
    assert_eq!(depth_of(&collection.trees()[0]), DEPTH);
    drop(collection);
}

#[test]
fn test_deep_collection_is_valid() {
    let collection = parse_deep();
    assert!(collection.is_valid());
    assert_eq!(validate(&collection), Ok(()));
}

#[test]
fn test_deep_collection_round_trips() {
    let source = nested_source(DEPTH);
    let collection = parse(&source).unwrap();
    assert_eq!(collection.to_sgf(&SgfFormat::NO_NEW_LINES), source);

    let one_tree_per_line = SgfFormat {
        indentation: 0,
        ..SgfFormat::DEFAULT
    };
    let text = collection.to_sgf(&one_tree_per_line);
    assert_eq!(text.lines().count(), DEPTH);
    assert_eq!(parse(&text).unwrap(), collection);
}

#[test]
fn test_deep_collection_clone_and_compare() {
    let collection = parse_deep();
    let copy = collection.clone();
    assert_eq!(copy, collection);
    assert_ne!(copy.trees()[0].id(), collection.trees()[0].id());

    let mut edited = copy.clone();
    let mut tree = &mut edited.trees_mut()[0];
    while !tree.children().is_empty() {
        tree = &mut tree.children_mut()[0];
    }
    tree.nodes_mut()[0].new_property("C", ["leaf"]);
    assert_ne!(edited, collection);
}

#[test]
fn test_deep_branch_removed_and_dropped() {
    let mut collection = parse_deep();
    let branch = collection.trees_mut()[0].remove_child_at(0);
    assert_eq!(depth_of(&branch), DEPTH - 1);
    drop(branch);
    assert_eq!(collection.to_sgf(&SgfFormat::NO_NEW_LINES), "(;)");
}
