//! The in-memory game record: a [`Collection`] of [`Tree`]s, each holding a
//! trunk of [`Node`]s and a list of child trees, each node holding an ordered
//! list of [`Property`] values.
//!
//! Every tree, node and property carries a typed handle ([`TreeId`],
//! [`NodeId`], [`PropertyId`]) so callers can address an item by identity even
//! when another item has identical content. Handles are unique for the life of
//! the process and are never reused; a clone gets fresh handles.
//!
//! Swapping or removing by an unknown handle or an out-of-range index is a
//! caller bug and panics. Use the `*_index` lookups first when presence is
//! uncertain.

use crate::serialization::{to_sgf, SgfFormat};
use crate::validator;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            fn fresh() -> Self {
                Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// Identity of a [`Tree`].
    TreeId
);
handle!(
    /// Identity of a [`Node`].
    NodeId
);
handle!(
    /// Identity of a [`Property`].
    PropertyId
);

/// Items that live in an ordered container and can be found by handle.
trait Identified {
    type Id: Copy + PartialEq + fmt::Display;
    const KIND: &'static str;

    fn handle(&self) -> Self::Id;
}

fn index_of<T: Identified>(items: &[T], id: T::Id) -> Option<usize> {
    items.iter().position(|item| item.handle() == id)
}

#[track_caller]
fn require_index<T: Identified>(items: &[T], id: T::Id) -> usize {
    match index_of(items, id) {
        Some(index) => index,
        None => panic!("{} {id} is not in this container", T::KIND),
    }
}

#[track_caller]
fn require_in_bounds<T: Identified>(items: &[T], index: usize) {
    if index >= items.len() {
        panic!(
            "{} index {index} out of bounds (len {})",
            T::KIND,
            items.len()
        );
    }
}

#[track_caller]
fn swap_at<T: Identified>(items: &mut [T], i: usize, j: usize) {
    require_in_bounds(items, i);
    require_in_bounds(items, j);
    items.swap(i, j);
}

#[track_caller]
fn swap_by_id<T: Identified>(items: &mut [T], a: T::Id, b: T::Id) {
    let i = require_index(items, a);
    let j = require_index(items, b);
    items.swap(i, j);
}

#[track_caller]
fn remove_at<T: Identified>(items: &mut Vec<T>, index: usize) -> T {
    require_in_bounds(items, index);
    items.remove(index)
}

#[track_caller]
fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: T::Id) -> T {
    let index = require_index(items, id);
    items.remove(index)
}

// --- Collection ---

/// The root forest of trees parsed from one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    trees: Vec<Tree>,
}

impl Collection {
    /// An empty collection. It is not valid for serialization until it holds
    /// at least one tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Mutable access to the trees in place. Adding or removing trees goes
    /// through the methods below.
    pub fn trees_mut(&mut self) -> &mut [Tree] {
        &mut self.trees
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Appends a tree and returns its handle.
    pub fn add_tree(&mut self, tree: Tree) -> TreeId {
        let id = tree.id;
        self.trees.push(tree);
        id
    }

    /// Appends a new tree that already holds one empty node.
    pub fn new_tree(&mut self) -> &mut Tree {
        self.trees.push(Tree::with_root_node());
        let index = self.trees.len() - 1;
        &mut self.trees[index]
    }

    #[must_use]
    pub fn tree_index(&self, id: TreeId) -> Option<usize> {
        index_of(&self.trees, id)
    }

    #[must_use]
    pub fn tree(&self, id: TreeId) -> Option<&Tree> {
        self.trees.iter().find(|tree| tree.id == id)
    }

    pub fn tree_mut(&mut self, id: TreeId) -> Option<&mut Tree> {
        self.trees.iter_mut().find(|tree| tree.id == id)
    }

    /// # Panics
    ///
    /// Panics if either tree is not part of this collection.
    #[track_caller]
    pub fn swap_trees(&mut self, a: TreeId, b: TreeId) {
        swap_by_id(&mut self.trees, a, b);
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[track_caller]
    pub fn swap_trees_at(&mut self, i: usize, j: usize) {
        swap_at(&mut self.trees, i, j);
    }

    /// Removes the tree and returns it, shifting later trees left.
    ///
    /// # Panics
    ///
    /// Panics if the tree is not part of this collection.
    #[track_caller]
    pub fn remove_tree(&mut self, id: TreeId) -> Tree {
        remove_by_id(&mut self.trees, id)
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn remove_tree_at(&mut self, index: usize) -> Tree {
        remove_at(&mut self.trees, index)
    }

    /// See [`validator::is_valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        validator::is_valid(self)
    }

    /// Renders the collection as SGF text.
    ///
    /// # Panics
    ///
    /// Panics if the collection is not valid, see [`validator::validate`].
    #[must_use]
    pub fn to_sgf(&self, format: &SgfFormat) -> String {
        to_sgf(self, format)
    }
}

// --- Tree ---

/// A trunk of nodes plus nested child trees (branches).
///
/// Cloning, comparing and dropping work at any nesting depth. The derived
/// `Debug` and `Serialize` impls recurse once per level, so printing or
/// exporting a tree nested many thousands of levels deep can overflow the
/// stack.
#[derive(Debug, Serialize)]
pub struct Tree {
    #[serde(skip)]
    id: TreeId,
    nodes: Vec<Node>,
    children: Vec<Tree>,
}

impl Tree {
    /// A tree without nodes. Add at least one node before serializing it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: TreeId::fresh(),
            nodes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A tree holding one empty node.
    #[must_use]
    pub fn with_root_node() -> Self {
        let mut tree = Self::new();
        tree.add_node(Node::new());
        tree
    }

    #[must_use]
    pub fn id(&self) -> TreeId {
        self.id
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    #[must_use]
    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Tree] {
        &mut self.children
    }

    // Nodes

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Appends an empty node and returns it.
    pub fn new_node(&mut self) -> &mut Node {
        self.nodes.push(Node::new());
        let index = self.nodes.len() - 1;
        &mut self.nodes[index]
    }

    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        index_of(&self.nodes, id)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// # Panics
    ///
    /// Panics if either node is not part of this tree's trunk.
    #[track_caller]
    pub fn swap_nodes(&mut self, a: NodeId, b: NodeId) {
        swap_by_id(&mut self.nodes, a, b);
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[track_caller]
    pub fn swap_nodes_at(&mut self, i: usize, j: usize) {
        swap_at(&mut self.nodes, i, j);
    }

    /// # Panics
    ///
    /// Panics if the node is not part of this tree's trunk.
    #[track_caller]
    pub fn remove_node(&mut self, id: NodeId) -> Node {
        remove_by_id(&mut self.nodes, id)
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn remove_node_at(&mut self, index: usize) -> Node {
        remove_at(&mut self.nodes, index)
    }

    // Child trees

    pub fn add_child(&mut self, tree: Tree) -> TreeId {
        let id = tree.id;
        self.children.push(tree);
        id
    }

    /// Appends a child tree that already holds one empty node.
    pub fn new_child(&mut self) -> &mut Tree {
        self.children.push(Tree::with_root_node());
        let index = self.children.len() - 1;
        &mut self.children[index]
    }

    #[must_use]
    pub fn child_index(&self, id: TreeId) -> Option<usize> {
        index_of(&self.children, id)
    }

    #[must_use]
    pub fn child(&self, id: TreeId) -> Option<&Tree> {
        self.children.iter().find(|tree| tree.id == id)
    }

    pub fn child_mut(&mut self, id: TreeId) -> Option<&mut Tree> {
        self.children.iter_mut().find(|tree| tree.id == id)
    }

    /// # Panics
    ///
    /// Panics if either tree is not a direct child of this tree.
    #[track_caller]
    pub fn swap_children(&mut self, a: TreeId, b: TreeId) {
        swap_by_id(&mut self.children, a, b);
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[track_caller]
    pub fn swap_children_at(&mut self, i: usize, j: usize) {
        swap_at(&mut self.children, i, j);
    }

    /// # Panics
    ///
    /// Panics if the tree is not a direct child of this tree.
    #[track_caller]
    pub fn remove_child(&mut self, id: TreeId) -> Tree {
        remove_by_id(&mut self.children, id)
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn remove_child_at(&mut self, index: usize) -> Tree {
        remove_at(&mut self.children, index)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

// Clone, PartialEq and Drop walk the branches with an explicit stack so that
// arbitrarily deep trees do not exhaust the call stack.

impl Tree {
    /// Copies the nodes under a fresh handle, without children.
    fn shallow_clone(&self) -> Self {
        Self {
            id: TreeId::fresh(),
            nodes: self.nodes.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }
}

impl Clone for Tree {
    fn clone(&self) -> Self {
        let mut root = self.shallow_clone();
        // Descendants whose children are still being copied, innermost last.
        let mut stack: Vec<(&Tree, Tree)> = Vec::new();
        loop {
            let (source, copy) = match stack.last_mut() {
                Some((source, copy)) => (*source, copy),
                None => (self, &mut root),
            };
            match source.children.get(copy.children.len()) {
                Some(child) => stack.push((child, child.shallow_clone())),
                None => match stack.pop() {
                    Some((_, done)) => match stack.last_mut() {
                        Some((_, parent)) => parent.children.push(done),
                        None => root.children.push(done),
                    },
                    None => return root,
                },
            }
        }
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.nodes != b.nodes || a.children.len() != b.children.len() {
                return false;
            }
            pending.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut tree) = pending.pop() {
            pending.append(&mut tree.children);
        }
    }
}

impl Identified for Tree {
    type Id = TreeId;
    const KIND: &'static str = "tree";

    fn handle(&self) -> TreeId {
        self.id
    }
}

// --- Node ---

/// One step along a trunk: an ordered list of properties.
#[derive(Debug, Serialize)]
pub struct Node {
    #[serde(skip)]
    id: NodeId,
    properties: Vec<Property>,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NodeId::fresh(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }

    /// The first property with the given identifier.
    #[must_use]
    pub fn property(&self, ident: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.ident == ident)
    }

    pub fn add_property(&mut self, property: Property) -> PropertyId {
        let id = property.id;
        self.properties.push(property);
        id
    }

    /// Appends a property built from `ident` and `values` and returns it.
    pub fn new_property<I, V>(&mut self, ident: impl Into<String>, values: I) -> &mut Property
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.properties.push(Property::new(ident, values));
        let index = self.properties.len() - 1;
        &mut self.properties[index]
    }

    #[must_use]
    pub fn property_index(&self, id: PropertyId) -> Option<usize> {
        index_of(&self.properties, id)
    }

    #[must_use]
    pub fn property_by_id(&self, id: PropertyId) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn property_by_id_mut(&mut self, id: PropertyId) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.id == id)
    }

    /// # Panics
    ///
    /// Panics if either property is not part of this node.
    #[track_caller]
    pub fn swap_properties(&mut self, a: PropertyId, b: PropertyId) {
        swap_by_id(&mut self.properties, a, b);
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[track_caller]
    pub fn swap_properties_at(&mut self, i: usize, j: usize) {
        swap_at(&mut self.properties, i, j);
    }

    /// # Panics
    ///
    /// Panics if the property is not part of this node.
    #[track_caller]
    pub fn remove_property(&mut self, id: PropertyId) -> Property {
        remove_by_id(&mut self.properties, id)
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn remove_property_at(&mut self, index: usize) -> Property {
        remove_at(&mut self.properties, index)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            id: NodeId::fresh(),
            properties: self.properties.clone(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
    }
}

impl Identified for Node {
    type Id = NodeId;
    const KIND: &'static str = "node";

    fn handle(&self) -> NodeId {
        self.id
    }
}

// --- Property ---

/// A named, multi-valued attribute. Values hold the unescaped text.
#[derive(Debug, Serialize)]
pub struct Property {
    #[serde(skip)]
    id: PropertyId,
    pub ident: String,
    pub values: Vec<String>,
}

impl Property {
    /// Any non-empty `ident` passes validation, but only idents made of
    /// uppercase ASCII letters (`A`..=`Z`) can be parsed back from the
    /// serialized text.
    pub fn new<I, V>(ident: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            id: PropertyId::fresh(),
            ident: ident.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }
}

impl Clone for Property {
    fn clone(&self) -> Self {
        Self {
            id: PropertyId::fresh(),
            ident: self.ident.clone(),
            values: self.values.clone(),
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.ident == other.ident && self.values == other.values
    }
}

impl Identified for Property {
    type Id = PropertyId;
    const KIND: &'static str = "property";

    fn handle(&self) -> PropertyId {
        self.id
    }
}
