//! Schema expansion: normalizes a [FieldSchema] into a tree of typed leaves,
//! tuples and array nodes ready for layout and emission.
//!
//! Fixed array dimensions are unrolled into one child per index. A run of
//! dynamic dimensions counted from the outermost collapses into a single
//! iterating node; the first fixed dimension met while scanning inwards ends
//! the run, and whatever remains is expanded again by the same rule.

use crate::{
    errors::CompileError,
    field::{FieldSchema, Node},
    types::{Dimension, LeafType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandedKind {
    Leaf(LeafType),
    Tuple,
    /// Fixed dimension, unrolled: `components` holds one child per index.
    FixedArray(usize),
    /// Collapsed run of dynamic dimensions: `components` holds the single element.
    DynamicArray,
}

/// A node of the normalized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedField {
    pub name: String,
    pub kind: ExpandedKind,
    /// Width of a fixed leaf, 0 for dynamic leaves and aggregates.
    pub bit_size: u16,
    /// Length-prefixed on the wire: dynamic leaves and dynamic arrays.
    pub is_dynamic: bool,
    /// Number of dynamic dimensions collapsed into this node, minus one.
    pub iterations: usize,
    /// Filled in by [crate::layout::annotate] for fixed leaves.
    pub shift: Option<i32>,
    pub components: Vec<ExpandedField>,
}

impl ExpandedField {
    fn leaf(name: String, leaf: LeafType) -> Self {
        ExpandedField {
            name,
            kind: ExpandedKind::Leaf(leaf),
            bit_size: leaf.bit_size(),
            is_dynamic: leaf.is_dynamic(),
            iterations: 0,
            shift: None,
            components: Vec::new(),
        }
    }

    fn aggregate(name: String, kind: ExpandedKind, components: Vec<ExpandedField>) -> Self {
        ExpandedField {
            name,
            kind,
            bit_size: 0,
            is_dynamic: kind == ExpandedKind::DynamicArray,
            iterations: 0,
            shift: None,
            components,
        }
    }

    /// The leaf type, if this is a leaf.
    pub fn leaf_type(&self) -> Option<LeafType> {
        match self.kind {
            ExpandedKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Total number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.components.iter().map(ExpandedField::node_count).sum::<usize>()
    }
}

/// Expands `schema` into its normalized tree.
pub fn expand(schema: &FieldSchema) -> Result<ExpandedField, CompileError> {
    let node = schema.resolve()?;
    Ok(expand_node(schema.name.clone(), &node))
}

/// Expands an already resolved node.
pub fn expand_node(name: String, node: &Node) -> ExpandedField {
    match node {
        Node::Leaf(leaf) => ExpandedField::leaf(name, *leaf),
        Node::Tuple(components) => {
            let children = components
                .iter()
                .map(|c| expand_node(c.name.clone(), &c.node))
                .collect();
            ExpandedField::aggregate(name, ExpandedKind::Tuple, children)
        }
        Node::Array { element, dims } => match dims.split_last() {
            Some((Dimension::Fixed(n), rest)) => {
                let inner = Node::array(element, rest);
                let children = (0..*n)
                    .map(|i| expand_node(format!("{}[{}]", name, i), &inner))
                    .collect();
                ExpandedField::aggregate(name, ExpandedKind::FixedArray(*n), children)
            }
            Some((Dimension::Dynamic, _)) => {
                let run = dims
                    .iter()
                    .rev()
                    .take_while(|d| **d == Dimension::Dynamic)
                    .count();
                let inner = Node::array(element, &dims[..dims.len() - run]);

                let mut field = ExpandedField::aggregate(
                    name.clone(),
                    ExpandedKind::DynamicArray,
                    vec![expand_node(format!("{}[]", name), &inner)],
                );
                field.iterations = run - 1;
                field
            }
            None => expand_node(name, element),
        },
    }
}
