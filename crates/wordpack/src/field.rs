//! Author-supplied schema fields and their resolved form.

use crate::{
    errors::{CompileError, SchemaError},
    types::{BaseType, Dimension, LeafType, TypeTag},
};

/// A single named field as written by the schema author: a type string plus,
/// for tuples and arrays of tuples, the component list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    /// Type string such as `uint16`, `bytes`, `tuple[2][]`.
    pub ty: String,
    /// Components, present iff the base type is `tuple`.
    pub components: Vec<FieldSchema>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        FieldSchema {
            name: name.into(),
            ty: ty.into(),
            components: Vec::new(),
        }
    }

    /// A `tuple` field with the given components.
    pub fn tuple(name: impl Into<String>, components: Vec<FieldSchema>) -> Self {
        Self::tuple_array(name, "", components)
    }

    /// A tuple-based field with array suffix `dims`, e.g. `"[]"` or `"[2][]"`.
    pub fn tuple_array(
        name: impl Into<String>,
        dims: &str,
        components: Vec<FieldSchema>,
    ) -> Self {
        FieldSchema {
            name: name.into(),
            ty: format!("tuple{}", dims),
            components,
        }
    }

    /// Parses the type tag and checks the component list against it.
    pub fn type_tag(&self) -> Result<TypeTag, CompileError> {
        let tag = TypeTag::parse(&self.name, &self.ty)?;

        if tag.is_tuple() && self.components.is_empty() {
            return Err(SchemaError::MissingComponents(self.name.clone()).into());
        }
        if !tag.is_tuple() && !self.components.is_empty() {
            return Err(SchemaError::UnexpectedComponents(self.name.clone()).into());
        }

        Ok(tag)
    }

    /// Resolves the whole subtree into a [Node].
    pub fn resolve(&self) -> Result<Node, CompileError> {
        let tag = self.type_tag()?;

        let element = match tag.base {
            BaseType::Tuple => Node::Tuple(
                self.components
                    .iter()
                    .map(|c| {
                        Ok(NamedNode {
                            name: c.name.clone(),
                            node: c.resolve()?,
                        })
                    })
                    .collect::<Result<Vec<_>, CompileError>>()?,
            ),
            BaseType::Leaf(leaf) => Node::Leaf(leaf),
        };

        if tag.dims.is_empty() {
            Ok(element)
        } else {
            Ok(Node::Array {
                element: Box::new(element),
                dims: tag.dims,
            })
        }
    }
}

/// Resolved schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafType),
    /// A non-array element type with its dimensions, innermost first.
    Array {
        element: Box<Node>,
        dims: Vec<Dimension>,
    },
    Tuple(Vec<NamedNode>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedNode {
    pub name: String,
    pub node: Node,
}

impl Node {
    /// `element` wrapped in `dims`, or `element` itself when `dims` is empty.
    pub fn array(element: &Node, dims: &[Dimension]) -> Node {
        if dims.is_empty() {
            element.clone()
        } else {
            Node::Array {
                element: Box::new(element.clone()),
                dims: dims.to_vec(),
            }
        }
    }

    /// The node with its outermost dimension removed, or `None` if it is not an array.
    pub fn split_outer(&self) -> Option<(Dimension, Node)> {
        match self {
            Node::Array { element, dims } => {
                let (outer, rest) = dims.split_last()?;
                Some((*outer, Node::array(element, rest)))
            }
            _ => None,
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldSchemaDef> for FieldSchema {
    fn from(value: crate::serde::FieldSchemaDef) -> Self {
        FieldSchema {
            name: value.name,
            ty: value.ty,
            components: value.components.into_iter().map(Into::into).collect(),
        }
    }
}
