//! Struct declarations derived from the tuples of a raw schema.
//!
//! Declarations come out leaves first: every tuple's inner tuples are declared
//! before the tuple itself, and the root declaration comes last.

use crate::{
    errors::CompileError,
    field::FieldSchema,
    options::StructDedup,
    types::dims_suffix,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructField {
    pub name: String,
    /// Declared type string; tuple components are replaced by their struct name,
    /// array suffix kept.
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructDeclaration {
    pub name: String,
    pub fields: Vec<StructField>,
}

/// Extracts declarations for every tuple in `root`, plus a root declaration.
///
/// A tuple-based root is its own root declaration; any other root is wrapped
/// in a single-field declaration named after it.
pub fn extract_structs(
    root: &FieldSchema,
    dedup: StructDedup,
) -> Result<Vec<StructDeclaration>, CompileError> {
    let mut out = Vec::new();

    if visit(root, dedup, &mut out)?.is_none() {
        let field = StructField {
            name: root.name.clone(),
            ty: root.ty.clone(),
        };
        push(
            StructDeclaration {
                name: capitalize(&root.name),
                fields: vec![field],
            },
            dedup,
            &mut out,
        );
    }

    Ok(out)
}

/// Declares `field` if it is tuple-based and returns the declared name.
fn visit(
    field: &FieldSchema,
    dedup: StructDedup,
    out: &mut Vec<StructDeclaration>,
) -> Result<Option<String>, CompileError> {
    if !field.type_tag()?.is_tuple() {
        return Ok(None);
    }

    let mut fields = Vec::with_capacity(field.components.len());
    for component in &field.components {
        let ty = match visit(component, dedup, out)? {
            Some(name) => format!("{}{}", name, dims_suffix(&component.ty)),
            None => component.ty.clone(),
        };
        fields.push(StructField {
            name: component.name.clone(),
            ty,
        });
    }

    let declaration = StructDeclaration {
        name: capitalize(&field.name),
        fields,
    };

    Ok(Some(push(declaration, dedup, out)))
}

/// Appends `declaration` unless an equivalent one exists; returns the name to reference.
fn push(declaration: StructDeclaration, dedup: StructDedup, out: &mut Vec<StructDeclaration>) -> String {
    if dedup == StructDedup::ByStructure {
        if let Some(existing) = out.iter().find(|d| d.fields == declaration.fields) {
            return existing.name.clone();
        }
    }

    if !out.iter().any(|d| d.name == declaration.name) {
        out.push(declaration.clone());
    }

    declaration.name
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
