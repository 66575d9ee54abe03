//! Compile-time configuration.

/// How [crate::structs::extract_structs] collapses repeated tuple declarations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StructDedup {
    /// One declaration per distinct name; the first occurrence wins. Two tuples
    /// with different names but identical fields yield two declarations.
    #[default]
    ByName,
    /// Additionally collapse declarations whose field lists are identical into
    /// the first one, rewriting later references to its name.
    ByStructure,
}

/// Options for [crate::schema::Schema::compile_with].
///
/// Use the builder-style setters, then pass the options by reference.
///
/// ```
/// use wordpack::options::{CompileOptions, StructDedup};
///
/// let mut options = CompileOptions::new();
/// options.set_struct_dedup(StructDedup::ByStructure);
/// assert_eq!(options.struct_dedup, StructDedup::ByStructure);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub struct_dedup: StructDedup,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_struct_dedup(&mut self, struct_dedup: StructDedup) -> &mut Self {
        self.struct_dedup = struct_dedup;
        self
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::CompileOptionsDef> for CompileOptions {
    fn from(value: crate::serde::CompileOptionsDef) -> Self {
        CompileOptions {
            struct_dedup: match value.struct_dedup {
                crate::serde::StructDedupDef::ByName => StructDedup::ByName,
                crate::serde::StructDedupDef::ByStructure => StructDedup::ByStructure,
            },
        }
    }
}
