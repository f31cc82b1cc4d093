// src/analysis/types.rs
//
// Data model produced by one pass over one file's syntax tree.

use thiserror::Error;

/// Why a file could not be analyzed. Callers skip the file and keep going.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("parser produced no syntax tree")]
    Parse,

    #[error("syntax error near line {line}")]
    Syntax { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Function,
    Method,
    Class,
}

impl DeclKind {
    pub fn label(self) -> &'static str {
        match self {
            DeclKind::Function | DeclKind::Method => "Function",
            DeclKind::Class => "Class",
        }
    }
}

/// One function, method, or class definition.
///
/// Line numbers are 1-based and inclusive, taken from syntax-tree position
/// metadata. `source` is the reconstructed definition text (node text, or a
/// line slice of the original when node text is unavailable).
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Set for methods only.
    pub owner_class: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// Parenthesized parameter list, e.g. `(self, x=1)`. Empty for classes.
    pub params: String,
    /// Callee names in order of appearance, duplicates allowed.
    pub calls: Vec<String>,
    pub source: String,
}

impl Declaration {
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// Everything extracted from one file, declarations in source order.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub imports: Vec<String>,
    pub decls: Vec<Declaration>,
}

impl Analysis {
    pub fn find_function(&self, name: &str) -> Option<&Declaration> {
        self.decls
            .iter()
            .find(|d| d.kind == DeclKind::Function && d.name == name)
    }

    /// First method with this name, scanning classes in declaration order.
    pub fn find_method(&self, name: &str) -> Option<&Declaration> {
        self.decls
            .iter()
            .find(|d| d.kind == DeclKind::Method && d.name == name)
    }

    /// Direct methods of `class_name`, in declaration order.
    pub fn methods_of<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.decls.iter().filter(move |d| {
            d.kind == DeclKind::Method && d.owner_class.as_deref() == Some(class_name)
        })
    }
}
