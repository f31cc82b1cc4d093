pub mod ast;
pub mod types;

pub use ast::{analyze, parse_source};
pub use types::{Analysis, AnalyzeError, DeclKind, Declaration};
