//! analysis/ast.rs
//!
//! Single-pass extraction of imports, declarations, and per-declaration
//! call sites from one Python source file.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

use crate::diag::{log, DiagLevel, DiagSink};

use super::types::{Analysis, AnalyzeError, DeclKind, Declaration};

thread_local! {
    static PY_PARSER: RefCell<Parser> = RefCell::new(make_python_parser());
}

fn make_python_parser() -> Parser {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_python::language()).unwrap();
    p
}

pub fn parse_source(source: &str) -> Option<Tree> {
    PY_PARSER.with(|p| p.borrow_mut().parse(source, None))
}

/// Analyze one file's full source.
///
/// A file that does not parse cleanly is rejected as a whole; the caller
/// skips it and continues with other files. Per-call-site reconstruction
/// failures inside a parseable file only drop that call site.
pub fn analyze(source: &str, diag: &dyn DiagSink) -> Result<Analysis, AnalyzeError> {
    let tree = parse_source(source).ok_or(AnalyzeError::Parse)?;
    let root = tree.root_node();

    if root.has_error() {
        return Err(AnalyzeError::Syntax {
            line: first_error_line(root),
        });
    }

    let mut analysis = Analysis::default();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        collect_import(child, source, &mut analysis.imports);
    }

    visit_block(root, source, None, &mut analysis, diag);

    Ok(analysis)
}

fn first_error_line(root: Node) -> usize {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            if child.has_error() {
                stack.push(child);
            }
        }
    }

    1
}

/* ============================================================
   Imports (module level)
   ============================================================ */

fn collect_import(node: Node, src: &str, imports: &mut Vec<String>) {
    match node.kind() {
        // `import a, b as c` becomes one directive per name, the way the
        // downstream annotation scan expects them.
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                if let Some(text) = text(name, src) {
                    imports.push(format!("import {}", text));
                }
            }
        }

        "import_from_statement" => {
            let Some(module) = node.child_by_field_name("module_name").and_then(|n| text(n, src))
            else {
                return;
            };

            let mut names = Vec::new();
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                if let Some(text) = text(name, src) {
                    names.push(text);
                }
            }

            if names.is_empty() {
                // `from m import *`
                imports.push(format!("from {} import *", module));
            } else {
                imports.push(format!("from {} import {}", module, names.join(", ")));
            }
        }

        "future_import_statement" => {
            let mut names = Vec::new();
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                if let Some(text) = text(name, src) {
                    names.push(text);
                }
            }
            imports.push(format!("from __future__ import {}", names.join(", ")));
        }

        _ => {}
    }
}

/* ============================================================
   Declarations
   ============================================================ */

/// Walk the statements of `container`, registering every definition found.
///
/// `class_ctx` is set while iterating a class body, so functions found
/// there register as methods of that class. Definitions nested inside a
/// function body register as plain declarations in the flat namespace and
/// additionally feed their calls into the enclosing declaration's list.
fn visit_block(
    container: Node,
    src: &str,
    class_ctx: Option<&str>,
    out: &mut Analysis,
    diag: &dyn DiagSink,
) {
    let mut cursor = container.walk();
    for child in container.children(&mut cursor) {
        let node = unwrap_decorated(child);

        match node.kind() {
            "function_definition" => {
                register_function(node, src, class_ctx, out, diag);
                if let Some(body) = node.child_by_field_name("body") {
                    visit_block(body, src, None, out, diag);
                }
            }

            "class_definition" => {
                let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, src))
                else {
                    continue;
                };

                out.decls.push(Declaration {
                    name: name.to_string(),
                    kind: DeclKind::Class,
                    owner_class: None,
                    start_line: node.start_position().row + 1,
                    end_line: node.end_position().row + 1,
                    params: String::new(),
                    calls: Vec::new(),
                    source: node_source(node, src),
                });

                if let Some(body) = node.child_by_field_name("body") {
                    visit_block(body, src, Some(name), out, diag);
                }
            }

            _ => {}
        }
    }
}

fn unwrap_decorated(node: Node) -> Node {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

fn register_function(
    node: Node,
    src: &str,
    class_ctx: Option<&str>,
    out: &mut Analysis,
    diag: &dyn DiagSink,
) {
    let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, src)) else {
        return;
    };

    let params = node
        .child_by_field_name("parameters")
        .and_then(|n| text(n, src))
        .unwrap_or("()")
        .to_string();

    let mut calls = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        collect_calls(body, src, &mut calls, diag);
    }

    out.decls.push(Declaration {
        name: name.to_string(),
        kind: if class_ctx.is_some() {
            DeclKind::Method
        } else {
            DeclKind::Function
        },
        owner_class: class_ctx.map(str::to_string),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        params,
        calls,
        source: node_source(node, src),
    });
}

/// Structural reconstruction of a definition, with a line-slice fallback.
fn node_source(node: Node, src: &str) -> String {
    if let Ok(text) = node.utf8_text(src.as_bytes()) {
        return text.to_string();
    }

    let start = node.start_position().row;
    let end = node.end_position().row;
    src.lines()
        .skip(start)
        .take(end - start + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/* ============================================================
   Call sites
   ============================================================ */

fn collect_calls(node: Node, src: &str, out: &mut Vec<String>, diag: &dyn DiagSink) {
    if node.kind() == "call" {
        if let Some(name) = callee_name(node, src, diag) {
            out.push(name);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, src, out, diag);
    }
}

/// Best-effort callee name for one call expression.
///
/// Bare identifier calls resolve to the identifier; attribute calls to the
/// full dotted path when the receiver chain is plain names, or `?.attr`
/// when the receiver is a computed expression. Other call shapes (calls on
/// subscripts, on call results, ...) are not recorded.
fn callee_name(call: Node, src: &str, diag: &dyn DiagSink) -> Option<String> {
    let func = call.child_by_field_name("function")?;

    match func.kind() {
        "identifier" => match text(func, src) {
            Some(name) => Some(name.to_string()),
            None => {
                warn_unreadable(call, diag);
                None
            }
        },

        "attribute" => {
            let Some(attr) = func.child_by_field_name("attribute").and_then(|n| text(n, src))
            else {
                warn_unreadable(call, diag);
                return None;
            };

            if let Some(path) = dotted_path(func, src) {
                return Some(path);
            }

            let object = func.child_by_field_name("object")?;
            if object.kind() == "identifier" {
                let Some(receiver) = text(object, src) else {
                    warn_unreadable(call, diag);
                    return None;
                };
                Some(format!("{}.{}", receiver, attr))
            } else {
                // computed receiver, e.g. make()().method or (a or b).method
                Some(format!("?.{}", attr))
            }
        }

        _ => None,
    }
}

/// Reconstruct `a.b.c` when every link in the receiver chain is a name.
fn dotted_path(node: Node, src: &str) -> Option<String> {
    match node.kind() {
        "identifier" => text(node, src).map(str::to_string),
        "attribute" => {
            let base = dotted_path(node.child_by_field_name("object")?, src)?;
            let attr = text(node.child_by_field_name("attribute")?, src)?;
            Some(format!("{}.{}", base, attr))
        }
        _ => None,
    }
}

fn warn_unreadable(call: Node, diag: &dyn DiagSink) {
    log(
        diag,
        DiagLevel::Warn,
        format!(
            "could not reconstruct callee name at line {}",
            call.start_position().row + 1
        ),
    );
}

fn text<'a>(node: Node, src: &'a str) -> Option<&'a str> {
    node.utf8_text(src.as_bytes()).ok()
}
