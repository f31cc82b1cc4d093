// src/context/builder.rs
//
// Assembles the context bundle: for every changed file, the full text of
// each declaration touched by an added line, the calls it makes, and the
// file's imports.
//
// Never errors. Fetch misses are skipped, parse failures become inline
// error blocks, and an empty selection yields an empty string.

use std::collections::HashSet;

use crate::analysis::{analyze, Analysis, DeclKind, Declaration};
use crate::diag::{log, DiagLevel, DiagSink};
use crate::diff::ChangedLines;

use super::annotate::annotate_call;
use super::fetch::FileFetcher;

pub struct ContextBuilder<'a> {
    fetcher: &'a dyn FileFetcher,
    diag: &'a dyn DiagSink,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(fetcher: &'a dyn FileFetcher, diag: &'a dyn DiagSink) -> Self {
        Self { fetcher, diag }
    }

    /// Build the bundle for every changed file with added lines.
    pub fn build(&self, changed: &ChangedLines) -> String {
        let mut blocks = Vec::new();

        for (path, added) in changed {
            if added.is_empty() {
                continue;
            }

            if let Some(block) = self.file_block(path, added) {
                blocks.push(block);
            }
        }

        blocks.join("\n\n").trim().to_string()
    }

    fn file_block(&self, path: &str, added: &std::collections::BTreeSet<usize>) -> Option<String> {
        log(
            self.diag,
            DiagLevel::Info,
            format!("analyzing changed file: {}", path),
        );

        let Some(content) = self.fetcher.fetch(path) else {
            log(
                self.diag,
                DiagLevel::Warn,
                format!("could not fetch content for {}; skipping", path),
            );
            return None;
        };

        if content.trim().is_empty() {
            log(
                self.diag,
                DiagLevel::Info,
                format!("file {} is empty; skipping", path),
            );
            return None;
        }

        let analysis = match analyze(&content, self.diag) {
            Ok(analysis) => analysis,
            Err(err) => {
                log(
                    self.diag,
                    DiagLevel::Error,
                    format!("error parsing {}: {}", path, err),
                );
                return Some(format!(
                    "--- Error Analyzing {} ---\nCould not parse file: {}",
                    path, err
                ));
            }
        };

        let relevant = select_relevant(&analysis, added);
        if relevant.is_empty() {
            log(
                self.diag,
                DiagLevel::Info,
                format!("no declarations containing changes in {}", path),
            );
            return None;
        }

        Some(render_file(path, &relevant, &analysis))
    }
}

/// Declarations touched by the added lines, in declaration order.
///
/// Functions match on their own range. A class matches on its own range
/// or on the range of one of its direct methods; either way the whole
/// class is selected. Methods never surface as their own blocks.
fn select_relevant<'d>(
    analysis: &'d Analysis,
    added: &std::collections::BTreeSet<usize>,
) -> Vec<&'d Declaration> {
    let mut relevant = Vec::new();

    for decl in &analysis.decls {
        match decl.kind {
            DeclKind::Function => {
                if added.iter().any(|&line| decl.contains_line(line)) {
                    relevant.push(decl);
                }
            }

            DeclKind::Class => {
                let own_hit = added.iter().any(|&line| decl.contains_line(line));
                let method_hit = || {
                    analysis.methods_of(&decl.name).any(|method| {
                        added.iter().any(|&line| method.contains_line(line))
                    })
                };
                if own_hit || method_hit() {
                    relevant.push(decl);
                }
            }

            DeclKind::Method => {}
        }
    }

    relevant
}

fn render_file(path: &str, relevant: &[&Declaration], analysis: &Analysis) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut emitted: HashSet<&str> = HashSet::new();

    for decl in relevant {
        // Same-named declarations collapse to the first occurrence.
        if !emitted.insert(decl.name.as_str()) {
            continue;
        }

        parts.push(format!(
            "--- Full Definition of Changed {} `{}` (in {}) ---",
            decl.kind.label(),
            decl.name,
            path
        ));
        parts.push(decl.source.clone());

        let calls = calls_of(decl, analysis);
        if !calls.is_empty() {
            parts.push(String::new());
            parts.push(format!(
                "--- Calls made by `{}` (or its methods) ---",
                decl.name
            ));

            let mut seen = HashSet::new();
            for call in calls {
                if seen.insert(call) {
                    parts.push(annotate_call(call, analysis));
                }
            }
        }
    }

    if !analysis.imports.is_empty() {
        parts.push(String::new());
        parts.push(format!("--- Relevant Imports from {} ---", path));
        parts.extend(analysis.imports.iter().cloned());
    }

    parts.join("\n")
}

/// A function's own calls; for a class, the concatenation of its direct
/// methods' calls.
fn calls_of<'d>(decl: &'d Declaration, analysis: &'d Analysis) -> Vec<&'d String> {
    match decl.kind {
        DeclKind::Function | DeclKind::Method => decl.calls.iter().collect(),
        DeclKind::Class => analysis
            .methods_of(&decl.name)
            .flat_map(|method| method.calls.iter())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fetch::FnFetcher;
    use crate::diag::{DiagLevel, MemorySink, NullSink};
    use crate::diff::parse_diff;
    use std::collections::{BTreeMap, BTreeSet};

    fn changed(path: &str, lines: &[usize]) -> ChangedLines {
        let mut map = BTreeMap::new();
        map.insert(path.to_string(), lines.iter().copied().collect::<BTreeSet<_>>());
        map
    }

    fn build_one(src: &'static str, lines: &[usize]) -> String {
        let fetcher = FnFetcher::new(move |_: &str| Some(src.to_string()));
        ContextBuilder::new(&fetcher, &NullSink).build(&changed("app.py", lines))
    }

    const SAMPLE: &str = "\
import os
from helpers import shim

def bar(x, y=2):
    return x + y

def foo():
    bar(1)
    os.path.join(\"a\", \"b\")
    missing()
";

    #[test]
    fn touched_function_block_with_annotated_calls() {
        // line 8 is inside foo
        let bundle = build_one(SAMPLE, &[8]);

        assert!(bundle.contains("--- Full Definition of Changed Function `foo` (in app.py) ---"));
        assert!(bundle.contains("def foo():"));
        assert!(bundle.contains("--- Calls made by `foo` (or its methods) ---"));
        assert!(bundle.contains("def bar(x, y=2): ..."));
        assert!(bundle.contains("os.path.join(...) # Requires: import os"));
        assert!(bundle.contains("missing(...) # Local call, definition not found in file?"));
        assert!(bundle.contains("--- Relevant Imports from app.py ---"));
        assert!(bundle.contains("import os"));
        assert!(bundle.contains("from helpers import shim"));
        // untouched declarations stay out
        assert!(!bundle.contains("Changed Function `bar`"));
    }

    #[test]
    fn selection_boundaries_are_inclusive() {
        // foo spans lines 7..=10
        assert!(build_one(SAMPLE, &[6]).is_empty());
        assert!(build_one(SAMPLE, &[7]).contains("Changed Function `foo`"));
        assert!(build_one(SAMPLE, &[10]).contains("Changed Function `foo`"));
        assert!(build_one(SAMPLE, &[11]).is_empty());
    }

    #[test]
    fn changed_method_selects_the_whole_class() {
        let src = "\
class Greeter:
    def hello(self):
        return \"hi\"

    def bye(self):
        return \"bye\"
";
        // line 3 is inside hello, outside the class header
        let bundle = build_one(src, &[3]);

        assert!(bundle.contains("--- Full Definition of Changed Class `Greeter` (in app.py) ---"));
        assert!(bundle.contains("class Greeter:"));
        // the whole class body comes along
        assert!(bundle.contains("def bye(self):"));
        // no separate method block
        assert!(!bundle.contains("Changed Function `hello`"));
    }

    #[test]
    fn class_calls_section_aggregates_method_calls() {
        let src = "\
import json

class Encoder:
    def dump(self, obj):
        return json.dumps(obj)

    def load(self, raw):
        return json.loads(raw)
";
        let bundle = build_one(src, &[5]);

        assert!(bundle.contains("--- Calls made by `Encoder` (or its methods) ---"));
        assert!(bundle.contains("json.dumps(...) # Requires: import json"));
        assert!(bundle.contains("json.loads(...) # Requires: import json"));
    }

    #[test]
    fn duplicate_names_keep_first_occurrence_only() {
        let src = "\
def twice():
    return 1

def twice():
    return 2
";
        // both definitions are touched
        let bundle = build_one(src, &[2, 5]);

        assert_eq!(bundle.matches("Changed Function `twice`").count(), 1);
        assert!(bundle.contains("return 1"));
        assert!(!bundle.contains("return 2"));
    }

    #[test]
    fn repeated_callee_is_annotated_once() {
        let src = "\
def bar():
    pass

def foo():
    bar()
    bar()
";
        let bundle = build_one(src, &[5]);
        assert_eq!(bundle.matches("def bar(): ...").count(), 1);
    }

    #[test]
    fn empty_changed_map_yields_empty_bundle() {
        let fetcher = FnFetcher::new(|_: &str| Some("x = 1\n".to_string()));
        let bundle = ContextBuilder::new(&fetcher, &NullSink).build(&BTreeMap::new());
        assert_eq!(bundle, "");
    }

    #[test]
    fn change_outside_any_declaration_yields_empty_bundle() {
        let bundle = build_one("x = 1\n\ndef f():\n    pass\n", &[1]);
        assert_eq!(bundle, "");
    }

    #[test]
    fn unfetchable_file_is_skipped_with_a_warning() {
        let fetcher = FnFetcher::new(|_: &str| None);
        let sink = MemorySink::new();
        let bundle = ContextBuilder::new(&fetcher, &sink).build(&changed("gone.py", &[1]));

        assert_eq!(bundle, "");
        assert!(sink.contains(DiagLevel::Warn, "gone.py"));
    }

    #[test]
    fn parse_failure_emits_error_block_and_later_files_continue() {
        let fetcher = FnFetcher::new(|path: &str| {
            match path {
                "bad.py" => Some("def broken(:\n    pass\n".to_string()),
                "good.py" => Some("def ok():\n    pass\n".to_string()),
                _ => None,
            }
        });

        let mut map = changed("bad.py", &[1]);
        map.extend(changed("good.py", &[2]));

        let bundle = ContextBuilder::new(&fetcher, &NullSink).build(&map);

        assert!(bundle.contains("--- Error Analyzing bad.py ---"));
        assert!(bundle.contains("Could not parse file:"));
        assert!(bundle.contains("Changed Function `ok`"));
    }

    #[test]
    fn diff_to_bundle_end_to_end() {
        let diff = "\
+++ b/app.py
@@ -7,3 +7,4 @@
 def foo():
     bar(1)
+    os.path.join(\"a\", \"b\")
     missing()
";
        let sink = MemorySink::new();
        let changed = parse_diff(diff, |p| p.ends_with(".py"), &sink);
        let fetcher = FnFetcher::new(|_: &str| Some(SAMPLE.to_string()));
        let bundle = ContextBuilder::new(&fetcher, &sink).build(&changed);

        assert!(bundle.contains("Changed Function `foo`"));
        assert!(bundle.contains("os.path.join(...) # Requires: import os"));
        assert!(sink.contains(DiagLevel::Info, "analyzing changed file: app.py"));
    }
}
