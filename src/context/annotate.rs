// src/context/annotate.rs
//
// Best-effort resolution of a recorded callee name against the file's
// own declarations and imports. Approximate by design: name-based,
// first match wins, no type or cross-file resolution.

use crate::analysis::Analysis;

/// One annotation line for a callee, in the bundle's literal format.
pub fn annotate_call(call: &str, analysis: &Analysis) -> String {
    if !call.contains('.') {
        return annotate_local(call, analysis);
    }

    // Dotted calls resolve against import literals by root name.
    let base = call.split('.').next().unwrap_or(call);
    let import_key = format!("import {}", base);
    let from_key = format!("from {}", base);
    let member_key = format!(".{}", base);

    for import in &analysis.imports {
        if import.contains(&import_key)
            || import.contains(&from_key)
            || import.contains(&member_key)
        {
            return format!("{}(...) # Requires: {}", call, import);
        }
    }

    format!("{}(...) # Imported or attribute call", call)
}

fn annotate_local(call: &str, analysis: &Analysis) -> String {
    if let Some(func) = analysis.find_function(call) {
        return format!("def {}{}: ...", call, func.params);
    }

    // Same-named methods in different classes tie-break by declaration
    // order of the owning class.
    if let Some(method) = analysis.find_method(call) {
        return format!(
            "def {}{}: ... # Method in class {}",
            call,
            method.params,
            method.owner_class.as_deref().unwrap_or("?"),
        );
    }

    format!("{}(...) # Local call, definition not found in file?", call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::diag::NullSink;

    fn analysis_of(src: &str) -> Analysis {
        analyze(src, &NullSink).unwrap()
    }

    #[test]
    fn known_function_shows_its_signature() {
        let analysis = analysis_of("def bar(x, y=2):\n    pass\n");
        assert_eq!(annotate_call("bar", &analysis), "def bar(x, y=2): ...");
    }

    #[test]
    fn known_method_names_its_class() {
        let analysis = analysis_of(
            "class Store:\n    def save(self, item):\n        pass\n",
        );
        assert_eq!(
            annotate_call("save", &analysis),
            "def save(self, item): ... # Method in class Store"
        );
    }

    #[test]
    fn same_named_methods_resolve_to_first_declared_class() {
        let analysis = analysis_of(
            "class A:\n    def run(self):\n        pass\n\nclass B:\n    def run(self, fast):\n        pass\n",
        );
        assert_eq!(
            annotate_call("run", &analysis),
            "def run(self): ... # Method in class A"
        );
    }

    #[test]
    fn unknown_local_call_is_marked() {
        let analysis = analysis_of("x = 1\n");
        assert_eq!(
            annotate_call("mystery", &analysis),
            "mystery(...) # Local call, definition not found in file?"
        );
    }

    #[test]
    fn dotted_call_matches_first_import_by_root_name() {
        let analysis = analysis_of("import os\nimport os.path\n");
        assert_eq!(
            annotate_call("os.path.join", &analysis),
            "os.path.join(...) # Requires: import os"
        );
    }

    #[test]
    fn dotted_call_matches_from_import() {
        let analysis = analysis_of("from collections import OrderedDict\n");
        assert_eq!(
            annotate_call("collections.Counter", &analysis),
            "collections.Counter(...) # Requires: from collections import OrderedDict"
        );
    }

    #[test]
    fn dotted_call_without_import_is_generic() {
        let analysis = analysis_of("x = 1\n");
        assert_eq!(
            annotate_call("self.helper", &analysis),
            "self.helper(...) # Imported or attribute call"
        );
    }
}
