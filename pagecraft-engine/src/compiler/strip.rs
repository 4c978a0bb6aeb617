//! Removes ES module syntax from component source.
//!
//! Import statements are blanked out (newlines kept, so error locations still
//! point at the original lines) and recorded as [`ImportBinding`]s; export
//! keywords are dropped in front of declarations.

use std::sync::OnceLock;

use regex::Regex;

/// One local name introduced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    /// `None` for default and namespace imports
    pub imported: Option<String>,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrippedSource {
    pub code: String,
    pub imports: Vec<ImportBinding>,
}

fn import_regex() -> Option<&'static Regex> {
    static IMPORT_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    IMPORT_REGEX
        .get_or_init(|| {
            Regex::new(
                r#"(?m)^[ \t]*import[ \t]+(?:([\w$*{}\s,]+?)\s+from\s+)?['"]([^'"\n]+)['"][ \t]*;?"#,
            )
            .ok()
        })
        .as_ref()
}

fn export_regex() -> Option<&'static Regex> {
    static EXPORT_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    EXPORT_REGEX
        .get_or_init(|| {
            Regex::new(r"(?m)^[ \t]*export[ \t]*\{[^}]*\}[ \t]*;?|^([ \t]*)export[ \t]+(?:default[ \t]+)?")
                .ok()
        })
        .as_ref()
}

pub fn strip_module_syntax(source: &str) -> StrippedSource {
    let mut imports = Vec::new();
    let without_imports = match import_regex() {
        Some(re) => re
            .replace_all(source, |caps: &regex::Captures<'_>| {
                let module = caps.get(2).map_or("", |m| m.as_str());
                if let Some(clause) = caps.get(1) {
                    imports.extend(parse_clause(clause.as_str(), module));
                }
                blank(&caps[0])
            })
            .into_owned(),
        None => source.to_string(),
    };

    let code = match export_regex() {
        Some(re) => re
            .replace_all(&without_imports, |caps: &regex::Captures<'_>| match caps.get(1) {
                Some(indent) => indent.as_str().to_string(),
                None => blank(&caps[0]),
            })
            .into_owned(),
        None => without_imports,
    };
    StrippedSource { code, imports }
}

/// Same number of lines, nothing else.
fn blank(text: &str) -> String {
    text.chars().filter(|c| *c == '\n').collect()
}

fn parse_clause(clause: &str, module: &str) -> Vec<ImportBinding> {
    let mut out = Vec::new();
    let clause = clause.trim();
    if clause.starts_with("type ") {
        return out;
    }
    let binding = |local: &str, imported: Option<&str>| ImportBinding {
        local: local.to_string(),
        imported: imported.map(str::to_string),
        module: module.to_string(),
    };

    let (head, named) = match clause.find('{') {
        Some(open) => {
            let close = clause[open..].find('}').map_or(clause.len(), |c| open + c);
            (&clause[..open], Some(&clause[open + 1..close]))
        }
        None => (clause, None),
    };
    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.strip_prefix('*') {
            Some(rest) => {
                if let Some(local) = rest.trim().strip_prefix("as") {
                    out.push(binding(local.trim(), None));
                }
            }
            None => out.push(binding(part, None)),
        }
    }
    if let Some(named) = named {
        for spec in named.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if spec.starts_with("type ") {
                continue;
            }
            match spec.split_once(" as ") {
                Some((imported, local)) => {
                    let imported = imported.trim();
                    let imported = (imported != "default").then_some(imported);
                    out.push(binding(local.trim(), imported));
                }
                None => out.push(binding(spec, Some(spec))),
            }
        }
    }
    out
}
