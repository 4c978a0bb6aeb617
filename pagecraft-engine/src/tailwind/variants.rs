//! Variant modifiers (responsive, hover, focus, dark, ...)
//!
//! Splits variant prefixes off class names and applies the matching
//! selector or media query transformation.

use super::CssRule;

/// Longest prefixes first so `group-hover` wins over `hover`.
const PSEUDO_CLASS_VARIANTS: &[(&str, &str)] = &[
    ("group-hover", ":hover"),
    ("group-focus", ":focus"),
    ("focus-within", ":focus-within"),
    ("focus-visible", ":focus-visible"),
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("active", ":active"),
    ("disabled", ":disabled"),
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
];

/// Breakpoints: (min-width) for sm:, md:, etc.
pub const BREAKPOINTS: &[(&str, &str)] = &[
    ("sm", "40rem"),
    ("md", "48rem"),
    ("lg", "64rem"),
    ("xl", "80rem"),
    ("2xl", "96rem"),
];

/// Splits `md:hover:bg-x` into (`["md", "hover"]`, `"bg-x"`).
///
/// Colons inside brackets (arbitrary values) do not separate variants.
pub fn split_variants(class: &str) -> (Vec<&str>, &str) {
    let mut variants = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in class.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                variants.push(&class[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    (variants, &class[start..])
}

pub fn is_known_variant(variant: &str) -> bool {
    pseudo_class_for(variant).is_some() || media_query_for(variant).is_some()
}

/// Rewrites `rule` for the variant chain of `full_class`.
///
/// The selector becomes the escaped full class; pseudo-classes are appended
/// (or, for `group-*`, placed on an ancestor `.group`) and responsive or
/// preference variants wrap the rule in a media query. Unknown variants leave
/// the rule untouched.
pub fn apply_variants(rule: CssRule, variants: &[&str], full_class: &str) -> CssRule {
    if variants.iter().any(|v| !is_known_variant(v)) {
        return rule;
    }
    let mut selector = format!(".{}", escape_selector(full_class));
    let mut group_prefix = String::new();
    let mut media_query = rule.media_query;

    for variant in variants {
        if let Some(pseudo) = pseudo_class_for(variant) {
            if variant.starts_with("group-") {
                group_prefix = format!(".group{} ", pseudo);
            } else {
                selector.push_str(pseudo);
            }
        } else if let Some(mq) = media_query_for(variant) {
            media_query = Some(mq);
        }
    }

    CssRule {
        selector: format!("{}{}", group_prefix, selector),
        declarations: rule.declarations,
        media_query,
    }
}

fn pseudo_class_for(variant: &str) -> Option<&'static str> {
    PSEUDO_CLASS_VARIANTS
        .iter()
        .find(|(p, _)| *p == variant)
        .map(|(_, s)| *s)
}

fn media_query_for(variant: &str) -> Option<String> {
    for (prefix, width) in BREAKPOINTS {
        if variant == *prefix {
            return Some(format!("@media (min-width: {})", width));
        }
    }
    match variant {
        "dark" => Some("@media (prefers-color-scheme: dark)".into()),
        "print" => Some("@media print".into()),
        _ => None,
    }
}

pub fn escape_selector(class: &str) -> String {
    let mut out = String::with_capacity(class.len() + 4);
    for ch in class.chars() {
        match ch {
            '.' | '/' | '[' | ']' | '(' | ')' | '%' | '#' | ':' | '@' | '!' | ',' | '~'
            | '^' | '$' | '&' | '+' | '=' | '<' | '>' | '|' | '\'' | '"' | ';' | '{'
            | '}' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> CssRule {
        CssRule::new(".x", vec![("color".to_string(), "red".to_string())])
    }

    #[test]
    fn splits_variant_chain() {
        assert_eq!(split_variants("md:hover:bg-x"), (vec!["md", "hover"], "bg-x"));
        assert_eq!(split_variants("bg-[url(a:b)]"), (vec![], "bg-[url(a:b)]"));
    }

    #[test]
    fn hover_appends_pseudo_class() {
        let out = apply_variants(rule(), &["hover"], "hover:bg-x");
        assert_eq!(out.selector, ".hover\\:bg-x:hover");
        assert_eq!(out.media_query, None);
    }

    #[test]
    fn group_hover_targets_ancestor() {
        let out = apply_variants(rule(), &["group-hover"], "group-hover:text-x");
        assert_eq!(out.selector, ".group:hover .group-hover\\:text-x");
    }

    #[test]
    fn responsive_wraps_in_media_query() {
        let out = apply_variants(rule(), &["md", "hover"], "md:hover:bg-x");
        assert_eq!(out.selector, ".md\\:hover\\:bg-x:hover");
        assert_eq!(out.media_query.as_deref(), Some("@media (min-width: 48rem)"));
    }

    #[test]
    fn unknown_variant_is_left_alone() {
        let out = apply_variants(rule(), &["aria-busy"], "aria-busy:bg-x");
        assert_eq!(out, rule());
    }
}
