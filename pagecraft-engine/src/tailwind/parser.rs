use std::collections::HashSet;

/// Extracts all unique CSS class tokens from an HTML string.
///
/// Scans for `class="..."` and `class='...'` attributes and returns
/// each whitespace-separated token exactly once, in order of first appearance.
/// `data-class=` and similar suffixed attribute names are not matched.
pub fn extract_classes(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut classes = Vec::new();

    let bytes = html.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        while i < len && !html.is_char_boundary(i) {
            i += 1;
        }
        if i >= len {
            break;
        }
        let at_name_start = i == 0 || bytes[i - 1].is_ascii_whitespace();
        if at_name_start && html[i..].starts_with("class") {
            let mut j = i + 5;
            while j < len && bytes[j] == b' ' {
                j += 1;
            }
            if j < len && bytes[j] == b'=' {
                j += 1;
                while j < len && bytes[j] == b' ' {
                    j += 1;
                }
                if j < len && (bytes[j] == b'"' || bytes[j] == b'\'') {
                    let quote = bytes[j];
                    j += 1;
                    let start = j;
                    while j < len && bytes[j] != quote {
                        j += 1;
                    }
                    for token in html[start..j].split_whitespace() {
                        if seen.insert(token.to_string()) {
                            classes.push(token.to_string());
                        }
                    }
                    i = j + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    classes
}

/// Splits a class attribute value into tokens, dropping duplicates and
/// keeping first-occurrence order.
pub fn split_classes(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .split_whitespace()
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

/// Joins several class strings: existing tokens first, then new ones, each once.
pub fn merge_classes<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    let mut out: Vec<&str> = Vec::new();
    for part in parts {
        for token in part.split_whitespace() {
            if seen.insert(token) {
                out.push(token);
            }
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_double_quoted() {
        let html = r#"<div class="flex p-4 text-white"></div>"#;
        assert_eq!(extract_classes(html), vec!["flex", "p-4", "text-white"]);
    }

    #[test]
    fn deduplicates_across_elements() {
        let html = r#"<div class="flex p-4"><span class="flex text-sm"></span></div>"#;
        assert_eq!(extract_classes(html), vec!["flex", "p-4", "text-sm"]);
    }

    #[test]
    fn handles_single_quoted() {
        let html = "<div class='bg-theme-primary rounded'></div>";
        assert_eq!(extract_classes(html), vec!["bg-theme-primary", "rounded"]);
    }

    #[test]
    fn ignores_prefixed_attribute_names() {
        let html = r#"<div data-class="nope" class="yes"></div>"#;
        assert_eq!(extract_classes(html), vec!["yes"]);
    }

    #[test]
    fn handles_utf8_multibyte_in_html() {
        let html = r#"<div class="flex">Olá — mundo</div>"#;
        assert_eq!(extract_classes(html), vec!["flex"]);
    }

    #[test]
    fn merge_is_order_stable_and_deduplicated() {
        assert_eq!(merge_classes(["p-4 text-lg", "text-lg font-bold p-4"]), "p-4 text-lg font-bold");
        assert_eq!(merge_classes(["", "  "]), "");
        assert_eq!(split_classes("a b  a c"), vec!["a", "b", "c"]);
    }
}
