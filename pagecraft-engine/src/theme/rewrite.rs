use regex::Regex;
use std::sync::OnceLock;

use super::{ThemeRole, THEME_TOKEN_MARKER};
use crate::tailwind::split_variants;

/// Color-taking utility prefixes, longest first so `border-t` wins over `border`.
pub const COLOR_UTILITIES: &[&str] = &[
    "ring-offset",
    "placeholder",
    "decoration",
    "border-t",
    "border-r",
    "border-b",
    "border-l",
    "border-x",
    "border-y",
    "outline",
    "border",
    "divide",
    "accent",
    "stroke",
    "caret",
    "ring",
    "fill",
    "from",
    "text",
    "via",
    "bg",
    "to",
];

const PRIMARY_FAMILY: &[&str] = &["blue", "indigo", "sky", "cyan", "violet", "purple"];
const SECONDARY_FAMILY: &[&str] = &[
    "emerald", "green", "teal", "lime", "amber", "orange", "yellow", "red", "rose", "pink",
    "fuchsia",
];
const NEUTRAL_FAMILY: &[&str] = &["gray", "slate", "zinc", "neutral", "stone"];
const SHADES: &[u16] = &[50, 100, 200, 300, 400, 500, 600, 700, 800, 900, 950];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Primary,
    Secondary,
    Neutral,
    White,
    Black,
}

/// A parsed theme-backed token such as `hover:bg-theme-primary-hover`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeToken<'a> {
    pub variants: Vec<&'a str>,
    pub important: bool,
    pub utility: &'static str,
    pub role: ThemeRole,
}

fn token_regex() -> Option<&'static Regex> {
    static TOKEN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_REGEX
        .get_or_init(|| Regex::new(r"[A-Za-z0-9:!/_-]+").ok())
        .as_ref()
}

fn class_attr_regex() -> Option<&'static Regex> {
    static CLASS_ATTR_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    CLASS_ATTR_REGEX
        .get_or_init(|| {
            Regex::new(
                r#"\b(?:className|class)\s*=\s*(?:"[^"]*"|'[^']*'|\{\s*(?:`[^`]*`|"[^"]*"|'[^']*')\s*\})"#,
            )
            .ok()
        })
        .as_ref()
}

/// Rewrites the fixed color utilities inside the literal class attributes
/// of `source` (`className="..."`, `class='...'`, ``className={`...`}``).
///
/// Purely lexical. Text content, other string literals and class strings
/// built at runtime are copied through byte for byte.
pub fn rewrite_source(source: &str) -> String {
    let Some(re) = class_attr_regex() else {
        return source.to_string();
    };
    re.replace_all(source, |caps: &regex::Captures<'_>| rewrite_class_list(&caps[0]))
        .into_owned()
}

/// Rewrites every color utility in a whitespace-separated class list. Each
/// class-like run of characters is considered on its own, so the result
/// does not depend on token order.
pub fn rewrite_class_list(classes: &str) -> String {
    let Some(re) = token_regex() else {
        return classes.to_string();
    };
    re.replace_all(classes, |caps: &regex::Captures<'_>| {
        let token = &caps[0];
        rewrite_token(token).unwrap_or_else(|| token.to_string())
    })
    .into_owned()
}

/// Theme token for one class, or `None` when the class is left alone.
pub fn rewrite_token(class: &str) -> Option<String> {
    let (variants, base) = split_variants(class);
    if base.contains('/') {
        // opacity modifiers keep their fixed color
        return None;
    }
    let (important, base) = match base.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, base),
    };
    let (utility, color) = split_utility(base)?;
    let (family, shade) = parse_color(color)?;
    let hovered = variants.iter().any(|v| *v == "hover" || *v == "group-hover");
    let role = role_for(utility, family, shade, hovered)?;

    let mut out = String::with_capacity(class.len() + 8);
    for variant in &variants {
        out.push_str(variant);
        out.push(':');
    }
    if important {
        out.push('!');
    }
    out.push_str(utility);
    out.push('-');
    out.push_str(THEME_TOKEN_MARKER);
    out.push('-');
    out.push_str(role.as_str());
    Some(out)
}

/// Parses a rewritten token back into its parts.
pub fn parse_theme_token(class: &str) -> Option<ThemeToken<'_>> {
    let (variants, base) = split_variants(class);
    let (important, base) = match base.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, base),
    };
    let (utility, rest) = split_utility(base)?;
    let role = rest
        .strip_prefix(THEME_TOKEN_MARKER)
        .and_then(|r| r.strip_prefix('-'))
        .and_then(ThemeRole::parse)?;
    Some(ThemeToken {
        variants,
        important,
        utility,
        role,
    })
}

fn split_utility(base: &str) -> Option<(&'static str, &str)> {
    COLOR_UTILITIES.iter().find_map(|utility| {
        base.strip_prefix(utility)
            .and_then(|rest| rest.strip_prefix('-'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| (*utility, rest))
    })
}

fn parse_color(color: &str) -> Option<(Family, u16)> {
    match color {
        "white" => return Some((Family::White, 0)),
        "black" => return Some((Family::Black, 0)),
        _ => {}
    }
    let (name, shade) = color.rsplit_once('-')?;
    let shade: u16 = shade.parse().ok()?;
    if !SHADES.contains(&shade) {
        return None;
    }
    let family = if PRIMARY_FAMILY.contains(&name) {
        Family::Primary
    } else if SECONDARY_FAMILY.contains(&name) {
        Family::Secondary
    } else if NEUTRAL_FAMILY.contains(&name) {
        Family::Neutral
    } else {
        return None;
    };
    Some((family, shade))
}

fn role_for(utility: &str, family: Family, shade: u16, hovered: bool) -> Option<ThemeRole> {
    let is_fill = matches!(utility, "bg" | "from" | "via" | "to");
    let is_text = matches!(
        utility,
        "text" | "placeholder" | "decoration" | "caret" | "fill" | "stroke"
    );
    match family {
        Family::Primary | Family::Secondary => {
            let (base, muted) = if family == Family::Primary {
                (ThemeRole::Primary, ThemeRole::PrimaryMuted)
            } else {
                (ThemeRole::Secondary, ThemeRole::SecondaryMuted)
            };
            Some(if shade <= 200 {
                muted
            } else if hovered {
                base.hovered()
            } else {
                base
            })
        }
        Family::Neutral if is_fill => Some(match shade {
            0..=300 => ThemeRole::Background,
            400..=600 => ThemeRole::MutedForeground,
            _ => ThemeRole::Foreground,
        }),
        Family::Neutral if is_text => Some(match shade {
            0..=300 => ThemeRole::Background,
            400..=500 => ThemeRole::MutedForeground,
            600 => ThemeRole::Muted,
            _ => ThemeRole::Foreground,
        }),
        // light neutral borders stay fixed, darker ones follow the text color
        Family::Neutral => (shade >= 400).then_some(ThemeRole::MutedForeground),
        Family::White => is_fill.then_some(ThemeRole::Background),
        Family::Black => Some(ThemeRole::Foreground),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrites_primary_text_and_hover() {
        assert_eq!(
            rewrite_source(r#"className="bg-blue-500 text-gray-900 hover:bg-blue-600 p-4""#),
            r#"className="bg-theme-primary text-theme-foreground hover:bg-theme-primary-hover p-4""#
        );
    }

    #[test]
    fn leaves_non_color_classes_alone() {
        let src = r#"<div className="text-xl text-center border-2 flex bg-gradient-to-r">{props.text}</div>"#;
        assert_eq!(rewrite_source(src), src);
    }

    #[test]
    fn keeps_opacity_and_white_text() {
        assert_eq!(rewrite_token("bg-black/50"), None);
        assert_eq!(rewrite_token("text-white"), None);
        assert_eq!(rewrite_token("bg-white").as_deref(), Some("bg-theme-background"));
    }

    #[test]
    fn light_shades_become_tints() {
        assert_eq!(rewrite_token("bg-indigo-100").as_deref(), Some("bg-theme-primary-muted"));
        assert_eq!(rewrite_token("bg-emerald-50").as_deref(), Some("bg-theme-secondary-muted"));
    }

    #[test]
    fn variants_and_important_survive() {
        assert_eq!(
            rewrite_token("md:group-hover:!text-red-600").as_deref(),
            Some("md:group-hover:!text-theme-secondary-hover")
        );
        assert_eq!(
            rewrite_token("focus:ring-sky-400").as_deref(),
            Some("focus:ring-theme-primary")
        );
    }

    #[test]
    fn border_side_is_not_confused_with_color_name() {
        assert_eq!(rewrite_token("border-teal-500").as_deref(), Some("border-theme-secondary"));
        assert_eq!(rewrite_token("border-t-gray-700").as_deref(), Some("border-t-theme-muted-foreground"));
        assert_eq!(rewrite_token("border-gray-200"), None);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite_class_list("bg-blue-500 text-slate-600 border-black");
        assert_eq!(rewrite_class_list(&once), once);
        let src = r#"<a className="bg-blue-500">x</a>"#;
        let once = rewrite_source(src);
        assert_eq!(rewrite_source(&once), once);
    }

    #[test]
    fn only_class_attributes_are_touched() {
        let src = r#"<p className="p-4 text-red-500" title="text-red-500">Use text-red-500 for errors</p>"#;
        assert_eq!(
            rewrite_source(src),
            r#"<p className="p-4 text-theme-secondary" title="text-red-500">Use text-red-500 for errors</p>"#
        );
        let defaults = r#"const tone = "bg-blue-500"; function A() { return <div className={`m-2 bg-blue-500`} />; }"#;
        assert_eq!(
            rewrite_source(defaults),
            r#"const tone = "bg-blue-500"; function A() { return <div className={`m-2 bg-theme-primary`} />; }"#
        );
        assert_eq!(
            rewrite_source("<div class='border-teal-500'></div>"),
            "<div class='border-theme-secondary'></div>"
        );
    }

    #[test]
    fn parses_rewritten_tokens() {
        let token = parse_theme_token("hover:bg-theme-primary-hover").unwrap();
        assert_eq!(token.variants, vec!["hover"]);
        assert_eq!(token.utility, "bg");
        assert_eq!(token.role, ThemeRole::PrimaryHover);
        assert!(parse_theme_token("bg-blue-500").is_none());
    }
}
