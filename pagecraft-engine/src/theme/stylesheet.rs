use std::collections::HashSet;
use tracing::debug;

use super::{parse_theme_token, Theme, ThemeRole, ThemeToken, COLOR_UTILITIES, THEME_TOKEN_MARKER};
use crate::config::EngineConfig;
use crate::tailwind::{apply_variants, is_known_variant, render_css, CssRule, BREAKPOINTS};

/// State variants every theme token gets a rule for in the full stylesheet.
const STATE_VARIANTS: &[&str] = &["hover", "focus", "active", "group-hover", "focus-visible"];

/// Full theme stylesheet: custom properties plus a rule for every theme token
/// under every supported state and responsive variant.
pub fn synthesize(theme: &Theme, config: &EngineConfig) -> String {
    let mut rules = base_rules(theme, config);
    for utility in COLOR_UTILITIES {
        for role in ThemeRole::ALL {
            let token = format!("{}-{}-{}", utility, THEME_TOKEN_MARKER, role.as_str());
            let variants = std::iter::once(String::new())
                .chain(STATE_VARIANTS.iter().map(|v| format!("{}:", v)))
                .chain(BREAKPOINTS.iter().map(|(bp, _)| format!("{}:", bp)));
            for prefix in variants {
                let class = format!("{}{}", prefix, token);
                if let Some(rule) = rule_for_class(&class, config) {
                    rules.push(rule);
                }
            }
        }
    }
    render_css(&rules)
}

/// Theme stylesheet restricted to the theme tokens actually in use.
///
/// Classes that are not theme tokens are ignored, so the output of
/// [`crate::tailwind::extract_classes`] can be passed straight in.
pub fn synthesize_for_classes<S: AsRef<str>>(
    theme: &Theme,
    config: &EngineConfig,
    classes: &[S],
) -> String {
    let mut rules = base_rules(theme, config);
    let mut seen = HashSet::new();
    for class in classes {
        let class = class.as_ref();
        if !seen.insert(class) {
            continue;
        }
        if let Some(rule) = rule_for_class(class, config) {
            rules.push(rule);
        }
    }
    debug!(tokens = rules.len().saturating_sub(1), "synthesized theme stylesheet");
    render_css(&rules)
}

fn base_rules(theme: &Theme, config: &EngineConfig) -> Vec<CssRule> {
    let scope = format!(".{}", config.theme_scope_class);
    let mut vars: Vec<(String, String)> = ThemeRole::ALL
        .into_iter()
        .map(|role| {
            (
                config.css_var(role.as_str()),
                css_value(&theme.resolve(role, config)),
            )
        })
        .collect();
    if let Some(accent) = &theme.accent_color {
        vars.push((config.css_var("accent"), css_value(accent)));
    }
    if let Some(radius) = &theme.border_radius {
        vars.push((config.css_var("radius"), css_value(radius)));
    }

    let mut root = vars;
    root.push((
        "background-color".to_string(),
        format!("var({})", config.css_var("background")),
    ));
    root.push(("color".to_string(), format!("var({})", config.css_var("foreground"))));
    if let Some(font) = &theme.font_family {
        root.push(("font-family".to_string(), css_value(font)));
    }

    let mut rules = vec![CssRule::new(scope, root)];
    if let Some(heading) = &theme.heading_font {
        rules.push(
            CssRule::new(
                "h1, h2, h3, h4, h5, h6",
                vec![("font-family".to_string(), css_value(heading))],
            )
            .scoped(&config.theme_scope_class),
        );
    }
    rules
}

fn rule_for_class(class: &str, config: &EngineConfig) -> Option<CssRule> {
    let token = parse_theme_token(class)?;
    if !token.variants.iter().all(|v| is_known_variant(v)) {
        debug!(class, "theme token with unsupported variant skipped");
        return None;
    }
    let value = format!("var({})", config.css_var(token.role.as_str()));
    let declarations = utility_declarations(&token, &value);
    let mut rule = apply_variants(CssRule::new("", declarations), &token.variants, class);
    match token.utility {
        "divide" => rule.selector.push_str(" > :not([hidden]) ~ :not([hidden])"),
        "placeholder" => rule.selector.push_str("::placeholder"),
        _ => {}
    }
    Some(rule.scoped(&config.theme_scope_class))
}

fn utility_declarations(token: &ThemeToken<'_>, value: &str) -> Vec<(String, String)> {
    let value = if token.important {
        format!("{} !important", value)
    } else {
        value.to_string()
    };
    let single = |prop: &str| vec![(prop.to_string(), value.clone())];
    match token.utility {
        "bg" => single("background-color"),
        "text" | "placeholder" => single("color"),
        "border" | "divide" => single("border-color"),
        "border-t" => single("border-top-color"),
        "border-r" => single("border-right-color"),
        "border-b" => single("border-bottom-color"),
        "border-l" => single("border-left-color"),
        "border-x" => vec![
            ("border-left-color".to_string(), value.clone()),
            ("border-right-color".to_string(), value.clone()),
        ],
        "border-y" => vec![
            ("border-top-color".to_string(), value.clone()),
            ("border-bottom-color".to_string(), value.clone()),
        ],
        "ring" => single("--tw-ring-color"),
        "ring-offset" => single("--tw-ring-offset-color"),
        "outline" => single("outline-color"),
        "decoration" => single("text-decoration-color"),
        "accent" => single("accent-color"),
        "caret" => single("caret-color"),
        "fill" => single("fill"),
        "stroke" => single("stroke"),
        "from" => vec![
            ("--tw-gradient-from".to_string(), value.clone()),
            ("--tw-gradient-to".to_string(), "transparent".to_string()),
            (
                "--tw-gradient-stops".to_string(),
                "var(--tw-gradient-from), var(--tw-gradient-to)".to_string(),
            ),
        ],
        "via" => vec![
            ("--tw-gradient-to".to_string(), "transparent".to_string()),
            (
                "--tw-gradient-stops".to_string(),
                format!("var(--tw-gradient-from), {}, var(--tw-gradient-to)", value),
            ),
        ],
        "to" => single("--tw-gradient-to"),
        _ => Vec::new(),
    }
}

/// Strips characters that could close the declaration or the style element.
fn css_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_theme() -> Theme {
        Theme {
            primary_color: "#FF0000".to_string(),
            ..Theme::default()
        }
    }

    #[test]
    fn defines_scoped_custom_properties() {
        let css = synthesize_for_classes(&red_theme(), &EngineConfig::default(), &[] as &[&str]);
        assert!(css.starts_with(".pc-theme { --pc-primary: #FF0000;"));
        assert!(css.contains("--pc-primary-hover: #e60000;"));
        assert!(css.contains("--pc-muted: rgba(17, 24, 39, 0.7);"));
        assert!(css.contains("--pc-muted-foreground: rgba(17, 24, 39, 0.5);"));
    }

    #[test]
    fn maps_used_tokens_to_variables() {
        let css = synthesize_for_classes(
            &red_theme(),
            &EngineConfig::default(),
            &["text-theme-primary", "hover:bg-theme-primary-hover", "p-4"],
        );
        assert!(css.contains(".pc-theme .text-theme-primary { color: var(--pc-primary); }"));
        assert!(css.contains(
            ".pc-theme .hover\\:bg-theme-primary-hover:hover { background-color: var(--pc-primary-hover); }"
        ));
        assert!(!css.contains("p-4"));
    }

    #[test]
    fn full_stylesheet_covers_variants() {
        let css = synthesize(&Theme::default(), &EngineConfig::default());
        assert!(css.contains(".pc-theme .group:hover .group-hover\\:text-theme-secondary"));
        assert!(css.contains("@media (min-width: 48rem) {\n  .pc-theme .md\\:bg-theme-primary {"));
        assert!(css.contains(".pc-theme .divide-theme-muted > :not([hidden]) ~ :not([hidden])"));
    }

    #[test]
    fn hostile_theme_values_cannot_escape_the_rule() {
        let theme = Theme {
            font_family: Some("Inter; } body { display: none".to_string()),
            ..Theme::default()
        };
        let css = synthesize_for_classes(&theme, &EngineConfig::default(), &[] as &[&str]);
        assert!(!css.contains("body {"));
    }
}
