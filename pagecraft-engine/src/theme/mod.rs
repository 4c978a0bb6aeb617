//! Project theme: palette, typography, and the two transforms built on it.
//!
//! [`rewrite_source`] turns fixed color utilities (`bg-blue-500`) into
//! theme-backed tokens (`bg-theme-primary`); [`synthesize`] emits the scoped
//! stylesheet those tokens resolve against.

pub mod color;
mod rewrite;
mod stylesheet;

pub use color::{adjust_brightness, parse_hex, with_alpha, Rgb};
pub use rewrite::{
    parse_theme_token, rewrite_class_list, rewrite_source, rewrite_token, ThemeToken, COLOR_UTILITIES,
};
pub use stylesheet::{synthesize, synthesize_for_classes};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Marker placed between utility and role in rewritten tokens.
pub const THEME_TOKEN_MARKER: &str = "theme";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#3b82f6".to_string(),
            secondary_color: "#10b981".to_string(),
            background_color: "#ffffff".to_string(),
            text_color: "#111827".to_string(),
            accent_color: None,
            font_family: None,
            heading_font: None,
            border_radius: None,
        }
    }
}

impl Theme {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> EngineResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Concrete CSS color a role resolves to under this theme.
    pub fn resolve(&self, role: ThemeRole, config: &EngineConfig) -> String {
        match role {
            ThemeRole::Primary => self.primary_color.clone(),
            ThemeRole::PrimaryHover => adjust_brightness(&self.primary_color, -config.hover_darken),
            ThemeRole::PrimaryMuted => with_alpha(&self.primary_color, config.tint_alpha),
            ThemeRole::Secondary => self.secondary_color.clone(),
            ThemeRole::SecondaryHover => {
                adjust_brightness(&self.secondary_color, -config.hover_darken)
            }
            ThemeRole::SecondaryMuted => with_alpha(&self.secondary_color, config.tint_alpha),
            ThemeRole::Background => self.background_color.clone(),
            ThemeRole::Foreground => self.text_color.clone(),
            ThemeRole::Muted => with_alpha(&self.text_color, config.muted_alpha),
            ThemeRole::MutedForeground => {
                with_alpha(&self.text_color, config.muted_foreground_alpha)
            }
        }
    }
}

/// Palette slot a rewritten token points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThemeRole {
    Primary,
    PrimaryHover,
    PrimaryMuted,
    Secondary,
    SecondaryHover,
    SecondaryMuted,
    Background,
    Foreground,
    Muted,
    MutedForeground,
}

impl ThemeRole {
    pub const ALL: [ThemeRole; 10] = [
        ThemeRole::Primary,
        ThemeRole::PrimaryHover,
        ThemeRole::PrimaryMuted,
        ThemeRole::Secondary,
        ThemeRole::SecondaryHover,
        ThemeRole::SecondaryMuted,
        ThemeRole::Background,
        ThemeRole::Foreground,
        ThemeRole::Muted,
        ThemeRole::MutedForeground,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeRole::Primary => "primary",
            ThemeRole::PrimaryHover => "primary-hover",
            ThemeRole::PrimaryMuted => "primary-muted",
            ThemeRole::Secondary => "secondary",
            ThemeRole::SecondaryHover => "secondary-hover",
            ThemeRole::SecondaryMuted => "secondary-muted",
            ThemeRole::Background => "background",
            ThemeRole::Foreground => "foreground",
            ThemeRole::Muted => "muted",
            ThemeRole::MutedForeground => "muted-foreground",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    /// The `*-hover` counterpart, for roles that have one.
    pub fn hovered(self) -> Self {
        match self {
            ThemeRole::Primary => ThemeRole::PrimaryHover,
            ThemeRole::Secondary => ThemeRole::SecondaryHover,
            other => other,
        }
    }
}

impl fmt::Display for ThemeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_derived_roles() {
        let theme = Theme {
            secondary_color: "#10B981".to_string(),
            ..Theme::default()
        };
        let config = EngineConfig::default();
        assert_eq!(theme.resolve(ThemeRole::SecondaryHover, &config), "#00a068");
        assert_eq!(theme.resolve(ThemeRole::Muted, &config), "rgba(17, 24, 39, 0.7)");
        assert_eq!(
            theme.resolve(ThemeRole::MutedForeground, &config),
            "rgba(17, 24, 39, 0.5)"
        );
    }

    #[test]
    fn theme_json_uses_camel_case() {
        let theme = Theme::from_json(
            r##"{"primaryColor":"#FF0000","secondaryColor":"#00FF00","backgroundColor":"#fff","textColor":"#000","fontFamily":"Inter"}"##,
        )
        .unwrap();
        assert_eq!(theme.primary_color, "#FF0000");
        assert_eq!(theme.font_family.as_deref(), Some("Inter"));
        assert_eq!(theme.accent_color, None);
    }

    #[test]
    fn roles_round_trip_through_names() {
        for role in ThemeRole::ALL {
            assert_eq!(ThemeRole::parse(role.as_str()), Some(role));
        }
    }
}
