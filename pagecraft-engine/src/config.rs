use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Default step budget for one render of one component.
pub const DEFAULT_MAX_STEPS: u64 = 250_000;
/// Default interpreter call depth.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;
/// Default nesting depth accepted by the JSX parser.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 96;
/// Default number of compiled components kept in the render cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Engine-wide knobs. Every field has a default so partial YAML files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Container class the theme stylesheet is scoped to
    pub theme_scope_class: String,
    /// Prefix for the generated CSS custom properties (`--{prefix}-primary`)
    pub css_var_prefix: String,
    /// Brightness delta applied to base colors for `*-hover` tokens
    pub hover_darken: f64,
    /// Alpha for the `muted` variant
    pub muted_alpha: f64,
    /// Alpha for the `muted-foreground` variant
    pub muted_foreground_alpha: f64,
    /// Alpha for light-shade tints (`primary-muted`, `secondary-muted`)
    pub tint_alpha: f64,
    /// Rewrite fixed color utility classes into theme tokens before compiling
    pub rewrite_theme_tokens: bool,
    pub cache_capacity: usize,
    pub max_steps: u64,
    pub max_call_depth: usize,
    pub max_nesting_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            theme_scope_class: "pc-theme".to_string(),
            css_var_prefix: "pc".to_string(),
            hover_darken: 0.1,
            muted_alpha: 0.7,
            muted_foreground_alpha: 0.5,
            tint_alpha: 0.15,
            rewrite_theme_tokens: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_steps: DEFAULT_MAX_STEPS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.theme_scope_class.trim().is_empty()
            || self.theme_scope_class.contains(char::is_whitespace)
        {
            return Err(EngineError::InvalidConfig {
                field: "themeScopeClass".to_string(),
                reason: "must be a single non-empty class name".to_string(),
            });
        }
        if self.css_var_prefix.is_empty() {
            return Err(EngineError::InvalidConfig {
                field: "cssVarPrefix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        for (field, value) in [
            ("hoverDarken", self.hover_darken),
            ("mutedAlpha", self.muted_alpha),
            ("mutedForegroundAlpha", self.muted_foreground_alpha),
            ("tintAlpha", self.tint_alpha),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig {
                    field: field.to_string(),
                    reason: format!("{} is outside 0.0..=1.0", value),
                });
            }
        }
        if self.max_steps == 0 || self.max_call_depth == 0 || self.max_nesting_depth == 0 {
            return Err(EngineError::InvalidConfig {
                field: "limits".to_string(),
                reason: "interpreter and parser limits must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Name of a theme custom property, e.g. `--pc-primary`.
    pub fn css_var(&self, role: &str) -> String {
        format!("--{}-{}", self.css_var_prefix, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml("hoverDarken: 0.2\nmaxSteps: 1000\n").unwrap();
        assert_eq!(config.hover_darken, 0.2);
        assert_eq!(config.max_steps, 1000);
        assert_eq!(config.theme_scope_class, "pc-theme");
        assert!(config.rewrite_theme_tokens);
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        assert!(EngineConfig::from_yaml("mutedAlpha: 1.5").is_err());
    }

    #[test]
    fn rejects_scope_with_spaces() {
        assert!(EngineConfig::from_yaml("themeScopeClass: \"a b\"").is_err());
    }

    #[test]
    fn css_var_uses_prefix() {
        let config = EngineConfig::default();
        assert_eq!(config.css_var("primary-hover"), "--pc-primary-hover");
    }
}
