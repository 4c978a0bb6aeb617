//! Hex color arithmetic used by the theme stylesheet.
//!
//! Both operations are total: malformed input comes back unchanged.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Relative luminance in 0.0..=1.0 (sRGB weights, no gamma).
    pub fn luminance(self) -> f64 {
        (0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64) / 255.0
    }
}

/// Parses `#rgb` or `#rrggbb` (leading `#` optional, surrounding space ignored).
pub fn parse_hex(input: &str) -> Option<Rgb> {
    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// Adds `amount * 255` to every channel, clamped to `0..=255`.
///
/// Negative amounts darken. `adjust_brightness(c, 0.0)` returns `c` as given.
pub fn adjust_brightness(color: &str, amount: f64) -> String {
    if amount == 0.0 {
        return color.to_string();
    }
    let Some(rgb) = parse_hex(color) else {
        return color.to_string();
    };
    let delta = amount * 255.0;
    let shift = |channel: u8| (channel as f64 + delta).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: shift(rgb.r),
        g: shift(rgb.g),
        b: shift(rgb.b),
    }
    .to_hex()
}

/// `rgba()` form of a hex color at the given alpha.
pub fn with_alpha(color: &str, alpha: f64) -> String {
    match parse_hex(color) {
        Some(Rgb { r, g, b }) => format!("rgba({}, {}, {}, {})", r, g, b, alpha.clamp(0.0, 1.0)),
        None => color.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_is_identity() {
        assert_eq!(adjust_brightness("#10B981", 0.0), "#10B981");
        assert_eq!(adjust_brightness("not-a-color", 0.0), "not-a-color");
    }

    #[test]
    fn darkens_and_clamps() {
        assert_eq!(adjust_brightness("#10B981", -0.1), "#00a068");
        let dark = parse_hex(&adjust_brightness("#10B981", -0.1)).unwrap();
        let base = parse_hex("#10B981").unwrap();
        assert!(dark.luminance() < base.luminance());
        assert_eq!(adjust_brightness("#ffffff", 0.5), "#ffffff");
        assert_eq!(adjust_brightness("#000", -0.5), "#000000");
    }

    #[test]
    fn malformed_input_is_returned_unchanged() {
        assert_eq!(adjust_brightness("rgb(1,2,3)", -0.1), "rgb(1,2,3)");
        assert_eq!(adjust_brightness("#12345", -0.1), "#12345");
        assert_eq!(with_alpha("tomato", 0.5), "tomato");
    }

    #[test]
    fn alpha_produces_rgba() {
        assert_eq!(with_alpha("#111827", 0.7), "rgba(17, 24, 39, 0.7)");
        assert_eq!(with_alpha("#fff", 0.5), "rgba(255, 255, 255, 0.5)");
    }
}
