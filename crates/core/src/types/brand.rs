//! Brand styling helpers.

use serde::Serialize;

/// Primary colour of a brand that has not picked one.
pub const DEFAULT_PRIMARY_COLOR: &str = "#007bff";

/// Secondary colour of a brand that has not picked one.
pub const DEFAULT_SECONDARY_COLOR: &str = "#6c757d";

/// RGB triple used when a stored colour is not a valid `#rrggbb` value.
const FALLBACK_RGB: &str = "13, 110, 253";

/// Convert `#rrggbb` to the `r, g, b` form used inside CSS `rgba()`.
///
/// Invalid input yields `13, 110, 253`.
#[must_use]
pub fn hex_to_rgb(hex: &str) -> String {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return FALLBACK_RGB.to_owned();
    }
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => format!("{r}, {g}, {b}"),
        _ => FALLBACK_RGB.to_owned(),
    }
}

/// Derive a URL slug from a display name.
///
/// Lower-cases ASCII letters and digits and collapses every other run of
/// characters into a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// CSS custom properties derived from a brand's colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandPalette {
    #[serde(rename = "--brand-primary")]
    pub primary: String,
    #[serde(rename = "--brand-primary-rgb")]
    pub primary_rgb: String,
    #[serde(rename = "--brand-secondary")]
    pub secondary: String,
    #[serde(rename = "--brand-secondary-rgb")]
    pub secondary_rgb: String,
}

impl BrandPalette {
    /// Build the palette, substituting defaults for blank colours.
    #[must_use]
    pub fn new(primary: &str, secondary: &str) -> Self {
        let primary = non_blank(primary, DEFAULT_PRIMARY_COLOR);
        let secondary = non_blank(secondary, DEFAULT_SECONDARY_COLOR);
        Self {
            primary_rgb: hex_to_rgb(&primary),
            secondary_rgb: hex_to_rgb(&secondary),
            primary,
            secondary,
        }
    }
}

impl Default for BrandPalette {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR)
    }
}

fn non_blank(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() { default } else { value }.to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#007bff"), "0, 123, 255");
        assert_eq!(hex_to_rgb("6c757d"), "108, 117, 125");
        assert_eq!(hex_to_rgb("#FFF"), "13, 110, 253");
        assert_eq!(hex_to_rgb("#zzzzzz"), "13, 110, 253");
        assert_eq!(hex_to_rgb(""), "13, 110, 253");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Model2Design"), "model2design");
        assert_eq!(slugify("  Acme & Sons, Ltd. "), "acme-sons-ltd");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_palette_css_variables() {
        let palette = BrandPalette::new("#ff0000", " ");
        let json = serde_json::to_value(&palette).unwrap();
        assert_eq!(json["--brand-primary"], "#ff0000");
        assert_eq!(json["--brand-primary-rgb"], "255, 0, 0");
        assert_eq!(json["--brand-secondary"], DEFAULT_SECONDARY_COLOR);
        assert_eq!(json["--brand-secondary-rgb"], "108, 117, 125");
    }
}
