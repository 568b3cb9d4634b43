//! Static lookup from an illustrative tag to a decorative glyph.
//!
//! Read steps may carry a tag naming the concept they illustrate; the tag is
//! resolved here so presentation layers never hold their own copy of the
//! mapping. Unknown tags fall back to a default glyph; an absent tag resolves
//! to nothing at all.

/// Glyph used when a tag is present but not in the table.
pub const DEFAULT_GLYPH: &str = "📚";

/// Look up the glyph for a known tag (case-insensitive).
#[must_use]
pub fn lookup(tag: &str) -> Option<&'static str> {
    match tag.to_ascii_lowercase().as_str() {
        "handshake" => Some("🤝"),
        "money" => Some("💰"),
        "chart" => Some("📈"),
        "business" => Some("💼"),
        "market" => Some("🏪"),
        "trade" => Some("📊"),
        "investment" => Some("💵"),
        "stock" => Some("📈"),
        "finance" => Some("💳"),
        "economy" => Some("🌍"),
        "success" => Some("✅"),
        "growth" => Some("📊"),
        "profit" => Some("💎"),
        "partnership" => Some("🤝"),
        "agreement" => Some("📝"),
        _ => None,
    }
}

/// Resolve an optional tag: absent → no glyph, unknown → the default glyph.
#[must_use]
pub fn resolve(tag: Option<&str>) -> Option<&'static str> {
    tag.map(|t| lookup(t).unwrap_or(DEFAULT_GLYPH))
}
