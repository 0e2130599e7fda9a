//! Championship identifiers and display names.

/// Known series ids and their display names.
const KNOWN_SERIES: [(&str, &str); 18] = [
    ("motogp", "MotoGP"),
    ("moto2", "Moto2"),
    ("moto3", "Moto3"),
    ("f1", "Formula 1"),
    ("f2", "Formula 2"),
    ("f3", "Formula 3"),
    ("indycar", "IndyCar"),
    ("worldsbk", "World Superbike"),
    ("worldrx", "World Rallycross"),
    ("dtm", "DTM"),
    ("nascar", "NASCAR Cup Series"),
    ("wec", "FIA WEC"),
    ("imsa", "IMSA WeatherTech"),
    ("wrc", "WRC"),
    ("formula_e", "Formula E"),
    ("btcc", "BTCC"),
    ("gt_world_challenge", "GT World Challenge"),
    ("custom", "Custom Series"),
];

/// Display name used for unknown series ids.
pub const CUSTOM_SERIES_NAME: &str = "Custom Series";

/// Returns the display name for a series id; unknown ids map to "Custom Series".
#[must_use]
pub fn display_name(series_id: &str) -> &'static str {
    let key = series_id.trim().to_ascii_lowercase();
    KNOWN_SERIES
        .iter()
        .find(|(id, _)| *id == key)
        .map_or(CUSTOM_SERIES_NAME, |(_, name)| name)
}

/// Lists every known series id, in display order.
pub fn known_series_ids() -> impl Iterator<Item = &'static str> {
    KNOWN_SERIES.iter().map(|(id, _)| *id)
}

/// Lowercase ASCII slug with single `_` separators.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}
