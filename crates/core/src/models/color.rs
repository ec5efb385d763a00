/// Saturation used for every derived display color.
pub const PASTEL_SATURATION: u32 = 70;

/// Lightness used for every derived display color.
pub const PASTEL_LIGHTNESS: u32 = 60;

/// 32-bit string hash: `h = h * 31 + unit` over the UTF-16 code units of
/// `seed`, wrapping at 2^32. Matches the hash the web front-end uses, so the
/// same asset gets the same color everywhere.
pub fn seed_hash(seed: &str) -> u32 {
    seed.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Hue in degrees (0..360) for a seed string.
pub fn seed_hue(seed: &str) -> u32 {
    seed_hash(seed) % 360
}

/// Deterministic pastel color for an asset identifier, as a CSS `hsl()` string.
///
/// The upstream price API has no brand colors, so the pie chart and cards
/// use this instead. Pure: same input, same output, across restarts.
pub fn seed_pastel(seed: &str) -> String {
    format!(
        "hsl({},{}%,{}%)",
        seed_hue(seed),
        PASTEL_SATURATION,
        PASTEL_LIGHTNESS
    )
}
