pub const CORPORATE: &str = "#F2AF58";
pub const FRANCHISE: &str = "#9B2E2E";
pub const GREEN: &str = "#96CB91";

pub const UNCOVERED_STATE: &str = "#88A4BC";
pub const COVERED_STATE: &str = "#334155";
pub const COVERED_STATE_HOVER: &str = "#3B729F";

pub const BORDER: &str = "#FFFFFF";
/// Outline of the hovered territory group.
pub const TERRITORY_OUTLINE: &str = "#E89F2D";
pub const TERRITORY_OUTLINE_OUTER: &str = "#F8D9A8";
pub const LABEL: &str = "#FFFFFF";

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// CSS color for a hex color at the given opacity. Unparseable input is returned unchanged.
pub fn hex_with_alpha(hex: &str, alpha: f64) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => rgba_css(r, g, b, alpha.clamp(0.0, 1.0)),
        None => hex.to_string(),
    }
}

/// Scale a color toward black by `amount` (0.0 = unchanged, 1.0 = black).
pub fn darken(hex: &str, amount: f64) -> Option<String> {
    let (r, g, b) = parse_hex(hex)?;
    let amount = amount.clamp(0.0, 1.0);
    let mix = |v: u8| (v as f64 * (1.0 - amount)).round() as u8;
    Some(to_hex(mix(r), mix(g), mix(b)))
}
