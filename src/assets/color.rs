use crate::foundation::core::Rgb8;

/// Sentinel meaning "no color" for optional backgrounds.
pub const NONE_SENTINEL: &str = "none";

const NAMED: &[(&str, Rgb8)] = &[
    ("white", Rgb8::new(255, 255, 255)),
    ("black", Rgb8::new(0, 0, 0)),
    ("red", Rgb8::new(255, 0, 0)),
    ("green", Rgb8::new(0, 128, 0)),
    ("lime", Rgb8::new(0, 255, 0)),
    ("blue", Rgb8::new(0, 0, 255)),
    ("yellow", Rgb8::new(255, 255, 0)),
    ("cyan", Rgb8::new(0, 255, 255)),
    ("magenta", Rgb8::new(255, 0, 255)),
    ("gray", Rgb8::new(128, 128, 128)),
    ("grey", Rgb8::new(128, 128, 128)),
    ("silver", Rgb8::new(192, 192, 192)),
    ("orange", Rgb8::new(255, 165, 0)),
    ("purple", Rgb8::new(128, 0, 128)),
    ("pink", Rgb8::new(255, 192, 203)),
    ("brown", Rgb8::new(165, 42, 42)),
    ("navy", Rgb8::new(0, 0, 128)),
    ("teal", Rgb8::new(0, 128, 128)),
    ("maroon", Rgb8::new(128, 0, 0)),
    ("olive", Rgb8::new(128, 128, 0)),
    ("gold", Rgb8::new(255, 215, 0)),
];

/// Parse a color given either by name (`"white"`) or as hex (`#RRGGBB`, `RRGGBB`, `#RGB`).
pub fn parse_color(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("color is empty".to_owned());
    }

    let lower = s.to_ascii_lowercase();
    if let Some((_, rgb)) = NAMED.iter().find(|(name, _)| *name == lower) {
        return Ok(*rgb);
    }

    parse_hex(s)
}

/// `true` when an optional color setting means "no color".
pub fn is_none_sentinel(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case(NONE_SENTINEL)
}

fn parse_hex(s: &str) -> Result<Rgb8, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !hex.is_ascii() {
        return Err(format!("unknown color \"{s}\""));
    }

    match hex.len() {
        6 => Ok(Rgb8::new(
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
        )),
        3 => {
            let nibble = |i: usize| -> Result<u8, String> {
                let v = hex_byte(&hex[i..i + 1])?;
                Ok(v * 17)
            };
            Ok(Rgb8::new(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        _ if s.starts_with('#') => {
            Err(format!("hex color \"{s}\" must be #RRGGBB or #RGB"))
        }
        _ => Err(format!("unknown color \"{s}\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_colors_case_insensitively() {
        assert_eq!(parse_color("white"), Ok(Rgb8::WHITE));
        assert_eq!(parse_color(" Red "), Ok(Rgb8::new(255, 0, 0)));
        assert_eq!(parse_color("GREY"), parse_color("gray"));
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_color("#ff8000"), Ok(Rgb8::new(255, 128, 0)));
        assert_eq!(parse_color("FF8000"), Ok(Rgb8::new(255, 128, 0)));
        assert_eq!(parse_color("#f80"), Ok(Rgb8::new(255, 136, 0)));
    }

    #[test]
    fn malformed_hex_is_an_error() {
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
        assert!(parse_color("not-a-color").is_err());
        assert!(parse_color("").is_err());
        assert!(parse_color("#ż0000").is_err());
    }

    #[test]
    fn none_sentinel_matches_empty_and_none() {
        assert!(is_none_sentinel("none"));
        assert!(is_none_sentinel("None"));
        assert!(is_none_sentinel(""));
        assert!(!is_none_sentinel("black"));
    }
}
