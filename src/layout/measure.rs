const WIDTH_SAFETY: f32 = 1.08;

// Per-character-class width fractions. Hand-tuned against the rendered
// output of the overlay font; changing them shifts every wrap decision,
// so they are part of the layout contract.
fn char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        return 0.28;
    }
    if ch.is_ascii_uppercase() {
        return 0.68;
    }
    if ch.is_ascii_lowercase() {
        return 0.55;
    }
    if ch.is_ascii_digit() {
        return 0.60;
    }
    match ch {
        '-' | '\u{2013}' | '\u{2014}' | '/' | '\\' | '_' => 0.36,
        '\'' | '"' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '`' => 0.22,
        '.' | ',' | ':' | ';' | '!' | '?' => 0.30,
        '@' | '#' | '$' | '%' | '&' | '*' | '+' | '=' => 0.72,
        _ => 0.55,
    }
}

/// Estimated rendered width of `text` at `font_size`, in the same unit as
/// the font size. Overestimates slightly on purpose: wrapping a word too
/// early is invisible, overflowing the band is not.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    let units: f32 = text.chars().map(char_units).sum();
    units * font_size * WIDTH_SAFETY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_font_size() {
        let narrow = estimate_width("screenshot", 48.0);
        let wide = estimate_width("screenshot", 96.0);
        assert!((wide - narrow * 2.0).abs() < 1e-3);
    }

    #[test]
    fn width_monotonic_in_length() {
        for ch in ['a', 'Z', '7', '.', '-', '@'] {
            let mut previous = 0.0;
            for len in 1..24 {
                let text: String = std::iter::repeat(ch).take(len).collect();
                let width = estimate_width(&text, 32.0);
                assert!(width > previous, "width shrank for {:?} x{}", ch, len);
                previous = width;
            }
        }
    }

    #[test]
    fn uppercase_wider_than_lowercase() {
        assert!(estimate_width("HELLO", 40.0) > estimate_width("hello", 40.0));
    }

    #[test]
    fn unknown_characters_use_default_class() {
        assert_eq!(estimate_width("é", 100.0), estimate_width("x", 100.0));
    }

    #[test]
    fn safety_margin_applied() {
        // one lowercase char: 0.55 * 100 * 1.08
        let width = estimate_width("a", 100.0);
        assert!((width - 59.4).abs() < 1e-3);
    }
}
