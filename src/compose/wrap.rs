//! Greedy word wrapping on approximate glyph advances.
//!
//! The media backend does the real glyph layout; the advance estimate only needs to be close
//! enough to decide line breaks for a `wrap_width`.

/// Average glyph advance as a fraction of the font size.
pub const AVG_ADVANCE_EM: f64 = 0.55;

fn advance(font_size: u32) -> f64 {
    f64::from(font_size) * AVG_ADVANCE_EM
}

/// Break `text` into lines no wider than `width_px`, splitting words that do not fit on a line.
///
/// Existing line breaks are kept. At least one character is placed per line.
pub fn wrap_text(text: &str, width_px: u32, font_size: u32) -> String {
    let max_chars = ((f64::from(width_px) / advance(font_size)).floor() as usize).max(1);

    let mut out: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed <= max_chars {
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(word.iter());
                line_len += word.len();
                continue;
            }

            if line_len > 0 {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            while word.len() > max_chars {
                let rest = word.split_off(max_chars);
                out.push(word.into_iter().collect());
                word = rest;
            }
            line.extend(word.iter());
            line_len = word.len();
        }

        out.push(line);
    }

    out.join("\n")
}
