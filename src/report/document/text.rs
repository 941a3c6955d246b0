//! Glyph metrics and WinAnsi encoding for the base-14 Helvetica fonts.

pub const ELLIPSIS: char = '…';

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const DEFAULT_WIDTH: u16 = 556;

fn glyph_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 32],
        ELLIPSIS => 1000,
        _ => DEFAULT_WIDTH,
    }
}

/// Estimated advance of `text` at `size` points. Bold runs use the regular
/// metrics, which is close enough for alignment.
pub fn estimate_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    units as f32 * size / 1000.0
}

/// Shortens `text` with a trailing ellipsis so it fits in `max_width`
pub fn ellipsize(text: &str, max_width: f32, size: f32) -> String {
    if estimate_width(text, size) <= max_width {
        return text.to_string();
    }

    let budget = max_width - estimate_width(&ELLIPSIS.to_string(), size);
    let mut used = 0.0;
    let mut fitted = String::new();
    for c in text.chars() {
        let advance = f32::from(glyph_width(c)) * size / 1000.0;
        if used + advance > budget {
            break;
        }
        used += advance;
        fitted.push(c);
    }

    let mut fitted = fitted.trim_end().to_string();
    fitted.push(ELLIPSIS);
    fitted
}

/// Maps text to WinAnsiEncoding bytes, anything without a code point
/// becomes `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}
