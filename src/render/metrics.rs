//! Static Helvetica width tables used for word-wrapping.
//!
//! Widths are in 1/1000 em, indexed by WinAnsi byte. The tables cover
//! printable ASCII (0x20..=0x7E); the few typographic bytes the renderer emits
//! are handled explicitly and everything else falls back to `FALLBACK_WIDTH`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name used in page content streams.
    pub fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    fn table(self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA,
            Font::Bold => &HELVETICA_BOLD,
        }
    }

    /// Width of one encoded byte in 1/1000 em.
    fn byte_width(self, byte: u8) -> u16 {
        let bold = self == Font::Bold;
        match byte {
            0x20..=0x7E => self.table()[(byte - 0x20) as usize],
            0x91 | 0x92 => if bold { 278 } else { 222 },
            0x93 | 0x94 => if bold { 500 } else { 333 },
            0x95 => 350,
            0x96 => 556,
            0x97 => 1000,
            _ => FALLBACK_WIDTH,
        }
    }

    /// Rendered width of `text` in points at `size`.
    pub fn measure(self, text: &str, size: f32) -> f32 {
        let units: u32 = encode(text)
            .into_iter()
            .map(|b| u32::from(self.byte_width(b)))
            .sum();
        units as f32 * size / 1000.0
    }
}

const FALLBACK_WIDTH: u16 = 556;

/// Encodes text for a WinAnsiEncoding Type1 font.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\t' | '\n' | '\r' => b' ',
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word-wrap of `text` so that no line exceeds `max_width` points.
///
/// A single word wider than the line is kept whole on its own line.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    wrap_from(text, font, size, max_width, max_width)
}

/// Like [`wrap`], but the first line only has `first_width` points available.
pub fn wrap_from(
    text: &str,
    font: Font,
    size: f32,
    first_width: f32,
    max_width: f32,
) -> Vec<String> {
    let space = font.measure(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_width = font.measure(word, size);
        let limit = if lines.is_empty() { first_width } else { max_width };
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width > limit {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    // sp  !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // :   ;    <    =    >    ?    @
    278, 278, 584, 584, 584, 556, 1015,
    // A-M
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    // N-Z
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [   \    ]    ^    _    `
    278, 278, 278, 469, 556, 333,
    // a-m
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    // n-z
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // {   |    }    ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    // sp  !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // :   ;    <    =    >    ?    @
    333, 333, 584, 584, 584, 611, 975,
    // A-M
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    // N-Z
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [   \    ]    ^    _    `
    333, 278, 333, 584, 556, 333,
    // a-m
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    // n-z
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // {   |    }    ~
    389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_with_afm_widths() {
        // H(722) + i(222) = 944 units
        assert!((Font::Regular.measure("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert!(Font::Bold.measure("Hi", 10.0) > Font::Regular.measure("Hi", 10.0));
    }

    #[test]
    fn encodes_bullets_and_latin1() {
        assert_eq!(encode("\u{2022} café"), vec![0x95, b' ', b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode("数据"), b"??".to_vec());
    }

    #[test]
    fn wraps_within_width() {
        let text = "Built dashboards in Power BI and automated weekly reporting for the sales team";
        let lines = wrap(text, Font::Regular, 9.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Regular.measure(line, 9.0) <= 120.0 || !line.contains(' '));
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn overlong_word_stays_whole() {
        let lines = wrap("supercalifragilistic x", Font::Bold, 12.0, 20.0);
        assert_eq!(lines, vec!["supercalifragilistic", "x"]);
    }

    #[test]
    fn first_line_can_be_shorter() {
        let lines = wrap_from("aaa bbb ccc", Font::Regular, 10.0, 20.0, 1000.0);
        assert_eq!(lines, vec!["aaa", "bbb ccc"]);
    }

    #[test]
    fn blank_text_has_no_lines() {
        assert!(wrap("   ", Font::Regular, 9.0, 100.0).is_empty());
    }
}
