use lopdf::{content::Operation, Object};

use super::metrics::{encode, wrap_from, Font};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
/// 0.4in on every side.
pub const MARGIN: f32 = 28.8;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Black,
    DarkGray,
    Blue,
}

impl Color {
    fn rgb(self) -> [f32; 3] {
        match self {
            Color::Black => [0.0, 0.0, 0.0],
            Color::DarkGray => [0.2, 0.2, 0.2],
            Color::Blue => [0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub color: Color,
}

impl Style {
    pub const fn new(font: Font, size: f32, leading: f32) -> Self {
        Self {
            font,
            size,
            leading,
            color: Color::Black,
        }
    }

    pub const fn colored(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn width(&self, text: &str) -> f32 {
        self.font.measure(text, self.size)
    }
}

/// A URI annotation; `rect` is `[x1, y1, x2, y2]` in page space.
#[derive(Debug, Clone)]
pub struct Link {
    pub rect: [f32; 4],
    pub uri: String,
}

#[derive(Debug, Default)]
pub struct Page {
    pub operations: Vec<Operation>,
    pub links: Vec<Link>,
}

/// Top-down page composer. `cursor` is the top of the free area on the
/// current page; a new page starts when a line would cross the bottom margin.
pub struct Composer {
    pages: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Page::default(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    /// Reserves one line of `leading` points and returns its baseline.
    pub fn next_line(&mut self, leading: f32) -> f32 {
        if self.cursor - leading < MARGIN {
            self.break_page();
        }
        self.cursor -= leading;
        self.cursor + leading * 0.2
    }

    /// Vertical gap; never carries over onto a fresh page.
    pub fn space(&mut self, points: f32) {
        self.cursor = (self.cursor - points).max(MARGIN);
    }

    pub fn text(&mut self, x: f32, baseline: f32, text: &str, style: &Style) {
        let [r, g, b] = style.color.rgb();
        let ops = &mut self.current.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(style.font.resource().into()), style.size.into()],
        ));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(encode(text))]));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Draws `text` so that it ends at the right margin; returns its left edge.
    pub fn text_right(&mut self, baseline: f32, text: &str, style: &Style) -> f32 {
        let x = PAGE_WIDTH - MARGIN - style.width(text);
        self.text(x, baseline, text, style);
        x
    }

    pub fn link(&mut self, x: f32, baseline: f32, text: &str, style: &Style, uri: &str) {
        self.current.links.push(Link {
            rect: [
                x,
                baseline - style.size * 0.25,
                x + style.width(text),
                baseline + style.size,
            ],
            uri: uri.to_string(),
        });
    }

    /// Full-width hairline under the previous line.
    pub fn rule(&mut self) {
        if self.cursor - 2.0 < MARGIN {
            self.break_page();
        }
        self.cursor -= 1.0;
        let y = self.cursor;
        let ops = &mut self.current.operations;
        ops.push(Operation::new("w", vec![0.5_f32.into()]));
        ops.push(Operation::new("m", vec![MARGIN.into(), y.into()]));
        ops.push(Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]));
        ops.push(Operation::new("S", vec![]));
        self.cursor -= 1.0;
    }

    /// Word-wrapped paragraph starting at `indent` from the left margin.
    pub fn paragraph(&mut self, text: &str, style: &Style, indent: f32) {
        let width = CONTENT_WIDTH - indent;
        for line in wrap_from(text, style.font, style.size, width, width) {
            let baseline = self.next_line(style.leading);
            self.text(MARGIN + indent, baseline, &line, style);
        }
    }

    /// A bold `label` followed by wrapped body text on the same first line.
    pub fn labelled(&mut self, label: &str, text: &str, label_style: &Style, style: &Style) {
        let label_width = label_style.width(label) + style.width(" ");
        let lines = wrap_from(
            text,
            style.font,
            style.size,
            CONTENT_WIDTH - label_width,
            CONTENT_WIDTH,
        );
        let baseline = self.next_line(style.leading);
        self.text(MARGIN, baseline, label, label_style);
        let mut lines = lines.into_iter();
        if let Some(first) = lines.next() {
            self.text(MARGIN + label_width, baseline, &first, style);
        }
        for line in lines {
            let baseline = self.next_line(style.leading);
            self.text(MARGIN, baseline, &line, style);
        }
    }

    /// Bullet glyph at `indent`, text hanging at `indent + hang`.
    pub fn bullet(&mut self, text: &str, style: &Style, indent: f32, hang: f32) {
        let width = CONTENT_WIDTH - indent - hang;
        let lines = wrap_from(text, style.font, style.size, width, width);
        for (i, line) in lines.iter().enumerate() {
            let baseline = self.next_line(style.leading);
            if i == 0 {
                self.text(MARGIN + indent, baseline, "\u{2022}", style);
            }
            self.text(MARGIN + indent + hang, baseline, line, style);
        }
    }

    pub fn finish(mut self) -> Vec<Page> {
        self.break_page();
        self.pages
    }
}
