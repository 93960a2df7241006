//! Pixel surface composited onto the terminal with half-block cells.
//!
//! Every terminal cell carries two pixels: the top one is the cell background
//! and the bottom one is the foreground of a `▄` glyph. Text glyphs replace a
//! cell entirely and take the averaged pixel color as their background.

use glam::Vec2;
use std::io::{self, Write};

pub type Rgb = (u8, u8, u8);

#[derive(Clone, Copy)]
struct Glyph {
    ch: char,
    color: Rgb,
    alpha: f32,
    /// Continuation cell of a double-width glyph.
    shadow: bool,
}

pub struct Canvas {
    width: usize,
    height: usize,
    background: Rgb,
    pixels: Vec<[f32; 3]>,
    glyphs: Vec<Option<Glyph>>,
    output_buf: Vec<u8>,
}

impl Canvas {
    /// `height` is in pixels, two per terminal row.
    pub fn new(width: usize, height: usize, background: Rgb) -> Self {
        let mut canvas = Self {
            width: 0,
            height: 0,
            background,
            pixels: Vec::new(),
            glyphs: Vec::new(),
            output_buf: Vec::new(),
        };
        canvas.resize(width, height);
        canvas
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![rgb_to_f32(self.background); width * height];
        self.glyphs = vec![None; width * self.rows()];
        self.output_buf = Vec::with_capacity(width * height * 25);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn rows(&self) -> usize {
        self.height.div_ceil(2)
    }

    pub fn clear(&mut self) {
        let bg = rgb_to_f32(self.background);
        self.pixels.fill(bg);
        self.glyphs.fill(None);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Additive blend: overlapping light brightens.
    pub fn add(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        if let Some(idx) = self.index(x, y) {
            let px = &mut self.pixels[idx];
            px[0] += color.0 as f32 * alpha;
            px[1] += color.1 as f32 * alpha;
            px[2] += color.2 as f32 * alpha;
        }
    }

    /// Ordinary source-over blend.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        if let Some(idx) = self.index(x, y) {
            let px = &mut self.pixels[idx];
            px[0] = px[0] * (1.0 - alpha) + color.0 as f32 * alpha;
            px[1] = px[1] * (1.0 - alpha) + color.1 as f32 * alpha;
            px[2] = px[2] * (1.0 - alpha) + color.2 as f32 * alpha;
        }
    }

    /// Additive disc. Anything smaller than a pixel still lights its center.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: f32) {
        let cx = center.x.floor() as i32;
        let cy = center.y.floor() as i32;
        if radius < 0.75 {
            self.add(cx, cy, color, alpha);
            return;
        }

        let r = radius.ceil() as i32;
        let r2 = radius * radius;
        for dy in -r..=r {
            for dx in -r..=r {
                let px = cx as f32 + dx as f32 + 0.5;
                let py = cy as f32 + dy as f32 + 0.5;
                let d2 = (px - center.x).powi(2) + (py - center.y).powi(2);
                if d2 <= r2 {
                    self.add(cx + dx, cy + dy, color, alpha);
                }
            }
        }
    }

    /// Source-over filled rectangle covering `[left, right) x [top, bottom)`.
    pub fn fill_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: Rgb, alpha: f32) {
        let x0 = left.round() as i32;
        let y0 = top.round() as i32;
        let x1 = (right.round() as i32).max(x0 + 1);
        let y1 = (bottom.round() as i32).max(y0 + 1);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, alpha);
            }
        }
    }

    /// Places text centered on `center`. Glyphs that would leave the
    /// surface are dropped.
    pub fn put_text(&mut self, center: Vec2, text: &str, color: Rgb, alpha: f32) {
        if alpha <= 0.0 || self.width == 0 {
            return;
        }
        let row = (center.y / 2.0).floor() as i32;
        if row < 0 || row as usize >= self.rows() {
            return;
        }
        let total: usize = text.chars().map(glyph_width).sum();
        let mut col = (center.x - total as f32 / 2.0).round() as i32;

        for ch in text.chars() {
            let w = glyph_width(ch) as i32;
            if col >= 0 && (col + w) as usize <= self.width {
                let base = row as usize * self.width + col as usize;
                self.glyphs[base] = Some(Glyph { ch, color, alpha, shadow: false });
                for extra in 1..w as usize {
                    self.glyphs[base + extra] = Some(Glyph { ch, color, alpha, shadow: true });
                }
            }
            col += w;
        }
    }

    /// Composited color of a pixel, background included.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        clamp_rgb(self.pixels[y * self.width + x])
    }

    pub fn has_glyph(&self, col: usize, row: usize) -> bool {
        self.glyphs
            .get(row * self.width + col)
            .is_some_and(|g| g.is_some_and(|g| !g.shadow))
    }

    pub fn present<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top_color: Rgb = (255, 255, 255);
        let mut prev_bot_color: Rgb = (255, 255, 255);

        for y in (0..self.height).step_by(2) {
            let row = y / 2;
            for x in 0..self.width {
                let top_idx = y * self.width + x;
                let bot_idx = if y + 1 < self.height {
                    (y + 1) * self.width + x
                } else {
                    top_idx
                };
                let top_color = clamp_rgb(self.pixels[top_idx]);
                let bot_color = clamp_rgb(self.pixels[bot_idx]);

                match self.glyphs[row * self.width + x] {
                    Some(glyph) if glyph.shadow => {}
                    Some(glyph) => {
                        let bg = average(top_color, bot_color);
                        let fg = lerp_rgb(bg, glyph.color, glyph.alpha.min(1.0));
                        write!(
                            self.output_buf,
                            "\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{}",
                            bg.0, bg.1, bg.2, fg.0, fg.1, fg.2, glyph.ch
                        )?;
                        prev_top_color = bg;
                        prev_bot_color = fg;
                    }
                    None => {
                        if top_color != prev_top_color {
                            write!(
                                self.output_buf,
                                "\x1b[48;2;{};{};{}m",
                                top_color.0, top_color.1, top_color.2
                            )?;
                            prev_top_color = top_color;
                        }
                        if bot_color != prev_bot_color {
                            write!(
                                self.output_buf,
                                "\x1b[38;2;{};{};{}m",
                                bot_color.0, bot_color.1, bot_color.2
                            )?;
                            prev_bot_color = bot_color;
                        }
                        self.output_buf.extend_from_slice("▄".as_bytes());
                    }
                }
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top_color = (255, 255, 255);
            prev_bot_color = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()?;
        Ok(())
    }
}

/// Terminal columns taken by `ch`.
pub fn glyph_width(ch: char) -> usize {
    match ch as u32 {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x20000..=0x3FFFD => 2,
        _ => 1,
    }
}

/// HSL to RGB; hue in degrees (any value, wrapped), saturation and
/// lightness in [0, 1].
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    (
        ((r + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((g + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((b + m) * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

pub fn scale_rgb(color: Rgb, factor: f32) -> Rgb {
    (
        (color.0 as f32 * factor).clamp(0.0, 255.0) as u8,
        (color.1 as f32 * factor).clamp(0.0, 255.0) as u8,
        (color.2 as f32 * factor).clamp(0.0, 255.0) as u8,
    )
}

fn lerp_rgb(from: Rgb, to: Rgb, t: f32) -> Rgb {
    (
        (from.0 as f32 * (1.0 - t) + to.0 as f32 * t) as u8,
        (from.1 as f32 * (1.0 - t) + to.1 as f32 * t) as u8,
        (from.2 as f32 * (1.0 - t) + to.2 as f32 * t) as u8,
    )
}

fn average(a: Rgb, b: Rgb) -> Rgb {
    (
        ((a.0 as u16 + b.0 as u16) / 2) as u8,
        ((a.1 as u16 + b.1 as u16) / 2) as u8,
        ((a.2 as u16 + b.2 as u16) / 2) as u8,
    )
}

fn rgb_to_f32(color: Rgb) -> [f32; 3] {
    [color.0 as f32, color.1 as f32, color.2 as f32]
}

fn clamp_rgb(px: [f32; 3]) -> Rgb {
    (
        px[0].clamp(0.0, 255.0) as u8,
        px[1].clamp(0.0, 255.0) as u8,
        px[2].clamp(0.0, 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_blend_brightens() {
        let mut canvas = Canvas::new(4, 4, (0, 0, 0));
        canvas.add(1, 1, (100, 0, 0), 1.0);
        canvas.add(1, 1, (100, 50, 0), 1.0);
        assert_eq!(canvas.pixel(1, 1), (200, 50, 0));
        canvas.add(1, 1, (100, 0, 0), 1.0);
        assert_eq!(canvas.pixel(1, 1), (255, 50, 0));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut canvas = Canvas::new(4, 4, (0, 0, 0));
        canvas.add(-1, 0, (255, 255, 255), 1.0);
        canvas.blend(4, 0, (255, 255, 255), 1.0);
        canvas.fill_circle(Vec2::new(-10.0, -10.0), 3.0, (255, 255, 255), 1.0);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas.pixel(x, y), (0, 0, 0));
            }
        }
    }

    #[test]
    fn test_clear_restores_background() {
        let mut canvas = Canvas::new(3, 2, (10, 20, 30));
        canvas.fill_rect(0.0, 0.0, 3.0, 2.0, (255, 0, 0), 1.0);
        assert_eq!(canvas.pixel(2, 1), (255, 0, 0));
        canvas.clear();
        assert_eq!(canvas.pixel(2, 1), (10, 20, 30));
    }

    #[test]
    fn test_put_text_uses_wide_cells() {
        let mut canvas = Canvas::new(10, 4, (0, 0, 0));
        canvas.put_text(Vec2::new(5.0, 2.0), "马年", (255, 255, 255), 1.0);
        assert!(canvas.has_glyph(3, 1));
        assert!(!canvas.has_glyph(4, 1));
        assert!(canvas.has_glyph(5, 1));
    }

    #[test]
    fn test_present_writes_half_blocks() {
        let mut canvas = Canvas::new(2, 2, (0, 0, 0));
        canvas.add(0, 0, (255, 0, 0), 1.0);
        let mut out = Vec::new();
        canvas.present(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[H"));
        assert!(text.contains("\x1b[48;2;255;0;0m"));
        assert_eq!(text.matches('▄').count(), 2);
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl(360.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl(-120.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl(45.0, 0.0, 1.0), (255, 255, 255));
    }
}
