//! Chat line rasterizer for `minecraft` message mode.
//!
//! Draws a formatted Minecraft line onto a dark canvas with the in-game
//! colours and drop shadow, then encodes it as PNG.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::common::error::{BridgeError, BridgeResult};
use crate::minecraft::format::segments;
use crate::render::font::{glyph, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Converts a formatted chat line into image bytes.
pub trait ChatImageRenderer: Send + Sync {
    fn render(&self, full_message: &str) -> BridgeResult<Vec<u8>>;
}

const BACKGROUND: [u8; 4] = [0x36, 0x39, 0x3F, 0xFF];
const PADDING: u32 = 8;

/// Bitmap-font renderer backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct BitmapChatRenderer {
    /// Pixel multiplier for each font pixel.
    scale: u32,
    /// Characters per line before wrapping.
    max_columns: usize,
}

impl Default for BitmapChatRenderer {
    fn default() -> Self {
        Self::new(2, 80)
    }
}

impl BitmapChatRenderer {
    pub fn new(scale: u32, max_columns: usize) -> Self {
        Self {
            scale: scale.max(1),
            max_columns: max_columns.max(1),
        }
    }

    fn cell_width(&self) -> u32 {
        (GLYPH_WIDTH + 1) * self.scale
    }

    fn line_height(&self) -> u32 {
        (GLYPH_HEIGHT + 2) * self.scale
    }

    /// Lay out coloured characters into wrapped lines.
    fn layout(&self, full_message: &str) -> Vec<Vec<(char, [u8; 3])>> {
        let mut lines = vec![Vec::new()];

        for segment in segments(full_message) {
            for ch in segment.text.chars() {
                if ch == '\n' {
                    lines.push(Vec::new());
                    continue;
                }
                let needs_wrap = lines
                    .last()
                    .map_or(false, |line| line.len() >= self.max_columns);
                if needs_wrap {
                    lines.push(Vec::new());
                }
                if let Some(line) = lines.last_mut() {
                    line.push((ch, segment.color));
                }
            }
        }

        lines
    }

    fn draw_glyph(&self, canvas: &mut RgbaImage, ch: char, x: u32, y: u32, color: [u8; 3]) {
        let columns = glyph(ch);
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if bits & (1 << row) == 0 {
                    continue;
                }
                let px = x + col as u32 * self.scale;
                let py = y + row * self.scale;
                for dx in 0..self.scale {
                    for dy in 0..self.scale {
                        let (cx, cy) = (px + dx, py + dy);
                        if cx < canvas.width() && cy < canvas.height() {
                            canvas.put_pixel(cx, cy, Rgba([color[0], color[1], color[2], 0xFF]));
                        }
                    }
                }
            }
        }
    }

    /// Rasterize into an in-memory image.
    pub fn rasterize(&self, full_message: &str) -> RgbaImage {
        let lines = self.layout(full_message);
        let columns = lines.iter().map(Vec::len).max().unwrap_or(0).max(1) as u32;

        let width = PADDING * 2 + columns * self.cell_width();
        let height = PADDING * 2 + lines.len() as u32 * self.line_height();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(BACKGROUND));

        for (row, line) in lines.iter().enumerate() {
            let y = PADDING + row as u32 * self.line_height();
            for (col, (ch, color)) in line.iter().enumerate() {
                let x = PADDING + col as u32 * self.cell_width();
                // Minecraft draws a quarter-brightness shadow one pixel down-right
                let shadow = color.map(|c| c / 4);
                self.draw_glyph(&mut canvas, *ch, x + self.scale, y + self.scale, shadow);
                self.draw_glyph(&mut canvas, *ch, x, y, *color);
            }
        }

        canvas
    }
}

impl ChatImageRenderer for BitmapChatRenderer {
    fn render(&self, full_message: &str) -> BridgeResult<Vec<u8>> {
        let canvas = self.rasterize(full_message);
        let mut buf = Cursor::new(Vec::new());
        canvas
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| BridgeError::Render {
                message: e.to_string(),
            })?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_png() {
        let renderer = BitmapChatRenderer::default();
        let bytes = renderer.render("§2Guild > §bSteve§f: hello").unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_canvas_size_tracks_text() {
        let renderer = BitmapChatRenderer::new(1, 80);
        let short = renderer.rasterize("hi");
        let long = renderer.rasterize("hello there");
        assert!(long.width() > short.width());
        assert_eq!(short.height(), long.height());
    }

    #[test]
    fn test_long_lines_wrap() {
        let renderer = BitmapChatRenderer::new(1, 10);
        let one_line = renderer.rasterize("0123456789");
        let two_lines = renderer.rasterize("0123456789abc");
        assert_eq!(one_line.width(), two_lines.width());
        assert!(two_lines.height() > one_line.height());
    }

    #[test]
    fn test_text_uses_segment_color() {
        let renderer = BitmapChatRenderer::new(1, 80);
        let canvas = renderer.rasterize("§cI");
        // 'I' has its full-height stroke in the middle column
        let stroke = canvas.get_pixel(PADDING + 2, PADDING + 3);
        assert_eq!(stroke, &Rgba([0xFF, 0x55, 0x55, 0xFF]));
    }

    #[test]
    fn test_empty_message_still_renders() {
        let renderer = BitmapChatRenderer::default();
        assert!(renderer.render("").is_ok());
    }
}
