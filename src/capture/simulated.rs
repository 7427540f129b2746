//! Placeholder video used when no camera is attached.
//!
//! The frame is rendered once with a built-in 5x7 bitmap font and every tick
//! hands out the same pixels, so the pipeline always has something to show.

use crate::config::Resolution;
use std::sync::Arc;

const BACKGROUND: (u8, u8, u8) = (26, 26, 26);
pub const MARKER: (u8, u8, u8) = (100, 255, 100);

const LINES: [&str; 3] = ["VIDEO STREAM", "[SIMULATED]", "NO CAMERA"];

const GLYPH_W: usize = 5;
const GLYPH_H: usize = 7;

fn glyph(c: char) -> [u8; GLYPH_H] {
    match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        '[' => [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110],
        ']' => [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110],
        _ => [0; GLYPH_H],
    }
}

/// Render the "no camera" placeholder as packed RGB
pub fn render_placeholder(size: Resolution) -> Vec<u8> {
    let w = size.width as usize;
    let h = size.height as usize;
    let mut pixels = Vec::with_capacity(w * h * 3);
    for _ in 0..w * h {
        pixels.extend_from_slice(&[BACKGROUND.0, BACKGROUND.1, BACKGROUND.2]);
    }

    // Largest integer scale where the widest line fits in ~80% of the frame
    let widest = LINES.iter().map(|l| l.chars().count()).max().unwrap_or(1);
    let cell_w = GLYPH_W + 1;
    let scale = ((w * 4 / 5) / (widest * cell_w)).min((h * 3 / 5) / (LINES.len() * (GLYPH_H + 2))).max(1);

    let line_h = (GLYPH_H + 2) * scale;
    let block_h = line_h * LINES.len();
    let top = h.saturating_sub(block_h) / 2;

    for (row, line) in LINES.iter().enumerate() {
        let text_w = line.chars().count() * cell_w * scale;
        let left = w.saturating_sub(text_w) / 2;
        let y0 = top + row * line_h;

        for (i, c) in line.chars().enumerate() {
            let x0 = left + i * cell_w * scale;
            for (gy, bits) in glyph(c).iter().enumerate() {
                for gx in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - gx)) == 0 {
                        continue;
                    }
                    fill_block(&mut pixels, w, h, x0 + gx * scale, y0 + gy * scale, scale);
                }
            }
        }
    }

    pixels
}

fn fill_block(pixels: &mut [u8], w: usize, h: usize, x0: usize, y0: usize, scale: usize) {
    for y in y0..(y0 + scale).min(h) {
        for x in x0..(x0 + scale).min(w) {
            let offset = (y * w + x) * 3;
            pixels[offset] = MARKER.0;
            pixels[offset + 1] = MARKER.1;
            pixels[offset + 2] = MARKER.2;
        }
    }
}

pub struct SimulatedSource {
    size: Resolution,
    pixels: Arc<Vec<u8>>,
}

impl SimulatedSource {
    pub fn new(size: Resolution) -> Self {
        Self {
            size,
            pixels: Arc::new(render_placeholder(size)),
        }
    }

    pub fn size(&self) -> Resolution {
        self.size
    }

    pub fn pixels(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_marker(pixels: &[u8]) -> usize {
        pixels
            .chunks_exact(3)
            .filter(|p| (p[0], p[1], p[2]) == MARKER)
            .count()
    }

    #[test]
    fn placeholder_has_visible_marker() {
        let pixels = render_placeholder(Resolution::new(640, 480));
        assert_eq!(pixels.len(), 640 * 480 * 3);

        let lit = count_marker(&pixels);
        assert!(lit > 1000, "expected a readable label, got {} lit pixels", lit);
        assert!(lit < 640 * 480 / 2);
        // Corners stay background
        assert_eq!(&pixels[0..3], &[26, 26, 26]);
    }

    #[test]
    fn placeholder_is_deterministic() {
        let a = render_placeholder(Resolution::new(640, 480));
        let b = render_placeholder(Resolution::new(640, 480));
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let pixels = render_placeholder(Resolution::new(3, 2));
        assert_eq!(pixels.len(), 3 * 2 * 3);
    }
}
