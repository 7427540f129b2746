use crate::capture::Frame;
use crate::config::Resolution;
use crate::core::resample::Resampler;
use anyhow::Result;
use crossterm::{
    cursor,
    style::Print,
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand, QueueableCommand,
};
use rayon::prelude::*;
use std::io::{Stdout, Write};

/// One terminal cell showing two vertically stacked pixels with '▀'
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cell {
    pub top: (u8, u8, u8),
    pub bottom: (u8, u8, u8),
}

/// Largest size with `src`'s aspect that fits `cols` x `rows` half-block cells.
/// Height is kept even so every cell has a top and bottom pixel.
pub fn fit(src: Resolution, cols: u16, rows: u16) -> Resolution {
    let max_w = cols.max(1) as u64;
    let max_h = rows.max(1) as u64 * 2;
    let (sw, sh) = (src.width.max(1) as u64, src.height.max(1) as u64);

    let (w, h) = if sw * max_h <= max_w * sh {
        (sw * max_h / sh, max_h)
    } else {
        (max_w, sh * max_w / sw)
    };
    let w = w.clamp(1, max_w) as u32;
    let h = h.clamp(2, max_h) as u32;
    Resolution::new(w, h - h % 2)
}

/// Map an RGB frame onto half-block cells, row-major.
pub fn half_block_cells(frame: &Frame) -> Vec<Cell> {
    let w = frame.width as usize;
    let rows = (frame.height as usize + 1) / 2;

    (0..w * rows)
        .into_par_iter()
        .map(|idx| {
            let cx = (idx % w) as u32;
            let cy = (idx / w) as u32;
            Cell {
                top: frame.pixel(cx, cy * 2),
                bottom: frame.pixel(cx, cy * 2 + 1),
            }
        })
        .collect()
}

fn push_rgb(buffer: &mut Vec<u8>, prefix: &[u8], (r, g, b): (u8, u8, u8)) {
    buffer.extend_from_slice(prefix);
    buffer.extend_from_slice(format!("{};{};{}m", r, g, b).as_bytes());
}

/// Append escape sequences for the cells that differ from `last`.
///
/// `last` of a different length forces a full redraw.
pub fn encode_cells(cells: &[Cell], width: usize, origin: (u16, u16), last: &[Cell], buffer: &mut Vec<u8>) {
    let full = last.len() != cells.len();
    let mut fg = None;
    let mut bg = None;
    let mut cursor: Option<(usize, usize)> = None;

    for (i, cell) in cells.iter().enumerate() {
        if !full && *cell == last[i] {
            cursor = None;
            continue;
        }

        let x = i % width;
        let y = i / width;
        if cursor != Some((x, y)) {
            let col = x + origin.0 as usize + 1;
            let row = y + origin.1 as usize + 1;
            buffer.extend_from_slice(format!("\x1b[{};{}H", row, col).as_bytes());
        }
        if fg != Some(cell.top) {
            push_rgb(buffer, b"\x1b[38;2;", cell.top);
            fg = Some(cell.top);
        }
        if bg != Some(cell.bottom) {
            push_rgb(buffer, b"\x1b[48;2;", cell.bottom);
            bg = Some(cell.bottom);
        }
        buffer.extend_from_slice("▀".as_bytes());

        // Wrapping is disabled, so the cursor stays on this row
        cursor = if x + 1 < width { Some((x + 1, y)) } else { None };
    }

    buffer.extend_from_slice(b"\x1b[0m");
}

/// Terminal view: video preview on top, status lines below.
pub struct Preview {
    stdout: Stdout,
    resampler: Resampler,
    last_cells: Vec<Cell>,
    last_layout: Option<(u16, u16, Resolution)>,
    buffer: Vec<u8>,
}

impl Preview {
    pub fn enter() -> Result<Self> {
        let mut stdout = std::io::stdout();
        terminal::enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(cursor::Hide)?;
        // Disable line wrapping (DECRAWM)
        stdout.execute(Print("\x1b[?7l"))?;

        Ok(Self {
            stdout,
            resampler: Resampler::new(),
            last_cells: Vec::new(),
            last_layout: None,
            buffer: Vec::with_capacity(1 << 20),
        })
    }

    pub fn draw(&mut self, frame: Option<&Frame>, status: &[String]) -> Result<()> {
        let (cols, rows) = terminal::size()?;
        let status_rows = status.len() as u16 + 1;
        let video_rows = rows.saturating_sub(status_rows).max(1);

        self.buffer.clear();
        self.buffer.extend_from_slice(b"\x1b[?2026h");

        if let Some(frame) = frame {
            let target = fit(frame.resolution(), cols, video_rows);
            let layout = (cols, rows, target);
            if self.last_layout != Some(layout) {
                self.buffer.extend_from_slice(b"\x1b[2J");
                self.last_cells.clear();
                self.last_layout = Some(layout);
            }

            let scaled = self.resampler.resize(frame, target)?;
            let cells = half_block_cells(&scaled);
            let origin = ((cols.saturating_sub(target.width as u16)) / 2, 0);
            encode_cells(&cells, target.width as usize, origin, &self.last_cells, &mut self.buffer);
            self.last_cells = cells;
        }

        self.buffer.extend_from_slice(b"\x1b[?2026l");
        self.stdout.write_all(&self.buffer)?;

        for (i, line) in status.iter().enumerate() {
            let text: String = line.chars().take(cols as usize).collect();
            self.stdout
                .queue(cursor::MoveTo(0, video_rows + 1 + i as u16))?
                .queue(terminal::Clear(ClearType::UntilNewLine))?
                .queue(Print(text))?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        let _ = self.stdout.execute(Print("\x1b[?7h"));
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fit_keeps_aspect_and_even_height() {
        // 16:9 into an 80x24 terminal: 48 pixel rows available
        let r = fit(Resolution::new(1280, 720), 80, 24);
        assert_eq!(r, Resolution::new(80, 44));

        let tall = fit(Resolution::new(640, 480), 200, 10);
        assert_eq!(tall, Resolution::new(26, 20));

        let tiny = fit(Resolution::new(640, 480), 0, 0);
        assert_eq!(tiny, Resolution::new(1, 2));
    }

    #[test]
    fn half_block_pairs_rows() {
        let mut data = vec![0u8; 2 * 4 * 3];
        // (0,0) red, (0,1) green, (1,2) blue, (1,3) yellow
        data[0] = 255;
        data[7] = 255;
        data[17] = 255;
        data[21] = 255;
        data[22] = 255;
        let frame = Frame::new(data, 2, 4, Duration::ZERO, 0).unwrap();

        let cells = half_block_cells(&frame);
        assert_eq!(cells.len(), 2 * 2);
        assert_eq!(cells[0], Cell { top: (255, 0, 0), bottom: (0, 255, 0) });
        assert_eq!(cells[3].top, (0, 0, 255));
        assert_eq!(cells[3].bottom, (255, 255, 0));
    }

    #[test]
    fn unchanged_cells_are_skipped() {
        let cells = vec![Cell::default(); 4];
        let mut first = Vec::new();
        encode_cells(&cells, 2, (0, 0), &[], &mut first);
        assert_eq!(String::from_utf8_lossy(&first).matches('▀').count(), 4);

        let mut changed = cells.clone();
        changed[3].top = (9, 9, 9);
        let mut second = Vec::new();
        encode_cells(&changed, 2, (0, 0), &cells, &mut second);
        let text = String::from_utf8_lossy(&second);
        assert_eq!(text.matches('▀').count(), 1);
        assert!(text.contains("\x1b[2;2H"));
        assert!(text.contains("\x1b[38;2;9;9;9m"));
    }
}
