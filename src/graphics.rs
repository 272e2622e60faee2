use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use std::io::{Cursor, Write};

use crate::display::DisplayMode;

// --- Sizing ---

/// Largest cell rectangle inside `area` that keeps the image's aspect ratio.
///
/// Terminal cells are roughly twice as tall as they are wide, so one row covers
/// two horizontal "pixel units". The result is centered inside `area`.
pub fn fit_area(img_w: u32, img_h: u32, area: Rect) -> Rect {
  if img_w == 0 || img_h == 0 || area.is_empty() {
    return Rect { width: 0, height: 0, ..area };
  }
  let max_cols = area.width as u32;
  let max_rows = area.height as u32;

  let mut cols = max_cols;
  let mut rows = (cols * img_h).div_ceil(img_w * 2);
  if rows > max_rows {
    rows = max_rows;
    cols = ((rows * 2 * img_w) / img_h).clamp(1, max_cols);
  }

  let x = area.x + ((max_cols - cols) / 2) as u16;
  let y = area.y + ((max_rows - rows) / 2) as u16;
  Rect { x, y, width: cols as u16, height: rows.max(1) as u16 }
}

// --- Poster Widget ---

/// Draws a show thumbnail into the cell buffer (half-block or ASCII).
/// In Kitty mode the buffer is left untouched; the image is sent separately.
pub struct PosterWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    let target = fit_area(self.image.width(), self.image.height(), area);
    if target.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => draw_half_blocks(self.image, target, buf),
      DisplayMode::Ascii => draw_ascii(self.image, target, buf),
      DisplayMode::Kitty => {}
    }
  }
}

fn draw_half_blocks(image: &DynamicImage, target: Rect, buf: &mut Buffer) {
  let px = image.resize_exact(target.width as u32, target.height as u32 * 2, FilterType::Triangle).to_rgb8();
  for row in 0..target.height {
    for col in 0..target.width {
      let top = px.get_pixel(col as u32, row as u32 * 2);
      let bottom = px.get_pixel(col as u32, row as u32 * 2 + 1);
      buf.set_string(
        target.x + col,
        target.y + row,
        "▀",
        Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
      );
    }
  }
}

fn draw_ascii(image: &DynamicImage, target: Rect, buf: &mut Buffer) {
  let px = image.resize_exact(target.width as u32, target.height as u32, FilterType::Triangle).to_luma8();
  for row in 0..target.height {
    for col in 0..target.width {
      let luma = px.get_pixel(col as u32, row as u32)[0] as usize;
      let idx = (luma * (ASCII_RAMP.len() - 1) + 127) / 255;
      let ch = ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)] as char;
      buf.set_string(target.x + col, target.y + row, ch.to_string(), Style::default());
    }
  }
}

// --- Kitty Graphics Protocol ---
//
//   First chunk: ESC _G a=T,f=100,t=d,i=<id>,p=1,c=<cols>,r=<rows>,q=2,m=1;<base64> ESC \
//   Next chunks: ESC _G m=1;<base64> ESC \   (m=0 on the last one)
//   Delete:      ESC _G a=d,d=i,i=<id>,q=2 ESC \
//
// Re-sending with the same image id replaces the poster in place.

const KITTY_IMAGE_ID: u32 = 7;
const KITTY_CHUNK_SIZE: usize = 4096;

/// Encode `image` as PNG and split it into Kitty transmission escapes.
fn kitty_sequence(image: &DynamicImage, area: Rect) -> Result<String> {
  let mut png = Vec::new();
  image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).context("Failed to encode poster as PNG")?;
  let b64 = BASE64.encode(&png);

  let chunks: Vec<&str> = b64
    .as_bytes()
    .chunks(KITTY_CHUNK_SIZE)
    .map(|c| std::str::from_utf8(c).context("base64 chunk was not valid UTF-8"))
    .collect::<Result<_>>()?;
  let last = chunks.len().saturating_sub(1);

  let mut out = format!("\x1B[{};{}H", area.y.saturating_add(1), area.x.saturating_add(1));
  for (i, data) in chunks.iter().enumerate() {
    let more = u8::from(i < last);
    if i == 0 {
      out.push_str(&format!(
        "\x1B_Ga=T,f=100,t=d,i={},p=1,c={},r={},q=2,m={};{}\x1B\\",
        KITTY_IMAGE_ID, area.width, area.height, more, data
      ));
    } else {
      out.push_str(&format!("\x1B_Gm={};{}\x1B\\", more, data));
    }
  }
  Ok(out)
}

/// Place the poster over `area` (already aspect-fitted by the caller).
pub fn kitty_place(image: &DynamicImage, area: Rect) -> Result<()> {
  if area.is_empty() {
    return Ok(());
  }
  let seq = kitty_sequence(image, area)?;
  let mut stdout = std::io::stdout();
  stdout.write_all(seq.as_bytes()).context("Failed to write kitty poster")?;
  stdout.flush().context("Failed to flush kitty poster")?;
  Ok(())
}

/// Remove the poster placement, if any.
pub fn kitty_clear() -> Result<()> {
  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B_Ga=d,d=i,i={},q=2\x1B\\", KITTY_IMAGE_ID).context("Failed to write kitty delete")?;
  stdout.flush().context("Failed to flush kitty delete")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
  }

  #[test]
  fn fit_portrait_is_height_bound() {
    // 210x295 poster into a 40x10 pane: height limits.
    let r = fit_area(210, 295, Rect::new(0, 0, 40, 10));
    assert_eq!(r.height, 10);
    assert_eq!(r.width, 14);
    assert_eq!(r.x, 13);
  }

  #[test]
  fn fit_landscape_is_width_bound() {
    let r = fit_area(400, 100, Rect::new(2, 3, 20, 20));
    assert_eq!(r.width, 20);
    assert_eq!(r.height, 3);
    assert_eq!(r.x, 2);
    assert!(r.y > 3);
  }

  #[test]
  fn fit_degenerate_inputs() {
    assert!(fit_area(0, 10, Rect::new(0, 0, 10, 10)).is_empty());
    assert!(fit_area(10, 10, Rect::new(0, 0, 0, 10)).is_empty());
  }

  #[test]
  fn half_block_uses_image_colors() {
    let img = solid(8, 8, [200, 10, 10]);
    let area = Rect::new(0, 0, 8, 4);
    let mut buf = Buffer::empty(area);
    PosterWidget { image: &img, display_mode: DisplayMode::Direct }.render(area, &mut buf);

    let cell = &buf[(0, 0)];
    assert_eq!(cell.symbol(), "▀");
    let Color::Rgb(r, g, b) = cell.fg else { panic!("expected rgb foreground") };
    assert!(r > 190 && g < 20 && b < 20);
  }

  #[test]
  fn ascii_white_is_densest() {
    let img = solid(4, 4, [255, 255, 255]);
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    PosterWidget { image: &img, display_mode: DisplayMode::Ascii }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "@");
  }

  #[test]
  fn kitty_mode_leaves_buffer_alone() {
    let img = solid(4, 4, [255, 255, 255]);
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    PosterWidget { image: &img, display_mode: DisplayMode::Kitty }.render(area, &mut buf);
    assert_eq!(buf, Buffer::empty(area));
  }

  #[test]
  fn kitty_sequence_framing() {
    let img = solid(64, 64, [1, 2, 3]);
    let seq = kitty_sequence(&img, Rect::new(4, 2, 10, 5)).unwrap();
    assert!(seq.starts_with("\x1B[3;5H\x1B_Ga=T,f=100,t=d,i=7,p=1,c=10,r=5,q=2,"));
    assert!(seq.ends_with("\x1B\\"));
    assert!(seq.contains("m=0;"));
  }
}
