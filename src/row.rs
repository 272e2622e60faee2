//! Presentation of a single search hit.
//!
//! A `ShowRow` is built from a `Show` with every optional field already
//! resolved to either its value or a fixed placeholder, so rendering never
//! has to branch on missing data.

use ratatui::{
  style::{Modifier, Style},
  text::{Line, Span},
};

use crate::constants::constants;
use crate::theme::Theme;
use crate::tvmaze::{Show, ShowHit};
use crate::ui::{pad_to_width, truncate_str};

/// Thumbnail source for a row. A missing image is its own variant so the
/// placeholder text is never handed to the image loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
  Url(String),
  Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowRow {
  /// Unique show id, used as the list key.
  pub key: u64,
  pub thumbnail: Thumbnail,
  pub name: String,
  pub link: String,
  pub genre: String,
  pub rating: String,
}

impl ShowRow {
  pub fn new(
    key: u64,
    thumbnail: Option<&str>,
    name: &str,
    rating: Option<f64>,
    link: &str,
    genre: Option<&str>,
  ) -> Self {
    let missing = &constants().missing_field;
    Self {
      key,
      thumbnail: thumbnail.map_or(Thumbnail::Missing, |u| Thumbnail::Url(u.to_string())),
      name: name.to_string(),
      link: link.to_string(),
      genre: genre.filter(|g| !g.is_empty()).map_or_else(|| missing.clone(), str::to_string),
      rating: rating.map_or_else(|| missing.clone(), format_rating),
    }
  }

  pub fn from_show(show: &Show) -> Self {
    Self::new(show.id, show.thumbnail_url(), &show.name, show.rating(), &show.url, show.genre())
  }

  /// One row per hit, in response order.
  pub fn from_hits(hits: &[ShowHit]) -> Vec<Self> {
    hits.iter().map(|hit| Self::from_show(&hit.show)).collect()
  }

  pub fn thumbnail_url(&self) -> Option<&str> {
    match &self.thumbnail {
      Thumbnail::Url(u) => Some(u),
      Thumbnail::Missing => None,
    }
  }

  /// Render the row as one line `width` cells wide: name, genre, rating.
  pub fn to_line(&self, theme: &Theme, width: usize) -> Line<'static> {
    let rating_w = 5;
    let genre_w = (width / 4).clamp(6, 18);
    let name_w = width.saturating_sub(genre_w + rating_w + 2);

    let name = pad_to_width(&truncate_str(&self.name, name_w), name_w);
    let genre = pad_to_width(&truncate_str(&self.genre, genre_w), genre_w);
    let rating = format!("{:>rating_w$}", truncate_str(&self.rating, rating_w));

    Line::from(vec![
      Span::styled(name, Style::default().fg(theme.link).add_modifier(Modifier::UNDERLINED)),
      Span::raw(" "),
      Span::styled(genre, Style::default().fg(theme.muted)),
      Span::raw(" "),
      Span::styled(rating, Style::default().fg(theme.muted)),
    ])
  }
}

/// Whole ratings drop the decimal point; others keep their shortest form.
fn format_rating(rating: f64) -> String {
  if rating.fract() == 0.0 { format!("{:.0}", rating) } else { rating.to_string() }
}
