use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, HitAreas};
use crate::constants::constants;
use crate::graphics::{PosterWidget, fit_area};
use crate::panel::PanelView;
use crate::row::{ShowRow, Thumbnail};
use crate::theme::Theme;

const PANEL_MAX_WIDTH: u16 = 100;
const PANEL_EXPANDED_HEIGHT: u16 = 24;
const PREVIEW_WIDTH: u16 = 26;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` display cells, appending "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    out.push(c);
    used += w;
  }
  if max_width > 0 {
    out.push('…');
  }
  out
}

/// Right-pad `s` with spaces to exactly `width` display cells (when it fits).
pub fn pad_to_width(s: &str, width: usize) -> String {
  let w = s.width();
  if w >= width { s.to_string() } else { format!("{}{}", s, " ".repeat(width - w)) }
}

fn spinner_frame(app: &App) -> &'static str {
  let frames = &constants().spinner_frames;
  if frames.is_empty() {
    return "…";
  }
  let idx = (app.started_at.elapsed().as_millis() / 120) as usize % frames.len();
  &frames[idx]
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.gfx.poster_area = None;

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, _, body_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_panel(frame, app, body_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ⌕ tvfind ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let version_w = (version.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - version_w, width: version_w, ..area };
  frame.render_widget(right, right_area);
}

/// The panel is centered horizontally and grows downwards when expanded.
fn panel_rect(app: &App, body: Rect) -> Rect {
  let width = body.width.min(PANEL_MAX_WIDTH);
  let height = if app.panel.is_expanded() { body.height.min(PANEL_EXPANDED_HEIGHT) } else { body.height.min(3) };
  Rect { x: body.x + (body.width - width) / 2, y: body.y, width, height }
}

fn render_panel(frame: &mut Frame, app: &mut App, body: Rect) {
  let theme = app.theme();
  let area = panel_rect(app, body);
  let expanded = app.panel.is_expanded();

  let border_color = if expanded { theme.accent } else { theme.border };
  let block = Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .style(Style::default().bg(theme.panel_bg));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let mut hit = HitAreas { panel: area, input: Rect { height: area.height.min(3), ..area }, close: None, list: None };

  let [input_area, rest] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
  hit.close = render_input(frame, app, input_area);

  if expanded && rest.height > 1 {
    let [separator, content] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(rest);
    frame.render_widget(
      Paragraph::new("─".repeat(separator.width as usize)).style(Style::default().fg(theme.border)),
      separator,
    );
    hit.list = render_content(frame, app, content);
  }

  app.hit = hit;
}

/// Draw the input line. Returns the close glyph's area when it is shown.
fn render_input(frame: &mut Frame, app: &mut App, area: Rect) -> Option<Rect> {
  let theme = app.theme();
  let expanded = app.panel.is_expanded();

  let [icon_area, text_area, close_area] =
    Layout::horizontal([Constraint::Length(3), Constraint::Min(1), Constraint::Length(if expanded { 3 } else { 0 })])
      .areas(area);

  frame.render_widget(Paragraph::new(" ⌕").style(Style::default().fg(theme.muted)), icon_area);

  let query = app.panel.query();
  if query.is_empty() && !expanded {
    let placeholder = Paragraph::new(constants().input_placeholder.as_str()).style(Style::default().fg(theme.muted));
    frame.render_widget(placeholder, text_area);
  } else if text_area.width > 0 {
    let inner_w = text_area.width as usize;
    let cursor_col = display_width(query, app.cursor_position);

    if cursor_col < app.input_scroll {
      app.input_scroll = cursor_col;
    } else if cursor_col >= app.input_scroll + inner_w {
      app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
    }

    let visible: String = query
      .chars()
      .scan(0usize, |col, c| {
        let w = c.width().unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= app.input_scroll)
      .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();

    frame
      .render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)), text_area);

    if expanded {
      let cursor_x = text_area.x + cursor_col.saturating_sub(app.input_scroll) as u16;
      frame.set_cursor_position((cursor_x, text_area.y));
    }
  }

  if !expanded {
    return None;
  }
  frame.render_widget(Paragraph::new(" ✕").style(Style::default().fg(theme.muted)), close_area);
  Some(close_area)
}

/// Draw the panel body. Returns the list area when results are shown.
fn render_content(frame: &mut Frame, app: &mut App, area: Rect) -> Option<Rect> {
  let theme = app.theme();
  let c = constants();

  let message = match app.panel.view() {
    PanelView::Collapsed => return None,
    PanelView::Loading => Ok(Line::from(Span::styled(spinner_frame(app), Style::default().fg(theme.fg).bold()))),
    PanelView::Prompt => Ok(Line::from(Span::styled(c.prompt_message.as_str(), Style::default().fg(theme.muted)))),
    PanelView::NoResults => Ok(Line::from(Span::styled(c.no_results_message.as_str(), Style::default().fg(theme.muted)))),
    PanelView::Results(hits) => Err(ShowRow::from_hits(hits)),
  };

  let message = match message {
    Ok(message) => message,
    Err(rows) => {
      let [list_area, preview_area] = if area.width >= PREVIEW_WIDTH * 2 + 20 {
        Layout::horizontal([Constraint::Min(20), Constraint::Length(PREVIEW_WIDTH)]).areas(area)
      } else {
        [area, Rect { width: 0, ..area }]
      };
      render_results(frame, app, list_area, &rows);
      if !preview_area.is_empty() {
        render_preview(frame, app, preview_area);
      }
      return Some(list_area);
    }
  };

  let y = area.y + area.height.saturating_sub(1) / 2;
  frame.render_widget(
    Paragraph::new(message).alignment(Alignment::Center),
    Rect { y, height: area.height.min(1), ..area },
  );
  None
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect, rows: &[ShowRow]) {
  let theme = app.theme();
  // Highlight symbol takes two cells.
  let inner_w = area.width.saturating_sub(2) as usize;

  let items: Vec<ListItem> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.panel_bg };
      ListItem::new(row.to_line(theme, inner_w)).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some(row) = app.selected_row() else { return };
  let notice = match (&row.thumbnail, &app.preview.image) {
    (Thumbnail::Missing, _) => constants().missing_thumbnail.as_str(),
    (Thumbnail::Url(_), None) => "Loading poster…",
    (Thumbnail::Url(_), Some(image)) => {
      if app.display_mode.is_protocol() {
        let target = fit_area(image.width(), image.height(), inner);
        if !target.is_empty() {
          app.gfx.poster_area = Some(target);
        }
      } else {
        frame.render_widget(PosterWidget { image, display_mode: app.display_mode }, inner);
      }
      return;
    }
  };

  let y = inner.y + inner.height.saturating_sub(1) / 2;
  frame.render_widget(
    Paragraph::new(notice).alignment(Alignment::Center).style(Style::default().fg(theme.muted)),
    Rect { y, height: inner.height.min(1), ..inner },
  );
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.panel.is_loading() {
    (format!(" ⏳ Searching '{}'…", app.panel.query().trim()), Style::default().fg(theme.status))
  } else if app.is_debounce_pending() && !app.panel.query().trim().is_empty() {
    (" Typing…".to_string(), Style::default().fg(theme.muted))
  } else if app.panel.no_findings() {
    (" No matches".to_string(), Style::default().fg(theme.muted))
  } else if !app.panel.results().is_empty() {
    let n = app.panel.results().len();
    (format!(" {} show{}", n, if n == 1 { "" } else { "s" }), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = if app.panel.is_expanded() {
    let mut k = vec![("Type", "Search")];
    if !app.panel.results().is_empty() {
      k.push(("↑/↓", "Select"));
      k.push(("Enter", "Open"));
    }
    k.push(("Esc", "Close"));
    k.push(("^t", "Theme"));
    k
  } else {
    vec![("Tab", "Focus"), ("^t", "Theme"), ("Esc", "Quit")]
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} · {} ", theme.name, app.display_mode.label());
  let label_w = theme_label.width() as u16;
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(label_w), width: label_w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}
