use ratatui::{
  crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind},
  layout::Position,
};
use tracing::debug;

use crate::app::App;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Apply an edit to a copy of the query and hand the result back to the app,
/// which decides whether the debounce timer restarts.
fn edit_query(app: &mut App, edit: impl FnOnce(&mut String, &mut usize)) {
  let mut query = app.panel.query().to_string();
  let mut cursor = app.cursor_position;
  edit(&mut query, &mut cursor);
  app.cursor_position = cursor.min(query.chars().count());
  app.set_query(query);
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('u') if app.panel.is_expanded() => edit_query(app, |q, cursor| {
        let byte_idx = char_to_byte_index(q, *cursor);
        q.replace_range(..byte_idx, "");
        *cursor = 0;
      }),
      _ => {}
    }
    return;
  }

  if app.panel.is_expanded() {
    handle_expanded_key(app, key);
  } else {
    handle_collapsed_key(app, key);
  }
}

fn handle_collapsed_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Tab | KeyCode::Enter | KeyCode::Down | KeyCode::Char('/') => app.focus(),
    KeyCode::Char(c) => {
      app.focus();
      insert_char(app, c);
    }
    KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_expanded_key(app: &mut App, key: KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Esc => app.collapse(),
    KeyCode::Enter => app.open_selected(),
    KeyCode::Down => app.select_next(),
    KeyCode::Up => app.select_prev(),
    KeyCode::Char(c) => insert_char(app, c),
    KeyCode::Backspace => edit_query(app, |q, cursor| {
      if *cursor > 0 {
        *cursor -= 1;
        let byte_idx = char_to_byte_index(q, *cursor);
        q.remove(byte_idx);
      }
    }),
    KeyCode::Delete => edit_query(app, |q, cursor| {
      if *cursor < q.chars().count() {
        let byte_idx = char_to_byte_index(q, *cursor);
        q.remove(byte_idx);
      }
    }),
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.panel.query().chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.panel.query().chars().count();
    }
    _ => {}
  }
}

fn insert_char(app: &mut App, c: char) {
  edit_query(app, |q, cursor| {
    let byte_idx = char_to_byte_index(q, *cursor);
    q.insert(byte_idx, c);
    *cursor += 1;
  });
}

/// Mouse clicks map onto the panel's focus / close / click-outside transitions.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
  let pos = Position { x: mouse.column, y: mouse.row };
  match mouse.kind {
    MouseEventKind::Down(MouseButton::Left) => {
      let hit = app.hit;
      if hit.close.is_some_and(|r| r.contains(pos)) {
        debug!("close clicked");
        app.collapse();
      } else if hit.input.contains(pos) {
        app.focus();
      } else if let Some(list) = hit.list
        && list.contains(pos)
      {
        let idx = app.list_state.offset() + (pos.y - list.y) as usize;
        if app.list_state.selected() == Some(idx) {
          app.open_selected();
        } else {
          app.select_index(idx);
        }
      } else if !hit.panel.contains(pos) && app.panel.is_expanded() {
        debug!("click outside panel");
        app.collapse();
      }
    }
    MouseEventKind::ScrollDown if app.hit.list.is_some() => app.select_next(),
    MouseEventKind::ScrollUp if app.hit.list.is_some() => app.select_prev(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::test_app;
  use crate::tvmaze::Endpoint;
  use ratatui::{crossterm::event::KeyEventKind, layout::Rect};
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn click(column: u16, row: u16) -> MouseEvent {
    MouseEvent { kind: MouseEventKind::Down(MouseButton::Left), column, row, modifiers: KeyModifiers::NONE }
  }

  fn app() -> App {
    test_app(Endpoint::direct("http://127.0.0.1:9/search/shows"), Duration::from_secs(60))
  }

  fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
      handle_key_event(app, key(KeyCode::Char(c)));
    }
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5);
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日";
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- keys ---

  #[tokio::test]
  async fn typing_while_collapsed_focuses_and_inserts() {
    let mut app = app();
    type_str(&mut app, "bat");
    assert!(app.panel.is_expanded());
    assert_eq!(app.panel.query(), "bat");
    assert_eq!(app.cursor_position, 3);
    assert!(app.is_debounce_pending());
  }

  #[test]
  fn tab_focuses_without_typing() {
    let mut app = app();
    handle_key_event(&mut app, key(KeyCode::Tab));
    assert!(app.panel.is_expanded());
    assert_eq!(app.panel.query(), "");
  }

  #[tokio::test]
  async fn editing_keys() {
    let mut app = app();
    type_str(&mut app, "batman");
    handle_key_event(&mut app, key(KeyCode::Home));
    handle_key_event(&mut app, key(KeyCode::Delete));
    assert_eq!(app.panel.query(), "atman");
    handle_key_event(&mut app, key(KeyCode::End));
    handle_key_event(&mut app, key(KeyCode::Backspace));
    assert_eq!(app.panel.query(), "atma");
    handle_key_event(&mut app, key(KeyCode::Left));
    type_str(&mut app, "x");
    assert_eq!(app.panel.query(), "atmxa");
  }

  #[tokio::test]
  async fn ctrl_u_clears_before_cursor() {
    let mut app = app();
    type_str(&mut app, "hello");
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
    assert_eq!(app.panel.query(), "");
    assert_eq!(app.cursor_position, 0);
  }

  #[tokio::test]
  async fn esc_collapses_then_quits() {
    let mut app = app();
    type_str(&mut app, "bat");
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(!app.panel.is_expanded());
    assert_eq!(app.panel.query(), "");
    assert!(!app.should_quit);
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(app.should_quit);
  }

  #[test]
  fn ctrl_c_quits() {
    let mut app = app();
    let mut ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    ev.kind = KeyEventKind::Press;
    handle_key_event(&mut app, ev);
    assert!(app.should_quit);
  }

  // --- mouse ---

  #[tokio::test]
  async fn click_outside_collapses() {
    let mut app = app();
    type_str(&mut app, "bat");
    app.hit.panel = Rect::new(10, 2, 80, 20);
    app.hit.input = Rect::new(10, 2, 80, 3);

    handle_mouse_event(&mut app, click(15, 10));
    assert!(app.panel.is_expanded());

    handle_mouse_event(&mut app, click(2, 25));
    assert!(!app.panel.is_expanded());
    assert_eq!(app.panel.query(), "");
  }

  #[test]
  fn click_input_focuses() {
    let mut app = app();
    app.hit.panel = Rect::new(10, 2, 80, 3);
    app.hit.input = Rect::new(10, 2, 80, 3);
    handle_mouse_event(&mut app, click(20, 3));
    assert!(app.panel.is_expanded());
  }

  #[tokio::test]
  async fn click_close_collapses() {
    let mut app = app();
    type_str(&mut app, "bat");
    app.hit.panel = Rect::new(10, 2, 80, 20);
    app.hit.input = Rect::new(10, 2, 80, 3);
    app.hit.close = Some(Rect::new(86, 3, 3, 1));
    handle_mouse_event(&mut app, click(87, 3));
    assert!(!app.panel.is_expanded());
  }
}
