use anyhow::Result;
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::debounce::DebouncedValue;
use crate::display::DisplayMode;
use crate::panel::{SearchPanel, SearchTicket};
use crate::row::ShowRow;
use crate::theme::{THEMES, Theme};
use crate::tvmaze::{Endpoint, ShowHit, fetch_thumbnail, search_shows};

// --- Types ---

/// Messages from background tasks back to the UI loop.
pub enum AppEvent {
  /// The query has been stable for the debounce delay.
  Debounced(String),
  SearchSettled { seq: u64, outcome: Result<Vec<ShowHit>> },
  PosterLoaded { seq: u64, url: String, outcome: Result<DynamicImage> },
}

/// Startup options resolved from the CLI and preferences.
pub struct AppOptions {
  pub display_mode: DisplayMode,
  pub endpoint: Endpoint,
  pub debounce: Duration,
  pub theme_index: usize,
}

/// Screen regions from the last draw, used for mouse hit-testing.
#[derive(Default, Debug, Clone, Copy)]
pub struct HitAreas {
  pub panel: Rect,
  pub input: Rect,
  pub close: Option<Rect>,
  pub list: Option<Rect>,
}

/// Poster for the selected row.
#[derive(Default)]
pub struct Preview {
  /// Bumped on every new poster request; older responses are dropped.
  seq: u64,
  pub url: Option<String>,
  pub image: Option<DynamicImage>,
}

/// Kitty placement bookkeeping.
#[derive(Default)]
pub struct GraphicsCache {
  pub poster_area: Option<Rect>,
  pub last_sent: Option<(String, Rect)>,
}

pub struct App {
  pub panel: SearchPanel,
  /// Cursor position within the query (char index).
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub list_state: ListState,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub last_error: Option<String>,
  pub should_quit: bool,
  pub preview: Preview,
  pub gfx: GraphicsCache,
  pub hit: HitAreas,
  pub started_at: Instant,
  endpoint: Endpoint,
  client: Client,
  debounce: DebouncedValue<String>,
  events_tx: mpsc::UnboundedSender<AppEvent>,
  events_rx: mpsc::UnboundedReceiver<AppEvent>,
  error_time: Option<Instant>,
}

impl App {
  pub fn new(options: AppOptions, client: Client) -> Self {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    Self {
      panel: SearchPanel::new(),
      cursor_position: 0,
      input_scroll: 0,
      list_state: ListState::default(),
      theme_index: options.theme_index.min(THEMES.len() - 1),
      display_mode: options.display_mode,
      last_error: None,
      should_quit: false,
      preview: Preview::default(),
      gfx: GraphicsCache::default(),
      hit: HitAreas::default(),
      started_at: Instant::now(),
      endpoint: options.endpoint,
      client,
      debounce: DebouncedValue::new(options.debounce),
      events_tx,
      events_rx,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    let mut config = Config::load();
    config.theme_name = Some(self.theme().name.to_string());
    config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages once they outlive their TTL.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= constants().error_ttl()
    {
      self.clear_error();
    }
  }

  pub fn is_debounce_pending(&self) -> bool {
    self.debounce.is_pending()
  }

  // --- Panel transitions ---

  pub fn focus(&mut self) {
    self.panel.focus();
  }

  /// Replace the query and restart the debounce timer when it changed.
  pub fn set_query(&mut self, query: String) {
    if !self.panel.set_query(query.clone()) {
      return;
    }
    let tx = self.events_tx.clone();
    self.debounce.update(query, move |q| {
      let _ = tx.send(AppEvent::Debounced(q));
    });
  }

  /// Close the panel: reset the search state and drop any pending work.
  pub fn collapse(&mut self) {
    self.panel.collapse();
    self.debounce.reset();
    self.cursor_position = 0;
    self.input_scroll = 0;
    self.list_state.select(None);
    self.clear_preview();
  }

  // --- Background work ---

  /// Apply everything background tasks have reported since the last frame.
  pub fn drain_events(&mut self) {
    while let Ok(event) = self.events_rx.try_recv() {
      self.handle_event(event);
    }
  }

  pub fn handle_event(&mut self, event: AppEvent) {
    match event {
      AppEvent::Debounced(query) => {
        if query != self.panel.query() || !self.panel.is_expanded() {
          debug!(query = %query, "debounce fired for a superseded query");
          return;
        }
        if let Some(ticket) = self.panel.begin_search() {
          self.spawn_search(ticket);
        }
      }
      AppEvent::SearchSettled { seq, outcome } => {
        if self.panel.finish_search(seq, outcome) {
          let first = if self.panel.results().is_empty() { None } else { Some(0) };
          self.list_state.select(first);
          self.refresh_preview();
        }
      }
      AppEvent::PosterLoaded { seq, url, outcome } => {
        if seq != self.preview.seq {
          return;
        }
        match outcome {
          Ok(image) => self.preview.image = Some(image),
          Err(e) => warn!(url = %url, err = ?e, "poster fetch failed"),
        }
      }
    }
  }

  fn spawn_search(&self, ticket: SearchTicket) {
    let client = self.client.clone();
    let endpoint = self.endpoint.clone();
    let tx = self.events_tx.clone();
    tokio::spawn(async move {
      let outcome = search_shows(&client, &endpoint, &ticket.query).await;
      let _ = tx.send(AppEvent::SearchSettled { seq: ticket.seq, outcome });
    });
  }

  fn clear_preview(&mut self) {
    self.preview.seq += 1;
    self.preview.url = None;
    self.preview.image = None;
  }

  /// Fetch the poster for the selected row unless it is already shown.
  pub fn refresh_preview(&mut self) {
    let wanted = self.selected_row().and_then(|r| r.thumbnail_url().map(str::to_string));
    if wanted.is_some() && wanted == self.preview.url {
      return;
    }
    self.clear_preview();
    let Some(url) = wanted else { return };

    self.preview.url = Some(url.clone());
    let seq = self.preview.seq;
    let client = self.client.clone();
    let tx = self.events_tx.clone();
    tokio::spawn(async move {
      let outcome = fetch_thumbnail(&client, &url).await;
      let _ = tx.send(AppEvent::PosterLoaded { seq, url, outcome });
    });
  }

  // --- Result selection ---

  pub fn selected_row(&self) -> Option<ShowRow> {
    let idx = self.list_state.selected()?;
    self.panel.results().get(idx).map(|hit| ShowRow::from_show(&hit.show))
  }

  pub fn select_next(&mut self) {
    let count = self.panel.results().len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
      self.refresh_preview();
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.panel.results().len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
      self.refresh_preview();
    }
  }

  pub fn select_index(&mut self, idx: usize) {
    if idx < self.panel.results().len() {
      self.list_state.select(Some(idx));
      self.refresh_preview();
    }
  }

  /// Open the selected show's page in the default browser.
  pub fn open_selected(&mut self) {
    let Some(row) = self.selected_row() else { return };
    info!(id = row.key, url = %row.link, "opening show link");
    if let Err(e) = open_link(&row.link) {
      self.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

fn open_link(url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()?;
  // Reap the child in the background so it never lingers as a zombie.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  pub(crate) fn test_app(endpoint: Endpoint, debounce: Duration) -> App {
    let options = AppOptions { display_mode: DisplayMode::Ascii, endpoint, debounce, theme_index: 0 };
    App::new(options, Client::new())
  }

  fn shows_body(ids: &[u64]) -> serde_json::Value {
    serde_json::Value::Array(
      ids
        .iter()
        .map(|id| {
          serde_json::json!({
            "score": 1.0,
            "show": { "id": id, "url": format!("https://www.tvmaze.com/shows/{}", id), "name": format!("Show {}", id), "genres": [] }
          })
        })
        .collect(),
    )
  }

  /// Drive the event loop until `done` holds or two seconds pass.
  async fn pump_until(app: &mut App, done: impl Fn(&App) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
      app.drain_events();
      if done(&*app) {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
  }

  async fn mock_server(query: &str, ids: &[u64]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search/shows"))
      .and(query_param("q", query))
      .respond_with(ResponseTemplate::new(200).set_body_json(shows_body(ids)))
      .expect(1)
      .mount(&server)
      .await;
    server
  }

  /// The server saw exactly one search, and it was for `query`.
  async fn assert_single_search(server: &MockServer, query: &str) {
    let requests = server.received_requests().await.unwrap();
    let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(requests.len(), 1, "expected one request, got {:?}", urls);
    let q = requests[0].url.query_pairs().find(|(k, _)| k == "q").map(|(_, v)| v.into_owned());
    assert_eq!(q.as_deref(), Some(query));
  }

  #[tokio::test]
  async fn typing_then_pausing_issues_one_request() {
    let server = mock_server("batman", &[1, 2, 3]).await;
    let mut app = test_app(Endpoint::direct(format!("{}/search/shows", server.uri())), Duration::from_millis(500));

    app.focus();
    app.set_query("batman".to_string());
    assert!(app.is_debounce_pending());

    pump_until(&mut app, |a| a.panel.results().len() == 3).await;
    assert!(!app.panel.is_loading());
    assert_eq!(app.list_state.selected(), Some(0));
    assert_eq!(app.selected_row().map(|r| r.key), Some(1));
    assert_single_search(&server, "batman").await;
  }

  #[tokio::test]
  async fn quick_retype_fetches_only_latest() {
    let server = mock_server("ba", &[7]).await;
    let mut app = test_app(Endpoint::direct(format!("{}/search/shows", server.uri())), Duration::from_millis(150));

    app.focus();
    app.set_query("b".to_string());
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.drain_events();
    app.set_query("ba".to_string());

    pump_until(&mut app, |a| a.panel.results().len() == 1).await;
    assert_eq!(app.panel.results()[0].show.id, 7);
    // The "b" timer would have fired by now had it survived.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_single_search(&server, "ba").await;
  }

  #[tokio::test]
  async fn empty_response_sets_no_findings() {
    let server = mock_server("xyznotashow", &[]).await;
    let mut app = test_app(Endpoint::direct(format!("{}/search/shows", server.uri())), Duration::from_millis(50));

    app.focus();
    app.set_query("xyznotashow".to_string());
    pump_until(&mut app, |a| a.panel.no_findings()).await;
    assert_eq!(app.list_state.selected(), None);
    assert_single_search(&server, "xyznotashow").await;
  }

  #[tokio::test]
  async fn transport_failure_is_swallowed() {
    // Nothing listens on port 9 in the test environment.
    let mut app = test_app(Endpoint::direct("http://127.0.0.1:9/search/shows"), Duration::from_millis(20));
    app.focus();
    app.set_query("batman".to_string());

    tokio::time::sleep(Duration::from_millis(40)).await;
    app.drain_events();
    pump_until(&mut app, |a| !a.panel.is_loading()).await;
    assert!(!app.panel.no_findings());
    assert!(app.panel.results().is_empty());
    assert!(app.last_error.is_none());
  }

  #[tokio::test]
  async fn collapse_cancels_pending_debounce() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
    let mut app = test_app(Endpoint::direct(format!("{}/search/shows", server.uri())), Duration::from_millis(50));

    app.focus();
    app.set_query("batman".to_string());
    app.collapse();
    assert!(!app.is_debounce_pending());

    tokio::time::sleep(Duration::from_millis(120)).await;
    app.drain_events();
    assert!(!app.panel.is_loading());
    assert_eq!(app.panel.query(), "");
  }

  #[tokio::test]
  async fn superseded_debounce_fire_is_ignored() {
    let mut app = test_app(Endpoint::direct("http://127.0.0.1:9/search/shows"), Duration::from_secs(60));
    app.focus();
    app.set_query("bat".to_string());
    app.handle_event(AppEvent::Debounced("ba".to_string()));
    assert!(!app.panel.is_loading());
  }

  #[tokio::test]
  async fn stale_poster_is_dropped() {
    let mut app = test_app(Endpoint::direct("http://127.0.0.1:9/search/shows"), Duration::from_secs(60));
    let seq = app.preview.seq;
    app.clear_preview();
    let image = DynamicImage::new_rgb8(2, 2);
    app.handle_event(AppEvent::PosterLoaded { seq, url: "http://x/1.jpg".to_string(), outcome: Ok(image) });
    assert!(app.preview.image.is_none());
  }

  #[tokio::test]
  async fn selection_wraps() {
    let mut app = test_app(Endpoint::direct("http://127.0.0.1:9/search/shows"), Duration::from_secs(60));
    app.focus();
    app.panel.set_query("x");
    let t = app.panel.begin_search().unwrap();
    let hits: Vec<ShowHit> = serde_json::from_value(shows_body(&[1, 2, 3])).unwrap();
    app.panel.finish_search(t.seq, Ok(hits));
    app.list_state.select(Some(0));

    app.select_prev();
    assert_eq!(app.list_state.selected(), Some(2));
    app.select_next();
    assert_eq!(app.list_state.selected(), Some(0));
    app.select_index(1);
    assert_eq!(app.selected_row().map(|r| r.key), Some(2));
    app.select_index(10);
    assert_eq!(app.list_state.selected(), Some(1));
  }
}
