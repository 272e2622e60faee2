mod app;
mod config;
mod constants;
mod debounce;
mod display;
mod graphics;
mod input;
mod logging;
mod panel;
mod row;
mod theme;
mod tvmaze;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
  },
};
use std::time::Duration;
use tracing::info;

use app::{App, AppOptions};
use config::Config;
use constants::constants;
use display::{CliDisplayMode, DisplayMode};
use graphics::{kitty_clear, kitty_place};
use tvmaze::Endpoint;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Search TV shows from the terminal", long_about = None)]
struct Args {
  /// Poster display mode: 'auto', 'kitty', 'direct', or 'ascii' (default: saved preference, then auto-detect)
  #[arg(short, long)]
  display_mode: Option<CliDisplayMode>,

  /// How long the query must stay unchanged before a search is sent, in milliseconds
  #[arg(long, value_name = "MS", default_value_t = constants().debounce_ms)]
  debounce_ms: u64,

  /// Query the search endpoint directly instead of through the CORS relay
  #[arg(long)]
  no_proxy: bool,

  /// Search endpoint URL (default: the TVmaze show search)
  #[arg(long, value_name = "URL")]
  endpoint: Option<String>,

  /// Print a shell completion script and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

impl Args {
  fn endpoint(&self) -> Endpoint {
    let defaults = Endpoint::default();
    let base = self.endpoint.clone().unwrap_or(defaults.base);
    if self.no_proxy { Endpoint::direct(base) } else { Endpoint { base, proxy: defaults.proxy } }
  }

  fn display_mode(&self, config: &Config) -> CliDisplayMode {
    self
      .display_mode
      .or_else(|| config.display_mode.as_deref().map(CliDisplayMode::from_config))
      .unwrap_or(CliDisplayMode::Auto)
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "tvfind", &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = logging::log_dir().and_then(|dir| match logging::init(&dir) {
    Ok(guard) => Some(guard),
    Err(e) => {
      eprintln!("tvfind: logging disabled: {:#}", e);
      None
    }
  });

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(std::io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;
  let result = run(&mut terminal, args).await;
  let _ = execute!(std::io::stdout(), DisableMouseCapture);
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args) -> Result<()> {
  let config = Config::load();
  let display_mode = display::resolve_display_mode(args.display_mode(&config));
  let endpoint = args.endpoint();
  info!(
    display_mode = display_mode.label(),
    endpoint = %endpoint.base,
    proxied = endpoint.proxy.is_some(),
    debounce_ms = args.debounce_ms,
    "starting"
  );

  let options = AppOptions {
    display_mode,
    endpoint,
    debounce: Duration::from_millis(args.debounce_ms),
    theme_index: theme::theme_index(config.theme_name.as_deref()),
  };
  let mut app = App::new(options, tvmaze::build_client()?);

  loop {
    app.drain_events();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if display_mode == DisplayMode::Kitty {
      sync_kitty_poster(&mut app)?;
    }

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(&mut app, key),
        Event::Mouse(mouse) => input::handle_mouse_event(&mut app, mouse),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  if display_mode == DisplayMode::Kitty {
    kitty_clear()?;
  }
  info!("exiting");
  Ok(())
}

/// Send, move or remove the Kitty poster to match what the last frame laid out.
fn sync_kitty_poster(app: &mut App) -> Result<()> {
  match (app.gfx.poster_area, &app.preview.url, &app.preview.image) {
    (Some(area), Some(url), Some(image)) => {
      let key = (url.clone(), area);
      if app.gfx.last_sent.as_ref() != Some(&key) {
        kitty_place(image, area)?;
        app.gfx.last_sent = Some(key);
      }
    }
    _ => {
      if app.gfx.last_sent.take().is_some() {
        kitty_clear()?;
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_definition_is_valid() {
    Args::command().debug_assert();
  }

  #[test]
  fn default_endpoint_goes_through_relay() {
    let args = Args::parse_from(["tvfind"]);
    let endpoint = args.endpoint();
    assert_eq!(endpoint.base, constants().search_endpoint);
    assert_eq!(endpoint.proxy.as_deref(), Some(constants().cors_proxy.as_str()));
    assert_eq!(args.debounce_ms, 500);
  }

  #[test]
  fn no_proxy_and_custom_endpoint() {
    let args = Args::parse_from(["tvfind", "--no-proxy", "--endpoint", "http://localhost:8080/search/shows"]);
    assert_eq!(args.endpoint(), Endpoint::direct("http://localhost:8080/search/shows"));
  }

  #[test]
  fn display_mode_precedence() {
    let prefs = Config { theme_name: None, display_mode: Some("ascii".to_string()) };
    let args = Args::parse_from(["tvfind"]);
    assert_eq!(args.display_mode(&prefs), CliDisplayMode::Ascii);
    assert_eq!(args.display_mode(&Config::default()), CliDisplayMode::Auto);

    let args = Args::parse_from(["tvfind", "--display-mode", "kitty"]);
    assert_eq!(args.display_mode(&prefs), CliDisplayMode::Kitty);
  }
}
