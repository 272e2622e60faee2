use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Kitty,
  Direct,
  Ascii,
}

impl CliDisplayMode {
  /// Parse the `display_mode` preference. Unknown values fall back to `Auto`.
  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "kitty" => CliDisplayMode::Kitty,
      "direct" | "half-block" => CliDisplayMode::Direct,
      "ascii" => CliDisplayMode::Ascii,
      _ => CliDisplayMode::Auto,
    }
  }
}

/// How show thumbnails are drawn in the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
  Kitty,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
      DisplayMode::Kitty => "Kitty",
    }
  }

  /// Whether images are sent out-of-band instead of drawn into the cell buffer.
  pub fn is_protocol(self) -> bool {
    matches!(self, DisplayMode::Kitty)
  }
}

/// Pick a display mode from the terminal's environment variables.
///
/// Probe order: Kitty graphics > true-color half-block > ASCII
fn detect_from(term: &str, term_program: &str, colorterm: &str) -> DisplayMode {
  let term_program = term_program.to_lowercase();
  if term == "xterm-kitty" || matches!(term_program.as_str(), "kitty" | "wezterm" | "ghostty") {
    return DisplayMode::Kitty;
  }

  let colorterm = colorterm.to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" {
    return DisplayMode::Direct;
  }

  DisplayMode::Ascii
}

pub fn detect_display_mode() -> DisplayMode {
  let term = std::env::var("TERM").unwrap_or_default();
  let term_program = std::env::var("TERM_PROGRAM").unwrap_or_default();
  let colorterm = std::env::var("COLORTERM").unwrap_or_default();
  detect_from(&term, &term_program, &colorterm)
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Kitty => DisplayMode::Kitty,
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}
