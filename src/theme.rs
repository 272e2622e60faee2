use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub panel_bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub link: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Night",
    bg: Color::Rgb(24, 24, 32),
    panel_bg: Color::Rgb(32, 33, 44),
    fg: Color::Rgb(222, 224, 236),
    accent: Color::Rgb(138, 180, 248),
    link: Color::Rgb(120, 160, 255),
    muted: Color::Rgb(128, 131, 150),
    border: Color::Rgb(70, 73, 92),
    highlight_fg: Color::Rgb(24, 24, 32),
    highlight_bg: Color::Rgb(138, 180, 248),
    stripe_bg: Color::Rgb(38, 39, 52),
    status: Color::Rgb(240, 198, 116),
    error: Color::Rgb(240, 113, 120),
    key_fg: Color::Rgb(24, 24, 32),
    key_bg: Color::Rgb(128, 131, 150),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(236, 236, 236),
    panel_bg: Color::Rgb(255, 255, 255),
    fg: Color::Rgb(0, 0, 0),
    accent: Color::Rgb(60, 60, 60),
    link: Color::Rgb(0, 0, 238),
    muted: Color::Rgb(161, 161, 161),
    border: Color::Rgb(216, 216, 216),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(80, 80, 80),
    stripe_bg: Color::Rgb(246, 246, 246),
    status: Color::Rgb(128, 96, 0),
    error: Color::Rgb(190, 30, 45),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(150, 150, 150),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    panel_bg: Color::Reset,
    fg: Color::White,
    accent: Color::Cyan,
    link: Color::LightBlue,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    status: Color::Yellow,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme named `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
