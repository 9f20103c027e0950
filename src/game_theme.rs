use ratatui::style::Color;

use crate::render::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameTheme {
    Monokai,
    Solarized,
    Dracula,
    GruvboxDark,
    Nord,
    HighContrast,
}

pub struct ThemeColors {
    pub background: Color,
    pub field: Color,
    pub text: Color,
    pub highlight: Color,
    pub paddle: Color,
    pub ball: Color,
    pub dim: Color,
    pub overlay: Color,
}

impl GameTheme {
    /// Accepts the names used by `PONG_THEME`, case-insensitively.
    pub fn from_name(name: &str) -> Option<GameTheme> {
        match name.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "monokai" => Some(GameTheme::Monokai),
            "solarized" => Some(GameTheme::Solarized),
            "dracula" => Some(GameTheme::Dracula),
            "gruvbox" | "gruvboxdark" => Some(GameTheme::GruvboxDark),
            "nord" => Some(GameTheme::Nord),
            "highcontrast" => Some(GameTheme::HighContrast),
            _ => None,
        }
    }

    pub fn color(&self, tone: Tone) -> Color {
        let colors = self.colors();
        match tone {
            Tone::Field => colors.field,
            Tone::Paddle => colors.paddle,
            Tone::Ball => colors.ball,
            Tone::Text => colors.text,
            Tone::Highlight => colors.highlight,
            Tone::Dim => colors.dim,
            Tone::Overlay => colors.overlay,
        }
    }

    pub fn colors(&self) -> ThemeColors {
        match self {
            GameTheme::Monokai => ThemeColors {
                background: Color::Reset,
                field: Color::Rgb(249, 38, 114),     // pink
                text: Color::Rgb(248, 248, 242),     // foreground
                highlight: Color::Rgb(166, 226, 46), // green
                paddle: Color::Rgb(102, 217, 239),   // cyan
                ball: Color::Rgb(255, 95, 135),
                dim: Color::Rgb(117, 113, 94),
                overlay: Color::Rgb(39, 40, 34),
            },
            GameTheme::Solarized => ThemeColors {
                background: Color::Reset,
                field: Color::Rgb(38, 139, 210),
                text: Color::Rgb(147, 161, 161),
                highlight: Color::Rgb(42, 161, 152),
                paddle: Color::Rgb(133, 153, 0),
                ball: Color::Rgb(220, 50, 47),
                dim: Color::Rgb(88, 110, 117),
                overlay: Color::Rgb(0, 43, 54),
            },
            GameTheme::Dracula => ThemeColors {
                background: Color::Reset,
                field: Color::Rgb(255, 121, 198),
                text: Color::Rgb(248, 248, 242),
                highlight: Color::Rgb(189, 147, 249),
                paddle: Color::Rgb(80, 250, 123),
                ball: Color::Rgb(255, 85, 85),
                dim: Color::Rgb(98, 114, 164),
                overlay: Color::Rgb(40, 42, 54),
            },
            GameTheme::GruvboxDark => ThemeColors {
                background: Color::Reset,
                field: Color::Rgb(250, 189, 47),
                text: Color::Rgb(235, 219, 178),
                highlight: Color::Rgb(184, 187, 38),
                paddle: Color::Rgb(131, 165, 152),
                ball: Color::Rgb(251, 73, 52),
                dim: Color::Rgb(146, 131, 116),
                overlay: Color::Rgb(40, 40, 40),
            },
            GameTheme::Nord => ThemeColors {
                background: Color::Reset,
                field: Color::Rgb(136, 192, 208),
                text: Color::Rgb(216, 222, 233),
                highlight: Color::Rgb(143, 188, 187),
                paddle: Color::Rgb(94, 129, 172),
                ball: Color::Rgb(191, 97, 106),
                dim: Color::Rgb(76, 86, 106),
                overlay: Color::Rgb(46, 52, 64),
            },
            GameTheme::HighContrast => ThemeColors {
                background: Color::Black,
                field: Color::White,
                text: Color::White,
                highlight: Color::Yellow,
                paddle: Color::Rgb(0, 255, 255),
                ball: Color::Rgb(255, 0, 0),
                dim: Color::Gray,
                overlay: Color::Black,
            },
        }
    }
}
