use crossterm::style::Color;

use crate::app::notify::Tone;

#[derive(Clone, Debug)]
pub struct Theme {
    pub enabled: bool,
    pub fg: Color,
    pub accent: Color,
    pub success: Color,
    pub error: Color,
    pub secondary: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            enabled: true,
            fg: Color::Rgb { r: 171, g: 178, b: 191 },
            accent: Color::Rgb { r: 97, g: 175, b: 239 },
            success: Color::Rgb { r: 152, g: 195, b: 121 },
            error: Color::Rgb { r: 224, g: 108, b: 117 },
            secondary: Color::Rgb { r: 130, g: 137, b: 151 },
        }
    }

    /// No escape sequences at all; used for `--no-color` and piped output.
    pub fn plain() -> Self {
        Self {
            enabled: false,
            ..Self::dark()
        }
    }

    pub fn for_color(color: bool) -> Self {
        if color {
            Self::dark()
        } else {
            Self::plain()
        }
    }

    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Neutral => self.fg,
            Tone::Ok => self.success,
            Tone::Error => self.error,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
