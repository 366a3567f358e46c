use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Padding};

pub struct Theme;

impl Theme {
    pub const BORDER_DIM: Color = Color::DarkGray;
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);
    pub const BORDER_ACCENT: Color = Color::Rgb(100, 180, 240);

    // Text, brightest first.
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_CONTENT: Color = Color::Rgb(170, 175, 190);
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);

    // Footer key hints.
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    pub const BRAND: Color = Color::Rgb(217, 119, 80);
    /// Context and repository names, the selection marker, info flashes.
    pub const ACCENT: Color = Color::Rgb(100, 180, 240);
    /// Branch names and the display mode.
    pub const BRANCH: Color = Color::Rgb(180, 140, 220);
    /// Active filter, repeat counts, help keys.
    pub const HIGHLIGHT: Color = Color::Rgb(220, 180, 60);
    pub const SUCCESS: Color = Color::Rgb(80, 200, 120);
    pub const FAILURE: Color = Color::Rgb(220, 80, 80);

    // Bucketed command list.
    pub const GUTTER: Color = Color::Rgb(55, 60, 75);
    pub const BUCKET_HEADER: Color = Color::Rgb(100, 120, 160);
    pub const SELECTED_BG: Color = Color::Rgb(40, 48, 68);

    pub const PADDING_CARD: Padding = Padding::new(2, 2, 1, 1);
    pub const PADDING_COMPACT: Padding = Padding::new(1, 1, 0, 0);

    pub fn block() -> Block<'static> {
        Self::rounded(Self::BORDER_NORMAL)
    }

    /// Border for empty states.
    pub fn block_dim() -> Block<'static> {
        Self::rounded(Self::BORDER_DIM)
    }

    /// Border for focused content: the command card and the help popup.
    pub fn block_accent() -> Block<'static> {
        Self::rounded(Self::BORDER_ACCENT)
    }

    fn rounded(border: Color) -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(border))
    }
}

/// Exit status marker color.
pub fn status_color(exit_status: i32) -> Color {
    if exit_status == 0 {
        Theme::SUCCESS
    } else {
        Theme::FAILURE
    }
}
