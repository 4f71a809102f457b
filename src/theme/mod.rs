pub mod fonts;
pub mod icon;

use iced::{Color, Theme};

pub const PRIMARY: Color = Color::from_rgb(40.0 / 255.0, 102.0 / 255.0, 1.0);
pub const BACKGROUND: Color = Color::from_rgb(248.0 / 255.0, 250.0 / 255.0, 252.0 / 255.0);
pub const HEADER: Color = Color::from_rgb(30.0 / 255.0, 41.0 / 255.0, 59.0 / 255.0);
pub const MUTED: Color = Color::from_rgb(0.55, 0.55, 0.58);
pub const SUCCESS: Color = Color::from_rgb(0.20, 0.78, 0.35);
pub const DANGER: Color = Color::from_rgb(1.0, 0.23, 0.19);
pub const WARNING: Color = Color::from_rgb(0.8, 0.5, 0.0);

pub fn light() -> Theme {
    Theme::custom(
        "Printer Installer Light".to_string(),
        iced::theme::Palette {
            background: BACKGROUND,
            text: Color::from_rgb(0.11, 0.11, 0.12),
            primary: PRIMARY,
            success: SUCCESS,
            danger: DANGER,
        },
    )
}
