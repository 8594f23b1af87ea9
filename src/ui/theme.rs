use ratatui::style::Color;

use crate::app::NoticeLevel;

pub const BG_PRIMARY: Color = Color::Rgb(0, 0, 0);
pub const BG_PANEL: Color = Color::Rgb(12, 12, 12);
pub const FG_PRIMARY: Color = Color::Rgb(190, 190, 190);
pub const FG_DIM: Color = Color::Rgb(128, 128, 128);

pub const BAR_BG: Color = Color::Rgb(23, 52, 127);
pub const BAR_TEXT: Color = Color::Rgb(235, 240, 255);

pub const MENU_BG: Color = Color::Rgb(79, 79, 79);
pub const MENU_BORDER: Color = Color::Rgb(208, 208, 208);
pub const MENU_HIGHLIGHT_BG: Color = Color::Rgb(220, 220, 220);
pub const MENU_HIGHLIGHT_TEXT: Color = Color::Rgb(30, 30, 30);

pub const BORDER_IDLE: Color = Color::Rgb(61, 120, 120);
pub const BORDER_FOCUS: Color = Color::Rgb(187, 94, 0);
pub const HEADER_BG: Color = Color::Rgb(40, 40, 40);

pub const USER_LABEL: Color = Color::Cyan;
pub const ASSISTANT_LABEL: Color = Color::White;
pub const ERROR_TEXT: Color = Color::LightRed;
pub const READY_TEXT: Color = Color::LightGreen;

pub fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => BAR_TEXT,
        NoticeLevel::Success => READY_TEXT,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => ERROR_TEXT,
    }
}
