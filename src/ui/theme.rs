/// CodeTales color palette
use iced::theme::Palette;
use iced::widget::container;
use iced::{Border, Color, Theme};

pub const DARK: Color = iced::color!(0x1B, 0x19, 0x19);
pub const PINK: Color = iced::color!(0xDB, 0x2D, 0x69);
pub const WHITE: Color = iced::color!(0xFF, 0xFF, 0xFF);
pub const MUTED: Color = iced::color!(0x9A, 0x96, 0x96);
const SURFACE: Color = iced::color!(0x26, 0x23, 0x23);

/// The application theme built on the palette
pub fn codetales() -> Theme {
    Theme::custom(
        "CodeTales".to_string(),
        Palette {
            background: DARK,
            text: WHITE,
            primary: PINK,
            success: iced::color!(0x3F, 0xB9, 0x50),
            danger: iced::color!(0xE5, 0x48, 0x4D),
        },
    )
}

pub fn nav(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(SURFACE.into()),
        border: Border {
            color: Color { a: 0.25, ..PINK },
            width: 1.0,
            radius: 0.0.into(),
        },
        ..container::Style::default()
    }
}

/// Title cards and comment bubbles
pub fn card(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(DARK.into()),
        border: Border {
            color: Color { a: 0.25, ..PINK },
            width: 1.0,
            radius: 8.0.into(),
        },
        ..container::Style::default()
    }
}

pub fn placeholder(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(SURFACE.into()),
        border: Border {
            radius: 8.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    }
}

/// Genre tag
pub fn tag(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Color { a: 0.2, ..PINK }.into()),
        border: Border {
            radius: 12.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    }
}
