/// User interface
///
/// One module per screen plus shared pieces:
/// - `theme.rs` - CodeTales palette and container styles
/// - `stars.rs` - canvas star rating
/// - `landing.rs`, `detail.rs`, `chapter.rs` - screens
use std::time::Duration;

use iced::widget::{button, column, container, image, row, text, Space};
use iced::{Alignment, ContentFit, Element, Length, Task};

use crate::media::{ImageTracker, PendingLoad};
use crate::store::StoreError;
use crate::Message;

pub mod chapter;
pub mod detail;
pub mod landing;
pub mod stars;
pub mod theme;

/// Data fetched from the content store for a screen
#[derive(Debug, Clone)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(StoreError),
}

impl<T> Loadable<T> {
    pub fn from_result(result: Result<T, StoreError>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => Loadable::Failed(err),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Run image loads in the background; each completion comes back as `ImageLoaded`
pub fn load_images(pending: Vec<PendingLoad>) -> Task<Message> {
    Task::batch(
        pending
            .into_iter()
            .map(|load| Task::perform(load, Message::ImageLoaded)),
    )
}

/// Deliver `message` after `delay`
pub fn after(delay: Duration, message: Message) -> Task<Message> {
    Task::perform(tokio::time::sleep(delay), move |_| message.clone())
}

/// Top navigation bar
pub fn nav_bar<'a>(show_back: bool) -> Element<'a, Message> {
    let back = button(text("← Back"))
        .style(button::text)
        .on_press_maybe(show_back.then_some(Message::Back));

    let bar = row![
        text("CodeTales").size(26).color(theme::PINK),
        Space::with_width(Length::Fill),
        back,
        button(text("Home"))
            .style(button::text)
            .on_press(Message::GoHome),
    ]
    .spacing(16)
    .padding([12, 24])
    .align_y(Alignment::Center);

    container(bar)
        .width(Length::Fill)
        .style(theme::nav)
        .into()
}

/// A remote image, or a placeholder while it is not loaded
pub fn remote_image<'a>(
    tracker: &ImageTracker,
    url: &str,
    width: Length,
    height: Length,
    fit: ContentFit,
) -> Element<'a, Message> {
    match tracker.handle(url) {
        Some(handle) => image(handle)
            .width(width)
            .height(height)
            .content_fit(fit)
            .into(),
        None => placeholder(width, height, tracker.is_loading(url)),
    }
}

pub fn placeholder<'a>(width: Length, height: Length, loading: bool) -> Element<'a, Message> {
    let label = if loading { "Loading…" } else { "" };
    container(text(label).color(theme::MUTED))
        .width(width)
        .height(height)
        .center_x(width)
        .center_y(height)
        .style(theme::placeholder)
        .into()
}

/// Full-screen message with "Go back" and optionally "Retry"
pub fn notice<'a>(message: String, retry: bool) -> Element<'a, Message> {
    let mut actions = row![button(text("Go back")).on_press(Message::Back)].spacing(12);
    if retry {
        actions = actions.push(
            button(text("Retry"))
                .style(button::secondary)
                .on_press(Message::Retry),
        );
    }

    container(
        column![text(message).size(20), actions]
            .spacing(20)
            .align_x(Alignment::Center),
    )
    .width(Length::Fill)
    .padding(60)
    .center_x(Length::Fill)
    .into()
}

/// Message for a failed store request
pub fn failure_text(err: &StoreError, not_found: &str, generic: &str) -> String {
    if err.is_not_found() {
        not_found.to_string()
    } else {
        generic.to_string()
    }
}
