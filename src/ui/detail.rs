/// Title detail page: metadata, likes, chapter list and comments
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Space};
use iced::{Alignment, ContentFit, Element, Length, Task};
use tracing::warn;

use super::stars::StarRating;
use super::{failure_text, load_images, nav_bar, notice, remote_image, theme, Loadable};
use crate::media::ImageTracker;
use crate::state::comments::{CommentDraft, MAX_RATING, MIN_RATING};
use crate::state::data::{ComicRecord, Comment, RatingUpdate};
use crate::store::StoreError;
use crate::Message;

const COVER_WIDTH: f32 = 300.0;
const COVER_HEIGHT: f32 = 420.0;

#[derive(Debug)]
pub struct Detail {
    pub comic_id: String,
    pub record: Loadable<ComicRecord>,
    pub comments: Loadable<Vec<Comment>>,
    /// Whether this reader has liked the title (local library)
    pub liked: bool,
    /// A like write is in flight; further toggles are ignored
    pub like_pending: bool,
    pub draft: CommentDraft,
    pub posting: bool,
    /// Validation or posting error shown under the form
    pub comment_error: Option<String>,
    pub images: ImageTracker,
}

impl Detail {
    pub fn new(comic_id: String, liked: bool, images: ImageTracker) -> Self {
        Self {
            comic_id,
            record: Loadable::Loading,
            comments: Loadable::Loading,
            liked,
            like_pending: false,
            draft: CommentDraft::default(),
            posting: false,
            comment_error: None,
            images,
        }
    }

    pub fn record_loaded(&mut self, result: Result<ComicRecord, StoreError>) -> Task<Message> {
        match result {
            Ok(record) => {
                let pending = if record.thumbnail.is_empty() {
                    Vec::new()
                } else {
                    self.images.preload_many([record.thumbnail.as_str()])
                };
                self.record = Loadable::Ready(record);
                load_images(pending)
            }
            Err(err) => {
                warn!(comic = %self.comic_id, error = %err, "Failed to fetch title");
                self.record = Loadable::Failed(err);
                Task::none()
            }
        }
    }

    pub fn comments_loaded(&mut self, result: Result<Vec<Comment>, StoreError>) {
        if let Err(err) = &result {
            warn!(comic = %self.comic_id, error = %err, "Failed to fetch comments");
        }
        self.comments = Loadable::from_result(result);
    }

    /// A comment was posted: show it at the top and keep the new totals
    pub fn comment_posted(&mut self, comment: Comment, update: RatingUpdate) {
        if let Some(comments) = self.comments.ready_mut() {
            comments.insert(0, comment);
        } else {
            self.comments = Loadable::Ready(vec![comment]);
        }
        if let Some(record) = self.record.ready_mut() {
            record.rating = update.rating;
            record.rating_count = update.rating_count;
            record.comments_count = update.comments_count;
        }
        self.draft.clear_after_post();
        self.comment_error = None;
    }

    pub fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.record {
            Loadable::Loading => container(text("Loading…"))
                .padding(40)
                .center_x(Length::Fill)
                .into(),
            Loadable::Failed(err) => notice(
                failure_text(err, "This title does not exist.", "Failed to load this title."),
                !err.is_not_found(),
            ),
            Loadable::Ready(record) => column![
                self.header(record),
                self.chapters(record),
                self.comments_view(record),
            ]
            .spacing(32)
            .padding(24)
            .into(),
        };

        column![nav_bar(true), scrollable(body).height(Length::Fill)].into()
    }

    fn header<'a>(&'a self, record: &'a ComicRecord) -> Element<'a, Message> {
        let cover = remote_image(
            &self.images,
            &record.thumbnail,
            Length::Fixed(COVER_WIDTH),
            Length::Fixed(COVER_HEIGHT),
            ContentFit::Cover,
        );

        let like_label = if self.liked { "♥ Liked" } else { "♡ Like" };
        let like = button(text(like_label))
            .style(if self.liked {
                button::primary
            } else {
                button::secondary
            })
            .on_press_maybe((!self.like_pending).then_some(Message::ToggleLike));

        let genres = row(record.genre.iter().map(|genre| {
            container(text(genre).size(14))
                .padding([4, 10])
                .style(theme::tag)
                .into()
        }))
        .spacing(8);

        let read_first = button(text("Read first chapter")).on_press_maybe(
            record
                .first_chapter()
                .map(|chapter| Message::OpenChapter(record.id.clone(), chapter)),
        );

        let read_latest = match (record.first_chapter(), record.latest_chapter()) {
            (Some(first), Some(latest)) if latest != first => Some(
                button(text(format!("Latest: Chapter {latest}")))
                    .style(button::secondary)
                    .on_press(Message::OpenChapter(record.id.clone(), latest)),
            ),
            _ => None,
        };

        let info = column![
            text(&record.title).size(36),
            text(format!("by {}", record.author)).color(theme::MUTED),
            row![
                StarRating::from_rating(record.rating).view(20.0),
                text(format!("{:.1}", record.rating)),
                text(format!("({} ratings)", record.rating_count)).color(theme::MUTED),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
            row![text(format!("{} Likes", record.likes)), like]
                .spacing(12)
                .align_y(Alignment::Center),
            genres,
            text(&record.description),
            row![read_first].push_maybe(read_latest).spacing(12),
        ]
        .spacing(14)
        .width(Length::Fill);

        row![cover, info].spacing(32).into()
    }

    fn chapters<'a>(&'a self, record: &'a ComicRecord) -> Element<'a, Message> {
        let numbers = record.chapter_numbers();
        let mut list = Column::new().spacing(8);
        if numbers.is_empty() {
            list = list.push(text("No chapters yet.").color(theme::MUTED));
        }
        for number in numbers {
            let panels = record.chapters.get(&number).map_or(0, Vec::len);
            let entry = row![
                text(format!("Chapter {number}")),
                Space::with_width(Length::Fill),
                text(format!("{panels} panels")).color(theme::MUTED),
            ]
            .align_y(Alignment::Center);
            list = list.push(
                button(entry)
                    .width(Length::Fill)
                    .style(button::secondary)
                    .on_press(Message::OpenChapter(record.id.clone(), number)),
            );
        }

        column![text("Chapters").size(24), list].spacing(12).into()
    }

    fn comments_view<'a>(&'a self, record: &'a ComicRecord) -> Element<'a, Message> {
        let picker = row((MIN_RATING..=MAX_RATING).map(|stars| {
            let picked = self.draft.rating.is_some_and(|rating| stars <= rating);
            button(text(if picked { "★" } else { "☆" }).size(22))
                .padding([2, 6])
                .style(button::text)
                .on_press(Message::RatingPicked(stars))
                .into()
        }))
        .spacing(2);

        let submit_label = if self.posting { "Posting…" } else { "Post comment" };
        let mut form = column![
            text_input("Your name", &self.draft.author).on_input(Message::AuthorChanged),
            text_input("Write a comment…", &self.draft.text)
                .on_input(Message::CommentChanged)
                .on_submit(Message::SubmitComment),
            row![text("Your rating"), picker]
                .spacing(12)
                .align_y(Alignment::Center),
            button(text(submit_label))
                .on_press_maybe((!self.posting).then_some(Message::SubmitComment)),
        ]
        .spacing(10)
        .max_width(640);
        if let Some(err) = &self.comment_error {
            form = form.push(text(err).style(text::danger));
        }

        let list: Element<'a, Message> = match &self.comments {
            Loadable::Loading => text("Loading comments…").into(),
            Loadable::Failed(_) => text("Comments are unavailable right now.")
                .color(theme::MUTED)
                .into(),
            Loadable::Ready(comments) if comments.is_empty() => {
                text("No comments yet. Be the first!").color(theme::MUTED).into()
            }
            Loadable::Ready(comments) => {
                Column::with_children(comments.iter().map(comment_view))
                    .spacing(12)
                    .into()
            }
        };

        let heading = row![
            text("Comments").size(24),
            text(format!("({})", record.comments_count))
                .size(18)
                .color(theme::MUTED),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        column![heading, form, list]
            .spacing(16)
            .into()
    }
}

fn comment_view(comment: &Comment) -> Element<'_, Message> {
    let header = row![
        text(&comment.author).size(16),
        StarRating::whole(comment.rating).view(14.0),
        Space::with_width(Length::Fill),
        text(comment.timestamp.format("%b %e, %Y").to_string())
            .size(13)
            .color(theme::MUTED),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    container(column![header, text(&comment.text)].spacing(6))
        .padding(12)
        .width(Length::Fill)
        .style(theme::card)
        .into()
}
