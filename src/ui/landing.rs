/// Landing page: hero rotator over the featured titles and the title grid
use std::time::Instant;

use iced::widget::{button, column, container, image, row, scrollable, stack, text, Space};
use iced::{Alignment, ContentFit, Element, Length, Task};
use iced_aw::Wrap;
use tracing::warn;

use super::stars::StarRating;
use super::{after, load_images, nav_bar, placeholder, remote_image, theme, Loadable};
use crate::media::ImageTracker;
use crate::state::data::ComicSummary;
use crate::state::hero::{HeroRotator, Layer, Tick, AUTO_ROTATE, CROSSFADE};
use crate::store::StoreError;
use crate::Message;

const HERO_HEIGHT: f32 = 420.0;
const CARD_WIDTH: f32 = 220.0;
const CARD_IMAGE_HEIGHT: f32 = 300.0;

#[derive(Debug)]
pub struct Landing {
    pub summaries: Loadable<Vec<ComicSummary>>,
    pub hero: HeroRotator,
    pub images: ImageTracker,
    /// Last frame time, drives the crossfade opacity
    now: Instant,
}

impl Landing {
    pub fn new(images: ImageTracker) -> Self {
        Self {
            summaries: Loadable::Loading,
            hero: HeroRotator::new(Vec::new()),
            images,
            now: Instant::now(),
        }
    }

    /// Titles arrived: seed the hero, load thumbnails, start the rotation
    pub fn loaded(
        &mut self,
        result: Result<Vec<ComicSummary>, StoreError>,
        hero_count: usize,
    ) -> Task<Message> {
        match result {
            Ok(summaries) => {
                self.hero = HeroRotator::new(summaries.iter().take(hero_count).cloned().collect());
                let pending = self.images.preload_many(
                    summaries
                        .iter()
                        .map(|summary| summary.thumbnail.as_str())
                        .filter(|url| !url.is_empty()),
                );
                self.summaries = Loadable::Ready(summaries);
                Task::batch([load_images(pending), self.arm_timer()])
            }
            Err(err) => {
                warn!(error = %err, "Failed to fetch titles");
                self.summaries = Loadable::Failed(err);
                Task::none()
            }
        }
    }

    fn arm_timer(&mut self) -> Task<Message> {
        let generation = self.hero.arm_timer();
        after(AUTO_ROTATE, Message::HeroTick(generation))
    }

    fn crossfade(generation: u64) -> Task<Message> {
        after(CROSSFADE, Message::HeroTransitionDone(generation))
    }

    /// Indicator clicked. A manual change restarts the auto-advance.
    pub fn select(&mut self, index: usize) -> Task<Message> {
        self.now = Instant::now();
        match self.hero.select(index, self.now) {
            Some(generation) => Task::batch([Self::crossfade(generation), self.arm_timer()]),
            None => Task::none(),
        }
    }

    /// Auto-advance timer fired
    pub fn tick(&mut self, generation: u64) -> Task<Message> {
        self.now = Instant::now();
        match self.hero.tick(generation, self.now) {
            Tick::Stale => Task::none(),
            Tick::Rearm => self.arm_timer(),
            Tick::Advance(transition) => {
                Task::batch([Self::crossfade(transition), self.arm_timer()])
            }
        }
    }

    pub fn transition_done(&mut self, generation: u64) {
        self.hero.finish_transition(generation);
    }

    pub fn frame(&mut self, now: Instant) {
        self.now = now;
    }

    pub fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.summaries {
            Loadable::Loading => container(text("Loading titles…"))
                .padding(40)
                .center_x(Length::Fill)
                .into(),
            Loadable::Failed(err) => {
                let mut content = column![text("Could not load titles.").size(20)]
                    .spacing(12)
                    .align_x(Alignment::Center);
                content = content.push(text(err.to_string()).color(theme::MUTED));
                content = content.push(
                    button(text("Retry"))
                        .style(button::secondary)
                        .on_press(Message::Retry),
                );
                container(content).padding(40).center_x(Length::Fill).into()
            }
            Loadable::Ready(summaries) if summaries.is_empty() => {
                container(text("No titles published yet."))
                    .padding(40)
                    .center_x(Length::Fill)
                    .into()
            }
            Loadable::Ready(summaries) => column![
                self.hero_view(),
                text("Welcome to CodeTales").size(30),
                self.grid(summaries),
            ]
            .spacing(24)
            .padding([0, 24])
            .into(),
        };

        column![nav_bar(false), scrollable(body).height(Length::Fill)].into()
    }

    fn hero_view(&self) -> Element<'_, Message> {
        let Some(current) = self.hero.current() else {
            return Space::with_height(0).into();
        };

        let background = stack![
            self.hero_layer(Layer::First),
            self.hero_layer(Layer::Second),
        ]
        .width(Length::Fill)
        .height(Length::Fixed(HERO_HEIGHT));

        let info = container(
            column![
                text(&current.title).size(36),
                StarRating::from_rating(current.rating).view(20.0),
                text(current.genre.join(" · ")).color(theme::PINK),
                text(&current.description),
                button(text("Read now")).on_press(Message::OpenComic(current.id.clone())),
            ]
            .spacing(10)
            .max_width(520),
        )
        .padding(32)
        .height(Length::Fixed(HERO_HEIGHT))
        .align_y(Alignment::End);

        let indicators = row(self.hero.slides().iter().enumerate().map(|(index, _)| {
            let active = index == self.hero.displayed();
            let width = if active { 32.0 } else { 8.0 };
            button(Space::new(Length::Fixed(width), Length::Fixed(8.0)))
                .padding(0)
                .style(if active {
                    button::primary
                } else {
                    button::secondary
                })
                .on_press(Message::HeroSelect(index))
                .into()
        }))
        .spacing(8);

        column![stack![background, info], indicators]
            .spacing(12)
            .align_x(Alignment::Center)
            .into()
    }

    fn hero_layer(&self, layer: Layer) -> Element<'_, Message> {
        let opacity = self.hero.opacity(layer, self.now);
        match self
            .hero
            .layer_image(layer)
            .and_then(|url| self.images.handle(url))
        {
            Some(handle) => image(handle)
                .width(Length::Fill)
                .height(Length::Fixed(HERO_HEIGHT))
                .content_fit(ContentFit::Cover)
                .opacity(opacity * 0.5)
                .into(),
            None => Space::new(Length::Fill, Length::Fixed(HERO_HEIGHT)).into(),
        }
    }

    fn grid<'a>(&'a self, summaries: &'a [ComicSummary]) -> Element<'a, Message> {
        let cards = summaries.iter().map(|summary| self.card(summary)).collect();
        Wrap::with_elements(cards)
            .spacing(16.0)
            .line_spacing(16.0)
            .into()
    }

    fn card<'a>(&'a self, summary: &'a ComicSummary) -> Element<'a, Message> {
        let cover = if summary.thumbnail.is_empty() {
            placeholder(
                Length::Fixed(CARD_WIDTH),
                Length::Fixed(CARD_IMAGE_HEIGHT),
                false,
            )
        } else {
            remote_image(
                &self.images,
                &summary.thumbnail,
                Length::Fixed(CARD_WIDTH),
                Length::Fixed(CARD_IMAGE_HEIGHT),
                ContentFit::Cover,
            )
        };

        let body = column![
            cover,
            text(&summary.title).size(18),
            row![
                StarRating::from_rating(summary.rating).view(14.0),
                text(format!("{:.1}", summary.rating)).size(14),
            ]
            .spacing(6)
            .align_y(Alignment::Center),
        ]
        .spacing(8)
        .width(Length::Fixed(CARD_WIDTH));

        button(container(body).padding(8).style(theme::card))
            .padding(0)
            .style(button::text)
            .on_press(Message::OpenComic(summary.id.clone()))
            .into()
    }
}
