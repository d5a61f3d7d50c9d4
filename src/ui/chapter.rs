/// Chapter reader: list or one-panel-at-a-time layouts
use iced::widget::{button, column, container, image, pick_list, row, scrollable, text, Column};
use iced::{Alignment, Element, Length, Task};
use tracing::{debug, warn};

use super::{failure_text, load_images, nav_bar, notice, placeholder, Loadable};
use crate::config::PLACEHOLDER_HEIGHT;
use crate::media::{ImageTracker, PendingLoad};
use crate::state::data::Panel;
use crate::state::viewer::{PanelViewer, ViewMode};
use crate::store::StoreError;
use crate::Message;

const PANEL_MAX_WIDTH: f32 = 900.0;

#[derive(Debug)]
pub struct Chapter {
    pub comic_id: String,
    pub number: u32,
    pub viewer: Loadable<PanelViewer>,
    pub images: ImageTracker,
}

impl Chapter {
    pub fn new(comic_id: String, number: u32, images: ImageTracker) -> Self {
        Self {
            comic_id,
            number,
            viewer: Loadable::Loading,
            images,
        }
    }

    pub fn panels_loaded(&mut self, result: Result<Vec<Panel>, StoreError>) -> Task<Message> {
        match result {
            Ok(panels) => {
                debug!(comic = %self.comic_id, chapter = self.number, panels = panels.len(), "Chapter loaded");
                self.viewer = Loadable::Ready(PanelViewer::new(panels));
                self.request_images()
            }
            Err(err) => {
                warn!(comic = %self.comic_id, chapter = self.number, error = %err, "Failed to fetch panels");
                self.viewer = Loadable::Failed(err);
                Task::none()
            }
        }
    }

    pub fn switch_mode(&mut self, mode: ViewMode) -> Task<Message> {
        match self.viewer.ready_mut() {
            Some(viewer) if viewer.mode() != mode => {
                viewer.switch_mode(mode);
                self.request_images()
            }
            _ => Task::none(),
        }
    }

    /// Step through panels; only the paged layout has a position
    pub fn step(&mut self, forward: bool) -> Task<Message> {
        load_images(self.advance(forward))
    }

    pub fn jump_to(&mut self, index: usize) -> Task<Message> {
        let moved = self
            .viewer
            .ready_mut()
            .is_some_and(|viewer| viewer.jump_to(index));
        if moved {
            self.request_images()
        } else {
            Task::none()
        }
    }

    fn advance(&mut self, forward: bool) -> Vec<PendingLoad> {
        let moved = match self.viewer.ready_mut() {
            Some(viewer) if viewer.mode() == ViewMode::Paged => {
                if forward {
                    viewer.next()
                } else {
                    viewer.prev()
                }
            }
            _ => false,
        };
        if moved {
            self.pending_images()
        } else {
            Vec::new()
        }
    }

    fn request_images(&mut self) -> Task<Message> {
        load_images(self.pending_images())
    }

    /// Load what is on screen, then the neighbors
    fn pending_images(&mut self) -> Vec<PendingLoad> {
        let Some(viewer) = self.viewer.ready() else {
            return Vec::new();
        };
        let plan = viewer.load_plan();
        self.images
            .preload_many(plan.display.iter().chain(plan.preload.iter()))
    }

    pub fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.viewer {
            Loadable::Loading => container(text("Loading chapter…"))
                .padding(40)
                .center_x(Length::Fill)
                .into(),
            Loadable::Failed(err) => notice(
                failure_text(err, "No panels found for this chapter", "Failed to fetch panels."),
                !err.is_not_found(),
            ),
            Loadable::Ready(viewer) if viewer.is_empty() => {
                notice("No panels found for this chapter".to_string(), false)
            }
            Loadable::Ready(viewer) => self.reader(viewer),
        };

        column![nav_bar(true), body].into()
    }

    fn reader<'a>(&'a self, viewer: &'a PanelViewer) -> Element<'a, Message> {
        let mode = viewer.mode();
        let toggle = row![
            mode_button("List View", ViewMode::List, mode),
            mode_button("Page View", ViewMode::Paged, mode),
        ]
        .spacing(8);

        let header = row![
            text(format!("Chapter {}", self.number)).size(24),
            iced::widget::Space::with_width(Length::Fill),
            toggle,
        ]
        .align_y(Alignment::Center)
        .padding([12, 24]);

        let panels = Column::with_children(
            viewer
                .visible_panels()
                .iter()
                .map(|panel| self.panel_view(panel)),
        )
        .align_x(Alignment::Center)
        .width(Length::Fill);

        let content: Element<'a, Message> = match mode {
            ViewMode::List => scrollable(panels).height(Length::Fill).into(),
            ViewMode::Paged => column![
                pager(viewer),
                scrollable(panels).height(Length::Fill),
                pager(viewer),
            ]
            .spacing(12)
            .align_x(Alignment::Center)
            .into(),
        };

        column![header, content].height(Length::Fill).into()
    }

    fn panel_view(&self, panel: &Panel) -> Element<'_, Message> {
        let panel: Element<'_, Message> = match self.images.handle(&panel.image) {
            Some(handle) => image(handle).width(Length::Fill).into(),
            None => placeholder(
                Length::Fill,
                Length::Fixed(PLACEHOLDER_HEIGHT),
                self.images.is_loading(&panel.image),
            ),
        };
        container(panel).max_width(PANEL_MAX_WIDTH).into()
    }
}

fn mode_button<'a>(label: &'a str, mode: ViewMode, current: ViewMode) -> Element<'a, Message> {
    button(text(label))
        .style(if mode == current {
            button::primary
        } else {
            button::secondary
        })
        .on_press(Message::SwitchMode(mode))
        .into()
}

/// Previous/Next controls with the page indicator
fn pager<'a>(viewer: &PanelViewer) -> Element<'a, Message> {
    let pages: Vec<usize> = (1..=viewer.len()).collect();
    row![
        button(text("Previous")).on_press_maybe(viewer.has_prev().then_some(Message::PrevPanel)),
        text(viewer.position_label()),
        pick_list(pages, Some(viewer.current_index() + 1), |page| {
            Message::JumpToPanel(page - 1)
        })
        .width(Length::Shrink),
        button(text("Next")).on_press_maybe(viewer.has_next().then_some(Message::NextPanel)),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ImageCache, ImageError, ImageFetcher};
    use async_trait::async_trait;
    use iced::widget::image::Handle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records every URL it is asked for
    #[derive(Default)]
    struct RecordingFetcher {
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageFetcher for RecordingFetcher {
        async fn fetch(&self, url: &str) -> Result<Handle, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            Ok(Handle::from_rgba(1, 1, vec![255u8; 4]))
        }
    }

    fn panel_url(index: usize) -> String {
        format!("https://cdn.example/ch1/{index}.png")
    }

    fn paged_chapter(count: usize) -> (Chapter, Arc<RecordingFetcher>) {
        let fetcher = Arc::new(RecordingFetcher::default());
        let images = ImageTracker::new(ImageCache::new(), fetcher.clone());
        let mut chapter = Chapter::new("comic-1".to_string(), 1, images);

        let panels = (0..count).map(|i| Panel { image: panel_url(i) }).collect();
        let mut viewer = PanelViewer::new(panels);
        viewer.switch_mode(ViewMode::Paged);
        chapter.viewer = Loadable::Ready(viewer);
        (chapter, fetcher)
    }

    async fn settle(chapter: &mut Chapter, pending: Vec<PendingLoad>) {
        for load in pending {
            let outcome = load.await;
            assert!(chapter.images.finish(outcome));
        }
    }

    fn fetched_since(fetcher: &RecordingFetcher, seen: usize) -> Vec<String> {
        fetcher.urls.lock().unwrap()[seen..].to_vec()
    }

    #[tokio::test]
    async fn test_each_step_fetches_only_the_next_panel() {
        let (mut chapter, fetcher) = paged_chapter(5);

        let pending = chapter.pending_images();
        assert_eq!(pending.len(), 2);
        settle(&mut chapter, pending).await;
        assert_eq!(fetched_since(&fetcher, 0), vec![panel_url(0), panel_url(1)]);

        for target in 1..4 {
            let seen = fetcher.calls.load(Ordering::SeqCst);
            let pending = chapter.advance(true);
            assert_eq!(pending.len(), 1);
            settle(&mut chapter, pending).await;
            assert_eq!(fetched_since(&fetcher, seen), vec![panel_url(target + 1)]);
        }

        // Panel 4 was preloaded while on panel 3
        assert!(chapter.advance(true).is_empty());
        // Already on the last panel
        assert!(chapter.advance(true).is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_stepping_back_reuses_loaded_panels() {
        let (mut chapter, fetcher) = paged_chapter(4);
        let pending = chapter.pending_images();
        settle(&mut chapter, pending).await;
        let pending = chapter.advance(true);
        settle(&mut chapter, pending).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);

        assert!(chapter.advance(false).is_empty());
        assert!(chapter.advance(false).is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_list_layout_does_not_step() {
        let (mut chapter, fetcher) = paged_chapter(3);
        if let Some(viewer) = chapter.viewer.ready_mut() {
            viewer.switch_mode(ViewMode::List);
        }

        let pending = chapter.pending_images();
        assert_eq!(pending.len(), 3);
        settle(&mut chapter, pending).await;

        assert!(chapter.advance(true).is_empty());
        assert_eq!(chapter.viewer.ready().map(PanelViewer::current_index), Some(0));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }
}
