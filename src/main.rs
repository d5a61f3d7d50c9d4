use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use iced::keyboard::{self, key::Named, Key};
use iced::widget::{column, container, text};
use iced::{window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod media;
mod state;
mod store;
mod ui;

use config::{Config, StoreBackend};
use media::{HttpImageFetcher, ImageCache, ImageFetcher, ImageTracker, LoadOutcome};
use state::data::{ComicRecord, ComicSummary, Comment, Panel, RatingUpdate};
use state::library::{toggled_like_count, Library};
use state::viewer::ViewMode;
use store::{ContentStore, FirestoreStore, MemoryStore, StoreError};
use ui::chapter::Chapter;
use ui::detail::Detail;
use ui::landing::Landing;

/// Where the reader is
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Landing,
    Detail(String),
    Chapter(String, u32),
}

enum Screen {
    Landing(Landing),
    Detail(Detail),
    Chapter(Chapter),
    /// Startup failed; nothing else can be shown
    Unavailable(String),
}

impl Screen {
    fn images_mut(&mut self) -> Option<&mut ImageTracker> {
        match self {
            Screen::Landing(landing) => Some(&mut landing.images),
            Screen::Detail(detail) => Some(&mut detail.images),
            Screen::Chapter(chapter) => Some(&mut chapter.images),
            Screen::Unavailable(_) => None,
        }
    }
}

/// Connections shared by every screen
#[derive(Clone)]
struct Services {
    store: Arc<dyn ContentStore>,
    fetcher: Arc<dyn ImageFetcher>,
    /// Session-wide image cache; screens get trackers over it
    images: ImageCache,
}

impl Services {
    fn connect(config: &Config) -> Result<Self, String> {
        let store: Arc<dyn ContentStore> = match config.store_backend().map_err(|e| e.to_string())? {
            StoreBackend::Fixture(path) => {
                info!(path = %path.display(), "Reading content from fixture");
                Arc::new(MemoryStore::from_fixture(&path).map_err(|e| e.to_string())?)
            }
            StoreBackend::Firestore {
                project_id,
                api_key,
            } => {
                info!(project = %project_id, "Reading content from Firestore");
                Arc::new(
                    FirestoreStore::new(&project_id, api_key, config.request_timeout())
                        .map_err(|e| e.to_string())?,
                )
            }
        };

        let fetcher =
            HttpImageFetcher::new(config.request_timeout()).map_err(|e| e.to_string())?;

        Ok(Self {
            store,
            fetcher: Arc::new(fetcher),
            images: ImageCache::new(),
        })
    }

    fn tracker(&self) -> ImageTracker {
        ImageTracker::new(self.images.clone(), Arc::clone(&self.fetcher))
    }
}

/// Main application state
struct Reader {
    config: Config,
    services: Option<Services>,
    /// Liked titles; None if the database could not be opened
    library: Option<Library>,
    route: Route,
    history: Vec<Route>,
    screen: Screen,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    // Navigation
    GoHome,
    Back,
    OpenComic(String),
    OpenChapter(String, u32),
    Retry,

    // Landing page
    SummariesLoaded(Result<Vec<ComicSummary>, StoreError>),
    HeroSelect(usize),
    HeroTick(u64),
    HeroTransitionDone(u64),
    Frame(Instant),

    // Detail page
    ComicLoaded(String, Result<ComicRecord, StoreError>),
    CommentsLoaded(String, Result<Vec<Comment>, StoreError>),
    ToggleLike,
    LikeUpdated {
        comic_id: String,
        liked: bool,
        likes: u32,
        result: Result<(), StoreError>,
    },
    AuthorChanged(String),
    CommentChanged(String),
    RatingPicked(u8),
    SubmitComment,
    CommentPosted {
        comic_id: String,
        comment: Comment,
        result: Result<RatingUpdate, StoreError>,
    },

    // Chapter reader
    PanelsLoaded {
        comic_id: String,
        chapter: u32,
        result: Result<Vec<Panel>, StoreError>,
    },
    SwitchMode(ViewMode),
    NextPanel,
    PrevPanel,
    JumpToPanel(usize),

    /// A panel or thumbnail finished loading
    ImageLoaded(LoadOutcome),
}

impl Reader {
    fn new() -> (Self, Task<Message>) {
        let config = match config::load() {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "Invalid configuration");
                return (Self::unavailable(Config::default(), err.to_string()), Task::none());
            }
        };

        let services = match Services::connect(&config) {
            Ok(services) => services,
            Err(err) => {
                error!(error = %err, "Could not connect to the content store");
                return (Self::unavailable(config, err), Task::none());
            }
        };

        let opened = match &config.library_path {
            Some(path) => Library::open(path),
            None => Library::open_default(),
        };
        let library = match opened {
            Ok(library) => {
                match library.liked_count() {
                    Ok(count) => info!(liked = count, path = %library.path().display(), "Library ready"),
                    Err(err) => warn!(error = %err, "Could not count liked titles"),
                }
                Some(library)
            }
            Err(err) => {
                warn!(error = %err, "Likes will not be remembered this session");
                None
            }
        };

        let mut reader = Reader {
            config,
            services: Some(services),
            library,
            route: Route::Landing,
            history: Vec::new(),
            screen: Screen::Unavailable(String::new()),
        };
        let task = reader.open(Route::Landing);
        (reader, task)
    }

    fn unavailable(config: Config, reason: String) -> Self {
        Reader {
            config,
            services: None,
            library: None,
            route: Route::Landing,
            history: Vec::new(),
            screen: Screen::Unavailable(reason),
        }
    }

    fn is_liked(&self, comic_id: &str) -> bool {
        let Some(library) = &self.library else {
            return false;
        };
        library.is_liked(comic_id).unwrap_or_else(|err| {
            warn!(comic = comic_id, error = %err, "Could not read like state");
            false
        })
    }

    /// Build the screen for a route and start its fetches
    fn open(&mut self, route: Route) -> Task<Message> {
        let Some(services) = self.services.clone() else {
            return Task::none();
        };
        self.route = route.clone();
        debug!(route = ?route, cached_images = services.images.len(), "Opening screen");

        match route {
            Route::Landing => {
                self.screen = Screen::Landing(Landing::new(services.tracker()));
                let store = services.store;
                Task::perform(
                    async move { store.fetch_comic_summaries().await },
                    Message::SummariesLoaded,
                )
            }
            Route::Detail(comic_id) => {
                let liked = self.is_liked(&comic_id);
                self.screen = Screen::Detail(Detail::new(comic_id.clone(), liked, services.tracker()));

                let store = Arc::clone(&services.store);
                let id = comic_id.clone();
                let record = Task::perform(
                    async move { store.fetch_comic_by_id(&id).await },
                    {
                        let comic_id = comic_id.clone();
                        move |result| Message::ComicLoaded(comic_id.clone(), result)
                    },
                );

                let store = services.store;
                let id = comic_id.clone();
                let comments = Task::perform(
                    async move { store.fetch_comments(&id).await },
                    move |result| Message::CommentsLoaded(comic_id.clone(), result),
                );

                Task::batch([record, comments])
            }
            Route::Chapter(comic_id, chapter) => {
                self.screen = Screen::Chapter(Chapter::new(comic_id.clone(), chapter, services.tracker()));

                let store = services.store;
                let id = comic_id.clone();
                Task::perform(
                    async move { store.fetch_panels_by_chapter(&id, chapter).await },
                    move |result| Message::PanelsLoaded {
                        comic_id: comic_id.clone(),
                        chapter,
                        result,
                    },
                )
            }
        }
    }

    fn navigate(&mut self, route: Route) -> Task<Message> {
        if route == self.route {
            return Task::none();
        }
        self.history.push(self.route.clone());
        self.open(route)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::GoHome => {
                self.history.clear();
                if self.route == Route::Landing {
                    return Task::none();
                }
                self.open(Route::Landing)
            }
            Message::Back => match self.history.pop() {
                Some(route) => self.open(route),
                None if self.route != Route::Landing => self.open(Route::Landing),
                None => Task::none(),
            },
            Message::OpenComic(comic_id) => self.navigate(Route::Detail(comic_id)),
            Message::OpenChapter(comic_id, chapter) => {
                self.navigate(Route::Chapter(comic_id, chapter))
            }
            Message::Retry => self.open(self.route.clone()),

            Message::SummariesLoaded(result) => match &mut self.screen {
                Screen::Landing(landing) => landing.loaded(result, self.config.hero_count),
                _ => Task::none(),
            },
            Message::HeroSelect(index) => match &mut self.screen {
                Screen::Landing(landing) => landing.select(index),
                _ => Task::none(),
            },
            Message::HeroTick(generation) => match &mut self.screen {
                Screen::Landing(landing) => landing.tick(generation),
                _ => Task::none(),
            },
            Message::HeroTransitionDone(generation) => {
                if let Screen::Landing(landing) = &mut self.screen {
                    landing.transition_done(generation);
                }
                Task::none()
            }
            Message::Frame(now) => {
                if let Screen::Landing(landing) = &mut self.screen {
                    landing.frame(now);
                }
                Task::none()
            }

            Message::ComicLoaded(comic_id, result) => match &mut self.screen {
                Screen::Detail(detail) if detail.comic_id == comic_id => {
                    detail.record_loaded(result)
                }
                _ => Task::none(),
            },
            Message::CommentsLoaded(comic_id, result) => {
                if let Screen::Detail(detail) = &mut self.screen {
                    if detail.comic_id == comic_id {
                        detail.comments_loaded(result);
                    }
                }
                Task::none()
            }
            Message::ToggleLike => self.toggle_like(),
            Message::LikeUpdated {
                comic_id,
                liked,
                likes,
                result,
            } => {
                match result {
                    Ok(()) => {
                        if let Some(library) = &self.library {
                            if let Err(err) = library.set_liked(&comic_id, liked) {
                                warn!(comic = %comic_id, error = %err, "Could not save like");
                            }
                        }
                        info!(comic = %comic_id, liked, likes, "Like updated");
                    }
                    Err(ref err) => {
                        warn!(comic = %comic_id, error = %err, "Failed to update likes");
                    }
                }
                if let Screen::Detail(detail) = &mut self.screen {
                    if detail.comic_id == comic_id {
                        detail.like_pending = false;
                        if result.is_ok() {
                            detail.liked = liked;
                            if let Some(record) = detail.record.ready_mut() {
                                record.likes = likes;
                            }
                        }
                    }
                }
                Task::none()
            }
            Message::AuthorChanged(author) => {
                if let Screen::Detail(detail) = &mut self.screen {
                    detail.draft.author = author;
                }
                Task::none()
            }
            Message::CommentChanged(comment) => {
                if let Screen::Detail(detail) = &mut self.screen {
                    detail.draft.text = comment;
                }
                Task::none()
            }
            Message::RatingPicked(stars) => {
                if let Screen::Detail(detail) = &mut self.screen {
                    detail.draft.rating = Some(stars);
                }
                Task::none()
            }
            Message::SubmitComment => self.submit_comment(),
            Message::CommentPosted {
                comic_id,
                comment,
                result,
            } => {
                let Screen::Detail(detail) = &mut self.screen else {
                    return Task::none();
                };
                if detail.comic_id != comic_id {
                    return Task::none();
                }
                detail.posting = false;
                match result {
                    Ok(update) => {
                        detail.comment_posted(comment, update)
                    }
                    Err(err) => {
                        warn!(comic = %comic_id, error = %err, "Failed to post comment");
                        detail.comment_error =
                            Some("Failed to post comment. Please try again.".to_string());
                    }
                }
                Task::none()
            }

            Message::PanelsLoaded {
                comic_id,
                chapter,
                result,
            } => match &mut self.screen {
                Screen::Chapter(screen)
                    if screen.comic_id == comic_id && screen.number == chapter =>
                {
                    screen.panels_loaded(result)
                }
                _ => Task::none(),
            },
            Message::SwitchMode(mode) => match &mut self.screen {
                Screen::Chapter(chapter) => chapter.switch_mode(mode),
                _ => Task::none(),
            },
            Message::NextPanel => match &mut self.screen {
                Screen::Chapter(chapter) => chapter.step(true),
                _ => Task::none(),
            },
            Message::PrevPanel => match &mut self.screen {
                Screen::Chapter(chapter) => chapter.step(false),
                _ => Task::none(),
            },
            Message::JumpToPanel(index) => match &mut self.screen {
                Screen::Chapter(chapter) => chapter.jump_to(index),
                _ => Task::none(),
            },

            Message::ImageLoaded(outcome) => {
                match self.screen.images_mut() {
                    Some(tracker) => {
                        tracker.finish(outcome);
                    }
                    // The screen that asked is gone; keep the image for later
                    None => {
                        if let Some(services) = &self.services {
                            services.images.complete(outcome);
                        }
                    }
                }
                Task::none()
            }
        }
    }

    fn toggle_like(&mut self) -> Task<Message> {
        let Some(services) = &self.services else {
            return Task::none();
        };
        let Screen::Detail(detail) = &mut self.screen else {
            return Task::none();
        };
        if detail.like_pending {
            return Task::none();
        }
        let Some(record) = detail.record.ready() else {
            return Task::none();
        };

        let liked = !detail.liked;
        let likes = toggled_like_count(record.likes, detail.liked);
        detail.like_pending = true;

        let store = Arc::clone(&services.store);
        let comic_id = detail.comic_id.clone();
        Task::perform(
            async move {
                let result = store.update_like_count(&comic_id, likes).await;
                (comic_id, result)
            },
            move |(comic_id, result)| Message::LikeUpdated {
                comic_id,
                liked,
                likes,
                result,
            },
        )
    }

    fn submit_comment(&mut self) -> Task<Message> {
        let Some(services) = &self.services else {
            return Task::none();
        };
        let Screen::Detail(detail) = &mut self.screen else {
            return Task::none();
        };
        if detail.posting {
            return Task::none();
        }

        let comment = match detail.draft.validate(Utc::now()) {
            Ok(comment) => comment,
            Err(err) => {
                detail.comment_error = Some(err.to_string());
                return Task::none();
            }
        };
        detail.posting = true;
        detail.comment_error = None;

        let store = Arc::clone(&services.store);
        let comic_id = detail.comic_id.clone();
        Task::perform(
            async move {
                let result = store.post_comment(&comic_id, &comment).await;
                (comic_id, comment, result)
            },
            |(comic_id, comment, result)| Message::CommentPosted {
                comic_id,
                comment,
                result,
            },
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        match &self.screen {
            Screen::Landing(landing) => landing.view(),
            Screen::Detail(detail) => detail.view(),
            Screen::Chapter(chapter) => chapter.view(),
            Screen::Unavailable(reason) => container(
                column![
                    text("CodeTales is unavailable").size(32),
                    text(reason),
                ]
                .spacing(16)
                .align_x(Alignment::Center),
            )
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::on_key_press(|key, _modifiers| match key {
            Key::Named(Named::ArrowRight) => Some(Message::NextPanel),
            Key::Named(Named::ArrowLeft) => Some(Message::PrevPanel),
            Key::Named(Named::Escape) => Some(Message::Back),
            _ => None,
        });

        // Redraw every frame only while the hero is crossfading
        let frames = match &self.screen {
            Screen::Landing(landing) if landing.hero.is_transitioning() => {
                window::frames().map(Message::Frame)
            }
            _ => Subscription::none(),
        };

        Subscription::batch([keys, frames])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        ui::theme::codetales()
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codetales_reader=info,warn")),
        )
        .init();

    info!("Starting {}", config::NAME);

    iced::application(config::NAME, Reader::update, Reader::view)
        .theme(Reader::theme)
        .subscription(Reader::subscription)
        .window_size(Size::new(config::WIN_WIDTH, config::WIN_HEIGHT))
        .centered()
        .run_with(Reader::new)
}
