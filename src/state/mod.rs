/// State management module
///
/// This module handles all application state that is independent of
/// rendering, including:
/// - Shared content types (data.rs)
/// - The local SQLite library of liked titles (library.rs)
/// - The chapter panel viewer (viewer.rs)
/// - The landing page hero rotator (hero.rs)
/// - The comment form (comments.rs)

pub mod comments;
pub mod data;
pub mod hero;
pub mod library;
pub mod viewer;
