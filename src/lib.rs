pub mod app;
pub mod content;
pub mod counters;
pub mod error;
pub mod event_source;
pub mod narration;
pub mod notification;
pub mod options;
pub mod pagination;
pub mod panic_handler;
pub mod paths;
pub mod render;
pub mod settings;
pub mod share;
pub mod storage;
pub mod theme;
pub mod transition;
pub mod viewport;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, AppAction, AppConfig, Collaborators, run_app_with_event_source};
