//! Gateway services over the selected storage backend

pub mod content;
pub mod library;
pub mod stats;
pub mod users;

pub use content::{Content, PostDraft};
pub use library::{Library, SortBy};
pub use stats::Stats;
pub use users::Users;
