pub mod auth;
pub mod notification;
pub mod project;
pub mod stats;
pub mod task;
pub mod team;
pub mod time_entry;
pub mod user;
pub mod whatsapp;

// Re-export all models for easy importing
pub use auth::*;
pub use notification::*;
pub use project::*;
pub use stats::*;
pub use task::*;
pub use team::*;
pub use time_entry::*;
pub use user::*;
pub use whatsapp::*;
