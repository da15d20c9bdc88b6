pub mod admin;
pub mod auth;
pub mod notifications;
pub mod projects;
pub mod reports;
pub mod shared;
pub mod task_items;
pub mod tasks;
pub mod teams;
pub mod time_entries;
pub mod users;
pub mod whatsapp;
