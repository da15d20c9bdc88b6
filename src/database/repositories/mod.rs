pub mod maintenance;
pub mod notification;
pub mod project;
pub mod task;
pub mod task_item;
pub mod team;
pub mod time_entry;
pub mod user;
pub mod whatsapp;

// Re-export all repositories for easy importing
pub use maintenance::MaintenanceRepository;
pub use notification::NotificationSettingsRepository;
pub use project::ProjectRepository;
pub use task::TaskRepository;
pub use task_item::TaskItemRepository;
pub use team::TeamRepository;
pub use time_entry::TimeEntryRepository;
pub use user::UserRepository;
pub use whatsapp::WhatsappRepository;
