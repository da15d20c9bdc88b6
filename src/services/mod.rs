pub mod access;
pub mod auth;
pub mod provisioning;
pub mod stats;
pub mod user_context;
pub mod validation;

pub use auth::AuthService;
pub use provisioning::ProvisioningService;
pub use user_context::UserContext;
