mod auth;
mod state;

pub use auth::DEFAULT_SESSION;
pub use auth::SessionSlot;
pub use auth::TokenStore;
pub use state::PendingLogin;
pub use state::PendingLogins;
