pub mod auth;
pub mod timer;

pub use auth::AuthUser;
pub use timer::request_timer;
