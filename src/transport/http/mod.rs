pub mod csrf;
pub mod error;
pub mod middleware;
pub mod router;
pub mod session;
pub mod types;
pub mod views;
pub mod handlers {
    pub mod contacts;
    pub mod pages;
}

pub use error::{AppError, AppResult};
pub use router::create_router;
pub use session::{Session, SessionStore};
pub use types::AppState;
