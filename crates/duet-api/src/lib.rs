pub mod auth;
pub mod comments;
pub mod countdown;
pub mod error;
pub mod letters;
pub mod likes;
pub mod location;
pub mod media;
pub mod memories;
pub mod middleware;
pub mod storage;
pub mod voice;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
