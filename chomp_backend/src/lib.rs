mod api;
mod auth;
mod http;
mod model;
mod telegram_auth;

pub use api::{BackendError, ChompApi, NewAnswer};
pub use auth::{AuthProvider, HttpAuthProvider};
pub use http::HttpChompApi;
pub use telegram_auth::TelegramAuthSigner;
