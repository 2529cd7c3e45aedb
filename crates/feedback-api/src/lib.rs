pub mod auth;
pub mod error;
pub mod feedback;
pub mod middleware;
pub mod routes;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
