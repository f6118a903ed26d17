pub mod dto;
pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{router, AppState};
pub use server::{run_http_server, HttpServerConfig};
