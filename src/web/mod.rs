pub mod api;
pub mod server;

pub use api::AppState;
pub use server::{build_router, start_server};
