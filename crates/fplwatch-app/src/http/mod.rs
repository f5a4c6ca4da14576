// HTTP API for browser and script clients.
//
// Handlers parse and validate path/query input, call the dashboard service
// or the session handle, and map failures to `{ "error": ... }` bodies.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::{create_router, serve};
pub use state::AppState;
