//! docfeedback server: shared state, HTTP routes and command line parsing.

pub mod cli;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
