//! Request handler module
//!
//! Responsible for request dispatch: the echo routes, the CORS policy of the
//! alternate listener and the static files of the primary one.

pub mod cors;
pub mod echo;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, DispatchState};
