//! HTTP protocol layer module
//!
//! Response builders, MIME detection and cookie parsing, decoupled from the
//! route table that uses them.

pub mod cookie;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_empty_response, build_file_response, build_json_response,
    build_text_response,
};
