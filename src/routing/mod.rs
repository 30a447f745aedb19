//! Routing module
//!
//! The static echo route table and the (method, path) matcher that searches it.

mod matcher;
mod table;

pub use table::{EchoKind, FixtureCookie, RouteSpec, RouteTable};
