//! API routes and handlers

pub mod internal;
pub mod request_context;
mod router;
pub mod speech;
mod ui;

pub use router::create_router;
