//! # Blogicum Shared
//!
//! Types exchanged with the presentation layer: submitted forms, the page
//! contexts handlers produce, and problem responses.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
