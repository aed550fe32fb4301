//! # Blogicum Core
//!
//! The domain layer of the blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the publish policy, the visibility filter, the ownership guard and the use
//! cases built on them.

pub mod domain;
pub mod error;
pub mod forms;
pub mod guard;
pub mod navigation;
pub mod pagination;
pub mod ports;
pub mod services;
pub mod visibility;

pub use error::DomainError;
pub use services::BlogService;
