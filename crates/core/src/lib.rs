//! Core business logic for live-event polls and Q&A.

pub mod services;

pub use services::*;
