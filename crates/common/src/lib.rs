//! Common utilities and shared types for the watchit interactions service.
//!
//! This crate provides foundational components used across all crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use interactions_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Identity endpoint: {}, new id: {}", config.identity.user_endpoint, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{Config, DatabaseConfig, IdentityConfig};
pub use error::{AppError, AppResult, AuthFailure};
pub use id::IdGenerator;
