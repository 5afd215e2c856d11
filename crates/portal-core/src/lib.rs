//! Core types and trait definitions for the feedback portal.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the domain model, the store and authentication seams, role resolution,
//! the route guard, and the two view models (administration and feedback
//! submission). The server and storage crates depend on it.

pub mod admin;
pub mod auth;
pub mod error;
pub mod feedback;
pub mod guard;
pub mod model;
pub mod role;
pub mod session;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
