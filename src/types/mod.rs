//! Type definitions for LeetNotes
//!
//! This module contains all the data types used throughout the service,
//! including database row types and API request/response types.

pub mod cache;
pub mod llm;
pub mod solution;
pub mod usage;
pub mod user;

pub use cache::*;
pub use llm::*;
pub use solution::*;
pub use usage::*;
pub use user::*;
