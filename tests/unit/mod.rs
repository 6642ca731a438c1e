//! Unit tests module
//!
//! Contains unit tests for individual components.

mod constraints;
mod precedence;
mod templates;
mod values;
