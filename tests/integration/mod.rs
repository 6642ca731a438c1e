//! Integration tests module

mod link_generation;
mod policies;
mod routing;
