//! State repository adapters.

mod json;

pub use json::{InMemoryStateRepository, JsonStateRepository};
