//! Helpers shared by the integration harnesses.

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
