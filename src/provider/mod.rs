//! Repository search providers
//!
//! Defines the provider trait the request controller talks to, and the GitHub
//! implementation.

mod traits;

pub mod github;

pub use github::GitHub;
pub use traits::*;
