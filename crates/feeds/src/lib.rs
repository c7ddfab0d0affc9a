//! Quote feed layer.
//!
//! Defines the provider contract the engine polls against and the HTTP
//! scanner client that implements it.

pub mod error;
pub mod provider;
pub mod scanner;

pub use error::*;
pub use provider::*;
pub use scanner::*;
