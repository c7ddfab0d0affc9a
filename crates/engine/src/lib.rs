//! Alert engine.
//!
//! This crate contains the core logic of the alert service: the in-memory
//! store, instrument resolution, the create/cancel lifecycle and the
//! polling loop that fires alerts.

pub mod controller;
pub mod import;
pub mod notify;
pub mod resolver;
pub mod scheduler;
pub mod store;

pub use controller::*;
pub use import::*;
pub use notify::*;
pub use resolver::*;
pub use scheduler::*;
pub use store::*;
