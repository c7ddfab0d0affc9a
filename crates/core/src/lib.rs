//! Core data types for the price alert service.

pub mod alert;
pub mod instrument;
pub mod market;
pub mod price;

pub use alert::*;
pub use instrument::*;
pub use market::*;
pub use price::*;
