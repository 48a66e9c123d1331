//! HTTP request handlers.

pub mod addons;
pub mod health;
pub mod stats;
pub mod uploads;

pub use addons::*;
pub use health::*;
pub use stats::*;
pub use uploads::*;
