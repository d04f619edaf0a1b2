//! Shipping pack calculator.
//!
//! Picks the combination of pack sizes that ships the fewest items for an
//! order and, among those, the fewest packs. The solver lives in
//! [`optimizer`]; [`api`] and [`service`] expose it over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod numeric;
pub mod optimizer;
pub mod service;
pub mod sizes;

pub use error::{ErrorKind, PackError};
pub use model::{Combination, PackSize, Quantity};
pub use optimizer::{PackingConfig, calculate, calculate_with_config};
