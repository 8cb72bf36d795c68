//! Route groups for the package index API.

pub mod health;
pub mod kinds;
pub mod packages;

mod common;

pub use common::PrettyJson;
