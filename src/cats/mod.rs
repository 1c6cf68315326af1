//! The cats feature: entity, schema, service and controller.

mod controller;
mod schema;
mod service;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub use controller::CatsController;
pub use schema::cat_schema;
pub use service::{CatSummary, CatsService};

/// A cat. No identity of its own; its position in the service's list acts
/// as its id.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Cat {
    pub name: String,
    #[serde(deserialize_with = "whole_number")]
    pub age: u32,
    pub breed: String,
}

/// Accepts any JSON number with no fractional part that fits a `u32`, so
/// `3.0` reads as `3` the way the cat schema allows.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = f64::deserialize(deserializer)?;
    if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) {
        Ok(n as u32)
    } else {
        Err(D::Error::custom(format!("{n} is not a whole number in 0..={}", u32::MAX)))
    }
}
