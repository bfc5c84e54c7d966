//! Tool definitions module.
//!
//! Tools are grouped by area of the Garmin Connect account, one file per
//! group. Each group exposes a `register` function that adds its tools to the
//! registry.

pub mod activities;
pub mod challenges;
pub mod common;
pub mod data;
pub mod devices;
pub mod gear;
pub mod health;
pub mod profile;
pub mod training;
pub mod weight;
pub mod womens_health;
pub mod workouts;

use super::registry::ToolRegistry;

/// Register every tool group.
pub fn register_all(registry: &mut ToolRegistry) {
    activities::register(registry);
    health::register(registry);
    profile::register(registry);
    devices::register(registry);
    gear::register(registry);
    weight::register(registry);
    challenges::register(registry);
    training::register(registry);
    workouts::register(registry);
    data::register(registry);
    womens_health::register(registry);
}
