//! Delivery vehicles.

use bookshop_core::utils::VehicleConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// A vehicle in the delivery fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryVehicle {
    /// License number
    pub license: u32,

    /// Distance units covered per tick
    pub speed: u32,
}

impl DeliveryVehicle {
    /// Create a vehicle
    pub fn new(license: u32, speed: u32) -> Self {
        Self { license, speed }
    }

    /// Ticks needed to cover `distance`
    pub fn travel_ticks(&self, distance: u32) -> u64 {
        u64::from(distance / self.speed.max(1))
    }

    /// Drive to `address`, blocking for the travel time.
    ///
    /// Returns the number of ticks spent on the road.
    pub fn deliver(&self, address: &str, distance: u32, tick: Duration) -> u64 {
        let ticks = self.travel_ticks(distance);
        debug!(
            "Vehicle {} delivering to {} ({} ticks)",
            self.license, address, ticks
        );
        if ticks > 0 {
            thread::sleep(tick.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX)));
        }
        ticks
    }
}

impl From<&VehicleConfig> for DeliveryVehicle {
    fn from(config: &VehicleConfig) -> Self {
        Self::new(config.license, config.speed)
    }
}
