//! Simulation tuning knobs.

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating a [`SimConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Gains and biases that convert creature state into sensor currents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorGains {
    /// Current reported by a leg angle sensor sitting at its limit.
    pub leg_limit: f64,
    /// Gain applied to the held antenna contact angle.
    pub antenna_contact: f64,
    /// Ticks an antenna contact angle is held after the contact is reported.
    pub antenna_hold_ticks: u32,
    /// Gain applied to antenna odor.
    pub antenna_odor_gain: f64,
    /// Bias subtracted from antenna odor currents.
    pub antenna_odor_bias: f64,
    /// Gain applied to mouth odor.
    pub mouth_odor_gain: f64,
    /// Bias subtracted from mouth odor currents.
    pub mouth_odor_bias: f64,
    /// Gain applied to creature energy.
    pub energy: f64,
    /// Current reported while the mouth touches food.
    pub mouth_contact: f64,
}

impl Default for SensorGains {
    fn default() -> Self {
        Self {
            leg_limit: 1e-8,
            antenna_contact: 5.09e-9,
            antenna_hold_ticks: 100,
            antenna_odor_gain: 1e-10,
            antenna_odor_bias: 2.5e-12,
            mouth_odor_gain: 5e-11,
            mouth_odor_bias: 5e-11,
            energy: 5e-12,
            mouth_contact: 5e-9,
        }
    }
}

/// Static configuration for a simulation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds of simulated time per tick.
    pub dt: f64,
    /// Body-size multiplier applied to displacement, rotation and drain.
    pub scale: f64,
    /// Force produced by a unit stance (STxN) output.
    pub backward_force_gain: f64,
    /// Force produced by a unit swing (SWxN) output.
    pub forward_force_gain: f64,
    /// Force produced by a unit lateral (LExN) output.
    pub lateral_force_gain: f64,
    /// Displacement per second applied when the creature bounces off an edge.
    pub bounce_magnitude: f64,
    /// Actuator values are clamped to `±actuator_limit`; non-finite values become zero.
    pub actuator_limit: f64,
    /// Energy assigned on spawn.
    pub starting_energy: f64,
    /// Energy drained per second.
    pub energy_drain_rate: f64,
    /// Drained energy that triggers a poop event.
    pub poop_threshold: f64,
    /// Maximum energy transferred by a single bite.
    pub bite_energy_cap: f64,
    /// Scale `k` in `radius = k * sqrt(size / pi)`.
    pub food_radius_scale: f64,
    /// Odor sensed at an antenna tip per unit of food size over squared distance.
    pub antenna_odor_gain: f64,
    /// Odor sensed at the mouth per unit of food size over squared distance.
    pub mouth_odor_gain: f64,
    /// The mouth touches food within `mouth_contact_factor * radius`.
    pub mouth_contact_factor: f64,
    /// Number of food items scattered when a session is initialised.
    pub initial_food_count: usize,
    /// Size of each scattered food item.
    pub initial_food_size: f64,
    /// Optional RNG seed for reproducible food placement.
    pub rng_seed: Option<u64>,
    /// Arena width used when the caller does not supply bounds.
    pub arena_width: f64,
    /// Arena height used when the caller does not supply bounds.
    pub arena_height: f64,
    /// Maximum number of tick summaries retained in memory.
    pub history_capacity: usize,
    /// Sensor conversion constants.
    pub sensor_gains: SensorGains,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            scale: 1.0,
            backward_force_gain: 50.0,
            forward_force_gain: 50.0,
            lateral_force_gain: 7.0,
            bounce_magnitude: 20.5,
            actuator_limit: 1_000.0,
            starting_energy: 100.0,
            energy_drain_rate: 1.0,
            poop_threshold: 20.0,
            bite_energy_cap: 10.0,
            food_radius_scale: 1.0,
            antenna_odor_gain: 0.75,
            mouth_odor_gain: 1.0,
            mouth_contact_factor: 2.0,
            initial_food_count: 0,
            initial_food_size: 50.0,
            rng_seed: None,
            arena_width: 800.0,
            arena_height: 600.0,
            history_capacity: 256,
            sensor_gains: SensorGains::default(),
        }
    }
}

impl SimConfig {
    /// Checks every knob for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.dt) {
            return Err(ConfigError::Invalid("dt must be positive"));
        }
        if !positive(self.scale) {
            return Err(ConfigError::Invalid("scale must be positive"));
        }
        if !(positive(self.arena_width) && positive(self.arena_height)) {
            return Err(ConfigError::Invalid("arena extents must be positive"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be non-zero"));
        }
        if !positive(self.starting_energy) {
            return Err(ConfigError::Invalid("starting_energy must be positive"));
        }
        if !positive(self.poop_threshold) {
            return Err(ConfigError::Invalid("poop_threshold must be positive"));
        }
        if !positive(self.actuator_limit) {
            return Err(ConfigError::Invalid("actuator_limit must be positive"));
        }
        let rates = [
            self.backward_force_gain,
            self.forward_force_gain,
            self.lateral_force_gain,
            self.bounce_magnitude,
            self.energy_drain_rate,
            self.bite_energy_cap,
            self.food_radius_scale,
            self.antenna_odor_gain,
            self.mouth_odor_gain,
            self.mouth_contact_factor,
            self.initial_food_size,
        ];
        if !rates.into_iter().all(non_negative) {
            return Err(ConfigError::Invalid(
                "gains, rates and food parameters must be non-negative",
            ));
        }
        let gains = &self.sensor_gains;
        let currents = [
            gains.leg_limit,
            gains.antenna_contact,
            gains.antenna_odor_gain,
            gains.antenna_odor_bias,
            gains.mouth_odor_gain,
            gains.mouth_odor_bias,
            gains.energy,
            gains.mouth_contact,
        ];
        if !currents.into_iter().all(f64::is_finite) {
            return Err(ConfigError::Invalid("sensor gains must be finite"));
        }
        Ok(())
    }

    /// Returns the configured RNG, seeding from entropy when no seed is set.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
