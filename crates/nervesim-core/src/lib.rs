//! Core types for the nervesim hexapod simulation.
//!
//! A [`SimulationSession`] owns one creature, the food scattered around the
//! arena and the name tables negotiated with the driving network. Each
//! `update` batch of actuator values advances the creature by exactly one
//! fixed timestep and yields the sensor batch fed back to the network.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod creature;
pub mod environment;
pub mod geometry;
pub mod integrator;
pub mod names;
pub mod protocol;
pub mod sensors;
pub mod session;

pub use config::{ConfigError, SensorGains, SimConfig};
pub use creature::{CreatureState, Feeler, Leg, LegId, Pose, RenderFrame, Side};
pub use environment::{ArenaBounds, BoundaryContact, FoodField, FoodItem, FoodOdor};
pub use geometry::{BodyOutline, BodyPlan, Point, transform, transform_point};
pub use integrator::{StepOutcome, clamp_leg_angle, integrate};
pub use names::{Actuator, IoMap, SensorKind};
pub use protocol::{CallbackIds, Envelope, Inbound, ProtocolError, handle_inbound};
pub use sensors::{SensorBatch, encode_sensors};
pub use session::{ActuatorBatch, SimulationSession, TickEvents, TickSummary, tick};

/// Number of legs on the creature.
pub const LEG_COUNT: usize = 6;
/// Number of antennae (and of cerci).
pub const FEELER_COUNT: usize = 2;

pub(crate) const FULL_TURN: f64 = std::f64::consts::TAU;
pub(crate) const HALF_TURN: f64 = std::f64::consts::PI;

/// Wraps an angle into `(-π, π]`. NaN maps to zero.
#[must_use]
pub fn wrap_signed_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut angle = angle % FULL_TURN;
    while angle <= -HALF_TURN {
        angle += FULL_TURN;
    }
    while angle > HALF_TURN {
        angle -= FULL_TURN;
    }
    angle
}

/// Wraps an angle into `[0, 2π)`. NaN maps to zero.
#[must_use]
pub fn wrap_unsigned_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut angle = angle % FULL_TURN;
    while angle < 0.0 {
        angle += FULL_TURN;
    }
    // -tiny + TAU rounds to TAU
    while angle >= FULL_TURN {
        angle -= FULL_TURN;
    }
    angle
}

/// Monotonic simulation tick counter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}
