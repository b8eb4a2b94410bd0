//! Conversion of creature state into the sensor currents sent to the network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SensorGains;
use crate::creature::{CreatureState, Side};
use crate::geometry::BodyPlan;
use crate::names::{IoMap, SensorKind};

/// Sensor values keyed by input node name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SensorBatch(BTreeMap<String, f64>);

impl SensorBatch {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_owned(), value);
    }
}

/// Reads one value per declared input node.
///
/// Antenna contact sensors own the edge timers: a fresh contact latches its
/// angle for `antenna_hold_ticks` reads, and every later read counts down.
pub fn encode_sensors(
    creature: &mut CreatureState,
    plan: &BodyPlan,
    io: &IoMap,
    gains: &SensorGains,
) -> SensorBatch {
    let mut batch = SensorBatch::default();
    for (name, kind) in io.inputs() {
        let value = match kind {
            SensorKind::LegForwardLimit(leg) => {
                if creature.at_forward_limit(leg, plan) {
                    gains.leg_limit
                } else {
                    0.0
                }
            }
            SensorKind::LegBackwardLimit(leg) => {
                if creature.at_backward_limit(leg, plan) {
                    gains.leg_limit
                } else {
                    0.0
                }
            }
            SensorKind::AntennaContact(side) => {
                let feeler = &mut creature.antennae[side.index()];
                if feeler.edge_timer == 0 {
                    if feeler.contact {
                        feeler.edge_timer = gains.antenna_hold_ticks;
                        feeler.held_angle = feeler.contact_angle;
                        gains.antenna_contact * feeler.held_angle
                    } else {
                        0.0
                    }
                } else {
                    feeler.edge_timer -= 1;
                    gains.antenna_contact * feeler.held_angle
                }
            }
            SensorKind::AntennaOdor(side) => {
                let odor = match side {
                    Side::Left => creature.food_odor.left,
                    Side::Right => creature.food_odor.right,
                };
                gains.antenna_odor_gain * odor - gains.antenna_odor_bias
            }
            SensorKind::MouthOdor => {
                gains.mouth_odor_gain * creature.food_odor.mouth - gains.mouth_odor_bias
            }
            SensorKind::Energy => gains.energy * creature.energy,
            SensorKind::MouthContact => {
                if creature.mouth_contact {
                    gains.mouth_contact
                } else {
                    0.0
                }
            }
            SensorKind::Unmapped => 0.0,
        };
        batch.insert(name, value);
    }
    batch
}
