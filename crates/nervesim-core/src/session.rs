//! Session state owned by the host: one creature, its food field and name tables.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, trace};

use crate::Tick;
use crate::config::{ConfigError, SimConfig};
use crate::creature::{CreatureState, Pose, RenderFrame};
use crate::environment::{ArenaBounds, FoodField, FoodItem};
use crate::geometry::{BodyOutline, BodyPlan, Point};
use crate::integrator::{StepOutcome, integrate};
use crate::names::{Actuator, IoMap};
use crate::sensors::{SensorBatch, encode_sensors};

/// Actuator values keyed by output node name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ActuatorBatch(BTreeMap<String, f64>);

impl ActuatorBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

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

    /// Collects the numeric entries of an `update` payload.
    ///
    /// Booleans count as `1.0`/`0.0`; strings, arrays, objects and nulls are
    /// display state and are skipped.
    #[must_use]
    pub fn from_json(payload: &Map<String, Value>) -> Self {
        payload
            .iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::Number(number) => number.as_f64()?,
                    Value::Bool(flag) => f64::from(u8::from(*flag)),
                    _ => return None,
                };
                Some((name.clone(), value))
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ActuatorBatch {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}

/// Events emitted after processing a tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TickEvents {
    pub tick: Tick,
    pub respawned: bool,
    pub died: bool,
    pub bounced: bool,
    pub poop: Option<FoodItem>,
    pub bite: Option<f64>,
}

impl TickEvents {
    fn from_outcome(tick: Tick, outcome: StepOutcome) -> Self {
        Self {
            tick,
            respawned: outcome.respawned,
            died: outcome.died,
            bounced: outcome.bounced,
            poop: outcome.poop,
            bite: outcome.bite,
        }
    }
}

/// Summary retained in the session history each tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickSummary {
    pub tick: Tick,
    pub energy: f64,
    pub alive: bool,
    pub food_items: usize,
    pub pose: Pose,
}

/// Everything needed to advance one creature between network updates.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    config: SimConfig,
    plan: BodyPlan,
    outline: BodyOutline,
    creature: CreatureState,
    food: FoodField,
    io: IoMap,
    tick: Tick,
    rng: SmallRng,
    history: VecDeque<TickSummary>,
}

impl SimulationSession {
    /// Validates `config` and spawns a creature with the standard body plan.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_plan(config, BodyPlan::standard())
    }

    /// Like [`SimulationSession::new`] with a custom body plan.
    pub fn with_plan(config: SimConfig, plan: BodyPlan) -> Result<Self, ConfigError> {
        config.validate()?;
        let outline = BodyOutline::from_plan(&plan);
        let rng = config.seeded_rng();
        let history_capacity = config.history_capacity;
        Ok(Self {
            creature: CreatureState::spawn(config.starting_energy),
            config,
            plan,
            outline,
            food: FoodField::new(),
            io: IoMap::default(),
            tick: Tick::zero(),
            rng,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Installs the node name tables and starts over with a fresh creature.
    ///
    /// Food is reseeded inside the configured arena.
    pub fn init<I, O>(&mut self, inputs: I, outputs: O)
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        self.io = IoMap::new(inputs, outputs);
        self.creature = CreatureState::spawn(self.config.starting_energy);
        self.tick = Tick::zero();
        self.history.clear();
        self.food.clear();
        let bounds = self.default_bounds();
        self.food.scatter(
            &mut self.rng,
            &bounds,
            self.config.initial_food_count,
            self.config.initial_food_size,
            self.config.food_radius_scale,
        );
        info!(
            inputs = self.io.input_count(),
            outputs = self.io.output_count(),
            food = self.food.len(),
            "session initialised"
        );
    }

    /// Applies the actuator batch and advances one tick.
    pub fn step(&mut self, batch: &ActuatorBatch, bounds: &ArenaBounds) -> TickEvents {
        self.apply_actuators(batch);
        let outcome = integrate(
            &mut self.creature,
            &mut self.food,
            &self.plan,
            &self.outline,
            &self.config,
            bounds,
        );
        self.tick = self.tick.next();
        let events = TickEvents::from_outcome(self.tick, outcome);
        if events.died {
            info!(tick = self.tick.0, "creature starved");
        } else if events.respawned {
            info!(tick = self.tick.0, "creature respawned");
        }
        if let Some(taken) = events.bite {
            debug!(tick = self.tick.0, taken, "bite");
        }
        if let Some(poop) = events.poop {
            debug!(tick = self.tick.0, size = poop.size, "poop");
        }
        self.record_history();
        events
    }

    /// Reads every declared input node.
    pub fn read_sensors(&mut self) -> SensorBatch {
        encode_sensors(
            &mut self.creature,
            &self.plan,
            &self.io,
            &self.config.sensor_gains,
        )
    }

    /// One full update: actuators in, one tick, sensors out.
    pub fn update(
        &mut self,
        batch: &ActuatorBatch,
        bounds: &ArenaBounds,
    ) -> (TickEvents, SensorBatch) {
        let events = self.step(batch, bounds);
        let sensors = self.read_sensors();
        (events, sensors)
    }

    fn apply_actuators(&mut self, batch: &ActuatorBatch) {
        let config = &self.config;
        for (name, raw) in batch.iter() {
            if !self.io.is_output(name) {
                trace!(%name, "display write ignored");
                continue;
            }
            let Some(actuator) = self.io.actuator(name) else {
                continue;
            };
            let value = sanitize(raw, config.actuator_limit);
            match actuator {
                Actuator::Backward(leg) => {
                    self.creature.leg_mut(leg).backward_force = config.backward_force_gain * value;
                }
                Actuator::Forward(leg) => {
                    self.creature.leg_mut(leg).forward_force = config.forward_force_gain * value;
                }
                Actuator::Lateral(leg) => {
                    self.creature.leg_mut(leg).lateral_force = config.lateral_force_gain * value;
                }
                Actuator::Foot(leg) => self.creature.leg_mut(leg).foot_down = value > 0.0,
                Actuator::Mouth => self.creature.mouth = value > 0.5,
            }
        }
    }

    fn record_history(&mut self) {
        let summary = TickSummary {
            tick: self.tick,
            energy: self.creature.energy,
            alive: self.creature.alive,
            food_items: self.food.len(),
            pose: self.creature.pose,
        };
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// Bounds of the configured arena, centred on the origin.
    #[must_use]
    pub fn default_bounds(&self) -> ArenaBounds {
        ArenaBounds::centered(self.config.arena_width, self.config.arena_height)
    }

    /// Drawable creature geometry; `origin` is added to every point.
    #[must_use]
    pub fn render_frame(&self, origin: Point) -> RenderFrame {
        self.creature
            .render_frame(&self.outline, &self.plan, self.config.scale, origin)
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn plan(&self) -> &BodyPlan {
        &self.plan
    }

    #[must_use]
    pub fn creature(&self) -> &CreatureState {
        &self.creature
    }

    /// Mutable creature access for hosts that stage scenarios.
    pub fn creature_mut(&mut self) -> &mut CreatureState {
        &mut self.creature
    }

    #[must_use]
    pub fn food(&self) -> &FoodField {
        &self.food
    }

    pub fn food_mut(&mut self) -> &mut FoodField {
        &mut self.food
    }

    #[must_use]
    pub fn io(&self) -> &IoMap {
        &self.io
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Iterate over retained tick summaries.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }
}

/// Non-finite values become zero; finite ones are clamped to `±limit`.
fn sanitize(value: f64, limit: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-limit, limit)
    } else {
        0.0
    }
}

/// Runs one update on a copy of `session`; the argument is left untouched.
#[must_use]
pub fn tick(
    session: &SimulationSession,
    batch: &ActuatorBatch,
    bounds: &ArenaBounds,
) -> (SimulationSession, SensorBatch) {
    let mut next = session.clone();
    let (_, sensors) = next.update(batch, bounds);
    (next, sensors)
}
