//! Fixed-timestep locomotion, metabolism and foraging for one creature.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::SimConfig;
use crate::creature::{CreatureState, LegId, Side};
use crate::environment::{ArenaBounds, FoodField, FoodItem, check_boundaries};
use crate::geometry::{BodyOutline, BodyPlan, Point, transform, transform_point};
use crate::{HALF_TURN, wrap_signed_angle, wrap_unsigned_angle};

/// Leg swing per unit of summed force per second.
const SWING_RATE: f64 = HALF_TURN / 15.0;

/// What happened during a single call to [`integrate`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    /// The creature was dead and has been replaced by a fresh spawn.
    pub respawned: bool,
    /// Energy ran out this tick.
    pub died: bool,
    /// An arena edge overrode the force-driven displacement.
    pub bounced: bool,
    /// Food deposited at the cerci.
    pub poop: Option<FoodItem>,
    /// Energy transferred by a bite.
    pub bite: Option<f64>,
}

/// Advances `creature` by one timestep using the forces already applied to its legs.
///
/// Dead creatures are respawned and nothing else happens that tick. Force
/// accumulators are consumed; foot and mouth flags are latched for the next tick.
pub fn integrate(
    creature: &mut CreatureState,
    food: &mut FoodField,
    plan: &BodyPlan,
    outline: &BodyOutline,
    config: &SimConfig,
    bounds: &ArenaBounds,
) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    if !creature.alive {
        *creature = CreatureState::spawn(config.starting_energy);
        outcome.respawned = true;
        return outcome;
    }

    let scale = config.scale;
    let step = config.dt * scale;
    let old = creature.pose;
    let legs = &creature.legs;

    let drive = legs
        .iter()
        .filter(|leg| leg.foot_down)
        .map(|leg| leg.backward_force - leg.forward_force)
        .sum::<f64>()
        / 2.0;
    let turn = (planted_lateral(creature, LegId::L1) - planted_lateral(creature, LegId::R1)) / 6.0;
    let strafe = 2.0 * (planted_lateral(creature, LegId::L2) - planted_lateral(creature, LegId::R2));

    let (sin, cos) = old.angle.sin_cos();
    let mut x = old.x - sin * drive * step - cos * strafe * step;
    let mut y = old.y + cos * drive * step - sin * strafe * step;
    let angle = wrap_unsigned_angle(old.angle + turn * step);

    let antenna_tips = transform(&outline.antenna_tips, x, y, angle, scale);
    let cercus_tips = transform(&outline.cercus_tips, x, y, angle, scale);
    let contact = check_boundaries(
        &mut creature.antennae,
        &antenna_tips,
        &cercus_tips,
        angle,
        bounds,
    );
    if contact.bounced() {
        x = old.x + config.bounce_magnitude * contact.x_sign() * step;
        y = old.y + config.bounce_magnitude * contact.y_sign() * step;
        outcome.bounced = true;
        trace!(x_inc = contact.x_inc, y_inc = contact.y_inc, "edge bounce");
    }
    if !(x.is_finite() && y.is_finite()) {
        x = old.x;
        y = old.y;
    }
    creature.pose.x = x;
    creature.pose.y = y;
    creature.pose.angle = angle;

    let old_feet = transform(
        &outline.feet(plan, &creature.leg_angles()),
        old.x,
        old.y,
        old.angle,
        scale,
    );
    let attachments = transform(&outline.legs, x, y, angle, scale);
    for id in LegId::ALL {
        let i = id.index();
        let leg = &mut creature.legs[i];
        let raw = if leg.last_foot_down && leg.foot_down {
            bearing(attachments[i], old_feet[i]) - angle
        } else {
            let sweep = config.dt * (leg.forward_force + leg.backward_force) * SWING_RATE;
            match id.side() {
                Side::Left => leg.angle + sweep,
                Side::Right => leg.angle - sweep,
            }
        };
        leg.angle = clamp_leg_angle(plan, id, raw);
    }

    let drain = config.energy_drain_rate * step;
    let drained = drain.min(creature.energy.max(0.0));
    creature.energy = (creature.energy - drain).max(0.0);
    creature.drained_since_poop += drained;
    if creature.drained_since_poop >= config.poop_threshold {
        let vent = cercus_tips_at(outline, creature, scale);
        let item = FoodItem::new(
            vent.x,
            vent.y,
            creature.drained_since_poop,
            config.food_radius_scale,
        );
        food.deposit(item);
        creature.drained_since_poop = 0.0;
        creature.last_poop_energy = creature.energy;
        outcome.poop = Some(item);
    }
    if creature.energy <= 0.0 {
        creature.alive = false;
        creature.energy = config.starting_energy;
        outcome.died = true;
        return outcome;
    }

    let pose = creature.pose;
    let antenna_tips = transform(&outline.antenna_tips, pose.x, pose.y, pose.angle, scale);
    let mouth = transform_point(outline.mouth(), pose.x, pose.y, pose.angle, scale);
    let sample = food.sample(
        &antenna_tips,
        mouth,
        config.antenna_odor_gain,
        config.mouth_odor_gain,
        config.mouth_contact_factor,
    );
    creature.food_odor = sample.odor;
    creature.mouth_contact = sample.mouth_target.is_some();
    if creature.last_mouth
        && !creature.mouth
        && let Some(target) = sample.mouth_target
    {
        let taken = food.bite(target, config.bite_energy_cap, config.food_radius_scale);
        creature.energy += taken;
        outcome.bite = Some(taken);
    }

    for leg in &mut creature.legs {
        leg.last_foot_down = leg.foot_down;
        leg.clear_forces();
    }
    creature.last_mouth = creature.mouth;
    outcome
}

fn planted_lateral(creature: &CreatureState, id: LegId) -> f64 {
    let leg = creature.leg(id);
    if leg.foot_down { leg.lateral_force } else { 0.0 }
}

fn bearing(from: Point, to: Point) -> f64 {
    wrap_unsigned_angle((to.y - from.y).atan2(to.x - from.x))
}

fn cercus_tips_at(outline: &BodyOutline, creature: &CreatureState, scale: f64) -> Point {
    let pose = creature.pose;
    let [left, right] = transform(&outline.cercus_tips, pose.x, pose.y, pose.angle, scale);
    left.midpoint(right)
}

/// Wraps a leg angle for its side and clamps it into the leg's swing range.
///
/// Left legs wrap into `(-π, π]` and clamp to `[min, max]`; right legs wrap
/// into `[0, 2π)` and clamp to `[max, min]`.
#[must_use]
pub fn clamp_leg_angle(plan: &BodyPlan, id: LegId, angle: f64) -> f64 {
    let i = id.index();
    let (min, max) = (plan.min_leg_angles[i], plan.max_leg_angles[i]);
    let wrapped = match id.side() {
        Side::Left => wrap_signed_angle(angle),
        Side::Right => wrap_unsigned_angle(angle),
    };
    wrapped.clamp(min.min(max), min.max(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LEG_COUNT;
    use std::f64::consts::{PI, TAU};

    struct Rig {
        plan: BodyPlan,
        outline: BodyOutline,
        config: SimConfig,
        bounds: ArenaBounds,
        food: FoodField,
        creature: CreatureState,
    }

    impl Rig {
        fn new() -> Self {
            let plan = BodyPlan::standard();
            let outline = BodyOutline::from_plan(&plan);
            let config = SimConfig::default();
            let bounds = ArenaBounds::centered(config.arena_width, config.arena_height);
            let creature = CreatureState::spawn(config.starting_energy);
            Self {
                plan,
                outline,
                config,
                bounds,
                food: FoodField::new(),
                creature,
            }
        }

        fn step(&mut self) -> StepOutcome {
            integrate(
                &mut self.creature,
                &mut self.food,
                &self.plan,
                &self.outline,
                &self.config,
                &self.bounds,
            )
        }
    }

    #[test]
    fn stance_force_moves_body_along_heading() {
        let mut rig = Rig::new();
        for leg in &mut rig.creature.legs {
            leg.backward_force = 10.0;
        }
        let before = rig.creature.pose;
        rig.step();
        let after = rig.creature.pose;
        // spawn heading points the head towards +x
        let expected = 6.0 * 10.0 / 2.0 * rig.config.dt;
        assert!((after.x - before.x - expected).abs() < 1e-9);
        assert!((after.y - before.y).abs() < 1e-9);
        assert_eq!(after.angle, before.angle);
    }

    #[test]
    fn lifted_feet_do_not_drive() {
        let mut rig = Rig::new();
        for leg in &mut rig.creature.legs {
            leg.backward_force = 10.0;
            leg.foot_down = false;
        }
        let before = rig.creature.pose;
        rig.step();
        assert_eq!(rig.creature.pose.x, before.x);
        assert_eq!(rig.creature.pose.y, before.y);
    }

    #[test]
    fn front_lateral_force_turns() {
        let mut rig = Rig::new();
        rig.creature.leg_mut(LegId::L1).lateral_force = 60.0;
        let before = rig.creature.pose.angle;
        rig.step();
        let expected = wrap_unsigned_angle(before + 10.0 * rig.config.dt);
        assert!((rig.creature.pose.angle - expected).abs() < 1e-12);
    }

    #[test]
    fn swinging_legs_move_in_opposite_directions() {
        let mut rig = Rig::new();
        for leg in &mut rig.creature.legs {
            leg.foot_down = false;
            leg.forward_force = 1.0;
        }
        rig.creature.leg_mut(LegId::L2).angle = 0.0;
        rig.creature.leg_mut(LegId::R2).angle = PI;
        rig.step();
        let sweep = rig.config.dt * SWING_RATE;
        assert!((rig.creature.leg(LegId::L2).angle - sweep).abs() < 1e-12);
        assert!((rig.creature.leg(LegId::R2).angle - (PI - sweep)).abs() < 1e-12);
    }

    #[test]
    fn leg_angles_are_clamped_per_side() {
        let plan = BodyPlan::standard();
        assert_eq!(clamp_leg_angle(&plan, LegId::L1, 3.0), plan.max_leg_angles[0]);
        assert_eq!(clamp_leg_angle(&plan, LegId::L1, -0.5), plan.min_leg_angles[0]);
        assert_eq!(clamp_leg_angle(&plan, LegId::R1, 0.1), plan.max_leg_angles[3]);
        assert_eq!(clamp_leg_angle(&plan, LegId::R1, 4.0), plan.min_leg_angles[3]);
        // right legs wrap before clamping
        let wrapped = clamp_leg_angle(&plan, LegId::R2, PI - TAU);
        assert!((wrapped - PI).abs() < 1e-12);
        assert_eq!(clamp_leg_angle(&plan, LegId::L2, f64::NAN), 0.0);
    }

    #[test]
    fn planted_feet_stay_in_range_while_walking() {
        let mut rig = Rig::new();
        for _ in 0..200 {
            for leg in &mut rig.creature.legs {
                leg.backward_force = 50.0;
            }
            rig.step();
            for id in LegId::ALL {
                let i = id.index();
                let angle = rig.creature.leg(id).angle;
                let (lo, hi) = (
                    rig.plan.min_leg_angles[i].min(rig.plan.max_leg_angles[i]),
                    rig.plan.min_leg_angles[i].max(rig.plan.max_leg_angles[i]),
                );
                assert!((lo..=hi).contains(&angle), "{id:?} at {angle}");
            }
        }
    }

    #[test]
    fn forces_are_consumed_and_feet_latched() {
        let mut rig = Rig::new();
        rig.creature.leg_mut(LegId::R3).backward_force = 3.0;
        rig.creature.leg_mut(LegId::R3).foot_down = false;
        rig.creature.mouth = true;
        rig.step();
        let leg = rig.creature.leg(LegId::R3);
        assert_eq!(leg.backward_force, 0.0);
        assert!(!leg.last_foot_down);
        assert!(rig.creature.last_mouth);
        assert_eq!(rig.creature.legs.len(), LEG_COUNT);
    }

    #[test]
    fn edge_contact_overrides_displacement() {
        let mut rig = Rig::new();
        // antenna tips reach 65 units ahead of the body on +x
        rig.creature.pose.x = rig.bounds.max_x - 60.0;
        for leg in &mut rig.creature.legs {
            leg.backward_force = 50.0;
        }
        let before = rig.creature.pose;
        let outcome = rig.step();
        assert!(outcome.bounced);
        let expected = -rig.config.bounce_magnitude * rig.config.dt;
        assert!((rig.creature.pose.x - before.x - expected).abs() < 1e-9);
        assert_eq!(rig.creature.pose.y, before.y);
        assert!(rig.creature.antennae.iter().all(|f| f.contact));
    }

    #[test]
    fn drain_emits_poop_at_cerci() {
        let mut rig = Rig::new();
        rig.config.dt = 0.25;
        rig.config.energy_drain_rate = 2.0;
        rig.config.poop_threshold = 0.5;
        let outcome = rig.step();
        let item = outcome.poop.expect("poop emitted");
        assert!((item.size - 0.5).abs() < 1e-12);
        assert_eq!(rig.food.len(), 1);
        // cerci trail behind the body, which faces +x
        assert!(item.x < rig.creature.pose.x);
        assert_eq!(rig.creature.drained_since_poop, 0.0);
        assert_eq!(rig.creature.last_poop_energy, rig.creature.energy);
    }

    #[test]
    fn exhaustion_kills_then_respawns() {
        let mut rig = Rig::new();
        rig.creature.energy = 0.001;
        rig.creature.pose.x = 25.0;
        let died = rig.step();
        assert!(died.died);
        assert!(!rig.creature.alive);
        assert_eq!(rig.creature.energy, rig.config.starting_energy);

        let respawn = rig.step();
        assert!(respawn.respawned);
        assert_eq!(rig.creature, CreatureState::spawn(rig.config.starting_energy));
    }

    #[test]
    fn closing_mouth_on_food_bites() {
        let mut rig = Rig::new();
        let mouth = transform_point(
            rig.outline.mouth(),
            rig.creature.pose.x,
            rig.creature.pose.y,
            rig.creature.pose.angle,
            1.0,
        );
        rig.food.deposit(FoodItem::new(mouth.x + 1.0, mouth.y, 25.0, 1.0));
        rig.creature.mouth = true;
        let first = rig.step();
        assert!(first.bite.is_none());
        assert!(rig.creature.mouth_contact);

        let energy = rig.creature.energy;
        rig.creature.mouth = false;
        let second = rig.step();
        assert_eq!(second.bite, Some(10.0));
        let drain = rig.config.energy_drain_rate * rig.config.dt;
        assert!((rig.creature.energy - (energy - drain + 10.0)).abs() < 1e-9);
        assert_eq!(rig.food.items()[0].size, 15.0);
    }
}
