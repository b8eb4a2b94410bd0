//! Mutable per-creature simulation state.

use serde::{Deserialize, Serialize};

use crate::environment::FoodOdor;
use crate::geometry::{BodyOutline, BodyPlan, Point, transform};
use crate::{FEELER_COUNT, LEG_COUNT};

use std::f64::consts::{FRAC_PI_2, PI};

/// Left or right side of the body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Index into paired appendage arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// Parses the `L`/`R` side letter used in node names.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            _ => None,
        }
    }
}

/// Identifies one of the six legs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LegId {
    L1,
    L2,
    L3,
    R1,
    R2,
    R3,
}

impl LegId {
    /// All legs in index order.
    pub const ALL: [Self; LEG_COUNT] = [Self::L1, Self::L2, Self::L3, Self::R1, Self::R2, Self::R3];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::L1 | Self::L2 | Self::L3 => Side::Left,
            Self::R1 | Self::R2 | Self::R3 => Side::Right,
        }
    }

    /// Position along the body, 1 (front) to 3 (rear).
    #[must_use]
    pub const fn segment(self) -> u8 {
        match self {
            Self::L1 | Self::R1 => 1,
            Self::L2 | Self::R2 => 2,
            Self::L3 | Self::R3 => 3,
        }
    }

    /// Two-character code such as `"L1"`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
        }
    }

    /// Parses a two-character leg code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|leg| leg.code() == code)
    }
}

/// Body position and heading. Heading 0 faces +x, rotations are counter-clockwise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

/// Per-leg actuation and kinematic state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Leg {
    pub backward_force: f64,
    pub forward_force: f64,
    pub lateral_force: f64,
    /// Swing angle relative to the body heading.
    pub angle: f64,
    pub foot_down: bool,
    pub last_foot_down: bool,
}

impl Leg {
    fn planted(angle: f64) -> Self {
        Self {
            backward_force: 0.0,
            forward_force: 0.0,
            lateral_force: 0.0,
            angle,
            foot_down: true,
            last_foot_down: true,
        }
    }

    /// Consumes the single-tick force impulses.
    pub fn clear_forces(&mut self) {
        self.backward_force = 0.0;
        self.forward_force = 0.0;
        self.lateral_force = 0.0;
    }
}

/// Contact state of an antenna.
///
/// `edge_timer` counts down while `held_angle` is reported, keeping the
/// sensor reading stable for a while after the contact itself ends.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Feeler {
    pub contact: bool,
    /// Only meaningful while `contact` is true.
    pub contact_angle: f64,
    pub held_angle: f64,
    pub edge_timer: u32,
}

/// Complete mutable state of one creature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatureState {
    pub pose: Pose,
    pub legs: [Leg; LEG_COUNT],
    pub antennae: [Feeler; FEELER_COUNT],
    pub mouth: bool,
    pub last_mouth: bool,
    pub mouth_contact: bool,
    pub energy: f64,
    /// Energy at the most recent poop event.
    pub last_poop_energy: f64,
    /// Energy drained since the most recent poop event.
    pub drained_since_poop: f64,
    pub alive: bool,
    pub food_odor: FoodOdor,
}

impl CreatureState {
    /// Fresh creature at the arena origin facing -y.
    #[must_use]
    pub fn spawn(starting_energy: f64) -> Self {
        Self {
            pose: Pose {
                x: 0.0,
                y: 0.0,
                angle: PI + FRAC_PI_2,
            },
            legs: [
                Leg::planted(0.0),
                Leg::planted(0.0),
                Leg::planted(0.0),
                Leg::planted(PI),
                Leg::planted(PI),
                Leg::planted(PI),
            ],
            antennae: [Feeler::default(); FEELER_COUNT],
            mouth: false,
            last_mouth: false,
            mouth_contact: false,
            energy: starting_energy,
            last_poop_energy: starting_energy,
            drained_since_poop: 0.0,
            alive: true,
            food_odor: FoodOdor::default(),
        }
    }

    #[must_use]
    pub fn leg(&self, id: LegId) -> &Leg {
        &self.legs[id.index()]
    }

    pub fn leg_mut(&mut self, id: LegId) -> &mut Leg {
        &mut self.legs[id.index()]
    }

    #[must_use]
    pub fn leg_angles(&self) -> [f64; LEG_COUNT] {
        self.legs.map(|leg| leg.angle)
    }

    /// Whether the leg has swung as far forward as it can.
    #[must_use]
    pub fn at_forward_limit(&self, id: LegId, plan: &BodyPlan) -> bool {
        let angle = self.leg(id).angle;
        let max = plan.max_leg_angles[id.index()];
        match id.side() {
            Side::Left => angle >= max,
            Side::Right => angle <= max,
        }
    }

    /// Whether the leg has swung as far backward as it can.
    #[must_use]
    pub fn at_backward_limit(&self, id: LegId, plan: &BodyPlan) -> bool {
        let angle = self.leg(id).angle;
        let min = plan.min_leg_angles[id.index()];
        match id.side() {
            Side::Left => angle <= min,
            Side::Right => angle >= min,
        }
    }

    /// World-space arrays for drawing the creature.
    ///
    /// `origin` is added to the pose so callers can map arena coordinates
    /// (centred on zero) onto a canvas.
    #[must_use]
    pub fn render_frame(
        &self,
        outline: &BodyOutline,
        plan: &BodyPlan,
        scale: f64,
        origin: Point,
    ) -> RenderFrame {
        let x = self.pose.x + origin.x;
        let y = self.pose.y + origin.y;
        let angle = self.pose.angle;
        let feet = transform(
            &outline.feet(plan, &self.leg_angles()),
            x,
            y,
            angle,
            scale,
        );
        let half = 2.0 * scale;
        let foot_pads = self
            .legs
            .iter()
            .zip(feet.iter())
            .filter(|(leg, _)| leg.foot_down)
            .map(|(_, foot)| {
                [
                    Point::new(foot.x - half, foot.y - half),
                    Point::new(foot.x + half, foot.y - half),
                    Point::new(foot.x + half, foot.y + half),
                    Point::new(foot.x - half, foot.y + half),
                ]
            })
            .collect();

        RenderFrame {
            head: transform(&outline.head, x, y, angle, scale).to_vec(),
            body: transform(&outline.body, x, y, angle, scale).to_vec(),
            antennae: line_pairs(
                &transform(&outline.antenna_bases, x, y, angle, scale),
                &transform(&outline.antenna_tips, x, y, angle, scale),
            ),
            cerci: line_pairs(
                &transform(&outline.cercus_bases, x, y, angle, scale),
                &transform(&outline.cercus_tips, x, y, angle, scale),
            ),
            legs: line_pairs(&transform(&outline.legs, x, y, angle, scale), &feet),
            foot_pads,
        }
    }
}

fn line_pairs<const N: usize>(from: &[Point; N], to: &[Point; N]) -> Vec<[Point; 2]> {
    from.iter().zip(to.iter()).map(|(a, b)| [*a, *b]).collect()
}

/// Drawable geometry for one creature in world coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderFrame {
    pub head: Vec<Point>,
    pub body: Vec<Point>,
    pub antennae: Vec<[Point; 2]>,
    pub cerci: Vec<[Point; 2]>,
    pub legs: Vec<[Point; 2]>,
    pub foot_pads: Vec<[Point; 4]>,
}
