//! Body plan constants and the rigid transform shared by physics and rendering.

use serde::{Deserialize, Serialize};

use crate::{FEELER_COUNT, LEG_COUNT};

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Point in either body-local or world space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Construct a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `length` along `angle` from the origin.
    #[must_use]
    pub fn polar(length: f64, angle: f64) -> Self {
        Self::new(length * angle.cos(), length * angle.sin())
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Squared euclidean distance.
    #[must_use]
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Length and base angle of a limb segment measured from the body origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Offset {
    pub length: f64,
    pub angle: f64,
}

impl Offset {
    /// Offset reaching the local point `(x, y)`.
    #[must_use]
    pub fn to(x: f64, y: f64) -> Self {
        Self {
            length: x.hypot(y),
            angle: y.atan2(x),
        }
    }

    const fn polar(length: f64, angle: f64) -> Self {
        Self { length, angle }
    }

    #[must_use]
    pub fn point(self) -> Point {
        Point::polar(self.length, self.angle)
    }
}

/// Fixed limb lengths and angles for one species.
///
/// Index order for legs is L1, L2, L3, R1, R2, R3; for paired appendages it
/// is left then right. Left legs swing through `[min, max]`; right legs are
/// mirrored so their valid range is `[max, min]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyPlan {
    pub head_tip: Offset,
    pub head_base: Offset,
    pub head_sides: [Offset; 2],
    pub body_top: [Offset; 2],
    pub body_middle: [Offset; 2],
    pub body_bottom: [Offset; 2],
    pub leg_attachments: [Offset; LEG_COUNT],
    pub leg_lengths: [f64; LEG_COUNT],
    pub max_leg_angles: [f64; LEG_COUNT],
    pub min_leg_angles: [f64; LEG_COUNT],
    pub antenna_bases: [Offset; FEELER_COUNT],
    pub antenna_tips: [Offset; FEELER_COUNT],
    pub cercus_bases: [Offset; FEELER_COUNT],
    pub cercus_tips: [Offset; FEELER_COUNT],
}

impl BodyPlan {
    /// The hexapod body plan used by the nerve simulator.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            head_tip: Offset::polar(29.0, FRAC_PI_2),
            head_base: Offset::polar(14.0, FRAC_PI_2),
            head_sides: [Offset::to(11.0, 22.0), Offset::to(-11.0, 22.0)],
            body_top: [Offset::to(6.0, 18.0), Offset::to(-6.0, 18.0)],
            body_middle: [Offset::polar(12.0, 0.0), Offset::polar(12.0, PI)],
            body_bottom: [Offset::to(6.0, -30.0), Offset::to(-6.0, -30.0)],
            leg_attachments: [
                Offset::to(8.0, 15.0),
                Offset::polar(12.0, 0.0),
                Offset::to(8.0, -24.0),
                Offset::to(-8.0, 15.0),
                Offset::polar(12.0, PI),
                Offset::polar(8.0_f64.hypot(24.0), TAU + (-24.0_f64).atan2(-8.0)),
            ],
            leg_lengths: [17.0, 15.0, 17.0, 17.0, 15.0, 17.0],
            max_leg_angles: [
                PI / 5.0,
                PI / 12.0,
                PI / 12.0,
                PI - PI / 5.0,
                PI - PI / 12.0,
                PI - PI / 12.0,
            ],
            min_leg_angles: [
                0.0,
                -PI / 12.0,
                -PI / 8.0,
                PI,
                PI + PI / 12.0,
                PI + PI / 8.0,
            ],
            antenna_bases: [Offset::to(6.0, 26.0), Offset::to(-6.0, 26.0)],
            antenna_tips: [Offset::to(30.0, 65.0), Offset::to(-30.0, 65.0)],
            cercus_bases: [Offset::to(2.0, -30.0), Offset::to(-2.0, -30.0)],
            cercus_tips: [Offset::to(8.0, -34.0), Offset::to(-8.0, -34.0)],
        }
    }
}

impl Default for BodyPlan {
    fn default() -> Self {
        Self::standard()
    }
}

/// Body-local point sets derived once from a [`BodyPlan`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyOutline {
    pub head: [Point; 4],
    pub body: [Point; 6],
    pub legs: [Point; LEG_COUNT],
    pub antenna_bases: [Point; FEELER_COUNT],
    pub antenna_tips: [Point; FEELER_COUNT],
    pub cercus_bases: [Point; FEELER_COUNT],
    pub cercus_tips: [Point; FEELER_COUNT],
}

impl BodyOutline {
    /// Places every outline point around the body origin.
    #[must_use]
    pub fn from_plan(plan: &BodyPlan) -> Self {
        Self {
            head: [
                plan.head_tip.point(),
                plan.head_sides[0].point(),
                plan.head_base.point(),
                plan.head_sides[1].point(),
            ],
            body: [
                plan.body_top[0].point(),
                plan.body_middle[0].point(),
                plan.body_bottom[0].point(),
                plan.body_bottom[1].point(),
                plan.body_middle[1].point(),
                plan.body_top[1].point(),
            ],
            legs: plan.leg_attachments.map(Offset::point),
            antenna_bases: plan.antenna_bases.map(Offset::point),
            antenna_tips: plan.antenna_tips.map(Offset::point),
            cercus_bases: plan.cercus_bases.map(Offset::point),
            cercus_tips: plan.cercus_tips.map(Offset::point),
        }
    }

    /// The mouth sits at the tip of the head.
    #[must_use]
    pub const fn mouth(&self) -> Point {
        self.head[0]
    }

    /// Free ends of the legs for the given swing angles.
    #[must_use]
    pub fn feet(&self, plan: &BodyPlan, leg_angles: &[f64; LEG_COUNT]) -> [Point; LEG_COUNT] {
        std::array::from_fn(|i| {
            let attach = self.legs[i];
            let reach = Point::polar(plan.leg_lengths[i], leg_angles[i]);
            Point::new(attach.x + reach.x, attach.y + reach.y)
        })
    }
}

/// Rotates `point` by `angle`, scales it and translates by `(tx, ty)`.
#[must_use]
#[inline]
pub fn transform_point(point: Point, tx: f64, ty: f64, angle: f64, scale: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(
        scale * (point.x * cos - point.y * sin) + tx,
        scale * (point.x * sin + point.y * cos) + ty,
    )
}

/// Applies [`transform_point`] to every point of a fixed-size set.
#[must_use]
pub fn transform<const N: usize>(
    points: &[Point; N],
    tx: f64,
    ty: f64,
    angle: f64,
    scale: f64,
) -> [Point; N] {
    points.map(|p| transform_point(p, tx, ty, angle, scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() <= epsilon
    }

    #[test]
    fn offsets_match_their_triangles() {
        let plan = BodyPlan::standard();
        let tip = plan.antenna_tips[0].point();
        assert!(approx_eq(tip.x, 30.0, 1e-9));
        assert!(approx_eq(tip.y, 65.0, 1e-9));
        let r3 = plan.leg_attachments[5].point();
        assert!(approx_eq(r3.x, -8.0, 1e-9));
        assert!(approx_eq(r3.y, -24.0, 1e-9));
    }

    #[test]
    fn transform_rotates_then_scales_then_translates() {
        let moved = transform_point(Point::new(1.0, 0.0), 10.0, -5.0, FRAC_PI_2, 2.0);
        assert!(approx_eq(moved.x, 10.0, 1e-12));
        assert!(approx_eq(moved.y, -3.0, 1e-12));
    }

    #[test]
    fn identity_transform_preserves_points() {
        let outline = BodyOutline::from_plan(&BodyPlan::standard());
        let same = transform(&outline.body, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(same, outline.body);
    }

    #[test]
    fn feet_extend_from_attachments() {
        let plan = BodyPlan::standard();
        let outline = BodyOutline::from_plan(&plan);
        let feet = outline.feet(&plan, &[0.0, 0.0, 0.0, PI, PI, PI]);
        assert!(approx_eq(feet[1].x, 12.0 + 15.0, 1e-9));
        assert!(approx_eq(feet[4].x, -12.0 - 15.0, 1e-9));
        assert!(approx_eq(feet[4].y, 0.0, 1e-9));
    }
}
