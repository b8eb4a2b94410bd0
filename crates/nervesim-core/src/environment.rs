//! Arena edges and the food field the creature forages in.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::creature::Feeler;
use crate::geometry::Point;
use crate::FEELER_COUNT;

use std::f64::consts::{FRAC_PI_2, PI, TAU};

const THREE_HALF_PI: f64 = 1.5 * PI;

/// Axis-aligned arena limits in arena coordinates (centred on zero).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ArenaBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ArenaBounds {
    /// Bounds spanning a `width` by `height` canvas centred on the origin.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        Self {
            min_x: -half_w,
            max_x: half_w,
            min_y: -half_h,
            max_y: half_h,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Bounce direction accumulated from antenna and cercus edge contacts.
///
/// Each component is the sign of the summed per-tip contributions, so
/// touching opposite edges at once cancels out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryContact {
    pub x_inc: i32,
    pub y_inc: i32,
}

impl BoundaryContact {
    #[must_use]
    pub const fn bounced(&self) -> bool {
        self.x_inc != 0 || self.y_inc != 0
    }

    /// Sign of the x component as a float.
    #[must_use]
    pub fn x_sign(&self) -> f64 {
        f64::from(self.x_inc.signum())
    }

    /// Sign of the y component as a float.
    #[must_use]
    pub fn y_sign(&self) -> f64 {
        f64::from(self.y_inc.signum())
    }
}

/// Tests antenna and cercus tips against the arena edges.
///
/// Antenna contact flags are cleared first and then set for every tip that
/// crosses an edge while its edge timer is idle. Cerci only push the body.
pub fn check_boundaries(
    antennae: &mut [Feeler; FEELER_COUNT],
    antenna_tips: &[Point; FEELER_COUNT],
    cercus_tips: &[Point; FEELER_COUNT],
    heading: f64,
    bounds: &ArenaBounds,
) -> BoundaryContact {
    let mut contact = BoundaryContact::default();
    for feeler in antennae.iter_mut() {
        feeler.contact = false;
    }

    for (feeler, tip) in antennae.iter_mut().zip(antenna_tips.iter()) {
        let idle = feeler.edge_timer == 0;
        let mut touch = |angle: f64| {
            if idle {
                feeler.contact = true;
                feeler.contact_angle = angle;
            }
        };

        if tip.x <= bounds.min_x {
            contact.x_inc += 1;
            touch(if heading > FRAC_PI_2 && heading <= THREE_HALF_PI {
                PI - heading
            } else if heading < THREE_HALF_PI {
                heading
            } else {
                TAU - heading
            });
        } else if tip.x >= bounds.max_x {
            contact.x_inc -= 1;
            touch(if (FRAC_PI_2..=THREE_HALF_PI).contains(&heading) {
                heading - PI
            } else if heading > THREE_HALF_PI {
                TAU - heading
            } else {
                -heading
            });
        }

        if tip.y <= bounds.min_y {
            contact.y_inc += 1;
            touch(if heading <= PI {
                heading - FRAC_PI_2
            } else {
                THREE_HALF_PI - heading
            });
        } else if tip.y >= bounds.max_y {
            contact.y_inc -= 1;
            touch(if heading <= PI {
                FRAC_PI_2 - heading
            } else {
                heading - THREE_HALF_PI
            });
        }
    }

    for tip in cercus_tips {
        if tip.x <= bounds.min_x {
            contact.x_inc += 1;
        } else if tip.x >= bounds.max_x {
            contact.x_inc -= 1;
        }
        if tip.y <= bounds.min_y {
            contact.y_inc += 1;
        } else if tip.y >= bounds.max_y {
            contact.y_inc -= 1;
        }
    }

    contact
}

/// A piece of food lying in the arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub x: f64,
    pub y: f64,
    /// Remaining energy value.
    pub size: f64,
    pub radius: f64,
}

impl FoodItem {
    #[must_use]
    pub fn new(x: f64, y: f64, size: f64, radius_scale: f64) -> Self {
        let size = size.max(0.0);
        Self {
            x,
            y,
            size,
            radius: radius_for(size, radius_scale),
        }
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

fn radius_for(size: f64, radius_scale: f64) -> f64 {
    radius_scale * (size.max(0.0) / PI).sqrt()
}

/// Odor strength at both antenna tips and at the mouth.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FoodOdor {
    pub left: f64,
    pub right: f64,
    pub mouth: f64,
}

/// Result of sampling the food field around the head.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OdorSample {
    pub odor: FoodOdor,
    /// Index of the touched item with the strongest mouth odor.
    pub mouth_target: Option<usize>,
}

/// Collection of food items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FoodField {
    items: Vec<FoodItem>,
}

impl FoodField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Adds an item; empty items are dropped immediately.
    pub fn deposit(&mut self, item: FoodItem) {
        if item.size > 0.0 {
            self.items.push(item);
        }
    }

    /// Scatters `count` items of `size` uniformly inside `bounds`.
    pub fn scatter<R: Rng>(
        &mut self,
        rng: &mut R,
        bounds: &ArenaBounds,
        count: usize,
        size: f64,
        radius_scale: f64,
    ) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        for _ in 0..count {
            let x = rng.random_range(bounds.min_x..bounds.max_x);
            let y = rng.random_range(bounds.min_y..bounds.max_y);
            self.deposit(FoodItem::new(x, y, size, radius_scale));
        }
    }

    /// Sums inverse-square odor contributions and finds the food under the mouth.
    ///
    /// Samples that coincide with an item contribute nothing.
    #[must_use]
    pub fn sample(
        &self,
        antenna_tips: &[Point; FEELER_COUNT],
        mouth: Point,
        antenna_gain: f64,
        mouth_gain: f64,
        contact_factor: f64,
    ) -> OdorSample {
        let mut sample = OdorSample::default();
        let mut strongest = 0.0_f64;

        for (idx, item) in self.items.iter().enumerate() {
            let food = item.position();
            let mut antenna = [0.0; FEELER_COUNT];
            for (odor, tip) in antenna.iter_mut().zip(antenna_tips.iter()) {
                let d_sq = tip.distance_sq(food);
                if d_sq > 0.0 {
                    *odor = antenna_gain * item.size / d_sq;
                }
            }
            sample.odor.left += antenna[0];
            sample.odor.right += antenna[1];

            let d_sq = mouth.distance_sq(food);
            if d_sq <= 0.0 {
                continue;
            }
            let mouth_odor = mouth_gain * item.size / d_sq;
            sample.odor.mouth += mouth_odor;
            if d_sq.sqrt() <= contact_factor * item.radius && mouth_odor > strongest {
                strongest = mouth_odor;
                sample.mouth_target = Some(idx);
            }
        }

        sample
    }

    /// Removes up to `cap` energy from item `idx`, returning the amount taken.
    ///
    /// Items that run out are removed from the field.
    pub fn bite(&mut self, idx: usize, cap: f64, radius_scale: f64) -> f64 {
        let Some(item) = self.items.get_mut(idx) else {
            return 0.0;
        };
        let taken = item.size.min(cap.max(0.0));
        item.size -= taken;
        if item.size <= 0.0 {
            self.items.swap_remove(idx);
        } else {
            item.radius = radius_for(item.size, radius_scale);
        }
        taken
    }
}
