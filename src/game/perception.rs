//! Spatial queries a sheep may ask about the rest of the world
//!
//! Sheep never hold a reference to the world. Each tick the world lends them
//! a [`WorldQueries`] view for the duration of one decision step.

use super::agent::Sheep;
use super::obstacle::ObstacleField;
use super::rules::{FleeStrategy, MatchRules};
use super::tuning::Tuning;
use crate::util::vector::{distance_sq, normalize};

/// Read-only surface handed to [`Sheep::update`].
pub trait WorldQueries {
    fn tuning(&self) -> &Tuning;

    fn flee_strategy(&self) -> FleeStrategy;

    /// Living sheep that `me` may hunt, in roster order.
    fn targets(&self, me: &Sheep) -> Vec<&Sheep>;

    /// Living sheep that `me` should run from, in roster order.
    fn threats(&self, me: &Sheep) -> Vec<&Sheep>;

    fn nearest_threat(&self, me: &Sheep) -> Option<&Sheep>;

    /// Some other living sheep's strike zone covers the point.
    fn danger_at_point(&self, x: f32, y: f32, me: &Sheep) -> bool;

    /// Perpendicular escape direction if `me`'s horn is about to meet another's.
    fn predict_horn_conflict(&self, me: &Sheep) -> Option<(f32, f32)>;

    fn is_obstacle(&self, x: f32, y: f32) -> bool;

    fn has_terrain(&self) -> bool;
}

/// Snapshot of the roster as seen by the sheep currently deciding.
///
/// The roster may contain a stale copy of the deciding sheep; every query
/// skips it by id.
pub struct Perception<'a> {
    sheep: &'a [Sheep],
    rules: &'a MatchRules,
    tuning: &'a Tuning,
    obstacles: Option<&'a ObstacleField>,
}

impl<'a> Perception<'a> {
    pub fn new(
        sheep: &'a [Sheep],
        rules: &'a MatchRules,
        tuning: &'a Tuning,
        obstacles: Option<&'a ObstacleField>,
    ) -> Self {
        Self {
            sheep,
            rules,
            tuning,
            obstacles,
        }
    }

    fn others<'s>(&'s self, me: &'s Sheep) -> impl Iterator<Item = &'a Sheep> + 's {
        self.sheep
            .iter()
            .filter(move |s| s.is_alive() && s.id != me.id)
    }
}

impl WorldQueries for Perception<'_> {
    fn tuning(&self) -> &Tuning {
        self.tuning
    }

    fn flee_strategy(&self) -> FleeStrategy {
        self.rules.flee_strategy()
    }

    fn targets(&self, me: &Sheep) -> Vec<&Sheep> {
        self.others(me)
            .filter(|s| self.rules.can_strike(me, s))
            .collect()
    }

    fn threats(&self, me: &Sheep) -> Vec<&Sheep> {
        self.others(me)
            .filter(|s| self.rules.is_hostile(me, s))
            .collect()
    }

    fn nearest_threat(&self, me: &Sheep) -> Option<&Sheep> {
        self.others(me)
            .filter(|s| self.rules.is_hostile(me, s))
            .min_by(|a, b| {
                let da = distance_sq(me.x, me.y, a.x, a.y);
                let db = distance_sq(me.x, me.y, b.x, b.y);
                da.total_cmp(&db)
            })
    }

    fn danger_at_point(&self, x: f32, y: f32, me: &Sheep) -> bool {
        let reach = self.tuning.strike_zone_margin;
        self.others(me).any(|s| {
            let (hx, hy) = s.horn_point(self.tuning.horn_offset);
            distance_sq(x, y, hx, hy) <= reach * reach
        })
    }

    fn predict_horn_conflict(&self, me: &Sheep) -> Option<(f32, f32)> {
        let t = self.tuning.conflict_lookahead;
        let radius = self.tuning.conflict_radius;
        let (mx, my) = me.future_horn_point(t, self.tuning.horn_offset);

        self.others(me)
            .filter(|s| self.rules.is_hostile(me, s))
            .find(|s| {
                let (sx, sy) = s.future_horn_point(t, self.tuning.horn_offset);
                distance_sq(mx, my, sx, sy) <= radius * radius
            })
            .map(|s| {
                let (nx, ny) = normalize(s.x - me.x, s.y - me.y);
                (-ny, nx)
            })
    }

    fn is_obstacle(&self, x: f32, y: f32) -> bool {
        self.obstacles.is_some_and(|field| field.is_obstacle(x, y))
    }

    fn has_terrain(&self) -> bool {
        self.obstacles.is_some()
    }
}
