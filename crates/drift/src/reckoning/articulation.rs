use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Wraps an angle into [0, 2pi).
pub fn wrap_two_pi(angle: f32) -> f32 {
    let a = angle % TAU;
    if a < 0.0 { a + TAU } else { a }
}

/// Shortest signed angular path from `from` to `to`, in [-pi, pi].
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    let mut d = wrap_two_pi(to) - wrap_two_pi(from);
    if d > PI {
        d -= TAU;
    } else if d < -PI {
        d += TAU;
    }
    d
}

/// One articulation stop: the orientation a smoothing segment starts from
/// (or, for the newest stop, the commanded target), plus the rate used when
/// no further target exists.
#[derive(Debug, Clone)]
pub struct DofStop {
    /// Heading/pitch/roll in radians.
    pub start: Vec3,
    /// Radians per second, applied only in pure-prediction mode.
    pub rate: Vec3,
    pub elapsed: f32,
}

/// Articulation timeline for one named DOF node, an ordered sequence of
/// stops: index 0 is the active segment start, index 1 its target. Older
/// stops are stale and get pruned, so at most two stops are ever live.
#[derive(Debug, Clone)]
pub struct DofChain {
    node: String,
    stops: VecDeque<DofStop>,
}

impl DofChain {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            stops: VecDeque::new(),
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Appends a network-supplied articulation target.
    pub fn push_target(&mut self, hpr: Vec3, rate: Vec3) {
        self.stops.push_back(DofStop {
            start: hpr,
            rate,
            elapsed: 0.0,
        });
    }

    /// Advances the chain by `dt` seconds and returns the orientation to
    /// apply to the node; `None` only for an empty chain. `actual` is the
    /// node's current orientation; on segment handoff it is snapshotted as
    /// the next segment's start so mid-flight corrections are preserved,
    /// and the node is still driven with that snapshot on the handoff tick.
    pub fn advance(&mut self, dt: f32, window: f32, actual: Option<Vec3>) -> Option<Vec3> {
        // Only the newest two stops are live; anything older is stale.
        while self.stops.len() > 2 {
            self.stops.pop_front();
        }
        let head = self.stops.front_mut()?;
        head.elapsed = (head.elapsed + dt).max(0.0);
        let elapsed = head.elapsed;

        if self.stops.len() >= 2 {
            if elapsed >= window || window <= 0.0 {
                let start = actual.unwrap_or(self.stops[1].start);
                let next = &mut self.stops[1];
                next.start = start;
                next.elapsed = 0.0;
                self.stops.pop_front();
                return Some(start);
            }
            let ratio = elapsed / window;
            let from = self.stops[0].start;
            let to = self.stops[1].start;
            Some(Vec3::new(
                interpolate_wrapped(from.x, to.x, ratio),
                interpolate_wrapped(from.y, to.y, ratio),
                interpolate_wrapped(from.z, to.z, ratio),
            ))
        } else {
            // No further target: unconstrained prediction, no shortest-path
            // wrapping of the delta.
            let stop = &self.stops[0];
            Some(Vec3::new(
                wrap_two_pi(stop.start.x + stop.rate.x * elapsed),
                wrap_two_pi(stop.start.y + stop.rate.y * elapsed),
                wrap_two_pi(stop.start.z + stop.rate.z * elapsed),
            ))
        }
    }
}

fn interpolate_wrapped(from: f32, to: f32, ratio: f32) -> f32 {
    wrap_two_pi(wrap_two_pi(from) + shortest_delta(from, to) * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_into_range() {
        assert!((wrap_two_pi(-0.1) - (TAU - 0.1)).abs() < 1e-6);
        assert!((wrap_two_pi(TAU + 0.25) - 0.25).abs() < 1e-6);
        assert_eq!(wrap_two_pi(0.0), 0.0);
    }

    #[test]
    fn shortest_path_across_zero() {
        // 359 degrees to 1 degree is a +2 degree move, not -358.
        let from = 359.0_f32.to_radians();
        let to = 1.0_f32.to_radians();
        let d = shortest_delta(from, to);
        assert!((d - 2.0_f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn interpolation_takes_short_way_around() {
        let mut chain = DofChain::new("turret");
        chain.push_target(Vec3::new(359.0_f32.to_radians(), 0.0, 0.0), Vec3::ZERO);
        chain.push_target(Vec3::new(1.0_f32.to_radians(), 0.0, 0.0), Vec3::ZERO);

        let out = chain.advance(0.5, 1.0, None).unwrap();
        // Halfway: 359 + 1 = wrapped 0 degrees.
        assert!(out.x < 0.01 || out.x > TAU - 0.01, "heading {}", out.x);
    }

    #[test]
    fn four_stops_collapse_to_two() {
        let mut chain = DofChain::new("turret");
        for i in 0..4 {
            chain.push_target(Vec3::new(0.1 * i as f32, 0.0, 0.0), Vec3::ZERO);
        }
        assert_eq!(chain.len(), 4);
        // One tick past the smoothing window: prune to two, then hand off.
        chain.advance(1.5, 1.0, None);
        assert!(chain.len() <= 2, "len {}", chain.len());
    }

    #[test]
    fn handoff_snapshots_actual_orientation() {
        let mut chain = DofChain::new("turret");
        chain.push_target(Vec3::new(0.0, 0.0, 0.0), Vec3::ZERO);
        chain.push_target(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);

        let actual = Vec3::new(0.9, 0.0, 0.0);
        let out = chain.advance(1.0, 1.0, Some(actual)).unwrap();
        assert!((out.x - 0.9).abs() < 1e-6);
        assert_eq!(chain.len(), 1);
        // The surviving stop starts where the node actually was.
        let out = chain.advance(0.0, 1.0, None).unwrap();
        assert!((out.x - 0.9).abs() < 1e-6);
    }

    #[test]
    fn node_is_driven_on_every_tick_of_a_live_chain() {
        let mut chain = DofChain::new("turret");
        chain.push_target(Vec3::new(0.0, 0.0, 0.0), Vec3::ZERO);
        chain.push_target(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        chain.push_target(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);

        // Across two full smoothing windows, including both handoff ticks,
        // every advance of a non-empty chain yields an orientation.
        let mut t = 0.0_f32;
        while t < 2.5 {
            assert!(chain.advance(0.25, 1.0, None).is_some(), "no output at t={t}");
            t += 0.25;
        }
    }

    #[test]
    fn pure_prediction_extrapolates_by_rate() {
        let mut chain = DofChain::new("radar");
        chain.push_target(Vec3::new(0.2, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

        let out = chain.advance(0.5, 1.0, None).unwrap();
        assert!((out.x - 0.7).abs() < 1e-6);

        // Keeps wrapping into [0, 2pi) as it spins.
        let out = chain.advance(TAU, 1.0, None).unwrap();
        assert!((0.0..TAU).contains(&out.x));
        assert!((out.x - wrap_two_pi(0.2 + 0.5 + TAU)).abs() < 1e-4);
    }
}
