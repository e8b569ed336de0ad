//! Fixed-step cloth integration driven by a host clock.
//!
//! The simulator never reads a clock itself: hosts pass "now" as a
//! [`Duration`] since any fixed origin, which keeps the same code usable from
//! a browser animation frame, a native timer thread and deterministic tests.

use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use super::mesh::{ClothMesh, gravity_vector};
use super::point::{LinkCorrection, PointLink, WeightedPoint};
use crate::geom::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Mass-spring cloth with a `Stopped → Running ⇄ Paused` lifecycle.
#[derive(Debug, Clone)]
pub struct ClothSimulator {
    cloth: ClothMesh,
    /// Links grouped so that no two links of a group share a point.
    colours: Vec<Vec<PointLink>>,
    state: ClothState,
    started_at: Option<Duration>,
    last_tick: Option<Duration>,
    elapsed: Duration,
    leftover: Duration,
    steps: u64,
}

impl ClothSimulator {
    pub fn new(cloth: ClothMesh) -> Self {
        let colours = colour_links(cloth.links(), cloth.points().len());
        debug!(
            "cloth simulator: {} links in {} colours",
            cloth.links().len(),
            colours.len()
        );
        Self {
            cloth,
            colours,
            state: ClothState::Stopped,
            started_at: None,
            last_tick: None,
            elapsed: Duration::ZERO,
            leftover: Duration::ZERO,
            steps: 0,
        }
    }

    pub fn cloth(&self) -> &ClothMesh {
        &self.cloth
    }

    /// Anchor edits go through here; topology is fixed.
    pub fn cloth_mut(&mut self) -> &mut ClothMesh {
        &mut self.cloth
    }

    #[must_use]
    pub fn state(&self) -> ClothState {
        self.state
    }

    /// Clock reading of the first `start` since the last `stop`.
    #[must_use]
    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    /// Running time accumulated since the last `stop`.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Fixed steps integrated so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub fn colour_count(&self) -> usize {
        self.colours.len()
    }

    pub fn start(&mut self, now: Duration) {
        if self.state == ClothState::Running {
            return;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.last_tick = Some(now);
        info!("cloth {:?} -> running at {:?}", self.state, now);
        self.state = ClothState::Running;
    }

    /// Stops ticking; elapsed time is kept for the next `start`.
    pub fn pause(&mut self, now: Duration) {
        if self.state != ClothState::Running {
            return;
        }
        if let Some(last) = self.last_tick.take() {
            self.elapsed += now.saturating_sub(last);
        }
        self.state = ClothState::Paused;
        info!("cloth paused after {:?}", self.elapsed);
    }

    /// Stops ticking and resets the clock.
    pub fn stop(&mut self) {
        if self.state != ClothState::Stopped {
            info!("cloth {:?} -> stopped after {:?}", self.state, self.elapsed);
        }
        self.state = ClothState::Stopped;
        self.started_at = None;
        self.last_tick = None;
        self.elapsed = Duration::ZERO;
        self.leftover = Duration::ZERO;
    }

    /// Advances by the wall time since the previous tick. Returns the number
    /// of fixed steps taken; nothing happens unless running.
    pub fn tick(&mut self, now: Duration) -> usize {
        if self.state != ClothState::Running {
            return 0;
        }
        let delta = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_tick = Some(now);
        self.elapsed += delta;
        self.run(delta)
    }

    /// Advances by an explicit `delta` regardless of state.
    pub fn advance(&mut self, delta: Duration) -> usize {
        self.elapsed += delta;
        self.run(delta)
    }

    #[must_use]
    pub fn vertex_snapshot(&self) -> Vec<[f32; 3]> {
        self.cloth.vertex_snapshot()
    }

    fn run(&mut self, delta: Duration) -> usize {
        let params = self.cloth.params();
        let fixed = params.fixed_step.as_nanos();
        let total = delta + self.leftover;
        let due = total.as_nanos() / fixed;
        let steps = usize::try_from(due).map_or(params.max_steps, |due| due.min(params.max_steps));
        // Excess beyond the step cap is dropped; only the sub-step remainder carries.
        self.leftover = Duration::from_nanos(u64::try_from(total.as_nanos() % fixed).unwrap_or(0));
        if steps == 0 {
            return 0;
        }

        let gravity = gravity_vector(params);
        let damping = params.damping;
        let accuracy = params.accuracy;
        let dt = params.fixed_step.as_secs_f64();
        let dt2 = dt * dt;

        apply_gravity(self.cloth.points_mut(), gravity);
        for _ in 0..steps {
            for _ in 0..accuracy {
                for colour in &self.colours {
                    solve_colour(self.cloth.points_mut(), colour);
                }
            }
            apply_gravity(self.cloth.points_mut(), gravity);
            integrate(self.cloth.points_mut(), damping, dt2);
        }
        self.cloth.write_vertices();
        self.steps += steps as u64;
        steps
    }
}

/// Greedy edge colouring: each link takes the smallest colour neither of its
/// endpoints already uses.
pub(crate) fn colour_links(links: &[PointLink], point_count: usize) -> Vec<Vec<PointLink>> {
    let mut used: Vec<Vec<usize>> = vec![Vec::new(); point_count];
    let mut colours: Vec<Vec<PointLink>> = Vec::new();
    for link in links {
        let (a, b) = (link.a as usize, link.b as usize);
        let mut colour = 0;
        while used[a].contains(&colour) || used[b].contains(&colour) {
            colour += 1;
        }
        used[a].push(colour);
        used[b].push(colour);
        if colour == colours.len() {
            colours.push(Vec::new());
        }
        colours[colour].push(*link);
    }
    colours
}

fn solve_colour(points: &mut [WeightedPoint], links: &[PointLink]) {
    for correction in corrections(points, links) {
        correction.apply(points);
    }
}

#[cfg(feature = "parallel")]
fn corrections(points: &[WeightedPoint], links: &[PointLink]) -> Vec<LinkCorrection> {
    links.par_iter().filter_map(|link| link.correction(points)).collect()
}

#[cfg(not(feature = "parallel"))]
fn corrections(points: &[WeightedPoint], links: &[PointLink]) -> Vec<LinkCorrection> {
    links.iter().filter_map(|link| link.correction(points)).collect()
}

#[cfg(feature = "parallel")]
fn apply_gravity(points: &mut [WeightedPoint], gravity: Vec3) {
    points.par_iter_mut().for_each(|p| p.apply_gravity(gravity));
}

#[cfg(not(feature = "parallel"))]
fn apply_gravity(points: &mut [WeightedPoint], gravity: Vec3) {
    points.iter_mut().for_each(|p| p.apply_gravity(gravity));
}

#[cfg(feature = "parallel")]
fn integrate(points: &mut [WeightedPoint], damping: f64, dt2: f64) {
    points.par_iter_mut().for_each(|p| p.integrate(damping, dt2));
}

#[cfg(not(feature = "parallel"))]
fn integrate(points: &mut [WeightedPoint], damping: f64, dt2: f64) {
    points.iter_mut().for_each(|p| p.integrate(damping, dt2));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloth::ClothParams;

    const STEP: Duration = Duration::from_millis(16);

    fn simulator(nx: usize, ny: usize) -> ClothSimulator {
        ClothSimulator::new(ClothMesh::new(ClothParams::new(1.0, 1.0, nx, ny)).unwrap())
    }

    #[test]
    fn colours_never_share_a_point() {
        let sim = simulator(6, 5);
        let total: usize = sim.colours.iter().map(Vec::len).sum();
        assert_eq!(total, sim.cloth().links().len());
        for colour in &sim.colours {
            let mut seen = std::collections::HashSet::new();
            for link in colour {
                assert!(seen.insert(link.a));
                assert!(seen.insert(link.b));
            }
        }
    }

    #[test]
    fn steps_are_capped_and_remainder_carries() {
        let mut sim = simulator(3, 3);
        assert_eq!(sim.advance(Duration::from_millis(50)), 3);
        assert_eq!(sim.advance(Duration::from_millis(14)), 1);
        assert_eq!(sim.advance(Duration::from_secs(1)), 5);
        assert_eq!(sim.advance(Duration::from_millis(8)), 1);
        assert_eq!(sim.advance(Duration::from_millis(5)), 0);
        assert_eq!(sim.steps(), 10);
    }

    #[test]
    fn lifecycle_keeps_elapsed_across_pause() {
        let mut sim = simulator(3, 3);
        assert_eq!(sim.tick(Duration::from_millis(100)), 0);

        sim.start(Duration::ZERO);
        assert_eq!(sim.state(), ClothState::Running);
        assert_eq!(sim.tick(Duration::from_millis(32)), 2);
        sim.pause(Duration::from_millis(40));
        assert_eq!(sim.state(), ClothState::Paused);
        assert_eq!(sim.elapsed(), Duration::from_millis(40));
        assert_eq!(sim.tick(Duration::from_millis(90)), 0);

        sim.start(Duration::from_millis(100));
        assert_eq!(sim.started_at(), Some(Duration::ZERO));
        assert_eq!(sim.tick(Duration::from_millis(116)), 1);
        assert_eq!(sim.elapsed(), Duration::from_millis(56));

        sim.stop();
        assert_eq!(sim.state(), ClothState::Stopped);
        assert_eq!(sim.elapsed(), Duration::ZERO);
        assert_eq!(sim.started_at(), None);
    }

    #[test]
    fn anchored_points_stay_put() {
        let mut sim = simulator(5, 5);
        let before: Vec<Vec3> = sim.cloth().points().iter().map(|p| p.position).collect();
        for _ in 0..50 {
            sim.advance(STEP);
        }
        for (point, start) in sim.cloth().points().iter().zip(&before) {
            if point.anchored {
                assert_eq!(point.position, *start);
            }
        }
        assert!(sim.cloth().points()[12].position.y < before[12].y);
    }

    #[test]
    fn vertex_buffer_follows_points() {
        let mut sim = simulator(4, 4);
        sim.advance(STEP * 3);
        let snapshot = sim.vertex_snapshot();
        for (v, p) in snapshot.iter().zip(sim.cloth().points()) {
            assert!((f64::from(v[1]) - p.position.y).abs() < 1e-5);
        }
    }

    #[test]
    fn pinned_cloth_settles() {
        let params = ClothParams::new(1.0, 1.0, 10, 10).with_stiffness(0.98);
        let mut sim = ClothSimulator::new(ClothMesh::new(params).unwrap());
        for _ in 0..1000 {
            sim.advance(STEP);
        }
        let before: Vec<Vec3> = sim.cloth().points().iter().map(|p| p.position).collect();
        sim.advance(STEP);
        let worst = sim
            .cloth()
            .points()
            .iter()
            .zip(&before)
            .map(|(p, b)| p.position.sub(*b).length())
            .fold(0.0, f64::max);
        assert!(worst < 1e-3, "cloth still moving by {worst}");
        assert!(sim.vertex_snapshot().iter().flatten().all(|c| c.is_finite()));
    }
}
