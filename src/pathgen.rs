// Copyright (c) 2026 rezky_nightky

use std::f32::consts::{FRAC_PI_2, TAU};

use rand::{
    distr::{Distribution, Uniform},
    Rng,
};
use rand_distr::Normal;

use crate::geometry::{Domain, Point};
use crate::settings::{ConfigError, SimConfig, Style};

/// Hard cap on leader walk iterations.
pub const MAX_LEADER_STEPS: usize = 1000;
/// Leader vertices at each end that never host a branch root.
pub const BRANCH_ROOT_MARGIN: usize = 3;

const KINK_CHANCE: f64 = 0.12;
const TAPER_SIGMA: f32 = 0.55;
// Keeps every tapered step descending.
const MAX_STEP_ANGLE: f32 = FRAC_PI_2 - 0.35;

/// Point positions plus parallel per-point values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudField {
    pub positions: Vec<Point>,
    pub intensities: Vec<f32>,
    /// Drift amplitude per point, zero for styles without formation jitter.
    pub drift: Vec<Point>,
    pub drift_phase: Vec<f32>,
}

impl CloudField {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// All geometry for one animation cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationData {
    pub cloud: CloudField,
    pub leader: Vec<Point>,
    pub branches: Vec<Vec<Point>>,
    pub strokes: Vec<Vec<Point>>,
}

/// Gaussian blob in fractions of the domain.
#[derive(Clone, Copy, Debug)]
struct Cluster {
    center: (f32, f32),
    spread: (f32, f32),
    weight: f32,
}

const CLASSIC_CLUSTERS: [Cluster; 1] = [Cluster {
    center: (0.5, 0.8),
    spread: (0.2, 0.1),
    weight: 1.0,
}];

const STORM_CLUSTERS: [Cluster; 3] = [
    Cluster {
        center: (0.3, 0.8),
        spread: (0.1, 0.045),
        weight: 0.3,
    },
    Cluster {
        center: (0.5, 0.86),
        spread: (0.12, 0.055),
        weight: 0.4,
    },
    Cluster {
        center: (0.7, 0.8),
        spread: (0.1, 0.045),
        weight: 0.3,
    },
];

fn normal(name: &'static str, mean: f32, std_dev: f32) -> Result<Normal<f32>, ConfigError> {
    Normal::new(mean, std_dev).map_err(|e| ConfigError::Distribution {
        name,
        reason: e.to_string(),
    })
}

fn uniform(name: &'static str, low: f32, high: f32) -> Result<Uniform<f32>, ConfigError> {
    Uniform::new(low, high).map_err(|e| ConfigError::Distribution {
        name,
        reason: e.to_string(),
    })
}

/// Produces the random geometry for a cycle from an injected rng.
#[derive(Clone, Debug)]
pub struct PathGenerator {
    style: Style,
    domain: Domain,
    origin: Point,
    cloud_count: usize,
    branch_count: usize,
    stroke_count: usize,

    unit_normal: Normal<f32>,
    intensity: Uniform<f32>,
    drift: Normal<f32>,
    drift_phase: Uniform<f32>,

    step_len: Uniform<f32>,
    zigzag_dx: Normal<f32>,
    kink_angle: Uniform<f32>,
    kink_len: Uniform<f32>,

    branch_dx: Normal<f32>,
    branch_dy: Normal<f32>,
    branch_angle: Uniform<f32>,
    branch_len: Uniform<f32>,

    stroke_jitter: Normal<f32>,
}

impl PathGenerator {
    pub fn new(cfg: &SimConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let (intensity_low, drift_sd) = match cfg.style {
            Style::Classic => (0.0, 0.0),
            Style::Storm => (0.35, 0.08),
        };
        Ok(Self {
            style: cfg.style,
            domain: cfg.domain,
            origin: cfg.origin,
            cloud_count: cfg.cloud_count,
            branch_count: cfg.branch_count,
            stroke_count: cfg.stroke_count,
            unit_normal: normal("unit", 0.0, 1.0)?,
            intensity: uniform("cloud intensity", intensity_low, 1.0)?,
            drift: normal("cloud drift", 0.0, drift_sd)?,
            drift_phase: uniform("drift phase", 0.0, TAU)?,
            step_len: uniform("leader step", 0.2, 0.5)?,
            zigzag_dx: normal("zigzag dx", 0.0, 0.3)?,
            kink_angle: uniform("kink angle", 0.8, 1.3)?,
            kink_len: uniform("kink length", 0.08, 0.22)?,
            branch_dx: normal("branch dx", 0.0, 0.2)?,
            branch_dy: normal("branch dy", -0.2, 0.2)?,
            branch_angle: uniform("branch angle", 0.35, 1.1)?,
            branch_len: uniform("branch step", 0.15, 0.4)?,
            stroke_jitter: normal("stroke jitter", 0.0, 0.06)?,
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationData {
        let cloud = self.generate_cloud_field(rng);
        let leader = self.generate_leader_path(rng);
        let branches = self.generate_branches(rng, &leader, self.branch_count);
        let strokes = self.generate_secondary_strokes(rng, &leader, self.stroke_count);
        SimulationData {
            cloud,
            leader,
            branches,
            strokes,
        }
    }

    pub fn generate_cloud_field<R: Rng + ?Sized>(&self, rng: &mut R) -> CloudField {
        let clusters: &[Cluster] = match self.style {
            Style::Classic => &CLASSIC_CLUSTERS,
            Style::Storm => &STORM_CLUSTERS,
        };
        let total_weight: f32 = clusters.iter().map(|c| c.weight).sum();

        let n = self.cloud_count;
        let mut field = CloudField {
            positions: Vec::with_capacity(n),
            intensities: Vec::with_capacity(n),
            drift: Vec::with_capacity(n),
            drift_phase: Vec::with_capacity(n),
        };

        for _ in 0..n {
            let mut pick = rng.random::<f32>() * total_weight;
            let mut cluster = clusters[clusters.len() - 1];
            for c in clusters {
                if pick < c.weight {
                    cluster = *c;
                    break;
                }
                pick -= c.weight;
            }

            let center = self.domain.at(cluster.center.0, cluster.center.1);
            let sx = cluster.spread.0 * self.domain.width();
            let sy = cluster.spread.1 * self.domain.height();
            let p = center.offset(
                self.unit_normal.sample(rng) * sx,
                self.unit_normal.sample(rng) * sy,
            );
            field.positions.push(self.domain.clamp(p));
            field.intensities.push(self.intensity.sample(rng));

            match self.style {
                Style::Classic => {
                    field.drift.push(Point::new(0.0, 0.0));
                    field.drift_phase.push(0.0);
                }
                Style::Storm => {
                    field
                        .drift
                        .push(Point::new(self.drift.sample(rng), self.drift.sample(rng)));
                    field.drift_phase.push(self.drift_phase.sample(rng));
                }
            }
        }
        field
    }

    fn bound(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.domain.x_min, self.domain.x_max),
            p.y.clamp(self.domain.floor(), self.domain.y_max),
        )
    }

    pub fn generate_leader_path<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Point> {
        let floor = self.domain.floor();
        let span = (self.origin.y - floor).max(f32::EPSILON);
        let mut cur = self.origin;
        let mut vertices = vec![cur];

        for _ in 0..MAX_LEADER_STEPS {
            if cur.y <= floor {
                return vertices;
            }
            match self.style {
                Style::Classic => {
                    let dx = self.zigzag_dx.sample(rng);
                    let dy = -self.step_len.sample(rng);
                    cur = self.bound(cur.offset(dx, dy));
                }
                Style::Storm => {
                    if rng.random_bool(KINK_CHANCE) {
                        let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                        let a = side * self.kink_angle.sample(rng);
                        let len = self.kink_len.sample(rng);
                        cur = self.bound(cur.offset(len * a.sin(), -len * a.cos()));
                        vertices.push(cur);
                        if cur.y <= floor {
                            return vertices;
                        }
                    }
                    let progress = ((self.origin.y - cur.y) / span).clamp(0.0, 1.0);
                    let sigma = TAPER_SIGMA * (1.0 - 0.5 * progress);
                    let a = (self.unit_normal.sample(rng) * sigma)
                        .clamp(-MAX_STEP_ANGLE, MAX_STEP_ANGLE);
                    let len = self.step_len.sample(rng);
                    cur = self.bound(cur.offset(len * a.sin(), -len * a.cos()));
                }
            }
            vertices.push(cur);
        }

        if cur.y > floor {
            log::warn!(
                "leader walk hit the {} step cap at y={:.3}",
                MAX_LEADER_STEPS,
                cur.y
            );
        }
        vertices
    }

    fn branch_root<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
        let (lo, hi) = if len > 2 * BRANCH_ROOT_MARGIN + 1 {
            (BRANCH_ROOT_MARGIN, len - BRANCH_ROOT_MARGIN)
        } else if len > 2 {
            (1, len - 1)
        } else {
            (0, len)
        };
        rng.random_range(lo..hi)
    }

    pub fn generate_branches<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        leader: &[Point],
        count: usize,
    ) -> Vec<Vec<Point>> {
        if leader.is_empty() {
            return Vec::new();
        }

        let mut branches = Vec::with_capacity(count);
        for _ in 0..count {
            let root = leader[Self::branch_root(rng, leader.len())];
            let mut cur = root;
            let mut path = vec![root];

            match self.style {
                Style::Classic => {
                    let segments = rng.random_range(3..8);
                    for _ in 0..segments {
                        let dx = self.branch_dx.sample(rng);
                        let dy = self.branch_dy.sample(rng);
                        cur = self.domain.clamp(cur.offset(dx, dy));
                        path.push(cur);
                    }
                }
                Style::Storm => {
                    let segments = rng.random_range(3..=10);
                    let mut side: f32 = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    for _ in 0..segments {
                        if cur.x > root.x {
                            side = 1.0;
                        } else if cur.x < root.x {
                            side = -1.0;
                        }
                        let a = side * self.branch_angle.sample(rng);
                        let len = self.branch_len.sample(rng);
                        cur = self.domain.clamp(cur.offset(len * a.sin(), -len * a.cos()));
                        path.push(cur);
                    }
                }
            }
            branches.push(path);
        }
        branches
    }

    pub fn generate_secondary_strokes<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        leader: &[Point],
        count: usize,
    ) -> Vec<Vec<Point>> {
        if leader.len() < 2 {
            return Vec::new();
        }

        (0..count)
            .map(|_| {
                let start = rng.random_range(0..leader.len() - 1);
                let end = rng.random_range(start + 1..leader.len());
                leader[start..=end]
                    .iter()
                    .map(|p| {
                        let dx = self.stroke_jitter.sample(rng);
                        let dy = self.stroke_jitter.sample(rng);
                        self.domain.clamp(p.offset(dx, dy))
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn generator(style: Style) -> PathGenerator {
        PathGenerator::new(&SimConfig::new(style, 0)).expect("valid config")
    }

    #[test]
    fn leader_starts_at_origin_and_reaches_floor() {
        for style in [Style::Classic, Style::Storm] {
            let g = generator(style);
            for seed in 0..64 {
                let mut rng = StdRng::seed_from_u64(seed);
                let leader = g.generate_leader_path(&mut rng);
                assert_eq!(leader[0], g.origin);
                assert!(leader.len() >= 2);
                assert!(leader.len() <= 2 * MAX_LEADER_STEPS + 1);
                let last = leader[leader.len() - 1];
                assert!(last.y <= g.domain.floor() + 1e-6, "seed {seed}: {last:?}");
            }
        }
    }

    #[test]
    fn leader_walk_stops_at_the_step_cap() {
        for style in [Style::Classic, Style::Storm] {
            let mut cfg = SimConfig::new(style, 0);
            cfg.domain = Domain {
                x_min: 0.0,
                x_max: 10.0,
                y_min: 0.0,
                y_max: 1.0e6,
            };
            cfg.origin = Point::new(5.0, 9.0e5);
            let g = PathGenerator::new(&cfg).expect("valid config");
            let mut rng = StdRng::seed_from_u64(2);

            let leader = g.generate_leader_path(&mut rng);
            match style {
                Style::Classic => assert_eq!(leader.len(), MAX_LEADER_STEPS + 1),
                Style::Storm => {
                    assert!(leader.len() > MAX_LEADER_STEPS);
                    assert!(leader.len() <= 2 * MAX_LEADER_STEPS + 1);
                }
            }
            assert_eq!(leader[0], cfg.origin);
            let last = leader[leader.len() - 1];
            assert!(last.y > cfg.domain.floor(), "{last:?}");

            let data = g.generate(&mut rng);
            assert_eq!(data.branches.len(), cfg.branch_count);
            assert_eq!(data.strokes.len(), cfg.stroke_count);
            assert!(data.branches.iter().all(|b| b.len() >= 4));
            assert!(data.strokes.iter().all(|s| s.len() >= 2));
        }
    }

    #[test]
    fn leader_stays_inside_horizontal_bounds() {
        let g = generator(Style::Storm);
        let d = g.domain;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            for p in g.generate_leader_path(&mut rng) {
                assert!(p.x >= d.x_min && p.x <= d.x_max);
                assert!(p.y >= d.floor());
            }
        }
    }

    #[test]
    fn tapered_leader_descends_every_main_step() {
        let g = generator(Style::Storm);
        let mut rng = StdRng::seed_from_u64(11);
        let leader = g.generate_leader_path(&mut rng);
        let first = leader[0].y;
        let last = leader[leader.len() - 1].y;
        assert!(last < first);
        assert!(leader.windows(2).all(|w| w[1].y <= w[0].y));
    }

    #[test]
    fn cloud_field_has_parallel_arrays_in_range() {
        for style in [Style::Classic, Style::Storm] {
            let g = generator(style);
            let mut rng = StdRng::seed_from_u64(3);
            let cloud = g.generate_cloud_field(&mut rng);
            assert_eq!(cloud.len(), style.default_cloud_count());
            assert!(!cloud.is_empty());
            assert_eq!(cloud.intensities.len(), cloud.len());
            assert_eq!(cloud.drift.len(), cloud.len());
            assert_eq!(cloud.drift_phase.len(), cloud.len());
            assert!(cloud.intensities.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(cloud.positions.iter().all(|p| g.domain.contains(*p)));
        }
    }

    #[test]
    fn storm_cloud_sits_in_the_upper_domain() {
        let g = generator(Style::Storm);
        let mut rng = StdRng::seed_from_u64(5);
        let cloud = g.generate_cloud_field(&mut rng);
        let mean_y: f32 = cloud.positions.iter().map(|p| p.y).sum::<f32>() / cloud.len() as f32;
        assert!(mean_y > 7.0, "mean y {mean_y}");
    }

    #[test]
    fn branches_root_on_interior_leader_vertices() {
        for style in [Style::Classic, Style::Storm] {
            let g = generator(style);
            let mut rng = StdRng::seed_from_u64(21);
            let leader = g.generate_leader_path(&mut rng);
            let interior = &leader[BRANCH_ROOT_MARGIN..leader.len() - BRANCH_ROOT_MARGIN];
            let branches = g.generate_branches(&mut rng, &leader, 12);
            assert_eq!(branches.len(), 12);
            for b in &branches {
                assert!(interior.contains(&b[0]));
                let segments = b.len() - 1;
                assert!((3..=10).contains(&segments), "{segments} segments");
            }
        }
    }

    #[test]
    fn storm_branches_diverge_from_their_root() {
        let g = generator(Style::Storm);
        let mut rng = StdRng::seed_from_u64(8);
        let leader = g.generate_leader_path(&mut rng);
        for b in g.generate_branches(&mut rng, &leader, 8) {
            let root = b[0];
            let side = (b[1].x - root.x).signum();
            for p in &b[1..] {
                if p.x != root.x && p.x > 0.0 && p.x < 10.0 {
                    assert_eq!((p.x - root.x).signum(), side);
                }
            }
        }
    }

    #[test]
    fn short_leader_still_gets_branches() {
        let g = generator(Style::Classic);
        let mut rng = StdRng::seed_from_u64(1);
        let leader = vec![Point::new(5.0, 8.0), Point::new(5.1, 0.0)];
        let branches = g.generate_branches(&mut rng, &leader, 3);
        assert_eq!(branches.len(), 3);
        assert!(g.generate_branches(&mut rng, &[], 3).is_empty());
    }

    #[test]
    fn secondary_strokes_follow_a_leader_sub_range() {
        let g = generator(Style::Storm);
        let mut rng = StdRng::seed_from_u64(13);
        let leader = g.generate_leader_path(&mut rng);
        let strokes = g.generate_secondary_strokes(&mut rng, &leader, 4);
        assert_eq!(strokes.len(), 4);
        for s in &strokes {
            assert!(s.len() >= 2 && s.len() <= leader.len());
            let near = leader
                .iter()
                .any(|p| (p.x - s[0].x).abs() < 0.5 && (p.y - s[0].y).abs() < 0.5);
            assert!(near);
        }
        assert!(g
            .generate_secondary_strokes(&mut rng, &leader[..1], 4)
            .is_empty());
    }

    #[test]
    fn same_seed_same_geometry() {
        let g = generator(Style::Storm);
        let a = g.generate(&mut StdRng::seed_from_u64(99));
        let b = g.generate(&mut StdRng::seed_from_u64(99));
        let c = g.generate(&mut StdRng::seed_from_u64(100));
        assert_eq!(a, b);
        assert_ne!(a.leader, c.leader);
    }
}
