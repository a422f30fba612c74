// Copyright (c) 2026 rezky_nightky

use std::f32::consts::TAU;
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};

use crate::geometry::{Domain, Point};
use crate::palette::{Palette, Rgb};
use crate::pathgen::{CloudField, PathGenerator, SimulationData};
use crate::phase::{Phase, PhasePos, PhaseSchedule};
use crate::settings::{ConfigError, SimConfig, Style};

const LEADER_OPACITY: f32 = 0.6;
const BRANCH_OPACITY: f32 = 0.4;
const SECONDARY_OPACITY: f32 = 0.6;

/// Share of a phase over which staggered reveals are spread.
const STAGGER_SPAN: f32 = 0.5;
const DRIFT_RATE: f32 = 0.15;
const PULSE_FRAMES: f32 = 24.0;
const FLASH_FRAMES: f32 = 8.0;
const CLOUD_FLASH_LIFT: f32 = 0.6;

/// A polyline prefix with its opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trace<'a> {
    pub points: &'a [Point],
    pub opacity: f32,
}

impl<'a> Trace<'a> {
    fn prefix(path: &'a [Point], revealed: usize, opacity: f32) -> Self {
        Self {
            points: &path[..revealed.min(path.len())],
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    fn full(path: &'a [Point], opacity: f32) -> Self {
        Self::prefix(path, path.len(), opacity)
    }

    fn hidden(path: &'a [Point]) -> Self {
        Self::prefix(path, 0, 0.0)
    }

    #[allow(dead_code)]
    pub fn revealed(&self) -> usize {
        self.points.len()
    }

    pub fn is_visible(&self) -> bool {
        self.points.len() >= 2 && self.opacity > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudDot {
    pub pos: Point,
    pub intensity: f32,
}

/// Everything the render surface needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState<'a> {
    pub frame: u32,
    pub phase: Phase,
    pub progress: f32,
    pub cloud: Vec<CloudDot>,
    pub leader: Trace<'a>,
    pub branches: Vec<Trace<'a>>,
    pub stroke: Trace<'a>,
    pub secondary: Vec<Trace<'a>>,
    /// Flash level in `[0, 1]`; zero outside the return stroke.
    pub flash: f32,
    pub background: Rgb,
}

struct TickContext<'a> {
    style: Style,
    domain: Domain,
    schedule: PhaseSchedule,
    palette: Palette,
    data: &'a SimulationData,
    pos: PhasePos,
}

type PhaseHandler = for<'a> fn(&TickContext<'a>) -> VisualState<'a>;

const HANDLERS: [PhaseHandler; 5] = [
    formation,
    charge_separation,
    leader_formation,
    return_stroke,
    fade_out,
];

fn revealed(len: usize, progress: f32) -> usize {
    ((len as f32 * progress.clamp(0.0, 1.0)).floor() as usize).min(len)
}

/// Progress of the `i`th of `n` staggered items at phase progress `p`.
fn staggered(p: f32, i: usize, n: usize) -> f32 {
    if n == 0 {
        return p;
    }
    let delay = STAGGER_SPAN * i as f32 / n as f32;
    ((p - delay) / (1.0 - delay)).clamp(0.0, 1.0)
}

/// Intensity multiplier during charge separation.
fn charge_factor(style: Style, progress: f32, elapsed: u32) -> f32 {
    let factor = match style {
        Style::Classic => 1.0 - progress,
        Style::Storm => {
            let pulse = 0.55 + 0.45 * (TAU * elapsed as f32 / PULSE_FRAMES).cos();
            pulse * (1.0 - 0.5 * progress)
        }
    };
    factor.clamp(0.0, 1.0)
}

fn flash_level(style: Style, elapsed: u32) -> f32 {
    match style {
        Style::Classic => {
            if elapsed % 2 == 0 {
                1.0
            } else {
                0.0
            }
        }
        Style::Storm => 0.5 * (1.0 + (TAU * elapsed as f32 / FLASH_FRAMES).cos()),
    }
}

fn cloud_dots(
    cloud: &CloudField,
    domain: Domain,
    visible: usize,
    drift_frame: u32,
    scale: f32,
    lift: f32,
) -> Vec<CloudDot> {
    let t = DRIFT_RATE * drift_frame as f32;
    (0..visible.min(cloud.len()))
        .map(|i| {
            let wave = (t + cloud.drift_phase[i]).sin();
            let d = cloud.drift[i];
            let level = (cloud.intensities[i] * scale).clamp(0.0, 1.0);
            CloudDot {
                pos: domain.clamp(cloud.positions[i].offset(d.x * wave, d.y * wave)),
                intensity: (level + (1.0 - level) * lift).clamp(0.0, 1.0),
            }
        })
        .collect()
}

impl<'a> TickContext<'a> {
    /// Cloud as left by the end of charge separation.
    fn settled_cloud(&self, lift: f32) -> Vec<CloudDot> {
        let charge = self.schedule.length(Phase::ChargeSeparation);
        let scale = charge_factor(self.style, 1.0, charge);
        cloud_dots(
            &self.data.cloud,
            self.domain,
            self.data.cloud.len(),
            self.schedule.end(Phase::ChargeSeparation),
            scale,
            lift,
        )
    }

    fn state(
        &self,
        cloud: Vec<CloudDot>,
        leader: Trace<'a>,
        branches: Vec<Trace<'a>>,
        stroke: Trace<'a>,
        secondary: Vec<Trace<'a>>,
        flash: f32,
    ) -> VisualState<'a> {
        let flash = flash.clamp(0.0, 1.0);
        VisualState {
            frame: self.pos.frame,
            phase: self.pos.phase,
            progress: self.pos.progress,
            cloud,
            leader,
            branches,
            stroke,
            secondary,
            flash,
            background: self.palette.background(flash),
        }
    }

    fn hidden_strokes(&self) -> (Trace<'a>, Vec<Trace<'a>>) {
        (
            Trace::hidden(&self.data.leader),
            self.data.strokes.iter().map(|s| Trace::hidden(s)).collect(),
        )
    }
}

fn formation<'a>(ctx: &TickContext<'a>) -> VisualState<'a> {
    let visible = revealed(ctx.data.cloud.len(), ctx.pos.progress);
    let cloud = cloud_dots(
        &ctx.data.cloud,
        ctx.domain,
        visible,
        ctx.pos.frame,
        1.0,
        0.0,
    );
    let branches = ctx.data.branches.iter().map(|b| Trace::hidden(b)).collect();
    let (stroke, secondary) = ctx.hidden_strokes();
    ctx.state(
        cloud,
        Trace::hidden(&ctx.data.leader),
        branches,
        stroke,
        secondary,
        0.0,
    )
}

fn charge_separation<'a>(ctx: &TickContext<'a>) -> VisualState<'a> {
    let scale = charge_factor(ctx.style, ctx.pos.progress, ctx.pos.elapsed);
    let cloud = cloud_dots(
        &ctx.data.cloud,
        ctx.domain,
        ctx.data.cloud.len(),
        ctx.pos.frame,
        scale,
        0.0,
    );
    let branches = ctx.data.branches.iter().map(|b| Trace::hidden(b)).collect();
    let (stroke, secondary) = ctx.hidden_strokes();
    ctx.state(
        cloud,
        Trace::hidden(&ctx.data.leader),
        branches,
        stroke,
        secondary,
        0.0,
    )
}

fn leader_formation<'a>(ctx: &TickContext<'a>) -> VisualState<'a> {
    let p = ctx.pos.progress;
    let leader = Trace::prefix(
        &ctx.data.leader,
        revealed(ctx.data.leader.len(), p),
        LEADER_OPACITY,
    );

    let n = ctx.data.branches.len();
    let branches = ctx
        .data
        .branches
        .iter()
        .enumerate()
        .map(|(i, b)| match ctx.style {
            Style::Classic => Trace::prefix(b, revealed(b.len(), p), BRANCH_OPACITY),
            Style::Storm => {
                let local = staggered(p, i, n);
                Trace::prefix(b, revealed(b.len(), local), BRANCH_OPACITY * local)
            }
        })
        .collect();

    let (stroke, secondary) = ctx.hidden_strokes();
    ctx.state(ctx.settled_cloud(0.0), leader, branches, stroke, secondary, 0.0)
}

fn return_stroke<'a>(ctx: &TickContext<'a>) -> VisualState<'a> {
    let p = ctx.pos.progress;
    let flash = flash_level(ctx.style, ctx.pos.elapsed);

    let n = ctx.data.strokes.len();
    let secondary = ctx
        .data
        .strokes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let local = staggered(p, i, n);
            Trace::prefix(s, revealed(s.len(), local), SECONDARY_OPACITY * local)
        })
        .collect();

    let lift = match ctx.style {
        Style::Classic => 0.0,
        Style::Storm => CLOUD_FLASH_LIFT * flash,
    };

    ctx.state(
        ctx.settled_cloud(lift),
        Trace::full(&ctx.data.leader, LEADER_OPACITY),
        ctx.data
            .branches
            .iter()
            .map(|b| Trace::full(b, BRANCH_OPACITY))
            .collect(),
        Trace::full(&ctx.data.leader, p),
        secondary,
        flash,
    )
}

fn fade_out<'a>(ctx: &TickContext<'a>) -> VisualState<'a> {
    let alpha = (1.0 - ctx.pos.progress).clamp(0.0, 1.0);
    ctx.state(
        ctx.settled_cloud(0.0),
        Trace::full(&ctx.data.leader, LEADER_OPACITY * alpha),
        ctx.data
            .branches
            .iter()
            .map(|b| Trace::full(b, BRANCH_OPACITY * alpha))
            .collect(),
        Trace::full(&ctx.data.leader, alpha),
        ctx.data
            .strokes
            .iter()
            .map(|s| Trace::full(s, SECONDARY_OPACITY * alpha))
            .collect(),
        0.0,
    )
}

/// Owns the generated geometry and the animation clock.
pub struct Simulation {
    config: SimConfig,
    generator: PathGenerator,
    palette: Palette,
    rng: StdRng,
    data: SimulationData,
    frame: u32,
    playing: bool,
    speed: u32,
    delay: Duration,
    generation: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let generator = PathGenerator::new(&config)?;
        let speed = config.speed.clamp(config.initial_speed);
        let mut sim = Self {
            palette: Palette::for_style(config.style),
            rng: StdRng::seed_from_u64(config.seed),
            data: SimulationData::default(),
            frame: 0,
            playing: !config.start_paused,
            speed,
            delay: config.speed.delay_for(speed),
            generation: 0,
            generator,
            config,
        };
        sim.on_reset();
        Ok(sim)
    }

    /// Regenerates all geometry and rewinds to frame 0.
    pub fn on_reset(&mut self) {
        self.data = self.generator.generate(&mut self.rng);
        self.frame = 0;
        self.generation += 1;
        log::info!(
            "generation {} (seed {}, {}): {} cloud points, leader {} vertices, {} branches, {} strokes",
            self.generation,
            self.config.seed,
            self.config.style.label(),
            self.data.cloud.len(),
            self.data.leader.len(),
            self.data.branches.len(),
            self.data.strokes.len()
        );
    }

    /// Visual state for `frame`. Does not touch the simulation.
    pub fn on_tick(&self, frame: u32) -> VisualState<'_> {
        let ctx = TickContext {
            style: self.config.style,
            domain: self.config.domain,
            schedule: self.config.schedule,
            palette: self.palette,
            data: &self.data,
            pos: self.config.schedule.locate(frame),
        };
        HANDLERS[ctx.pos.phase.index()](&ctx)
    }

    pub fn on_speed_change(&mut self, value: u32) -> Duration {
        self.speed = self.config.speed.clamp(value);
        self.delay = self.config.speed.delay_for(self.speed);
        log::debug!("speed {} -> delay {:?}", self.speed, self.delay);
        self.delay
    }

    pub fn on_toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        log::debug!("{}", if self.playing { "playing" } else { "paused" });
        self.playing
    }

    /// Steps the frame counter when playing; holds at the last frame.
    pub fn advance(&mut self) -> u32 {
        if !self.playing {
            return self.frame;
        }
        let last = self.config.schedule.last_frame();
        let before = self.phase();
        self.frame = self.frame.saturating_add(1).min(last);
        let after = self.phase();
        if before != after {
            log::debug!("frame {}: {} -> {}", self.frame, before.label(), after.label());
        }
        self.frame
    }

    pub fn current(&self) -> VisualState<'_> {
        self.on_tick(self.frame)
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.config.schedule.last_frame()
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn last_frame(&self) -> u32 {
        self.config.schedule.last_frame()
    }

    pub fn phase(&self) -> Phase {
        self.config.schedule.phase_of(self.frame)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn style(&self) -> Style {
        self.config.style
    }

    pub fn domain(&self) -> Domain {
        self.config.domain
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[allow(dead_code)]
    pub fn data(&self) -> &SimulationData {
        &self.data
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.config.schedule
    }
}
