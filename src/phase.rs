// Copyright (c) 2026 rezky_nightky

use crate::settings::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Formation,
    ChargeSeparation,
    LeaderFormation,
    ReturnStroke,
    FadeOut,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Formation,
        Phase::ChargeSeparation,
        Phase::LeaderFormation,
        Phase::ReturnStroke,
        Phase::FadeOut,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Formation => "formation",
            Phase::ChargeSeparation => "charge separation",
            Phase::LeaderFormation => "leader",
            Phase::ReturnStroke => "return stroke",
            Phase::FadeOut => "fade out",
        }
    }
}

/// Where a frame sits in the schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhasePos {
    pub phase: Phase,
    /// Frame after clamping to the end of the schedule.
    pub frame: u32,
    /// Frames since the phase started.
    pub elapsed: u32,
    /// `elapsed / length`, in `[0, 1]`.
    pub progress: f32,
}

/// Frame lengths of the five phases; boundaries T1..T5 are running sums.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseSchedule {
    lengths: [u32; 5],
}

impl PhaseSchedule {
    pub fn new(lengths: [u32; 5]) -> Self {
        Self { lengths }
    }

    pub fn uniform(len: u32) -> Self {
        Self::new([len; 5])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (phase, &len) in Phase::ALL.iter().zip(self.lengths.iter()) {
            if len == 0 {
                return Err(ConfigError::EmptyPhase(phase.label()));
            }
        }
        Ok(())
    }

    pub fn length(&self, phase: Phase) -> u32 {
        self.lengths[phase.index()]
    }

    /// First frame of `phase`.
    pub fn start(&self, phase: Phase) -> u32 {
        self.lengths[..phase.index()]
            .iter()
            .fold(0u32, |acc, &l| acc.saturating_add(l))
    }

    /// End of `phase` (exclusive, except for the last phase which is held).
    pub fn end(&self, phase: Phase) -> u32 {
        self.start(phase).saturating_add(self.length(phase))
    }

    /// T5: the last frame of the animation.
    pub fn last_frame(&self) -> u32 {
        self.end(Phase::FadeOut)
    }

    pub fn phase_of(&self, frame: u32) -> Phase {
        self.locate(frame).phase
    }

    pub fn locate(&self, frame: u32) -> PhasePos {
        let frame = frame.min(self.last_frame());
        let phase = Phase::ALL
            .iter()
            .copied()
            .find(|&p| frame < self.end(p))
            .unwrap_or(Phase::FadeOut);
        let elapsed = frame - self.start(phase);
        let len = self.length(phase).max(1);
        PhasePos {
            phase,
            frame,
            elapsed,
            progress: (elapsed as f32 / len as f32).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_half_open() {
        let s = PhaseSchedule::uniform(60);
        assert_eq!(s.phase_of(0), Phase::Formation);
        assert_eq!(s.phase_of(59), Phase::Formation);
        assert_eq!(s.phase_of(60), Phase::ChargeSeparation);
        assert_eq!(s.phase_of(120), Phase::LeaderFormation);
        assert_eq!(s.phase_of(180), Phase::ReturnStroke);
        assert_eq!(s.phase_of(239), Phase::ReturnStroke);
        assert_eq!(s.phase_of(240), Phase::FadeOut);
        assert_eq!(s.phase_of(300), Phase::FadeOut);
        assert_eq!(s.last_frame(), 300);
    }

    #[test]
    fn frames_past_the_end_hold_at_last_frame() {
        let s = PhaseSchedule::uniform(50);
        let pos = s.locate(10_000);
        assert_eq!(pos.phase, Phase::FadeOut);
        assert_eq!(pos.frame, 250);
        assert_eq!(pos.progress, 1.0);
    }

    #[test]
    fn progress_restarts_each_phase() {
        let s = PhaseSchedule::new([10, 20, 30, 40, 50]);
        let before = s.locate(s.end(Phase::LeaderFormation) - 1);
        let after = s.locate(s.end(Phase::LeaderFormation));
        assert!(before.progress > 0.9);
        assert_eq!(after.phase, Phase::ReturnStroke);
        assert_eq!(after.progress, 0.0);
    }

    #[test]
    fn zero_length_phase_is_a_config_error() {
        let s = PhaseSchedule::new([10, 0, 10, 10, 10]);
        assert_eq!(
            s.validate(),
            Err(ConfigError::EmptyPhase("charge separation"))
        );
    }
}
