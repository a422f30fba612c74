// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;

use clap::Parser;
use rand::Rng;

use crate::palette::ColorMode;
use crate::phase::PhaseSchedule;
use crate::settings::{
    ConfigError, SimConfig, Style, DEFAULT_BRANCH_COUNT, DEFAULT_PHASE_FRAMES, DEFAULT_SPEED,
};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  thunderhead --style storm --speed 10 --phase-frames 60 --branches 5 --color-bg black --charset auto";

pub const KEYS_USAGE: &str = "KEYS:\n  space   play / pause\n  r       regenerate and restart\n  + / Up  faster\n  - / Down  slower\n  q / Esc quit";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_block(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("  thunderhead") {
            out.push_str("  \x1b[1;34mthunderhead\x1b[0m");
            out.push_str(rest);
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_block(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

pub fn keys_usage_for_help() -> String {
    let block = format!("\n{}", KEYS_USAGE);
    if color_enabled_stdout() {
        colorize_help_block(&block)
    } else {
        block
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
    #[value(name = "transparent")]
    Transparent,
}

impl ColorBg {
    pub fn is_transparent(self) -> bool {
        matches!(self, ColorBg::DefaultBackground | ColorBg::Transparent)
    }
}

/// Maps a `--colormode` value to a color depth.
pub fn parse_colormode(m: u16) -> Result<ColorMode, String> {
    match m {
        0 => Ok(ColorMode::Mono),
        16 => Ok(ColorMode::Color16),
        8 | 256 => Ok(ColorMode::Color256),
        24 | 32 => Ok(ColorMode::TrueColor),
        _ => Err(format!(
            "invalid --colormode: {} (allowed: 0,16,8/256,24/32)",
            m
        )),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "thunderhead",
    about = "Lightning formation animation for the terminal",
    version,
    disable_version_flag = true
)]
pub struct Args {
    #[arg(
        long = "style",
        default_value_t = Style::Storm,
        value_enum,
        help_heading = "SIMULATION",
        help = "Generation profile: classic (single cloud, zigzag leader) or storm"
    )]
    pub style: Style,

    #[arg(
        long = "seed",
        help_heading = "SIMULATION",
        help = "RNG seed for a reproducible storm (default: random)"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "phase-frames",
        default_value_t = DEFAULT_PHASE_FRAMES,
        help_heading = "SIMULATION",
        help = "Frames per phase (min 1)"
    )]
    pub phase_frames: u32,

    #[arg(
        long = "clouds",
        help_heading = "SIMULATION",
        help = "Cloud point count (min 1; default 100 classic, 160 storm)"
    )]
    pub clouds: Option<usize>,

    #[arg(
        long = "branches",
        default_value_t = DEFAULT_BRANCH_COUNT,
        help_heading = "SIMULATION",
        help = "Branch count (0 disables branches)"
    )]
    pub branches: usize,

    #[arg(
        long = "strokes",
        help_heading = "SIMULATION",
        help = "Secondary stroke count (default 0 classic, 3 storm)"
    )]
    pub strokes: Option<usize>,

    #[arg(
        short = 'S',
        long = "speed",
        default_value_t = DEFAULT_SPEED,
        help_heading = "PLAYBACK",
        help = "Initial speed (min 1 max 20)"
    )]
    pub speed: u32,

    #[arg(
        long = "paused",
        help_heading = "PLAYBACK",
        help = "Start paused on the first frame"
    )]
    pub paused: bool,

    #[arg(
        long = "once",
        help_heading = "PLAYBACK",
        help = "Hold the faded last frame instead of starting a new strike"
    )]
    pub once: bool,

    #[arg(
        long = "duration",
        help_heading = "PLAYBACK",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "PLAYBACK",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background, transparent)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "charset",
        default_value = "auto",
        help_heading = "APPEARANCE",
        help = "Glyph set (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "no-status",
        help_heading = "APPEARANCE",
        help = "Hide the status line"
    )]
    pub no_status: bool,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available glyph sets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

impl Args {
    /// Builds and validates the simulation settings these flags describe.
    pub fn sim_config(&self) -> Result<SimConfig, ConfigError> {
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut cfg = SimConfig::new(self.style, seed);
        cfg.schedule = PhaseSchedule::uniform(self.phase_frames);
        if let Some(n) = self.clouds {
            cfg.cloud_count = n;
        }
        cfg.branch_count = self.branches;
        if let Some(n) = self.strokes {
            cfg.stroke_count = n;
        }
        cfg.initial_speed = self.speed;
        cfg.start_paused = self.paused;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn print_list_charsets() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE CHARSETS:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --charset.\x1b[0m");
    } else {
        println!("AVAILABLE CHARSETS:");
        println!("NOTE: Use only the VALUE (left side) with --charset.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("auto         ascii when LANG is not UTF-8, otherwise unicode");
    println!("ascii        . : o O @ clouds, | - / \\ channels");
    println!("unicode      Dot clouds and thin box-drawing channels (aliases: utf8, utf-8)");
    println!("blocks       Shade-block clouds and heavy box-drawing channels");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("thunderhead").chain(argv.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn defaults_build_a_storm_config() {
        let cfg = parse(&["--seed", "7"]).sim_config().expect("valid config");
        assert_eq!(cfg.style, Style::Storm);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.cloud_count, Style::Storm.default_cloud_count());
        assert_eq!(cfg.stroke_count, 3);
        assert_eq!(cfg.schedule.last_frame(), 300);
        assert_eq!(cfg.initial_speed, DEFAULT_SPEED);
        assert!(!cfg.start_paused);
    }

    #[test]
    fn overrides_reach_the_config() {
        let args = parse(&[
            "--style",
            "classic",
            "--seed",
            "1",
            "--phase-frames",
            "10",
            "--clouds",
            "40",
            "--branches",
            "0",
            "--strokes",
            "2",
            "-S",
            "20",
            "--paused",
        ]);
        let cfg = args.sim_config().expect("valid config");
        assert_eq!(cfg.style, Style::Classic);
        assert_eq!(cfg.schedule.last_frame(), 50);
        assert_eq!(cfg.cloud_count, 40);
        assert_eq!(cfg.branch_count, 0);
        assert_eq!(cfg.stroke_count, 2);
        assert_eq!(cfg.initial_speed, 20);
        assert!(cfg.start_paused);
    }

    #[test]
    fn invalid_values_surface_config_errors() {
        let zero_clouds = parse(&["--clouds", "0"]).sim_config();
        assert_eq!(zero_clouds, Err(ConfigError::EmptyCloud));

        let zero_frames = parse(&["--phase-frames", "0"]).sim_config();
        assert!(matches!(zero_frames, Err(ConfigError::EmptyPhase(_))));
    }

    #[test]
    fn unknown_style_is_a_parse_error() {
        assert!(Args::try_parse_from(["thunderhead", "--style", "drizzle"]).is_err());
    }

    #[test]
    fn colormode_accepts_aliases() {
        assert_eq!(parse_colormode(0), Ok(ColorMode::Mono));
        assert_eq!(parse_colormode(16), Ok(ColorMode::Color16));
        assert_eq!(parse_colormode(256), Ok(ColorMode::Color256));
        assert_eq!(parse_colormode(32), Ok(ColorMode::TrueColor));
        assert!(parse_colormode(12).is_err());
    }

    #[test]
    fn transparent_backgrounds() {
        assert!(!ColorBg::Black.is_transparent());
        assert!(ColorBg::Transparent.is_transparent());
        assert!(ColorBg::DefaultBackground.is_transparent());
    }
}
