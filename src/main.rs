// Copyright (c) 2026 rezky_nightky

mod config;
mod frame;
mod geometry;
mod glyphs;
mod palette;
mod pathgen;
mod phase;
mod scene;
mod scheduler;
mod settings;
mod terminal;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, keys_usage_for_help, parse_colormode,
    print_list_charsets, Args,
};
use crate::frame::Frame;
use crate::glyphs::glyphs_from_str;
use crate::palette::ColorMode;
use crate::scene::Scene;
use crate::scheduler::Simulation;
use crate::settings::SpeedControl;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_u32_range(name: &str, v: u32, min: u32, max: u32) -> u32 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn default_to_ascii() -> bool {
    let lang = env::var("LANG").unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }
    if term.starts_with("linux") || term.starts_with("vt") {
        return ColorMode::Color16;
    }

    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        Some(m) => parse_colormode(m).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        }),
        None => detect_color_mode_auto(),
    }
}

fn status_line(sim: &Simulation) -> String {
    let pos = sim.schedule().locate(sim.frame());
    format!(
        " {:>4}/{}  {:<16} {:>3}%  speed {:>2}  {:<7} {} #{} seed {}   space play/pause  r reset  +/- speed  q quit",
        sim.frame(),
        sim.last_frame(),
        pos.phase.label(),
        (pos.progress * 100.0).round() as u32,
        sim.speed(),
        if sim.is_playing() { "playing" } else { "paused" },
        sim.style().label(),
        sim.generation(),
        sim.seed(),
    )
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    cmd = cmd.after_help(keys_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_charsets {
        print_list_charsets();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", auto.label());
        if args.colormode.is_some() {
            println!("  forced: {}", effective.label());
        }
        println!("  effective: {}", effective.label());
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let color_mode = detect_color_mode(&args);
    let speed_range = SpeedControl::default();
    require_u32_range("--speed", args.speed, speed_range.min, speed_range.max);

    let duration_s = args.duration.map(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        if s > 0.0 {
            return require_f64_range("--duration", s, 0.1, 86400.0);
        }
        s
    });

    let glyphs = match glyphs_from_str(&args.charset, default_to_ascii()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let sim_config = match args.sim_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to apply settings: {}", e);
            std::process::exit(1);
        }
    };
    let mut sim = match Simulation::new(sim_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to apply settings: {}", e);
            std::process::exit(1);
        }
    };

    let scene = Scene::new(
        *sim.palette(),
        glyphs,
        color_mode,
        args.color_bg.is_transparent(),
    );

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;
    let mut frame = Frame::new(w, h, None);

    let start_time = Instant::now();
    let end_time = duration_s.and_then(|s| {
        if s <= 0.0 {
            return None;
        }
        Some(start_time + Duration::from_secs_f64(s))
    });

    let mut running = true;
    let mut next_tick = Instant::now() + sim.delay();
    let mut redraw = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }

                        match (k.code, k.modifiers) {
                            (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => running = false,
                            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                                running = false
                            }
                            (KeyCode::Char(' '), _) => {
                                sim.on_toggle_play();
                                next_tick = Instant::now() + sim.delay();
                                redraw = true;
                            }
                            (KeyCode::Char('r'), _) => {
                                sim.on_reset();
                                next_tick = Instant::now() + sim.delay();
                                redraw = true;
                            }
                            (KeyCode::Up, _) | (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
                                sim.on_speed_change(sim.speed().saturating_add(1));
                                redraw = true;
                            }
                            (KeyCode::Down, _) | (KeyCode::Char('-'), _) => {
                                sim.on_speed_change(sim.speed().saturating_sub(1));
                                redraw = true;
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || redraw || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_tick {
                break;
            }

            let mut timeout = next_tick - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            frame = Frame::new(nw, nh, None);
            term.invalidate();
            redraw = true;
        }

        let now = Instant::now();
        if now >= next_tick {
            if sim.is_playing() {
                if sim.is_finished() && !args.once {
                    sim.on_reset();
                } else {
                    sim.advance();
                }
            }
            next_tick += sim.delay();
            if now > next_tick {
                next_tick = now + sim.delay();
            }
            redraw = true;
        }

        if redraw {
            let status = (!args.no_status).then(|| status_line(&sim));
            scene.render(&sim.current(), sim.domain(), status.as_deref(), &mut frame);
            term.draw(&frame)?;
            redraw = false;
        }
    }

    Ok(())
}
