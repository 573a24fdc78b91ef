use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::Parser;
use log::{info, warn};
use raylib::prelude::*;

mod constants;
mod event_log;
mod mapper;
mod poller;
mod sequence;
mod slider;
mod state;
mod texture_loader;
mod uplink;

use crate::constants::*;
use crate::event_log::LogSource;
use crate::poller::Poller;
use crate::sequence::MediaSequence;
use crate::slider::Slider;
use crate::state::{AppState, Mode};
use crate::texture_loader::{
    is_image_file, load_sorted_image_paths, load_texture_with_exif_rotation, placeholder_textures,
    sort_image_paths,
};

#[derive(Parser)]
#[command(name = "morphlab", about = "Slider-driven image crossfade with an autonomous uplink mode")]
struct Args {
    /// Directory of images forming the morph sequence (defaults to generated placeholders)
    images: Option<PathBuf>,

    /// Shortest autonomous poll delay in milliseconds
    #[arg(long, default_value_t = MIN_POLL_INTERVAL_MS)]
    min_interval: u64,

    /// Longest autonomous poll delay in milliseconds
    #[arg(long, default_value_t = MAX_POLL_INTERVAL_MS)]
    max_interval: u64,

    /// Start in manual mode (no autonomous polling until toggled)
    #[arg(long)]
    start_manual: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.min_interval > args.max_interval {
        bail!(
            "--min-interval ({}) must not exceed --max-interval ({})",
            args.min_interval,
            args.max_interval
        );
    }

    let (mut rl, thread) = raylib::init()
        .size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .title("Morph Lab")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    // --- Initial Sequence ---
    let textures = match &args.images {
        Some(dir) => {
            let paths = load_sorted_image_paths(dir)?;
            let mut textures = Vec::new();
            for path in &paths {
                match load_texture_with_exif_rotation(&mut rl, &thread, path) {
                    Ok(texture) => textures.push(texture),
                    Err(e) => warn!("skipping {}: {e:#}", path.display()),
                }
            }
            if textures.is_empty() {
                bail!("none of the images in {} could be loaded", dir.display());
            }
            textures
        }
        None => placeholder_textures(&mut rl, &thread)?,
    };
    info!("sequence ready with {} images", textures.len());
    let mut sequence = MediaSequence::new(textures);

    // --- Engine State ---
    let mut state = AppState::new();
    state.push_log(LogSource::System, "System initialized. Morph engine online.", None);

    let source = uplink::source_from_env()?;
    state.push_log(LogSource::System, format!("Value source: {}.", source.describe()), None);

    let (tx, rx) = mpsc::channel();
    let mut rng = rand::rng();
    let mut poller = Poller::new(
        Duration::from_millis(args.min_interval),
        Duration::from_millis(args.max_interval),
    );
    if args.start_manual {
        state.set_mode(Mode::Manual);
        state.push_log(LogSource::System, "Starting in manual mode.", None);
    } else {
        poller.start(Instant::now());
    }

    let mut slider = Slider::new(Rectangle::new(
        60.0,
        (WINDOW_HEIGHT - 220) as f32,
        (WINDOW_WIDTH - 120) as f32,
        24.0,
    ));

    // --- Main Loop ---
    while !rl.window_should_close() {
        let sw = rl.get_screen_width();
        let sh = rl.get_screen_height();
        slider.set_track(Rectangle::new(60.0, (sh - 220) as f32, (sw - 120) as f32, 24.0));

        // 1. Mode toggle
        if rl.is_key_pressed(KeyboardKey::KEY_SPACE) {
            match state.mode() {
                Mode::Autonomous => {
                    state.set_mode(Mode::Manual);
                    poller.stop();
                    state.push_log(
                        LogSource::System,
                        "Autonomous Control Override: Manual Mode Engaged.",
                        None,
                    );
                }
                Mode::Manual => {
                    state.set_mode(Mode::Autonomous);
                    state.push_log(LogSource::System, "Autonomous mode re-engaged.", None);
                    // Immediate tick, not a stale delay
                    poller.start(Instant::now());
                }
            }
        }

        // 2. Manual slider input
        if let Some(value) = slider.update(&rl) {
            if state.mode() == Mode::Autonomous {
                state.set_mode(Mode::Manual);
                poller.stop();
                state.push_log(
                    LogSource::User,
                    "Manual adjustment detected. Autonomous mode disengaged.",
                    None,
                );
            }
            state.set_value(value);
        }

        // 3. Sequence ingestion via file drop
        if rl.is_file_dropped() {
            let mut paths: Vec<PathBuf> = {
                let dropped = rl.load_dropped_files();
                dropped.paths().iter().map(|p| PathBuf::from(p.to_string())).collect()
            };
            paths.retain(|p| is_image_file(p));
            sort_image_paths(&mut paths);

            let mut textures = Vec::new();
            for path in &paths {
                match load_texture_with_exif_rotation(&mut rl, &thread, path) {
                    Ok(texture) => textures.push(texture),
                    Err(e) => warn!("skipping dropped file {}: {e:#}", path.display()),
                }
            }
            let count = textures.len();
            if sequence.replace(textures) {
                state.push_log(
                    LogSource::User,
                    format!("Custom sequence loaded ({count} images)."),
                    None,
                );
            } else {
                state.push_log(
                    LogSource::System,
                    "Sequence replacement needs at least 2 images; keeping current sequence.",
                    None,
                );
            }
        }

        // 4. Restore the default sequence
        if rl.is_key_pressed(KeyboardKey::KEY_R) && sequence.is_custom() {
            sequence.reset(placeholder_textures(&mut rl, &thread)?);
            state.push_log(LogSource::User, "Custom sequence cleared; defaults restored.", None);
        }

        // 5. Drive the polling loop
        let now = Instant::now();
        if poller.tick_due(now) && poller.begin_tick(&mut state, now) {
            uplink::dispatch(Arc::clone(&source), tx.clone());
        }
        while let Ok(outcome) = rx.try_recv() {
            poller.complete_tick(&mut state, outcome.result, Instant::now(), &mut rng);
        }

        // 6. Render
        let blend = mapper::map(state.value(), sequence.len());

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::BLACK);

        let viewport = Rectangle::new(40.0, 64.0, (sw - 80) as f32, (sh - 340) as f32);
        d.draw_rectangle_lines_ex(
            Rectangle::new(viewport.x - 2.0, viewport.y - 2.0, viewport.width + 4.0, viewport.height + 4.0),
            1.0,
            Color::DARKGREEN,
        );

        if sequence.is_empty() {
            d.draw_text(
                "NO_DATA_AVAILABLE",
                (sw / 2 - 110) as i32,
                (sh / 2) as i32,
                20,
                Color::RED,
            );
        } else {
            if let Some(texture) = sequence.get(blend.index_low) {
                draw_contained(&mut d, texture, viewport, Color::WHITE);
            }
            if blend.index_high != blend.index_low {
                if let Some(texture) = sequence.get(blend.index_high) {
                    let alpha = (blend.weight * 255.0).round() as u8;
                    draw_contained(&mut d, texture, viewport, Color::new(255, 255, 255, alpha));
                }
            }
        }

        // HUD: mode, value, blend sources
        let (mode_text, mode_color) = match state.mode() {
            Mode::Autonomous => ("AUTONOMOUS // LIVE", Color::LIME),
            Mode::Manual => ("MANUAL OVERRIDE // OFFLINE", Color::GRAY),
        };
        d.draw_text(mode_text, 40, 24, 20, mode_color);
        d.draw_text(&format!("INTENSITY {:.2}", state.value()), sw - 240, 24, 20, Color::WHITE);
        d.draw_text(
            &format!(
                "SOURCE_A: IMG_{:03}   SOURCE_B: IMG_{:03}   MIX: {:.1}%",
                blend.index_low,
                blend.index_high,
                blend.weight * 100.0
            ),
            40,
            sh - 260,
            10,
            Color::GREEN,
        );

        slider.draw(&mut d, state.value());

        // Event log tail
        let tail = state.log().tail(LOG_TAIL);
        for (i, entry) in tail.iter().enumerate() {
            let line = format!("[{}] {:<8} {}", entry.timestamp, entry.source, entry.message);
            d.draw_text(&line, 40, sh - 170 + i as i32 * 22, 10, Color::LIGHTGRAY);
        }

        d.draw_text(
            "SPACE toggle mode  |  drag slider  |  drop >=2 images  |  R reset sequence",
            40,
            sh - 40,
            10,
            Color::DARKGRAY,
        );
    }

    Ok(())
}

/// Draw a texture letterboxed inside `bounds`, preserving aspect ratio.
fn draw_contained(d: &mut impl RaylibDraw, texture: &Texture2D, bounds: Rectangle, tint: Color) {
    let tex_w = texture.width() as f32;
    let tex_h = texture.height() as f32;
    let scale = (bounds.width / tex_w).min(bounds.height / tex_h);
    let dest_w = tex_w * scale;
    let dest_h = tex_h * scale;
    let dest = Rectangle::new(
        bounds.x + (bounds.width - dest_w) / 2.0,
        bounds.y + (bounds.height - dest_h) / 2.0,
        dest_w,
        dest_h,
    );

    d.draw_texture_pro(
        texture,
        Rectangle::new(0.0, 0.0, tex_w, tex_h),
        dest,
        Vector2::new(0.0, 0.0),
        0.0,
        tint,
    );
}
