#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Pattern Loom.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use pattern_loom_core::{Key, KeyPress};
use pattern_loom_rendering::{
    render_scene, Color, DisplaySurface, FrameInput, Presentation, Rectangle, RenderingBackend,
    Scene,
};
use std::{
    ops::ControlFlow,
    time::{Duration, Instant},
};
use tracing::info;

/// Keys polled every frame, in the order their presses are reported.
const POLLED_KEYS: [(Key, KeyCode); 10] = [
    (Key::Escape, KeyCode::Escape),
    (Key::Up, KeyCode::Up),
    (Key::Down, KeyCode::Down),
    (Key::Left, KeyCode::Left),
    (Key::Right, KeyCode::Right),
    (Key::R, KeyCode::R),
    (Key::G, KeyCode::G),
    (Key::B, KeyCode::B),
    (Key::Space, KeyCode::Space),
    (Key::Enter, KeyCode::Enter),
];

/// Snapshot of the keyboard observed during a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyboardObservations {
    /// Edge-triggered presses, indexed like [`POLLED_KEYS`].
    pressed: [bool; POLLED_KEYS.len()],
    /// Either control key is held.
    control_down: bool,
}

impl KeyboardObservations {
    fn poll() -> Self {
        let mut pressed = [false; POLLED_KEYS.len()];
        for (slot, (_, code)) in pressed.iter_mut().zip(POLLED_KEYS) {
            *slot = is_key_pressed(code);
        }
        if is_key_pressed(KeyCode::KpEnter) {
            pressed[POLLED_KEYS.len() - 1] = true;
        }

        Self {
            pressed,
            control_down: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl),
        }
    }
}

/// Converts one frame's observations into key presses.
///
/// Macroquad 0.3 only reports which keys went down during the frame, not the
/// order they went down in, so simultaneous presses follow [`POLLED_KEYS`].
fn gather_frame_input(keyboard: KeyboardObservations) -> FrameInput {
    let key_presses = POLLED_KEYS
        .iter()
        .zip(keyboard.pressed)
        .filter(|(_, pressed)| *pressed)
        .map(|((key, _), _)| KeyPress {
            key: *key,
            control: keyboard.control_down,
        })
        .collect();

    FrameInput { key_presses }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Creates a backend that uses the platform's default presentation settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or present frames as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Accumulates frame timings and reports their averages once per second.
#[derive(Debug, Default)]
struct FrameTimer {
    elapsed: Duration,
    frames: u32,
    simulation: Duration,
    render: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameReport {
    fps: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FrameTimer {
    fn sample(
        &mut self,
        frame: Duration,
        simulation: Duration,
        render: Duration,
    ) -> Option<FrameReport> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation += simulation;
        self.render += render;

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let Self {
            elapsed,
            frames,
            simulation,
            render,
        } = std::mem::take(self);
        Some(FrameReport {
            fps: frames as f32 / elapsed.as_secs_f32(),
            avg_simulation: simulation / frames,
            avg_render: render / frames,
        })
    }
}

/// Display surface that forwards draw calls to macroquad's shape and text API.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadSurface;

impl DisplaySurface for MacroquadSurface {
    fn draw_rectangle(&mut self, rectangle: Rectangle) {
        let Rectangle {
            origin,
            size,
            fill,
            outline,
        } = rectangle;
        if let Some(fill) = fill {
            macroquad::shapes::draw_rectangle(
                origin.x,
                origin.y,
                size.x,
                size.y,
                to_macroquad_color(fill),
            );
        }
        if let Some(outline) = outline {
            macroquad::shapes::draw_rectangle_lines(
                origin.x,
                origin.y,
                size.x,
                size.y,
                outline.thickness,
                to_macroquad_color(outline.color),
            );
        }
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        macroquad::shapes::draw_circle(center.x, center.y, radius, to_macroquad_color(color));
    }

    fn draw_line(&mut self, start: Vec2, end: Vec2, thickness: f32, color: Color) {
        macroquad::shapes::draw_line(
            start.x,
            start.y,
            end.x,
            end.y,
            thickness,
            to_macroquad_color(color),
        );
    }

    fn draw_text(&mut self, text: &str, position: Vec2, size: f32, color: Color) {
        let _ = macroquad::text::draw_text(
            text,
            position.x,
            position.y,
            size,
            to_macroquad_color(color),
        );
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> ControlFlow<()> + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            layout,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 800,
            window_height: 600,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut surface = MacroquadSurface;
            let background = to_macroquad_color(clear_color);
            let mut timer = FrameTimer::default();

            loop {
                let frame_input = gather_frame_input(KeyboardObservations::poll());
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                let simulation_start = Instant::now();
                if update_scene(frame_dt, frame_input, &mut scene).is_break() {
                    break;
                }
                let simulation = simulation_start.elapsed();

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                render_scene(&scene, &layout, &mut surface);
                let render = render_start.elapsed();

                let report = timer.sample(frame_dt, simulation, render);
                if let (true, Some(report)) = (show_fps, report) {
                    info!(
                        fps = %format_args!("{:.2}", report.fps),
                        sim_ms = report.avg_simulation.as_secs_f64() * 1_000.0,
                        render_ms = report.avg_render.as_secs_f64() * 1_000.0,
                        "frame timing"
                    );
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(keys: &[Key], control_down: bool) -> KeyboardObservations {
        let mut pressed = [false; POLLED_KEYS.len()];
        for (slot, (key, _)) in pressed.iter_mut().zip(POLLED_KEYS) {
            *slot = keys.contains(&key);
        }
        KeyboardObservations {
            pressed,
            control_down,
        }
    }

    #[test]
    fn idle_keyboard_produces_no_presses() {
        let input = gather_frame_input(KeyboardObservations::default());

        assert!(input.key_presses.is_empty());
    }

    #[test]
    fn presses_are_reported_in_polling_order() {
        let input = gather_frame_input(observe(&[Key::Enter, Key::Left, Key::G], false));

        assert_eq!(
            input.key_presses,
            vec![
                KeyPress::plain(Key::Left),
                KeyPress::plain(Key::G),
                KeyPress::plain(Key::Enter),
            ]
        );
    }

    #[test]
    fn held_control_modifies_every_press() {
        let input = gather_frame_input(observe(&[Key::R], true));

        assert_eq!(input.key_presses, vec![KeyPress::with_control(Key::R)]);
    }

    #[test]
    fn same_frame_presses_ignore_observation_order() {
        let forward = gather_frame_input(observe(&[Key::R, Key::Enter], false));
        let backward = gather_frame_input(observe(&[Key::Enter, Key::R], false));

        assert_eq!(forward, backward);
        assert_eq!(
            forward.key_presses,
            vec![KeyPress::plain(Key::R), KeyPress::plain(Key::Enter)]
        );
    }

    #[test]
    fn escape_is_reported_first() {
        let input = gather_frame_input(observe(&[Key::Space, Key::Escape], false));

        assert_eq!(input.key_presses[0], KeyPress::plain(Key::Escape));
    }

    #[test]
    fn colors_convert_channel_for_channel() {
        let converted = to_macroquad_color(Color::new(0.1, 0.2, 0.3, 0.4));

        assert_eq!(
            (converted.r, converted.g, converted.b, converted.a),
            (0.1, 0.2, 0.3, 0.4)
        );
    }

    #[test]
    fn frame_timer_stays_quiet_until_a_second_has_passed() {
        let mut timer = FrameTimer::default();
        let quarter = Duration::from_millis(250);

        for _ in 0..3 {
            assert!(timer.sample(quarter, Duration::ZERO, Duration::ZERO).is_none());
        }
        let report = timer
            .sample(quarter, Duration::ZERO, Duration::ZERO)
            .expect("one second elapsed");
        assert!((report.fps - 4.0).abs() <= 1e-3);

        assert!(timer.sample(quarter, Duration::ZERO, Duration::ZERO).is_none());
    }

    #[test]
    fn frame_timer_averages_stage_durations() {
        let mut timer = FrameTimer::default();
        let half = Duration::from_millis(500);

        let _ = timer.sample(half, Duration::from_millis(1), Duration::from_millis(4));
        let report = timer
            .sample(half, Duration::from_millis(3), Duration::from_millis(8))
            .expect("one second elapsed");

        assert_eq!(report.avg_simulation, Duration::from_millis(2));
        assert_eq!(report.avg_render, Duration::from_millis(6));
    }

    #[test]
    fn frame_timer_starts_over_after_each_report() {
        let mut timer = FrameTimer::default();

        let first = timer
            .sample(Duration::from_secs(2), Duration::ZERO, Duration::ZERO)
            .expect("long frame reports at once");
        assert!((first.fps - 0.5).abs() <= 1e-3);

        for _ in 0..9 {
            assert!(timer
                .sample(Duration::from_millis(100), Duration::ZERO, Duration::ZERO)
                .is_none());
        }
        let second = timer
            .sample(Duration::from_millis(100), Duration::ZERO, Duration::ZERO)
            .expect("one second elapsed");
        assert!((second.fps - 10.0).abs() <= 1e-3);
    }
}
