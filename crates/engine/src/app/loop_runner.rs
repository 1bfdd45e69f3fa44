use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::sim::session::LOGIC_TICKS_PER_SECOND;
use crate::{resolve_app_paths, StartupError};

use super::assets::AssetStore;
use super::input::HeldKey;
use super::metrics::MetricsAccumulator;
use super::persistence::SaveStore;
use super::runtime::{log_persistence_outcome, GameRuntime, RuntimeOptions, WorldFactory};
use super::view::{SCREEN_HEIGHT_PX, SCREEN_WIDTH_PX};
use super::{InputSnapshot, LoopMetricsSnapshot, Renderer};

pub const MIN_RENDER_FPS: u32 = 5;
pub const MAX_RENDER_FPS: u32 = 240;
const RENDER_FPS_STEP: u32 = 5;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub render_fps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub death_restart_delay: Duration,
    pub save_file_name: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Tilequest".to_string(),
            window_width: SCREEN_WIDTH_PX,
            window_height: SCREEN_HEIGHT_PX,
            target_tps: LOGIC_TICKS_PER_SECOND,
            render_fps: 30,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 40,
            metrics_log_interval: Duration::from_secs(1),
            death_restart_delay: Duration::from_secs(5),
            save_file_name: "rpg-save-file.sav".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, factory: Box<dyn WorldFactory>) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        sprites_dir = %app_paths.sprites_dir.display(),
        saves_dir = %app_paths.saves_dir.display(),
        "startup"
    );

    let store = SaveStore::new(app_paths.saves_dir.clone());
    let options = RuntimeOptions {
        save_file_name: config.save_file_name.clone(),
        death_restart_delay: config.death_restart_delay,
    };
    let (mut runtime, assets) =
        match AssetStore::load_manifest(&app_paths.sprites_dir, factory.asset_manifest()) {
            Ok(assets) => {
                let seed = session_seed();
                (GameRuntime::start(factory, store, options, seed), assets)
            }
            Err(load_error) => {
                error!(error = %load_error, "asset_load_failed");
                let message = load_error.to_string();
                (
                    GameRuntime::failed(factory, store, options, message),
                    AssetStore::empty(),
                )
            }
        };

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), SCREEN_WIDTH_PX, SCREEN_HEIGHT_PX)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let mut render_clock = RenderClock::new(config.render_fps);
    let mut input_collector = InputCollector::default();

    info!(
        target_tps,
        render_fps = render_clock.fps(),
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, Instant::now());
    // Shows the configured rates until the first interval closes.
    let mut latest_metrics = LoopMetricsSnapshot {
        fps: render_clock.fps() as f32,
        tps: target_tps as f32,
    };
    let window_for_loop = Arc::clone(&window);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::Focused(false) => {
                        input_collector.release_all();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                    }
                    WindowEvent::RedrawRequested => {
                        let edges = input_collector.take_frame_edges();
                        if edges.pause {
                            runtime.toggle_pause();
                        }
                        if edges.save {
                            log_persistence_outcome("save", runtime.save());
                        }
                        if edges.load {
                            log_persistence_outcome("load", runtime.load());
                        }
                        if edges.fps_steps != 0 {
                            let fps = render_clock.change_fps(edges.fps_steps);
                            info!(render_fps = fps, "render_fps_changed");
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        if runtime.is_running() {
                            let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                            accumulator = accumulator.saturating_add(clamped_frame_dt);

                            let step_plan =
                                plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                            for _ in 0..step_plan.ticks_to_run {
                                let input_snapshot = input_collector.snapshot_for_tick();
                                if runtime.tick(&input_snapshot) {
                                    metrics_accumulator.record_tick();
                                }
                            }
                            accumulator = step_plan.remaining_accumulator;

                            if step_plan.dropped_backlog > Duration::ZERO {
                                warn!(
                                    dropped_backlog_ms =
                                        step_plan.dropped_backlog.as_millis() as u64,
                                    max_ticks_per_frame,
                                    "sim_clamp_triggered"
                                );
                            }
                        } else {
                            accumulator = Duration::ZERO;
                        }
                        runtime.update_death_clock(now);

                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep = compute_cap_sleep(
                            elapsed_since_last_present,
                            Some(render_clock.frame_target()),
                        );
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        let fps_label = latest_metrics.fps_label();
                        if let Err(error) = renderer
                            .render_with(&assets, |surface| runtime.draw(surface, &fps_label))
                        {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();
                        metrics_accumulator.record_frame();

                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            latest_metrics = snapshot;
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                paused = runtime.is_paused(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Seed for session-stable picks; differs between runs.
fn session_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Frame-level requests gathered since the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FrameEdges {
    pause: bool,
    save: bool,
    load: bool,
    fps_steps: i32,
}

#[derive(Debug, Default)]
struct InputCollector {
    held: HeldKey,
    pause_key_is_down: bool,
    save_key_is_down: bool,
    load_key_is_down: bool,
    faster_key_is_down: bool,
    slower_key_is_down: bool,
    pending: FrameEdges,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if let PhysicalKey::Code(code) = key_event.physical_key {
            self.handle_key(code, key_event.state);
        }
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => self.held.press(code),
            ElementState::Released => self.held.release(code),
        }

        match code {
            KeyCode::KeyP => {
                if press_edge(&mut self.pause_key_is_down, state) {
                    self.pending.pause = true;
                }
            }
            KeyCode::KeyW => {
                if press_edge(&mut self.save_key_is_down, state) {
                    self.pending.save = true;
                }
            }
            KeyCode::KeyX => {
                if press_edge(&mut self.load_key_is_down, state) {
                    self.pending.load = true;
                }
            }
            KeyCode::Equal | KeyCode::NumpadAdd => {
                if press_edge(&mut self.faster_key_is_down, state) {
                    self.pending.fps_steps = self.pending.fps_steps.saturating_add(1);
                }
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                if press_edge(&mut self.slower_key_is_down, state) {
                    self.pending.fps_steps = self.pending.fps_steps.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    fn release_all(&mut self) {
        self.held.clear();
        self.pause_key_is_down = false;
        self.save_key_is_down = false;
        self.load_key_is_down = false;
        self.faster_key_is_down = false;
        self.slower_key_is_down = false;
    }

    fn snapshot_for_tick(&self) -> InputSnapshot {
        InputSnapshot::new(self.held.action())
    }

    fn take_frame_edges(&mut self) -> FrameEdges {
        std::mem::take(&mut self.pending)
    }
}

/// Tracks a key's down state and reports whether this event is a fresh press.
fn press_edge(is_down: &mut bool, state: ElementState) -> bool {
    match state {
        ElementState::Pressed => {
            let fresh = !*is_down;
            *is_down = true;
            fresh
        }
        ElementState::Released => {
            *is_down = false;
            false
        }
    }
}

/// Render rate, adjustable while running.
#[derive(Debug, Clone, Copy)]
struct RenderClock {
    fps: u32,
}

impl RenderClock {
    fn new(fps: u32) -> Self {
        let mut clock = Self { fps: MIN_RENDER_FPS };
        clock.set_fps(fps);
        clock
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn set_fps(&mut self, fps: u32) -> u32 {
        self.fps = fps.clamp(MIN_RENDER_FPS, MAX_RENDER_FPS);
        self.fps
    }

    fn change_fps(&mut self, steps: i32) -> u32 {
        let delta = steps.unsigned_abs().saturating_mul(RENDER_FPS_STEP);
        let next = if steps >= 0 {
            self.fps.saturating_add(delta)
        } else {
            self.fps.saturating_sub(delta)
        };
        self.set_fps(next)
    }

    fn frame_target(&self) -> Duration {
        target_frame_duration(self.fps)
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn target_frame_duration(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InputAction;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(8);
        let result = plan_sim_steps(Duration::from_millis(36), fixed_dt, 40);

        assert_eq!(result.ticks_to_run, 4);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(4));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn default_frame_delta_fits_within_tick_cap() {
        let config = LoopConfig::default();
        let fixed_dt = Duration::from_secs_f64(1.0 / config.target_tps as f64);
        let plan = plan_sim_steps(config.max_frame_delta, fixed_dt, config.max_ticks_per_frame);

        assert_eq!(plan.dropped_backlog, Duration::ZERO);
        assert_eq!(plan.ticks_to_run, 32);
    }

    #[test]
    fn pause_press_is_edge_triggered_for_single_frame() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::KeyP, ElementState::Pressed);

        let first = input.take_frame_edges();
        let second = input.take_frame_edges();

        assert!(first.pause);
        assert!(!second.pause);
    }

    #[test]
    fn held_save_load_do_not_retrigger_without_release() {
        let mut input = InputCollector::default();

        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.take_frame_edges().save);
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(!input.take_frame_edges().save);
        input.handle_key(KeyCode::KeyW, ElementState::Released);
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.take_frame_edges().save);

        input.handle_key(KeyCode::KeyX, ElementState::Pressed);
        assert!(input.take_frame_edges().load);
        input.handle_key(KeyCode::KeyX, ElementState::Pressed);
        assert!(!input.take_frame_edges().load);
    }

    #[test]
    fn fps_keys_accumulate_steps_per_frame() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::Equal, ElementState::Pressed);
        input.handle_key(KeyCode::Equal, ElementState::Released);
        input.handle_key(KeyCode::Equal, ElementState::Pressed);
        input.handle_key(KeyCode::Minus, ElementState::Pressed);

        assert_eq!(input.take_frame_edges().fps_steps, 1);
        assert_eq!(input.take_frame_edges().fps_steps, 0);
    }

    #[test]
    fn gameplay_key_is_held_across_ticks_until_released() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::ArrowLeft, ElementState::Pressed);

        assert_eq!(input.snapshot_for_tick().held(), Some(InputAction::MoveLeft));
        assert_eq!(input.snapshot_for_tick().held(), Some(InputAction::MoveLeft));

        input.handle_key(KeyCode::ArrowLeft, ElementState::Released);
        assert_eq!(input.snapshot_for_tick().held(), None);
    }

    #[test]
    fn frame_keys_do_not_become_held_commands() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::KeyP, ElementState::Pressed);

        assert_eq!(input.snapshot_for_tick().held(), None);
    }

    #[test]
    fn focus_loss_releases_held_key() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::KeyZ, ElementState::Pressed);
        input.handle_key(KeyCode::KeyP, ElementState::Pressed);
        input.take_frame_edges();

        input.release_all();

        assert_eq!(input.snapshot_for_tick().held(), None);
        input.handle_key(KeyCode::KeyP, ElementState::Pressed);
        assert!(input.take_frame_edges().pause);
    }

    #[test]
    fn render_clock_clamps_and_steps() {
        let mut clock = RenderClock::new(30);
        assert_eq!(clock.change_fps(2), 40);
        assert_eq!(clock.change_fps(-100), MIN_RENDER_FPS);
        assert_eq!(clock.set_fps(10_000), MAX_RENDER_FPS);
        assert_eq!(RenderClock::new(0).fps(), MIN_RENDER_FPS);
    }

    #[test]
    fn target_frame_duration_for_30hz_is_expected() {
        let duration = target_frame_duration(30);
        assert!((duration.as_secs_f64() - (1.0 / 30.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(40), Some(target_frame_duration(30)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), Some(target_frame_duration(30)));
        assert!(sleep > Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::ZERO, None), Duration::ZERO);
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }
}
