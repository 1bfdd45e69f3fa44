mod assets;
mod input;
mod loop_runner;
mod metrics;
mod persistence;
mod rendering;
mod runtime;
mod view;

pub use assets::{AssetError, AssetStore, Sprite, PLACEHOLDER_IMAGE_ID};
pub use input::{action_for_key, InputAction, InputSnapshot};
pub use loop_runner::{
    run_app, AppError, LoopConfig, MAX_RENDER_FPS, MIN_RENDER_FPS,
};
pub use metrics::LoopMetricsSnapshot;
pub use persistence::{PersistenceError, SaveStore, SAVE_FILE_EXTENSION};
pub use rendering::{PixelSurface, Renderer};
pub use runtime::{GameRuntime, RuntimeError, RuntimeOptions, WorldFactory};
pub use view::{
    draw_death, draw_error, draw_session, player_render_id, split_for_width, DrawRequest,
    FrameInfo, Rgba, Surface, TextSize, SCREEN_HEIGHT_PX, SCREEN_WIDTH_PX,
};
