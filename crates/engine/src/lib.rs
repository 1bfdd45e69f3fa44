use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod sim;

pub use app::{
    run_app, AppError, AssetError, AssetStore, DrawRequest, InputAction,
    InputSnapshot, LoopConfig, LoopMetricsSnapshot, PersistenceError, SaveStore,
    Surface, TextSize, WorldFactory,
};
pub use sim::{Command, Session};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub sprites_dir: PathBuf,
    pub saves_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/."
    )]
    RootNotFound { start_dir: PathBuf },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let exe_dir = exe
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
    let root = find_root(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
        start_dir: normalize_path(&exe_dir),
    })?;
    app_paths_for_root(root)
}

fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let sprites_dir = root.join("assets").join("sprites");
    let saves_dir = root.join("saves");

    fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSaveDir {
        path: saves_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        sprites_dir,
        saves_dir,
    })
}

fn find_root(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
