mod renderer;

pub use renderer::{PixelSurface, Renderer};
