use std::collections::HashSet;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::assets::{AssetStore, Sprite, PLACEHOLDER_IMAGE_ID};
use crate::app::view::{DrawRequest, Rgba, Surface, TextSize, GLYPH_HEIGHT, GLYPH_WIDTH};

const CLEAR_COLOR: Rgba = [0, 0, 0, 255];
const FALLBACK_COLOR: Rgba = [255, 0, 255, 255];

/// 3x5 bitmap font for `' '..='~'`, one entry per character. Each entry packs
/// five 3-bit rows, top row in the highest bits.
const GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];

fn glyph_bits(ch: char) -> u16 {
    let index = match ch {
        ' '..='~' => ch as usize - ' ' as usize,
        _ => '?' as usize - ' ' as usize,
    };
    GLYPHS[index]
}

fn glyph_pixel_on(bits: u16, row: u32, col: u32) -> bool {
    let row_bits = (bits >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111;
    row_bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0
}

/// Window-backed frame buffer with a fixed logical resolution; `pixels`
/// scales it to whatever size the window has.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
    warned_missing_images: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, buffer_width: u32, buffer_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            size.width.max(1),
            size.height.max(1),
            buffer_width,
            buffer_height,
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
            warned_missing_images: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            width,
            height,
            self.buffer_width,
            self.buffer_height,
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        surface_width: u32,
        surface_height: u32,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer_width, buffer_height, surface)
    }

    /// Clears the frame, lets `draw` paint it and presents the result.
    pub fn render_with(
        &mut self,
        assets: &AssetStore,
        draw: impl FnOnce(&mut dyn Surface),
    ) -> Result<(), Error> {
        let mut surface = PixelSurface::new(
            self.pixels.frame_mut(),
            self.buffer_width,
            self.buffer_height,
            assets,
            &mut self.warned_missing_images,
        );
        surface.clear(CLEAR_COLOR);
        draw(&mut surface);
        self.pixels.render()
    }
}

/// [`Surface`] over a raw RGBA8 frame.
pub struct PixelSurface<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    assets: &'a AssetStore,
    warned_missing_images: &'a mut HashSet<String>,
}

impl<'a> PixelSurface<'a> {
    pub fn new(
        frame: &'a mut [u8],
        width: u32,
        height: u32,
        assets: &'a AssetStore,
        warned_missing_images: &'a mut HashSet<String>,
    ) -> Self {
        Self {
            frame,
            width,
            height,
            assets,
            warned_missing_images,
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn resolve_sprite(&mut self, image_id: &str) -> Option<&'a Sprite> {
        let assets = self.assets;
        if let Some(sprite) = assets.get(image_id) {
            return Some(sprite);
        }
        warn_missing_image_once(self.warned_missing_images, image_id);
        assets.placeholder()
    }

    fn write_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        write_pixel_rgba_clipped(self.frame, self.width as usize, self.height as usize, x, y, color);
    }
}

impl Surface for PixelSurface<'_> {
    fn draw(&mut self, request: DrawRequest<'_>) {
        if request.height == 0 || request.width == 0 {
            return;
        }
        match self.resolve_sprite(request.image_id) {
            Some(sprite) => draw_sprite_scaled(
                self.frame,
                self.width,
                self.height,
                &request,
                sprite,
            ),
            None => self.fill_rect(
                request.dest_x,
                request.dest_y,
                request.height,
                request.width,
                FALLBACK_COLOR,
            ),
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, height: u32, width: u32, color: Rgba) {
        let top = x.max(0);
        let left = y.max(0);
        let bottom = x.saturating_add(height as i32).min(self.height as i32);
        let right = y.saturating_add(width as i32).min(self.width as i32);
        for row in top..bottom {
            for col in left..right {
                self.write_pixel(row, col, color);
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, size: TextSize, color: Rgba, text: &str) {
        let scale = size.scale() as i32;
        let mut glyph_left = y;
        for ch in text.chars() {
            let bits = glyph_bits(ch);
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !glyph_pixel_on(bits, row, col) {
                        continue;
                    }
                    let cell_top = x + row as i32 * scale;
                    let cell_left = glyph_left + col as i32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.write_pixel(cell_top + dy, cell_left + dx, color);
                        }
                    }
                }
            }
            glyph_left += size.advance() as i32;
        }
    }
}

fn warn_missing_image_once(warned: &mut HashSet<String>, image_id: &str) {
    if !warned.insert(image_id.to_string()) {
        return;
    }
    warn!(image_id, "renderer_image_missing_using_placeholder");
}

fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: usize,
    height: usize,
    row: i32,
    col: i32,
    color: Rgba,
) {
    if row < 0 || col < 0 {
        return;
    }
    let row = row as usize;
    let col = col as usize;
    if row >= height || col >= width {
        return;
    }
    let Some(pixel_offset) = row.checked_mul(width).and_then(|start| start.checked_add(col)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

/// Nearest-neighbour blit of `sprite` stretched to the request's box.
/// Fully transparent source pixels leave the frame untouched.
fn draw_sprite_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    request: &DrawRequest<'_>,
    sprite: &Sprite,
) {
    if sprite.width == 0 || sprite.height == 0 {
        return;
    }

    let top = request.dest_x;
    let left = request.dest_y;
    let draw_top = top.max(0);
    let draw_left = left.max(0);
    let draw_bottom = top.saturating_add(request.height as i32).min(height as i32);
    let draw_right = left.saturating_add(request.width as i32).min(width as i32);
    if draw_top >= draw_bottom || draw_left >= draw_right {
        return;
    }

    for out_row in draw_top..draw_bottom {
        let src_row = ((out_row - top) as u64 * sprite.height as u64 / request.height as u64) as u32;
        for out_col in draw_left..draw_right {
            let src_col =
                ((out_col - left) as u64 * sprite.width as u64 / request.width as u64) as u32;
            let Some(color) = sprite.pixel(src_col, src_row) else {
                continue;
            };
            if color[3] == 0 {
                continue;
            }
            write_pixel_rgba_clipped(
                frame,
                width as usize,
                height as usize,
                out_row,
                out_col,
                color,
            );
        }
    }
}
