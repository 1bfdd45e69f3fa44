use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::info;

/// Image drawn in place of any id the store does not know.
pub const PLACEHOLDER_IMAGE_ID: &str = "missing";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open image `{id}` at {path}: {source}")]
    Open {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image `{id}` at {path}: {source}")]
    Decode {
        id: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded RGBA8 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Sprite {
    /// RGBA of the source pixel at (`col`, `row`), or `None` outside the image
    /// or when the buffer is short.
    pub fn pixel(&self, col: u32, row: u32) -> Option<[u8; 4]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let offset = (row as usize * self.width as usize + col as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Every image the game draws, loaded once before the first tick.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    sprites: HashMap<String, Sprite>,
}

impl AssetStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_sprites<K: Into<String>>(sprites: impl IntoIterator<Item = (K, Sprite)>) -> Self {
        Self {
            sprites: sprites
                .into_iter()
                .map(|(id, sprite)| (id.into(), sprite))
                .collect(),
        }
    }

    /// Loads `<dir>/<id>.png` for every id in `manifest`. The first failure
    /// aborts the whole load.
    pub fn load_manifest(dir: &Path, manifest: &[&str]) -> Result<Self, AssetError> {
        let mut sprites = HashMap::with_capacity(manifest.len());
        for id in manifest {
            let path = dir.join(format!("{id}.png"));
            let sprite = load_sprite_rgba(id, &path)?;
            sprites.insert((*id).to_string(), sprite);
        }
        info!(
            dir = %dir.display(),
            image_count = sprites.len(),
            "assets_loaded"
        );
        Ok(Self { sprites })
    }

    pub fn get(&self, id: &str) -> Option<&Sprite> {
        self.sprites.get(id)
    }

    pub fn placeholder(&self) -> Option<&Sprite> {
        self.sprites.get(PLACEHOLDER_IMAGE_ID)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sprites.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

fn load_sprite_rgba(id: &str, path: &Path) -> Result<Sprite, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        id: id.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        id: id.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    Ok(Sprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use image::{Rgba, RgbaImage};

    use super::*;

    fn write_png(dir: &Path, id: &str, width: u32, height: u32, color: [u8; 4]) {
        RgbaImage::from_pixel(width, height, Rgba(color))
            .save(dir.join(format!("{id}.png")))
            .expect("write png");
    }

    #[test]
    fn loads_every_manifest_entry() {
        let temp = tempfile::tempdir().expect("temp");
        write_png(temp.path(), "grass", 4, 4, [0, 200, 0, 255]);
        write_png(temp.path(), "missing", 2, 3, [255, 0, 255, 255]);

        let store =
            AssetStore::load_manifest(temp.path(), &["grass", "missing"]).expect("load manifest");

        assert_eq!(store.len(), 2);
        let grass = store.get("grass").expect("grass");
        assert_eq!((grass.width, grass.height), (4, 4));
        assert_eq!(grass.pixel(3, 3), Some([0, 200, 0, 255]));
        let placeholder = store.placeholder().expect("placeholder");
        assert_eq!((placeholder.width, placeholder.height), (2, 3));
    }

    #[test]
    fn missing_file_fails_with_open_error() {
        let temp = tempfile::tempdir().expect("temp");
        write_png(temp.path(), "grass", 1, 1, [0, 0, 0, 255]);

        let error = AssetStore::load_manifest(temp.path(), &["grass", "slime"])
            .expect_err("slime.png is absent");

        match error {
            AssetError::Open { id, .. } => assert_eq!(id, "slime"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_fails_with_decode_error() {
        let temp = tempfile::tempdir().expect("temp");
        fs::write(temp.path().join("wall.png"), b"not a png").expect("write");

        let error =
            AssetStore::load_manifest(temp.path(), &["wall"]).expect_err("garbage is rejected");

        assert!(matches!(error, AssetError::Decode { ref id, .. } if id == "wall"));
    }

    #[test]
    fn pixel_lookup_is_bounds_checked() {
        let sprite = Sprite {
            width: 2,
            height: 1,
            rgba: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        assert_eq!(sprite.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(sprite.pixel(2, 0), None);
        assert_eq!(sprite.pixel(0, 1), None);

        let short = Sprite {
            width: 2,
            height: 2,
            rgba: vec![0; 4],
        };
        assert_eq!(short.pixel(1, 1), None);
    }
}
