//! Asset store: background, glasses images and the music track.
//!
//! Every asset is required. A missing or undecodable file is fatal to
//! startup.

use crate::config::AssetConfig;
use crate::{Error, Result};
use image::RgbaImage;
use log::info;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Loaded assets
pub struct AssetStore {
    background: RgbaImage,
    glasses: Vec<RgbaImage>,
    music: PathBuf,
}

fn load_image(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| Error::AssetLoad(format!("{}: {e}", path.display())))
}

impl AssetStore {
    /// Load every configured asset
    ///
    /// # Errors
    ///
    /// Returns `AssetLoad` naming the first asset that could not be loaded
    pub fn load(config: &AssetConfig) -> Result<Self> {
        info!("Loading background {}", config.background.display());
        let background = load_image(&config.background)?;

        let glasses = config
            .glasses
            .iter()
            .map(|path| {
                info!("Loading glasses {}", path.display());
                load_image(path)
            })
            .collect::<Result<Vec<_>>>()?;

        if !config.music.is_file() {
            return Err(Error::AssetLoad(format!(
                "Music track not found: {}",
                config.music.display()
            )));
        }

        Self::from_parts(background, glasses, config.music.clone())
    }

    /// Build a store from already loaded images
    ///
    /// # Errors
    ///
    /// Returns `AssetLoad` if no glasses image is given or one has zero size
    pub fn from_parts(background: RgbaImage, glasses: Vec<RgbaImage>, music: PathBuf) -> Result<Self> {
        if glasses.is_empty() {
            return Err(Error::AssetLoad("At least one glasses image is required".to_string()));
        }
        if glasses.iter().any(|g| g.width() == 0 || g.height() == 0) {
            return Err(Error::AssetLoad("Glasses images must not be empty".to_string()));
        }

        Ok(Self {
            background,
            glasses,
            music,
        })
    }

    #[must_use]
    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    /// Glasses image by index, wrapping around
    #[must_use]
    pub fn glasses(&self, index: usize) -> &RgbaImage {
        &self.glasses[index % self.glasses.len()]
    }

    #[must_use]
    pub fn glasses_count(&self) -> usize {
        self.glasses.len()
    }

    #[must_use]
    pub fn music(&self) -> &Path {
        &self.music
    }

    /// Pick a glasses index uniformly at random
    pub fn pick_glasses<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.glasses.len())
    }
}
