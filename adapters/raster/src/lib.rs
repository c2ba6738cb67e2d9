#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level and sprite sources backed by raster images.
//!
//! Levels are read as opaque RGB and classified against the palette; sprites
//! are read as RGBA and reduced to an alpha mask.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use gravitation_core::Rgb;
use gravitation_world::{LevelMap, LevelMapError, SpriteMask, SpriteMaskError};
use thiserror::Error;
use tracing::debug;

/// Reasons a raster asset cannot be loaded.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The asset could not be read from disk.
    #[error("failed to read raster asset {path:?}")]
    Missing {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The bytes are not a decodable image.
    #[error("failed to decode raster image")]
    Decode(#[from] image::ImageError),
    /// The decoded image cannot be turned into a level map.
    #[error(transparent)]
    Map(#[from] LevelMapError),
    /// The decoded image cannot be turned into a sprite mask.
    #[error(transparent)]
    Sprite(#[from] SpriteMaskError),
}

fn read(path: &Path) -> Result<Vec<u8>, RasterError> {
    fs::read(path).map_err(|source| RasterError::Missing {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes an encoded image into a classified level map.
pub fn decode_level(bytes: &[u8]) -> Result<LevelMap, RasterError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = image.dimensions();
    let pixels: Vec<Rgb> = image
        .pixels()
        .map(|pixel| Rgb::new(pixel[0], pixel[1], pixel[2]))
        .collect();
    Ok(LevelMap::from_pixels(width, height, &pixels)?)
}

/// Reads and decodes a level image from disk.
pub fn load_level(path: impl AsRef<Path>) -> Result<LevelMap, RasterError> {
    let path = path.as_ref();
    let map = decode_level(&read(path)?)?;
    let (width, height) = map.dimensions();
    debug!(?path, width, height, "level raster decoded");
    Ok(map)
}

/// Decodes an encoded image into a sprite alpha mask.
pub fn decode_sprite(bytes: &[u8]) -> Result<SpriteMask, RasterError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    let alpha: Vec<u8> = image.pixels().map(|pixel| pixel[3]).collect();
    Ok(SpriteMask::from_alpha(width, height, &alpha)?)
}

/// Reads and decodes a sprite image from disk.
pub fn load_sprite(path: impl AsRef<Path>) -> Result<SpriteMask, RasterError> {
    let path = path.as_ref();
    let mask = decode_sprite(&read(path)?)?;
    debug!(?path, opaque = mask.opaque_count(), "sprite raster decoded");
    Ok(mask)
}
