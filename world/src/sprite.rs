//! Alpha masks for entity sprites and their rotated variants.

use thiserror::Error;

const EXTENT_EPSILON: f32 = 1e-3;

/// Reasons an alpha buffer cannot be turned into a [`SpriteMask`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpriteMaskError {
    /// The alpha buffer does not match the advertised dimensions.
    #[error("sprite of {width}x{height} expects {expected} alpha values but received {actual}")]
    PixelCountMismatch {
        /// Width reported by the sprite source.
        width: u32,
        /// Height reported by the sprite source.
        height: u32,
        /// Number of alpha values implied by the dimensions.
        expected: usize,
        /// Number of alpha values supplied.
        actual: usize,
    },
}

/// Row-major mask marking which sprite pixels are non-transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteMask {
    width: u32,
    height: u32,
    opaque: Vec<bool>,
}

impl SpriteMask {
    /// Builds a mask from per-pixel alpha values. Any non-zero alpha is opaque.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8]) -> Result<Self, SpriteMaskError> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(usize::MAX);
        if alpha.len() != expected {
            return Err(SpriteMaskError::PixelCountMismatch {
                width,
                height,
                expected,
                actual: alpha.len(),
            });
        }

        Ok(Self {
            width,
            height,
            opaque: alpha.iter().map(|value| *value > 0).collect(),
        })
    }

    /// Builds a fully opaque rectangular mask.
    #[must_use]
    pub fn filled(width: u32, height: u32) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            opaque: vec![true; len],
        }
    }

    /// Width of the mask in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the mask in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the pixel is opaque. Coordinates outside the mask are transparent.
    #[must_use]
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.opaque.get(index).copied().unwrap_or(false)
    }

    /// Number of opaque pixels in the mask.
    #[must_use]
    pub fn opaque_count(&self) -> usize {
        self.opaque.iter().filter(|opaque| **opaque).count()
    }

    /// Rotates the mask clockwise (as seen on screen) by `degrees`.
    ///
    /// The result grows to the bounding box of the rotated rectangle and is
    /// sampled nearest-neighbour around the shared center.
    #[must_use]
    pub fn rotated(&self, degrees: f32) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        if normalized == 0.0 || self.width == 0 || self.height == 0 {
            return self.clone();
        }

        let (sin, cos) = normalized.to_radians().sin_cos();
        let width = self.width as f32;
        let height = self.height as f32;
        let out_width = bounding_extent(width * cos.abs() + height * sin.abs());
        let out_height = bounding_extent(width * sin.abs() + height * cos.abs());

        let source_center = (width / 2.0, height / 2.0);
        let target_center = (out_width as f32 / 2.0, out_height as f32 / 2.0);

        let mut opaque = vec![false; out_width as usize * out_height as usize];
        for target_y in 0..out_height {
            for target_x in 0..out_width {
                let relative_x = target_x as f32 + 0.5 - target_center.0;
                let relative_y = target_y as f32 + 0.5 - target_center.1;
                // Inverse of the clockwise rotation in y-down screen space.
                let source_x = relative_x * cos + relative_y * sin + source_center.0;
                let source_y = -relative_x * sin + relative_y * cos + source_center.1;
                if source_x < 0.0 || source_y < 0.0 {
                    continue;
                }
                if self.is_opaque(source_x as u32, source_y as u32) {
                    opaque[target_y as usize * out_width as usize + target_x as usize] = true;
                }
            }
        }

        Self {
            width: out_width,
            height: out_height,
            opaque,
        }
    }
}

fn bounding_extent(extent: f32) -> u32 {
    (extent - EXTENT_EPSILON).ceil().max(1.0) as u32
}

/// Base sprite mask plus the owned rotated variant for the current heading.
///
/// The rotated mask is recomputed only when the heading changes and is never
/// shared between entities.
#[derive(Clone, Debug)]
pub struct Sprite {
    base: SpriteMask,
    rotated: SpriteMask,
    rotation: f32,
}

impl Sprite {
    /// Wraps a base mask at heading zero.
    #[must_use]
    pub fn new(base: SpriteMask) -> Self {
        Self {
            rotated: base.clone(),
            base,
            rotation: 0.0,
        }
    }

    /// Unrotated mask supplied by the sprite source.
    #[must_use]
    pub const fn base(&self) -> &SpriteMask {
        &self.base
    }

    /// Mask rotated to the current heading.
    #[must_use]
    pub const fn current(&self) -> &SpriteMask {
        &self.rotated
    }

    /// Size of the unrotated sprite, which defines the entity's logical box.
    #[must_use]
    pub fn extent(&self) -> glam::Vec2 {
        glam::Vec2::new(self.base.width() as f32, self.base.height() as f32)
    }

    /// Refreshes the rotated mask when the heading changed.
    pub(crate) fn set_rotation(&mut self, rotation: f32) {
        if rotation == self.rotation {
            return;
        }
        self.rotated = self.base.rotated(rotation);
        self.rotation = rotation;
    }

    /// Top-left corner of the rotated mask for an entity whose logical origin
    /// is `position`.
    ///
    /// The rotated box is centered on `(x + base_width / 2, y + base_height / 2)`
    /// using integer halves; the result truncates toward zero.
    #[must_use]
    pub fn footprint_origin(&self, position: glam::Vec2) -> (i64, i64) {
        let x = position.x + (self.base.width() / 2) as f32 - (self.rotated.width() / 2) as f32;
        let y = position.y + (self.base.height() / 2) as f32 - (self.rotated.height() / 2) as f32;
        (x as i64, y as i64)
    }
}
