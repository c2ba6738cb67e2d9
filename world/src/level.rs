//! Raster-decoded collision map for a single level.

use gravitation_core::{CellClass, FootprintContact, Rgb};
use thiserror::Error;

use crate::sprite::SpriteMask;

/// Reasons a level raster cannot be turned into a [`LevelMap`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelMapError {
    /// The raster has no pixels along at least one axis.
    #[error("level raster must not be empty, got {width}x{height}")]
    EmptyRaster {
        /// Width reported by the level source.
        width: u32,
        /// Height reported by the level source.
        height: u32,
    },
    /// The pixel buffer does not match the advertised dimensions.
    #[error("level raster of {width}x{height} expects {expected} pixels but received {actual}")]
    PixelCountMismatch {
        /// Width reported by the level source.
        width: u32,
        /// Height reported by the level source.
        height: u32,
        /// Number of pixels implied by the dimensions.
        expected: usize,
        /// Number of pixels supplied.
        actual: usize,
    },
}

/// Immutable grid of classified cells built once per level.
///
/// Queries outside the grid always classify as [`CellClass::Solid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelMap {
    width: u32,
    height: u32,
    cells: Vec<CellClass>,
}

impl LevelMap {
    /// Classifies every pixel of a row-major raster against the level palette.
    pub fn from_pixels(width: u32, height: u32, pixels: &[Rgb]) -> Result<Self, LevelMapError> {
        if width == 0 || height == 0 {
            return Err(LevelMapError::EmptyRaster { width, height });
        }

        let expected = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(usize::MAX);
        if pixels.len() != expected {
            return Err(LevelMapError::PixelCountMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        let cells = pixels
            .iter()
            .map(|pixel| CellClass::from_color(*pixel))
            .collect();

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Width and height of the map in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Classifies the cell at the provided pixel coordinate.
    #[must_use]
    pub fn classify(&self, x: i64, y: i64) -> CellClass {
        self.index(x, y)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellClass::Solid)
    }

    /// Number of cells carrying the provided classification.
    #[must_use]
    pub fn count(&self, class: CellClass) -> usize {
        self.cells.iter().filter(|cell| **cell == class).count()
    }

    /// Scans the opaque pixels of `mask` placed with its top-left corner at
    /// `(origin_x, origin_y)` and reports which cell classes they overlap.
    ///
    /// Only the intersection of the sprite box and the map is scanned; sprite
    /// pixels hanging off the map are ignored here and left to the resolver's
    /// boundary test. Scanning stops at the first solid cell.
    #[must_use]
    pub fn check_footprint(&self, mask: &SpriteMask, origin_x: i64, origin_y: i64) -> FootprintContact {
        let mut contact = FootprintContact::default();

        let start_x = origin_x.max(0);
        let start_y = origin_y.max(0);
        let end_x = origin_x
            .saturating_add(i64::from(mask.width()))
            .min(i64::from(self.width));
        let end_y = origin_y
            .saturating_add(i64::from(mask.height()))
            .min(i64::from(self.height));

        for level_y in start_y..end_y {
            for level_x in start_x..end_x {
                // Both offsets lie inside the mask because the scan range is
                // clipped to the sprite box.
                let sprite_x = (level_x - origin_x) as u32;
                let sprite_y = (level_y - origin_y) as u32;
                if !mask.is_opaque(sprite_x, sprite_y) {
                    continue;
                }

                match self.classify(level_x, level_y) {
                    CellClass::Solid => {
                        contact.solid = true;
                        return contact;
                    }
                    CellClass::Goal => contact.goal = true,
                    CellClass::Hazard => contact.hazard = true,
                    CellClass::Free | CellClass::Reserved => {}
                }
            }
        }

        contact
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravitation_core::{FREE_COLOR, GOAL_COLOR, HAZARD_COLOR, RESERVED_COLOR, SOLID_COLOR};

    fn map_from_rows(rows: &[&str]) -> LevelMap {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let pixels: Vec<Rgb> = rows
            .iter()
            .flat_map(|row| row.chars())
            .map(|symbol| match symbol {
                '#' => SOLID_COLOR,
                'G' => GOAL_COLOR,
                'H' => HAZARD_COLOR,
                'R' => RESERVED_COLOR,
                '?' => Rgb::new(12, 34, 56),
                _ => FREE_COLOR,
            })
            .collect();
        LevelMap::from_pixels(width, height, &pixels).expect("valid raster")
    }

    #[test]
    fn rejects_empty_raster() {
        assert_eq!(
            LevelMap::from_pixels(0, 4, &[]),
            Err(LevelMapError::EmptyRaster {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn rejects_mismatched_pixel_count() {
        let pixels = vec![FREE_COLOR; 5];
        assert_eq!(
            LevelMap::from_pixels(2, 3, &pixels),
            Err(LevelMapError::PixelCountMismatch {
                width: 2,
                height: 3,
                expected: 6,
                actual: 5,
            })
        );
    }

    #[test]
    fn classify_maps_palette_and_unknown_colors() {
        let map = map_from_rows(&["#.GHR?"]);
        assert_eq!(map.classify(0, 0), CellClass::Solid);
        assert_eq!(map.classify(1, 0), CellClass::Free);
        assert_eq!(map.classify(2, 0), CellClass::Goal);
        assert_eq!(map.classify(3, 0), CellClass::Hazard);
        assert_eq!(map.classify(4, 0), CellClass::Reserved);
        assert_eq!(map.classify(5, 0), CellClass::Solid);
    }

    #[test]
    fn out_of_bounds_points_are_solid() {
        let map = map_from_rows(&["...", "...", "..."]);
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i64::MIN, 1), (1, i64::MAX)] {
            assert_eq!(map.classify(x, y), CellClass::Solid, "({x}, {y})");
        }
        assert_eq!(map.classify(2, 2), CellClass::Free);
    }

    #[test]
    fn counts_cells_by_class() {
        let map = map_from_rows(&["#..", "G#?"]);
        assert_eq!(map.count(CellClass::Solid), 3);
        assert_eq!(map.count(CellClass::Free), 2);
        assert_eq!(map.count(CellClass::Goal), 1);
    }

    #[test]
    fn transparent_sprite_never_collides() {
        let map = map_from_rows(&["####", "#GH#", "####"]);
        let mask = SpriteMask::from_alpha(4, 3, &[0; 12]).expect("valid mask");
        for origin_y in -3..=3 {
            for origin_x in -4..=4 {
                assert_eq!(
                    map.check_footprint(&mask, origin_x, origin_y),
                    FootprintContact::default()
                );
            }
        }
    }

    #[test]
    fn footprint_reports_goal_and_hazard_overlap() {
        let map = map_from_rows(&["......", ".GH...", "......"]);
        let mask = SpriteMask::filled(2, 2);

        let contact = map.check_footprint(&mask, 1, 1);
        assert_eq!(
            contact,
            FootprintContact {
                solid: false,
                goal: true,
                hazard: true,
            }
        );

        assert_eq!(
            map.check_footprint(&mask, 4, 0),
            FootprintContact::default()
        );
    }

    #[test]
    fn footprint_ignores_transparent_pixels_over_terrain() {
        let map = map_from_rows(&["#...", "....", "...."]);
        // Top-left pixel is transparent, the rest of the 2x2 sprite is opaque.
        let mask = SpriteMask::from_alpha(2, 2, &[0, 255, 255, 255]).expect("valid mask");

        assert!(!map.check_footprint(&mask, 0, 0).solid);
        assert!(map.check_footprint(&mask, -1, 0).solid);
    }

    #[test]
    fn footprint_only_scans_the_map_intersection() {
        let map = map_from_rows(&["...", "...", "..."]);
        let mask = SpriteMask::filled(4, 4);

        assert!(!map.check_footprint(&mask, -2, -2).solid);
        assert_eq!(
            map.check_footprint(&mask, 10, 10),
            FootprintContact::default()
        );
    }

    #[test]
    fn footprint_stops_at_first_solid_cell() {
        let map = map_from_rows(&["#G", "GG"]);
        let mask = SpriteMask::filled(2, 2);

        let contact = map.check_footprint(&mask, 0, 0);
        assert!(contact.solid);
        assert!(!contact.goal, "scan should stop before reaching the goal cells");
    }
}
