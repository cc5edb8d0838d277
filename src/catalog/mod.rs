//! Primary catalog: points with precomputed Cartesian coordinates, search
//! radii, disc pixel sets, and per-point match buffers.

use crate::healpix::Grid;
use crate::heap::MatchBuffer;
use crate::util::error::{SmatchError, SmatchResult};

/// A point on the unit sphere with a search radius.
///
/// Constructed once at catalog build time and immutable thereafter.
#[derive(Clone, Copy, Debug)]
pub struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
    pub(crate) cos_radius: f64,
}

impl Point {
    pub(crate) fn dot(&self, x: f64, y: f64, z: f64) -> f64 {
        self.x * x + self.y * y + self.z * z
    }
}

/// One primary catalog entry: its point, the HEALPix pixels covering its
/// search disc, and its match buffer.
#[derive(Debug)]
pub struct CatalogEntry {
    pub(crate) point: Point,
    pub(crate) disc_pixels: Vec<u64>,
    pub(crate) matches: MatchBuffer,
}

impl CatalogEntry {
    /// The number of matches currently held in this entry's buffer.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

/// An ordered, fixed-size collection of [`CatalogEntry`] values built from a
/// primary catalog's `(ra, dec, radius)` arrays.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog from parallel `ra`/`dec`/`radius` arrays (degrees).
    ///
    /// Fails with [`SmatchError::EmptyCatalog`] if the arrays are empty,
    /// [`SmatchError::SizeMismatch`] if their lengths disagree, or
    /// [`SmatchError::BadCoordinate`] if any `(ra, dec)` pair is non-finite.
    pub fn new(grid: &Grid, ra: &[f64], dec: &[f64], radius_deg: &[f64]) -> SmatchResult<Self> {
        if ra.is_empty() {
            return Err(SmatchError::EmptyCatalog);
        }
        if dec.len() != ra.len() {
            return Err(SmatchError::SizeMismatch {
                context: "dec",
                expected: ra.len(),
                got: dec.len(),
            });
        }
        if radius_deg.len() != ra.len() {
            return Err(SmatchError::SizeMismatch {
                context: "radius",
                expected: ra.len(),
                got: radius_deg.len(),
            });
        }

        let mut entries = Vec::with_capacity(ra.len());
        for i in 0..ra.len() {
            let (x, y, z) = grid.eq2xyz(ra[i], dec[i])?;
            if !radius_deg[i].is_finite() {
                return Err(SmatchError::BadCoordinate {
                    context: "radius",
                    ra: ra[i],
                    dec: dec[i],
                });
            }
            let radius_rad = radius_deg[i].to_radians();
            let cos_radius = radius_rad.cos();
            let disc_pixels = grid.disc_intersect(x, y, z, radius_rad);
            entries.push(CatalogEntry {
                point: Point {
                    x,
                    y,
                    z,
                    cos_radius,
                },
                disc_pixels,
                matches: MatchBuffer::new(0),
            });
        }

        Ok(Self { entries })
    }

    /// The number of entries in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries (never true for a successfully
    /// constructed catalog, since construction rejects empty input).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [CatalogEntry] {
        &mut self.entries
    }

    pub fn entry(&self, cat_ind: usize) -> Option<&CatalogEntry> {
        self.entries.get(cat_ind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_catalog() {
        let grid = Grid::new(16).unwrap();
        let err = Catalog::new(&grid, &[], &[], &[]).unwrap_err();
        assert_eq!(err, SmatchError::EmptyCatalog);
    }

    #[test]
    fn rejects_size_mismatch() {
        let grid = Grid::new(16).unwrap();
        let err = Catalog::new(&grid, &[1.0, 2.0], &[1.0], &[1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            SmatchError::SizeMismatch {
                context: "dec",
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn rejects_non_finite_coordinate() {
        let grid = Grid::new(16).unwrap();
        let err = Catalog::new(&grid, &[f64::NAN], &[0.0], &[1.0]).unwrap_err();
        assert!(matches!(err, SmatchError::BadCoordinate { .. }));
    }

    #[test]
    fn builds_entries_with_disc_pixels() {
        let grid = Grid::new(32).unwrap();
        let cat = Catalog::new(&grid, &[10.0, 200.0], &[20.0, -30.0], &[0.5, 1.0]).unwrap();
        assert_eq!(cat.len(), 2);
        for entry in cat.entries() {
            assert!(!entry.disc_pixels.is_empty());
            assert!(entry.point.cos_radius < 1.0);
        }
    }
}
