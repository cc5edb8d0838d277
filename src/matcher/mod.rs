//! Top-level matching engine: builds the primary catalog over a HEALPix
//! grid and drives matching against successive secondary catalogs, either
//! in memory or streamed straight to a file sink.

mod options;

pub use options::MatchOptions;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::catalog::Catalog;
use crate::healpix::Grid;
use crate::heap::MatchCandidate;
use crate::io::write_match_line;
use crate::pixtree::PixelTree;
use crate::trace::{trace_event, trace_span};
use crate::util::error::{SmatchError, SmatchResult};

/// One accepted match, as returned by [`Matcher::copy_matches`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    pub cat_ind: usize,
    pub input_ind: usize,
    pub cosdist: f64,
}

/// The spherical matching engine: a HEALPix grid, the primary catalog built
/// over it, and the running match count of the most recent call.
///
/// One `Matcher` is meant to be matched against many secondary catalogs in
/// succession; per-entry match buffers are reused across calls rather than
/// reallocated.
#[derive(Debug)]
pub struct Matcher {
    grid: Grid,
    catalog: Catalog,
    maxmatch: usize,
    nmatches: u64,
}

impl Matcher {
    /// Builds the primary catalog from parallel `(ra, dec, radius)` arrays
    /// (degrees) over a grid of the given `nside`.
    pub fn new(nside: u64, ra: &[f64], dec: &[f64], radius_deg: &[f64]) -> SmatchResult<Self> {
        let grid = Grid::new(nside)?;
        let catalog = Catalog::new(&grid, ra, dec, radius_deg)?;
        Ok(Self {
            grid,
            catalog,
            maxmatch: 0,
            nmatches: 0,
        })
    }

    /// The grid's `Nside` parameter.
    pub fn hpix_nside(&self) -> u64 {
        self.grid.nside()
    }

    /// The grid's pixel area, in steradians.
    pub fn hpix_area(&self) -> f64 {
        self.grid.pixel_area()
    }

    /// The number of distinct matches appended by the most recent match
    /// call (append events only; a bounded buffer's root replacement does
    /// not increase this count, matching the invariant that it equals the
    /// sum of final per-entry buffer sizes).
    pub fn nmatches(&self) -> u64 {
        self.nmatches
    }

    /// The number of entries in the primary catalog.
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Runs an in-memory match of the primary catalog against a secondary
    /// catalog's `(ra, dec)` arrays, filling each primary entry's match
    /// buffer.
    ///
    /// `opts.self_match` is accepted for API symmetry with
    /// [`Matcher::match2file`] but is not consulted by this path.
    pub fn match_in_memory(&mut self, opts: &MatchOptions, ra: &[f64], dec: &[f64]) -> SmatchResult<()> {
        opts.validate()?;
        if dec.len() != ra.len() {
            return Err(SmatchError::SizeMismatch {
                context: "dec",
                expected: ra.len(),
                got: dec.len(),
            });
        }

        self.maxmatch = opts.maxmatch_usize();
        {
            let _guard = trace_span!(
                "smatch.match_prep",
                primary = self.catalog.len(),
                maxmatch = self.maxmatch
            )
            .entered();
            self.match_prep();
        }

        let tree = {
            let _guard = trace_span!("smatch.build_tree", secondary = ra.len()).entered();
            self.build_secondary_tree(ra, dec)?
        };

        {
            let _guard = trace_span!(
                "smatch.match",
                primary = self.catalog.len(),
                secondary = ra.len(),
                nside = self.grid.nside(),
                maxmatch = self.maxmatch
            )
            .entered();

            self.nmatches = 0;
            let npix = self.grid.npix();
            for entry in self.catalog.entries_mut() {
                for &pixel_id in &entry.disc_pixels {
                    let key = pixel_key(pixel_id, npix);
                    let Some(indices) = tree.find(key) else {
                        continue;
                    };
                    for &input_ind in indices {
                        let (x, y, z) = self.grid.eq2xyz(ra[input_ind], dec[input_ind])?;
                        let cosdist = entry.point.dot(x, y, z);
                        if cosdist > entry.point.cos_radius {
                            let len_before = entry.matches.len();
                            entry.matches.offer(MatchCandidate { input_ind, cosdist });
                            if entry.matches.len() > len_before {
                                self.nmatches += 1;
                            }
                        }
                    }
                }
            }
            trace_event!("smatch.match.done", nmatches = self.nmatches);
        }

        Ok(())
    }

    /// Runs a match and streams the result to `path` in the text format of
    /// the match interchange format, without retaining matches beyond what
    /// `maxmatch` requires.
    ///
    /// `maxmatch == 0` takes the unbounded streaming path (no per-entry
    /// retention at all); `maxmatch >= 1` runs [`Matcher::match_in_memory`]
    /// to completion and then drains each entry's buffer to the sink in
    /// buffer order (heap order when at capacity, not sorted).
    pub fn match2file<P: AsRef<Path>>(
        &mut self,
        opts: &MatchOptions,
        ra: &[f64],
        dec: &[f64],
        path: P,
    ) -> SmatchResult<()> {
        opts.validate()?;
        if dec.len() != ra.len() {
            return Err(SmatchError::SizeMismatch {
                context: "dec",
                expected: ra.len(),
                got: dec.len(),
            });
        }

        let file = File::create(path.as_ref()).map_err(|e| SmatchError::io("match2file: create", e))?;
        let mut writer = BufWriter::new(file);

        if opts.maxmatch_usize() == 0 {
            self.stream_unbounded(opts, ra, dec, &mut writer)?;
        } else {
            self.match_in_memory(opts, ra, dec)?;
            self.stream_bounded(&mut writer)?;
        }

        writer
            .flush()
            .map_err(|e| SmatchError::io("match2file: flush", e))?;
        Ok(())
    }

    /// Drains every entry's match buffer into `out`, in catalog-entry order
    /// and buffer order (heap order when at capacity). `out` is cleared
    /// first; buffers are empty afterward.
    pub fn copy_matches(&mut self, out: &mut Vec<Match>) {
        out.clear();
        for (cat_ind, entry) in self.catalog.entries_mut().iter_mut().enumerate() {
            for cand in entry.matches.drain() {
                out.push(Match {
                    cat_ind,
                    input_ind: cand.input_ind,
                    cosdist: cand.cosdist,
                });
            }
        }
    }

    fn match_prep(&mut self) {
        let maxmatch = self.maxmatch;
        for entry in self.catalog.entries_mut() {
            entry.matches.configure(maxmatch);
        }
    }

    fn build_secondary_tree(&self, ra: &[f64], dec: &[f64]) -> SmatchResult<PixelTree> {
        let mut tree = PixelTree::new();
        let npix = self.grid.npix();
        for (input_ind, (&r, &d)) in ra.iter().zip(dec.iter()).enumerate() {
            let pix = self.grid.eq2pix(r, d)?;
            tree.insert(pixel_key(pix, npix), input_ind);
        }
        Ok(tree)
    }

    fn stream_unbounded<W: Write>(
        &mut self,
        opts: &MatchOptions,
        ra: &[f64],
        dec: &[f64],
        w: &mut W,
    ) -> SmatchResult<()> {
        let _guard = trace_span!(
            "smatch.match2file.unbounded",
            primary = self.catalog.len(),
            secondary = ra.len()
        )
        .entered();

        let mut inverted = PixelTree::new();
        let npix = self.grid.npix();
        for (cat_ind, entry) in self.catalog.entries().iter().enumerate() {
            let pix = self.grid.xyz2pix(entry.point.x, entry.point.y, entry.point.z);
            inverted.insert(pixel_key(pix, npix), cat_ind);
        }

        self.nmatches = 0;
        for (input_ind, (&r, &d)) in ra.iter().zip(dec.iter()).enumerate() {
            let (x, y, z) = self.grid.eq2xyz(r, d)?;
            let pix = self.grid.xyz2pix(x, y, z);
            let Some(cat_inds) = inverted.find(pixel_key(pix, npix)) else {
                continue;
            };
            for &cat_ind in cat_inds {
                if opts.self_match && cat_ind == input_ind {
                    continue;
                }
                let entry = &self.catalog.entries()[cat_ind];
                let cosdist = entry.point.dot(x, y, z);
                if cosdist > entry.point.cos_radius {
                    write_match_line(w, cat_ind as i64, input_ind as i64, cosdist)?;
                    self.nmatches += 1;
                }
            }
        }

        trace_event!("smatch.match2file.unbounded.done", nmatches = self.nmatches);
        Ok(())
    }

    fn stream_bounded<W: Write>(&mut self, w: &mut W) -> SmatchResult<()> {
        for (cat_ind, entry) in self.catalog.entries_mut().iter_mut().enumerate() {
            for cand in entry.matches.drain() {
                write_match_line(w, cat_ind as i64, cand.input_ind as i64, cand.cosdist)?;
            }
        }
        Ok(())
    }
}

/// Shifts a pixel id by `-Npix/2`, centring the BST key distribution
/// around zero to balance insertion-ordered trees against HEALPix's
/// monotonically increasing pixel enumeration order.
fn pixel_key(pixel_id: u64, npix: u64) -> i64 {
    pixel_id as i64 - (npix / 2) as i64
}
