//! smatch: a spherical spatial matching engine for catalogs of points on
//! the unit sphere.
//!
//! Given a primary catalog of `(ra, dec, radius)` entries and a secondary
//! catalog of `(ra, dec)` points, [`Matcher`] reports, for every primary
//! entry, the secondary points that fall within its search disc — either
//! in memory via [`Matcher::match_in_memory`], or streamed directly to a
//! file via [`Matcher::match2file`] without retaining the full match set.
//!
//! The spatial index underneath is a HEALPix ring-scheme grid ([`Grid`]);
//! matching is single-threaded and synchronous by design, with no
//! parallelism anywhere in this crate.

mod catalog;
mod healpix;
mod heap;
mod io;
mod matcher;
mod pixtree;
mod trace;
mod util;

pub use healpix::Grid;
pub use io::{count_lines, load_matches, MatchRecord};
pub use matcher::{Match, MatchOptions, Matcher};
pub use util::error::{SmatchError, SmatchResult};
