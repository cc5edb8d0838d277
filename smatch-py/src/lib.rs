//! Python bindings for the smatch spherical catalog matching engine.
//!
//! This module exposes the core Rust matching engine to Python via PyO3,
//! taking `ra`/`dec`/`radius` arrays as numpy arrays.

use numpy::PyReadonlyArray1;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use ::smatch::{
    Match as RustMatch, MatchOptions as RustMatchOptions, MatchRecord, Matcher as RustMatcher,
    SmatchError,
};

/// Convert a SmatchError to a Python exception.
fn to_py_err(err: SmatchError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// A single accepted match: `(cat_ind, input_ind, cosdist)`.
#[pyclass]
#[derive(Clone)]
pub struct Match {
    #[pyo3(get)]
    pub cat_ind: usize,
    #[pyo3(get)]
    pub input_ind: usize,
    #[pyo3(get)]
    pub cosdist: f64,
}

#[pymethods]
impl Match {
    fn __repr__(&self) -> String {
        format!(
            "Match(cat_ind={}, input_ind={}, cosdist={:.6})",
            self.cat_ind, self.input_ind, self.cosdist
        )
    }
}

impl From<RustMatch> for Match {
    fn from(m: RustMatch) -> Self {
        Self {
            cat_ind: m.cat_ind,
            input_ind: m.input_ind,
            cosdist: m.cosdist,
        }
    }
}

/// Per-call match configuration: how many matches to keep per primary
/// entry (0 = unbounded), and whether the streaming path skips
/// `cat_ind == input_ind`.
#[pyclass]
#[derive(Clone)]
pub struct MatchOptions {
    inner: RustMatchOptions,
}

#[pymethods]
impl MatchOptions {
    /// Args:
    ///     maxmatch: matches kept per primary entry, 0 for unbounded (default: 0)
    ///     self_match: skip `cat_ind == input_ind` in the streaming path (default: False)
    #[new]
    #[pyo3(signature = (maxmatch = 0, self_match = false))]
    fn new(maxmatch: i64, self_match: bool) -> PyResult<Self> {
        let inner = RustMatchOptions::new(maxmatch, self_match);
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "MatchOptions(maxmatch={}, self_match={})",
            self.inner.maxmatch, self.inner.self_match
        )
    }
}

/// The spherical matching engine.
#[pyclass]
pub struct Matcher {
    inner: RustMatcher,
}

#[pymethods]
impl Matcher {
    /// Build the primary catalog.
    ///
    /// Args:
    ///     nside: HEALPix grid resolution, at least 1
    ///     ra: 1D float64 array of right ascensions in degrees
    ///     dec: 1D float64 array of declinations in degrees
    ///     radius: 1D float64 array of search radii in degrees
    #[new]
    fn new(
        nside: u64,
        ra: PyReadonlyArray1<'_, f64>,
        dec: PyReadonlyArray1<'_, f64>,
        radius: PyReadonlyArray1<'_, f64>,
    ) -> PyResult<Self> {
        let inner = RustMatcher::new(nside, ra.as_slice()?, dec.as_slice()?, radius.as_slice()?)
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn hpix_nside(&self) -> u64 {
        self.inner.hpix_nside()
    }

    #[getter]
    fn hpix_area(&self) -> f64 {
        self.inner.hpix_area()
    }

    #[getter]
    fn nmatches(&self) -> u64 {
        self.inner.nmatches()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Match against a secondary catalog's `(ra, dec)` arrays, retaining
    /// results in each primary entry's buffer. Retrieve them afterward
    /// with `copy_matches`.
    fn match_in_memory(
        &mut self,
        options: &MatchOptions,
        ra: PyReadonlyArray1<'_, f64>,
        dec: PyReadonlyArray1<'_, f64>,
    ) -> PyResult<()> {
        self.inner
            .match_in_memory(&options.inner, ra.as_slice()?, dec.as_slice()?)
            .map_err(to_py_err)
    }

    /// Match and stream the result directly to a match-file at `path`.
    fn match2file(
        &mut self,
        options: &MatchOptions,
        ra: PyReadonlyArray1<'_, f64>,
        dec: PyReadonlyArray1<'_, f64>,
        path: &str,
    ) -> PyResult<()> {
        self.inner
            .match2file(&options.inner, ra.as_slice()?, dec.as_slice()?, path)
            .map_err(to_py_err)
    }

    /// Drain every entry's match buffer and return the matches, emptying
    /// the buffers.
    fn copy_matches(&mut self) -> Vec<Match> {
        let mut out = Vec::new();
        self.inner.copy_matches(&mut out);
        out.into_iter().map(Match::from).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "Matcher(nside={}, len={})",
            self.inner.hpix_nside(),
            self.inner.len()
        )
    }
}

/// Count the `\n` bytes in a match-file.
#[pyfunction]
fn count_lines(path: &str) -> PyResult<u64> {
    ::smatch::count_lines(path).map_err(to_py_err)
}

/// Load every match from a match-file written by `Matcher.match2file`.
#[pyfunction]
fn load_matches(path: &str) -> PyResult<Vec<Match>> {
    let n = ::smatch::count_lines(path).map_err(to_py_err)? as usize;
    let mut out = vec![
        MatchRecord {
            cat_ind: 0,
            input_ind: 0,
            cosdist: 0.0,
        };
        n
    ];
    ::smatch::load_matches(path, &mut out).map_err(to_py_err)?;
    Ok(out
        .into_iter()
        .map(|r| Match {
            cat_ind: r.cat_ind as usize,
            input_ind: r.input_ind as usize,
            cosdist: r.cosdist,
        })
        .collect())
}

/// Python module for the smatch spherical catalog matching engine.
#[pymodule]
fn smatch(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Match>()?;
    m.add_class::<MatchOptions>()?;
    m.add_class::<Matcher>()?;
    m.add_function(wrap_pyfunction!(count_lines, m)?)?;
    m.add_function(wrap_pyfunction!(load_matches, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
