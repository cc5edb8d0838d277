//! Validated per-call match configuration.

use crate::util::error::{SmatchError, SmatchResult};

/// Configuration for a single match call: how many matches to retain per
/// primary entry, and whether the streaming path should skip `cat_ind ==
/// input_ind` matches.
///
/// `maxmatch` is signed so a caller-facing layer (CLI flags, Python ints)
/// can hand a raw integer straight to [`MatchOptions::new`] and let
/// [`validate`](MatchOptions::validate) reject a negative value with a
/// structured error instead of panicking on the cast to `usize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchOptions {
    pub maxmatch: i64,
    pub self_match: bool,
}

impl MatchOptions {
    pub fn new(maxmatch: i64, self_match: bool) -> Self {
        Self {
            maxmatch,
            self_match,
        }
    }

    /// Unbounded match, `self_match` disabled.
    pub fn unbounded() -> Self {
        Self {
            maxmatch: 0,
            self_match: false,
        }
    }

    /// Checks that `maxmatch` is representable as a `usize` on this
    /// platform. Must be called before [`MatchOptions::maxmatch_usize`].
    pub fn validate(&self) -> SmatchResult<()> {
        if self.maxmatch < 0 {
            return Err(SmatchError::BadInput {
                reason: format!("maxmatch must be non-negative, got {}", self.maxmatch),
            });
        }
        if self.maxmatch as u64 > usize::MAX as u64 {
            return Err(SmatchError::BadInput {
                reason: format!("maxmatch {} overflows this platform's usize", self.maxmatch),
            });
        }
        Ok(())
    }

    pub(crate) fn maxmatch_usize(&self) -> usize {
        self.maxmatch as usize
    }
}
