//! HEALPix ring-scheme grid: equatorial↔pixel↔Cartesian conversion and
//! conservative disc (spherical cap) enumeration.
//!
//! The grid partitions the unit sphere into `Npix = 12 * Nside^2` pixels of
//! equal area, numbered along iso-latitude rings starting at the north pole
//! (the "ring scheme"). Ring boundaries and per-ring pixel counts follow the
//! classic HEALPix construction (Gorski et al. 2005): `Nside - 1` rings in
//! each polar cap with `4 * ir` pixels apiece, and `2 * Nside + 1` equatorial
//! rings with `4 * Nside` pixels apiece.

use crate::util::error::{SmatchError, SmatchResult};
use crate::util::math::eq_to_unit_vec;

/// A HEALPix grid at a fixed resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    nside: u64,
    npix: u64,
}

impl Grid {
    /// Creates a grid for the given `nside`. Fails if `nside < 1`.
    pub fn new(nside: u64) -> SmatchResult<Self> {
        if nside < 1 {
            return Err(SmatchError::BadInput {
                reason: format!("nside must be at least 1, got {nside}"),
            });
        }
        Ok(Self {
            nside,
            npix: 12 * nside * nside,
        })
    }

    /// The grid's `Nside` parameter.
    pub fn nside(&self) -> u64 {
        self.nside
    }

    /// The total number of pixels, `12 * Nside^2`.
    pub fn npix(&self) -> u64 {
        self.npix
    }

    /// The solid angle of a single pixel, in steradians.
    pub fn pixel_area(&self) -> f64 {
        4.0 * std::f64::consts::PI / self.npix as f64
    }

    /// Converts an equatorial coordinate (degrees) to a unit Cartesian vector.
    pub fn eq2xyz(&self, ra_deg: f64, dec_deg: f64) -> SmatchResult<(f64, f64, f64)> {
        eq_to_unit_vec(ra_deg, dec_deg).ok_or(SmatchError::BadCoordinate {
            context: "eq2xyz",
            ra: ra_deg,
            dec: dec_deg,
        })
    }

    /// Converts an equatorial coordinate (degrees) to a ring-scheme pixel id.
    pub fn eq2pix(&self, ra_deg: f64, dec_deg: f64) -> SmatchResult<u64> {
        let (x, y, z) = self
            .eq2xyz(ra_deg, dec_deg)
            .map_err(|_| SmatchError::BadCoordinate {
                context: "eq2pix",
                ra: ra_deg,
                dec: dec_deg,
            })?;
        Ok(self.xyz2pix(x, y, z))
    }

    /// Converts a unit vector to its containing ring-scheme pixel id.
    pub(crate) fn xyz2pix(&self, x: f64, y: f64, z: f64) -> u64 {
        let layout = RingLayout::new(self.nside);
        let ir = layout.ring_of_z(z.clamp(-1.0, 1.0));
        let phi = wrap_phi(y.atan2(x));
        let j = layout.phi_to_index(ir, phi);
        layout.ring_start(ir) + j
    }

    /// Enumerates, in ascending order with no duplicates, every pixel that
    /// conservatively covers the spherical cap of the given `radius_rad`
    /// around the unit vector `(x, y, z)`.
    ///
    /// The enumeration is built from every pixel whose centre lies within
    /// the cap plus a one-pixel-width safety margin, so that pixels merely
    /// sharing a boundary with an in-cap pixel are also included. This
    /// over-covers the cap rather than under-covering it: candidates are
    /// re-tested exactly during matching, so extra pixels are harmless but
    /// a missed pixel would silently drop valid matches.
    pub fn disc_intersect(&self, x: f64, y: f64, z: f64, radius_rad: f64) -> Vec<u64> {
        if radius_rad <= 0.0 {
            return vec![self.xyz2pix(x, y, z)];
        }
        if radius_rad >= std::f64::consts::PI {
            return (0..self.npix).collect();
        }

        let layout = RingLayout::new(self.nside);
        // Safety margin approximating one pixel's angular width, so pixels
        // whose centre falls just outside `radius_rad` but whose area still
        // overlaps the cap are captured too.
        let margin = 1.5 * std::f64::consts::PI / (2.0 * self.nside as f64);
        let radius_eff = (radius_rad + margin).min(std::f64::consts::PI);

        let theta0 = z.clamp(-1.0, 1.0).acos();
        let phi0 = wrap_phi(y.atan2(x));
        let cos_radius_eff = radius_eff.cos();

        let theta_lo = (theta0 - radius_eff).max(0.0);
        let theta_hi = (theta0 + radius_eff).min(std::f64::consts::PI);
        let z_hi = theta_lo.cos();
        let z_lo = theta_hi.cos();

        let ir_lo = layout.ring_of_z(z_hi).saturating_sub(1).max(1);
        let ir_hi = (layout.ring_of_z(z_lo) + 1).min(layout.num_rings());

        let mut out = Vec::new();
        for ir in ir_lo..=ir_hi {
            let theta_ring = layout.ring_theta(ir);
            let (sin_t0, cos_t0) = theta0.sin_cos();
            let (sin_tr, cos_tr) = theta_ring.sin_cos();
            let denom = sin_t0 * sin_tr;
            let delta_phi_max = if denom.abs() < 1e-15 {
                // Degenerate ring (at a pole): either fully inside or fully outside.
                if cos_t0 * cos_tr >= cos_radius_eff {
                    std::f64::consts::PI
                } else {
                    continue;
                }
            } else {
                let cos_delta = (cos_radius_eff - cos_t0 * cos_tr) / denom;
                if cos_delta >= 1.0 {
                    continue;
                } else if cos_delta <= -1.0 {
                    std::f64::consts::PI
                } else {
                    cos_delta.acos()
                }
            };

            let count = layout.ring_count(ir);
            for j in layout.phi_window(ir, phi0, delta_phi_max) {
                let phi_j = layout.phi_at(ir, j);
                let (sin_pj, cos_pj) = phi_j.sin_cos();
                let (sin_p0, cos_p0) = phi0.sin_cos();
                let cos_sep = cos_t0 * cos_tr + sin_t0 * sin_tr * (cos_p0 * cos_pj + sin_p0 * sin_pj);
                if cos_sep >= cos_radius_eff {
                    out.push(layout.ring_start(ir) + (j % count));
                }
            }
        }

        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Wraps an angle (radians) into `[0, 2*pi)`.
fn wrap_phi(phi: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let wrapped = phi % two_pi;
    if wrapped < 0.0 {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Ring geometry for a given `Nside`: per-ring pixel counts, start offsets,
/// and the colatitude/phi of each ring's pixel centres.
///
/// Rings are numbered `1..=4*Nside-1` from the north pole. `eq2pix` and
/// `disc_intersect` both route through this type so that forward
/// (coordinate to pixel) and enumeration (pixel to coordinate range) stay
/// mutually consistent.
struct RingLayout {
    nside: u64,
}

impl RingLayout {
    fn new(nside: u64) -> Self {
        Self { nside }
    }

    fn num_rings(&self) -> u64 {
        4 * self.nside - 1
    }

    fn ncap(&self) -> u64 {
        2 * self.nside * (self.nside - 1)
    }

    /// Number of pixels in ring `ir` (1-based).
    fn ring_count(&self, ir: u64) -> u64 {
        let n = self.nside;
        if ir < n {
            4 * ir
        } else if ir <= 3 * n {
            4 * n
        } else {
            4 * (4 * n - ir)
        }
    }

    /// 0-based global pixel id of the first pixel in ring `ir`.
    fn ring_start(&self, ir: u64) -> u64 {
        let n = self.nside;
        if ir < n {
            2 * ir * (ir.saturating_sub(1))
        } else if ir <= 3 * n {
            self.ncap() + (ir - n) * 4 * n
        } else {
            let r_s = 4 * n - ir;
            let npix = 12 * n * n;
            npix - 2 * r_s * (r_s + 1)
        }
    }

    /// Colatitude (radians) of ring `ir`'s pixel centres.
    fn ring_theta(&self, ir: u64) -> f64 {
        let n = self.nside as f64;
        let irf = ir as f64;
        if (ir as u64) < self.nside {
            (1.0 - irf * irf / (3.0 * n * n)).acos()
        } else if ir <= 3 * self.nside {
            ((2.0 * n - irf) / (1.5 * n)).acos()
        } else {
            let r_s = (4 * self.nside - ir) as f64;
            (-(1.0 - r_s * r_s / (3.0 * n * n))).acos()
        }
    }

    /// Angular step and phase offset of pixel centres within ring `ir`.
    fn ring_step_offset(&self, ir: u64) -> (f64, f64) {
        let n = self.nside;
        let half_pi = std::f64::consts::FRAC_PI_2;
        if ir < n {
            (half_pi / ir as f64, 0.5)
        } else if ir <= 3 * n {
            let fodd = if (ir + n) % 2 == 1 { 1.0 } else { 0.5 };
            (half_pi / n as f64, fodd)
        } else {
            let r_s = 4 * n - ir;
            (half_pi / r_s as f64, 0.5)
        }
    }

    /// Phi (radians, `[0, 2*pi)`) of pixel `j` (0-based) in ring `ir`.
    fn phi_at(&self, ir: u64, j: u64) -> f64 {
        let (step, fodd) = self.ring_step_offset(ir);
        wrap_phi((j as f64 + fodd) * step)
    }

    /// Ring index (1-based, clamped to `[1, num_rings]`) whose centre
    /// colatitude is closest to `acos(z)`.
    fn ring_of_z(&self, z: f64) -> u64 {
        let n = self.nside as f64;
        let za = z.abs();
        let ir = if za <= 2.0 / 3.0 {
            (2.0 * n - 1.5 * n * z).round()
        } else {
            let r = (n * (3.0 * (1.0 - za)).max(0.0).sqrt()).round();
            let r = r.clamp(1.0, n);
            if z > 0.0 {
                r
            } else {
                4.0 * n - r
            }
        };
        (ir.round() as i64).clamp(1, self.num_rings() as i64) as u64
    }

    /// Maps `phi` (radians) to the nearest pixel index (0-based, unwrapped
    /// modulo the ring's pixel count) within ring `ir`.
    fn phi_to_index(&self, ir: u64, phi: f64) -> u64 {
        let (step, fodd) = self.ring_step_offset(ir);
        let count = self.ring_count(ir);
        let raw = (phi / step - fodd + 0.5).floor();
        let j = raw.rem_euclid(count as f64);
        j as u64
    }

    /// Iterates the (0-based, possibly `>= ring_count`) pixel indices within
    /// `delta_phi_max` of `phi0` on ring `ir`; callers reduce mod
    /// `ring_count` before use.
    fn phi_window(&self, ir: u64, phi0: f64, delta_phi_max: f64) -> Vec<u64> {
        let count = self.ring_count(ir);
        if delta_phi_max >= std::f64::consts::PI - 1e-12 {
            return (0..count).collect();
        }
        let (step, fodd) = self.ring_step_offset(ir);
        let center = (phi0 / step - fodd + 0.5).floor();
        let half_width = (delta_phi_max / step).ceil() as i64 + 1;
        let mut out = Vec::with_capacity((2 * half_width + 1) as usize);
        for d in -half_width..=half_width {
            let j = (center as i64 + d).rem_euclid(count as i64);
            out.push(j as u64);
        }
        out
    }
}
