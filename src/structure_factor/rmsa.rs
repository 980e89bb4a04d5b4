/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Rescaled mean spherical approximation (RMSA) for screened Coulomb interactions
//!
//! The pair potential is a hard core of diameter σ = 2R plus a Yukawa tail
//! `U(x)/kT = γ exp(-k(x-1))/x` for `x = r/σ > 1` with `k = σ/scl`.
//!
//! The analytic MSA solution of Hayter and Penfold reduces to a quartic in the
//! coefficient F. All roots of the quartic are evaluated and the root whose pair
//! correlation vanishes inside the hard core is taken. If the contact value g(1+)
//! is negative the volume fraction is rescaled until g(1+) = 0 (Gillan condition).

use super::common::{sq_result, validate_length, validate_q, validate_volume_fraction, Concentration};
use super::errors::{Result, StructureFactorError};
use super::pair_correlation::radial_distribution_hs;
use crate::data::DataArray;
use crate::utils::math::polynomial_roots;
use log::{debug, warn};
use num_complex::Complex64;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Rescaled screening constant above which the asymptotic large k solution is used
const LARGE_K: f64 = 15.0;
/// Above this k the sinh and cosh terms of S(q) cancel and are dropped
const ASYMPTOTIC_K: f64 = 25.0;
/// Upper limit of the dimensionless screening constant
const MAX_K: f64 = 200.0;
/// Relative accuracy of the Gillan rescaling
const RESCALE_ACCURACY: f64 = 5e-6;
/// Maximum rescaling iterations
const RESCALE_MAX_ITER: usize = 80;
/// Maximum rescaling iterations of the classic algorithm
const HP_RESCALE_MAX_ITER: usize = 40;
/// Relative accuracy of the Newton polish of the classic algorithm
const NEWTON_ACCURACY: f64 = 1e-6;
/// Maximum Newton iterations of the classic algorithm
const NEWTON_MAX_ITER: usize = 40;
/// Largest accepted rescaled volume fraction
const MAX_RESCALED_ETA: f64 = 0.64;
/// Step of the contact grid in diameter units
const CONTACT_STEP: f64 = 0.05;
/// Number of points of the contact grid
const CONTACT_POINTS: usize = 8192;
/// A root is accepted if g(r) just inside the core stays below this value
const MAX_CORE_G: f64 = 0.1;

/// Grid in qσ used to judge the roots by the sine transform of S(q)-1
static CONTACT_GRID: Lazy<Vec<f64>> =
    Lazy::new(|| (0..CONTACT_POINTS).map(|i| i as f64 * CONTACT_STEP).collect());

/// Distance inside the core where g(r) has to vanish, the last grid multiple below one
fn core_distance() -> f64 {
    (1.0 / CONTACT_STEP).floor() * CONTACT_STEP
}

/// How the physical root of the quartic is found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootSelection {
    /// All roots, the one with vanishing g(r) inside the core wins
    #[default]
    Full,
    /// Classic estimate plus Newton polish, kept for comparison
    HayterPenfold,
}

/// Options of the RMSA solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmsaConfig {
    /// Strategy to pick the root of the quartic
    pub root_selection: RootSelection,
}

impl Default for RmsaConfig {
    fn default() -> Self {
        Self {
            root_selection: RootSelection::Full,
        }
    }
}

impl RmsaConfig {
    /// Parse the options from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StructureFactorError::InvalidParameter(e.to_string()))
    }
}

/// Reasons why no RMSA solution was found, with the negative `ir` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmsaFailure {
    /// Newton iteration of the rescaled volume fraction did not converge
    RescalingDiverged,
    /// Newton polish of the root did not converge
    NewtonDiverged,
    /// Rescaled volume fraction outside (η, 0.64] or contact value still negative
    CannotRescale,
    /// No root gives g(r) close to zero inside the core
    NoPhysicalRoot,
    /// Coefficients overflow
    Overflow,
}

impl RmsaFailure {
    /// Negative error code stored in the `ir` attribute
    pub fn code(self) -> i32 {
        match self {
            RmsaFailure::RescalingDiverged => -1,
            RmsaFailure::NewtonDiverged => -2,
            RmsaFailure::CannotRescale => -3,
            RmsaFailure::NoPhysicalRoot => -4,
            RmsaFailure::Overflow => -5,
        }
    }

    /// Human readable reason
    pub fn message(self) -> &'static str {
        match self {
            RmsaFailure::RescalingDiverged => "Newton iteration of the rescaled volume fraction did not converge",
            RmsaFailure::NewtonDiverged => "Newton iteration of the quartic root did not converge",
            RmsaFailure::CannotRescale => "cannot rescale to g(1+) >= 0",
            RmsaFailure::NoPhysicalRoot => "no physical root with g(r<1) < 0.1",
            RmsaFailure::Overflow => "MSA coefficients overflow",
        }
    }
}

impl From<RmsaFailure> for StructureFactorError {
    fn from(failure: RmsaFailure) -> Self {
        let message = failure.message().to_string();
        match failure {
            RmsaFailure::NoPhysicalRoot => StructureFactorError::NoPhysicalRoot(message),
            RmsaFailure::Overflow => StructureFactorError::NumericOverflow(message),
            RmsaFailure::RescalingDiverged | RmsaFailure::CannotRescale | RmsaFailure::NewtonDiverged => {
                StructureFactorError::NoRescaling(message)
            }
        }
    }
}

type Solve<T> = std::result::Result<T, RmsaFailure>;

/// Coefficients of the (rescaled) MSA solution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RmsaCoefficients {
    /// Number of rescaling or Newton iterations, 0 for the plain MSA solution
    pub ir: i32,
    /// Volume fraction
    pub eta: f64,
    /// Contact potential γ exp(-k) in kT
    pub gek: f64,
    /// Dimensionless screening constant k = 2R/scl
    pub ak: f64,
    /// Coupling 2η^(1/3) gek exp(k - k/η^(1/3))
    pub gamk: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub f: f64,
    pub u: f64,
    pub v: f64,
    /// Rescaled volume fraction
    pub seta: f64,
    /// Rescaled contact potential
    pub sgek: f64,
    /// Rescaled screening constant
    pub sak: f64,
    /// Rescaling factor (η/seta)^(1/3) of the diameter
    pub scal: f64,
    /// Contact value g(1+)
    pub g1: f64,
}

impl RmsaCoefficients {
    /// Solve for the coefficients
    ///
    /// # Arguments
    ///
    /// * `r` - Hard core radius in nm
    /// * `scl` - Screening length in nm, non positive values give pure hard spheres
    /// * `gamma` - Contact potential in kT
    /// * `eta` - Volume fraction
    /// * `selection` - Root selection strategy
    pub fn solve(r: f64, scl: f64, gamma: f64, eta: f64, selection: RootSelection) -> Result<Self> {
        Ok(solve_coefficients(r, scl, gamma, eta, selection)?)
    }

    /// S(q) at dimensionless `qσ` values
    pub fn structure_factor(&self, q_sigma: &[f64]) -> Vec<f64> {
        msa_structure_factor(q_sigma, self.scal, self.seta, self.sak, self.sgek, &self.abcf())
    }

    fn abcf(&self) -> Abcf {
        Abcf {
            a: self.a,
            b: self.b,
            c: self.c,
            f: self.f,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Abcf {
    a: f64,
    b: f64,
    c: f64,
    f: f64,
}

/// Hayter-Penfold S(q) for the analytic MSA coefficients
fn msa_structure_factor(q_sigma: &[f64], scal: f64, eta: f64, ak: f64, gek: f64, k: &Abcf) -> Vec<f64> {
    let (sinh_k, cosh_k) = if ak > ASYMPTOTIC_K {
        (0.0, 0.0)
    } else {
        (ak.sinh(), ak.cosh())
    };
    q_sigma
        .iter()
        .map(|&qs| {
            if qs == 0.0 {
                return -1.0 / k.a;
            }
            let x = qs / scal;
            let (s, c) = x.sin_cos();
            let x2 = x * x;
            let x3 = x2 * x;
            let x4 = x3 * x;
            let kk = 1.0 / x / (x2 + ak * ak);
            let a_k = k.a * (s - x * c) / x3
                + k.b * ((2.0 / x2 - 1.0) * x * c + 2.0 * s - 2.0 / x) / x3
                + k.a * eta * (24.0 / x3 + 4.0 * (1.0 - 6.0 / x2) * s - (1.0 - 12.0 / x2 + 24.0 / x4) * x * c)
                    / 2.0
                    / x3
                + k.c * (ak * cosh_k * s - x * sinh_k * c) * kk
                + k.f * (ak * sinh_k * s - x * (cosh_k * c - 1.0)) * kk
                + k.f * (c - 1.0) / x2
                - gek * (ak * s + x * c) * kk;
            1.0 / (1.0 - 24.0 * eta * a_k)
        })
        .collect()
}

/// Stage of the coefficient calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Solve the quartic, return g(1+)
    Solve,
    /// Return the function whose zero is the Gillan volume fraction
    GillanFunction,
    /// Solve near the Gillan condition with the Percus-Williams estimate
    NearGillan,
    /// Return g(1+) at the Gillan volume fraction
    GillanContact,
}

/// Unscaled input of the coefficient calculation
#[derive(Debug, Clone, Copy)]
struct Base {
    eta: f64,
    gek: f64,
    ak: f64,
}

/// Coefficients for one trial volume fraction
#[derive(Debug, Clone, Copy)]
struct Trial {
    fval: f64,
    abcf: Abcf,
    u: f64,
    v: f64,
    g1: f64,
    seta: f64,
    sgek: f64,
    sak: f64,
    scal: f64,
    iterations: usize,
}

/// Coefficients for the trial volume fraction `evar`
fn sqfun(stage: Stage, evar: f64, base: &Base, selection: RootSelection) -> Solve<Trial> {
    let scal = (base.eta / evar).cbrt();
    let sak = base.ak / scal;
    let val = if base.gek.abs() > 1e-9 { base.gek } else { 1e-9 };
    let sgek = val * scal * (base.ak - sak).exp();
    let eta = evar;
    let gek = sgek;
    let ak = sak;

    let eta2 = eta * eta;
    let eta3 = eta2 * eta;
    let e12 = 12.0 * eta;
    let e24 = e12 + e12;
    let ak2 = ak * ak;
    let ak1 = 1.0 + ak;
    let dak2 = 1.0 / ak2;
    let dak4 = dak2 * dak2;
    let d = 1.0 - eta;
    let d2 = d * d;
    let dak = d / ak;
    let dd2 = 1.0 / d2;
    let dd4 = dd2 * dd2;
    let dd45 = dd4 * 0.2;
    let eta3d = 3.0 * eta;
    let eta6d = eta3d + eta3d;
    let eta32 = eta3 + eta3;
    let eta2d = eta + 2.0;
    let eta2d2 = eta2d * eta2d;
    let eta21 = 2.0 * eta + 1.0;
    let eta22 = eta21 * eta21;

    let al1 = -eta21 * dak;
    let al2 = (14.0 * eta2 - 4.0 * eta - 1.0) * dak2;
    let al3 = 36.0 * eta2 * dak4;

    let b1 = -(eta2 + 7.0 * eta + 1.0) * dak;
    let b2 = 9.0 * eta * (eta2 + 4.0 * eta - 2.0) * dak2;
    let b3 = 12.0 * eta * (2.0 * eta2 + 8.0 * eta - 1.0) * dak4;

    let n1 = -(eta3 + 3.0 * eta2 + 45.0 * eta + 5.0) * dak;
    let n2 = (eta32 + 3.0 * eta2 + 42.0 * eta - 20.0) * dak2;
    let n3 = (eta32 + 30.0 * eta - 5.0) * dak4;
    let n4 = n1 + 24.0 * eta * ak * n3;
    let n5 = eta6d * (n2 + 4.0 * n3);

    let f1 = eta6d / ak;
    let f2 = d - 12.0 * eta * dak2;
    let ff1 = f1 * f1;
    let ff2 = f2 * f2;
    let ff = ff1 + ff2;
    let f1f2 = 2.0 * f1 * f2;

    let t1 = (eta + 5.0) / (5.0 * ak);
    let t2 = eta2d * dak2;
    let t3 = -12.0 * eta * gek * (t1 + t2);
    let t4 = eta3d * ak2 * (t1 * t1 - t2 * t2);
    let t5 = eta3d * (eta + 8.0) * 0.1 - 2.0 * eta22 * dak2;

    let a1 = (e24 * gek * (al1 + al2 + ak1 * al3) - eta22) * dd4;
    let bb1 = (1.5 * eta * eta2d2 - 12.0 * eta * gek * (b1 + b2 + ak1 * b3)) * dd4;
    let v1 = (eta21 * (eta2 - 2.0 * eta + 10.0) * 0.25 - gek * (n4 + n5)) * dd45;
    let p1 = (gek * (ff1 + ff2 - f1f2) - 0.5 * eta2d) * dd2;
    let tt1 = t3 + t4 * a1 + t5 * bb1;

    let v3_base =
        (eta3 - 6.0 * eta2 + 5.0) * d - eta6d * (2.0 * eta3 - 3.0 * eta2 + 18.0 * eta + 10.0) * dak2 + e24 * n3;

    if sak > LARGE_K && stage == Stage::Solve {
        // cosh = sinh, the quartic degenerates to a linear equation in F
        let a3 = e24 * (eta22 * dak2 - 0.5 * d2 - al3) * dd4;
        let bb3 = e12 * (0.5 * d2 * eta2d - eta3d * eta2d2 * dak2 + b3) * dd4;
        let v3 = v3_base * dd45;
        let p3 = (ff1 - ff2) * dd2;
        let tt3 = t4 * a3 + t5 * bb3 + e12 * t2 - 0.4 * eta * (eta + 10.0) - 1.0;
        let m6 = tt3 * a3 - e12 * v3 * v3;
        let m5 = tt1 * a3 + a1 * tt3 - e24 * v1 * v3;
        let m4 = tt1 * a1 - e12 * v1 * v1;
        let l6 = e12 * p3 * p3;
        let l5 = e24 * p1 * p3 - 2.0 * bb3 - ak2;
        let l4 = e12 * p1 * p1 - 2.0 * bb1;
        let w56 = m5 * l6 - l5 * m6;
        let w46 = m4 * l6 - l4 * m6;
        let fa = -w46 / w56;
        let ca = -fa;
        let g1 = -(p1 + p3 * fa);
        // exp(-k) form of u avoids overflow of exp(k)
        let u = ak * ca / e24 / gek * (-ak).exp() - 1.0 / ak2;
        let trial = Trial {
            fval: if g1 > 1e-3 { g1 } else { 0.0 },
            abcf: Abcf {
                a: a1 + a3 * fa,
                b: bb1 + bb3 * fa,
                c: ca,
                f: fa,
            },
            u,
            v: v1 + v3 * fa,
            g1,
            seta: evar,
            sgek,
            sak,
            scal,
            iterations: 0,
        };
        return check_finite(trial);
    }

    let sk = ak.sinh();
    let ck = ak.cosh();
    let ckma = ck - 1.0 - ak * sk;
    let skma = sk - ak * ck;
    let a2 = e24 * (al3 * skma + al2 * sk - al1 * ck) * dd4;
    let a3 = e24 * (eta22 * dak2 - 0.5 * d2 + al3 * ckma - al1 * sk + al2 * ck) * dd4;
    let bb2 = e12 * (-b3 * skma - b2 * sk + b1 * ck) * dd4;
    let bb3 = e12 * (0.5 * d2 * eta2d - eta3d * eta2d2 * dak2 - b3 * ckma + b1 * sk - b2 * ck) * dd4;
    let v2 = (n4 * ck - n5 * sk) * dd45;
    let v3 = (v3_base + n4 * sk - n5 * ck) * dd45;
    let p2 = (ff * sk + f1f2 * ck) * dd2;
    let p3 = (ff * ck + f1f2 * sk + ff1 - ff2) * dd2;

    let tt2 = t4 * a2 + t5 * bb2 + e12 * (t1 * ck - t2 * sk);
    let tt3 = t4 * a3 + t5 * bb3 + e12 * (t1 * sk - t2 * (ck - 1.0)) - 0.4 * eta * (eta + 10.0) - 1.0;

    let m1 = tt2 * a2 - e12 * v2 * v2;
    let m2 = tt1 * a2 + tt2 * a1 - e24 * v1 * v2;
    let m3 = tt2 * a3 + tt3 * a2 - e24 * v2 * v3;
    let m4 = tt1 * a1 - e12 * v1 * v1;
    let m5 = tt1 * a3 + tt3 * a1 - e24 * v1 * v3;
    let m6 = tt3 * a3 - e12 * v3 * v3;

    let abcf_of = |ca: f64, fa: f64| Abcf {
        a: a1 + a2 * ca + a3 * fa,
        b: bb1 + bb2 * ca + bb3 * fa,
        c: ca,
        f: fa,
    };

    let (fval, ca, fa, g1, iterations) = match stage {
        Stage::Solve | Stage::NearGillan => {
            let l1 = e12 * p2 * p2;
            let l2 = e24 * p1 * p2 - 2.0 * bb2;
            let l3 = e24 * p2 * p3;
            let l4 = e12 * p1 * p1 - 2.0 * bb1;
            let l5 = e24 * p1 * p3 - 2.0 * bb3 - ak2;
            let l6 = e12 * p3 * p3;

            let w16 = m1 * l6 - l1 * m6;
            let w15 = m1 * l5 - l1 * m5;
            let w14 = m1 * l4 - l1 * m4;
            let w13 = m1 * l3 - l1 * m3;
            let w12 = m1 * l2 - l1 * m2;
            let w26 = m2 * l6 - l2 * m6;
            let w25 = m2 * l5 - l2 * m5;
            let w24 = m2 * l4 - l2 * m4;
            let w36 = m3 * l6 - l3 * m6;
            let w35 = m3 * l5 - l3 * m5;
            let w34 = m3 * l4 - l3 * m4;
            let w32 = m3 * l2 - l3 * m2;
            let w46 = m4 * l6 - l4 * m6;
            let w56 = m5 * l6 - l5 * m6;

            // quartic w4 F⁴ + w3 F³ + w2 F² + w1 F + w0
            let w4 = w16 * w16 - w13 * w36;
            let w3 = 2.0 * w16 * w15 - w13 * (w35 + w26) - w12 * w36;
            let w2 = w15 * w15 + 2.0 * w16 * w14 - w13 * (w34 + w25) - w12 * (w35 + w26);
            let w1 = 2.0 * w15 * w14 - w13 * w24 - w12 * (w34 + w25);
            let w0 = w14 * w14 - w12 * w24;
            let quartic = [w0, w1, w2, w3, w4];
            if quartic.iter().any(|w| !w.is_finite()) {
                return Err(RmsaFailure::Overflow);
            }
            let c_of = |fa: f64| -(w16 * fa * fa + w15 * fa + w14) / (w13 * fa + w12);

            let (fa, iterations) = match selection {
                RootSelection::Full => {
                    let g_core = |fa: f64| {
                        let coeffs = abcf_of(c_of(fa), fa);
                        let s = msa_structure_factor(&CONTACT_GRID, scal, eta, ak, gek, &coeffs);
                        radial_distribution_hs(&CONTACT_GRID, &s, eta, &[core_distance()])[0]
                    };
                    let roots = polynomial_roots(&quartic).map_err(|_| RmsaFailure::Overflow)?;
                    let (fa, g) = select_physical_root(&roots, g_core)?;
                    debug!("MSA root {fa:.6e} with g(r<1) = {g:.3e}");
                    (fa, 0)
                }
                RootSelection::HayterPenfold => {
                    let estimate = if stage == Stage::Solve {
                        (w14 - w34 - w46) / (w12 - w15 + w35 - w26 + w56 - w32)
                    } else {
                        let contact_estimate = |g1: f64| {
                            let pg = p1 + g1;
                            let ca = -(ak2 * pg + 2.0 * (bb3 * pg - bb1 * p3) + e12 * g1 * g1 * p3)
                                / (ak2 * p2 + 2.0 * (bb3 * p2 - bb2 * p3));
                            -(pg + p2 * ca) / p3
                        };
                        let mut g1 = 0.5 * eta2d * dd2 * (-gek).exp();
                        if gek > 0.0 && sgek <= 2.0 && sak <= 1.0 {
                            // Percus-Williams estimate for weak coupling
                            let pwk = (e24 * gek * ak.exp()).sqrt();
                            let qpw = (1.0 - (1.0 + 2.0 * d2 * d * pwk / eta22).sqrt()) * eta21 / d;
                            g1 = -qpw * qpw / e24 + 0.5 * eta2d * dd2;
                        }
                        contact_estimate(g1)
                    };
                    newton_root(&quartic, estimate)?
                }
            };
            let ca = c_of(fa);
            let g1 = -(p1 + p2 * ca + p3 * fa);
            (if g1.abs() > 1e-3 { g1 } else { 0.0 }, ca, fa, g1, iterations)
        }
        Stage::GillanFunction | Stage::GillanContact => {
            let ca = -(ak2 * p1 + 2.0 * (bb3 * p1 - bb1 * p3)) / (ak2 * p2 + 2.0 * (bb3 * p2 - bb2 * p3));
            let fa = -(p1 + p2 * ca) / p3;
            let g1 = -(p1 + p2 * ca + p3 * fa);
            let fval = if stage == Stage::GillanFunction {
                m1 * ca * ca + (m2 + m3 * fa) * ca + m4 + m5 * fa + m6 * fa * fa
            } else {
                g1
            };
            (fval, ca, fa, g1, 0)
        }
    };

    let abcf = abcf_of(ca, fa);
    let g24 = e24 * gek * ak.exp();
    let trial = Trial {
        fval,
        abcf,
        u: (ak2 * ak * ca - g24) / (ak2 * g24),
        v: (v1 + v2 * ca + v3 * fa) / abcf.a,
        g1,
        seta: evar,
        sgek,
        sak,
        scal,
        iterations,
    };
    check_finite(trial)
}

fn check_finite(trial: Trial) -> Solve<Trial> {
    let Abcf { a, b, c, f } = trial.abcf;
    if [a, b, c, f, trial.g1].iter().all(|v| v.is_finite()) {
        Ok(trial)
    } else {
        Err(RmsaFailure::Overflow)
    }
}

/// Sorted real roots, nearly real complex pairs count with their real part
fn real_roots(roots: &[Complex64]) -> Vec<f64> {
    let nearly_real = roots.iter().all(|z| (z.im / z.re).abs() < 1e-3);
    let mut values: Vec<f64> = roots
        .iter()
        .filter(|z| nearly_real || z.im.abs() <= 1e-10 * z.re.abs().max(1.0))
        .map(|z| z.re)
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Real root of the quartic whose g(r) vanishes inside the core
fn select_physical_root<G>(roots: &[Complex64], g_core: G) -> Solve<(f64, f64)>
where
    G: Fn(f64) -> f64,
{
    pick_root(&real_roots(roots), g_core).ok_or(RmsaFailure::NoPhysicalRoot)
}

/// Candidate with g(r) inside the core closest to zero
///
/// None if there is no candidate or every candidate has g(r) above the limit.
fn pick_root<G>(candidates: &[f64], g_core: G) -> Option<(f64, f64)>
where
    G: Fn(f64) -> f64,
{
    let scored: Vec<(f64, f64)> = candidates.iter().map(|&fa| (fa, g_core(fa))).collect();
    let lowest = scored.iter().map(|(_, g)| *g).fold(f64::INFINITY, f64::min);
    if lowest > MAX_CORE_G {
        return None;
    }
    scored.into_iter().min_by(|x, y| x.1.abs().total_cmp(&y.1.abs()))
}

/// Newton polish of a quartic root starting at `estimate`
fn newton_root(w: &[f64; 5], estimate: f64) -> Solve<(f64, usize)> {
    let mut next = estimate;
    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > NEWTON_MAX_ITER {
            return Err(RmsaFailure::NewtonDiverged);
        }
        let fa = next;
        let fun = w[0] + (w[1] + (w[2] + (w[3] + w[4] * fa) * fa) * fa) * fa;
        let fund = w[1] + (2.0 * w[2] + (3.0 * w[3] + 4.0 * w[4] * fa) * fa) * fa;
        next = fa - fun / fund;
        if fa == 0.0 {
            continue;
        }
        if ((next - fa) / fa).abs() < NEWTON_ACCURACY {
            return Ok((next, iterations));
        }
    }
}

/// Secant iteration for the volume fraction that satisfies the Gillan condition
fn gillan_volume_fraction(base: &Base, selection: RootSelection, max_iter: usize) -> Solve<(f64, usize)> {
    let mut seta = base.eta.min(0.2);
    let mut j = 0;
    loop {
        j += 1;
        if j > max_iter {
            return Err(RmsaFailure::RescalingDiverged);
        }
        if seta <= 0.0 {
            seta = base.eta / j as f64;
        }
        if seta > 0.6 {
            seta = 0.35 / j as f64;
        }
        let e1 = seta;
        let f1 = sqfun(Stage::GillanFunction, e1, base, selection)?.fval;
        let e2 = 1.01 * e1;
        let f2 = sqfun(Stage::GillanFunction, e2, base, selection)?.fval;
        let e2 = e1 - (e2 - e1) * f1 / (f2 - f1);
        seta = e2;
        if ((e2 - e1) / e1).abs() < RESCALE_ACCURACY {
            break;
        }
    }
    debug!("rescaling after {j} iterations scales the volume fraction by {:.4}", seta / base.eta);
    Ok((seta, j))
}

/// Full root search, rescaling whenever g(1+) < 0
fn coefficients_full(base: &Base) -> Solve<(Trial, usize)> {
    let first = sqfun(Stage::Solve, base.eta, base, RootSelection::Full)?;
    if first.g1 >= 0.0 {
        return Ok((first, 0));
    }
    let (seta, j) = gillan_volume_fraction(base, RootSelection::Full, RESCALE_MAX_ITER)?;
    let trial = sqfun(Stage::GillanContact, seta, base, RootSelection::Full)?;
    if seta > MAX_RESCALED_ETA || seta < base.eta {
        return Err(RmsaFailure::CannotRescale);
    }
    Ok((trial, j))
}

/// Classic Hayter-Penfold conditions for rescaling
fn coefficients_hayter_penfold(base: &Base, gamk: f64) -> Solve<(Trial, usize)> {
    let large_k = base.ak >= 1.0 + 8.0 * base.eta;
    if large_k {
        let first = sqfun(Stage::Solve, base.eta, base, RootSelection::HayterPenfold)?;
        if first.g1 >= 0.0 {
            return Ok((first, first.iterations));
        }
    }
    let mut ir = 0;
    if large_k || gamk >= 0.15 {
        let (seta, j) = gillan_volume_fraction(base, RootSelection::HayterPenfold, HP_RESCALE_MAX_ITER)?;
        let trial = sqfun(Stage::GillanContact, seta, base, RootSelection::HayterPenfold)?;
        ir = j;
        if large_k || seta >= base.eta {
            return Ok((trial, ir));
        }
    }
    let trial = sqfun(Stage::NearGillan, base.eta, base, RootSelection::HayterPenfold)?;
    if trial.g1 < 0.0 {
        return Err(RmsaFailure::CannotRescale);
    }
    Ok((trial, ir + trial.iterations))
}

/// Dimensionless screening constant, contact potential and coupling
fn dimensionless(r: f64, scl: f64, gamma: f64, eta: f64) -> (f64, f64, f64, f64) {
    let eta = if eta <= 0.0 { 1e-10 } else { eta };
    let ak = if scl <= 0.0 { 1e20 } else { 2.0 * r / scl };
    let ak = ak.min(MAX_K);
    let gek = gamma * (-ak).exp();
    let cbrt_eta = eta.cbrt();
    let gamk = 2.0 * cbrt_eta * gek * (ak - ak / cbrt_eta).exp();
    (eta, ak, gek, gamk)
}

fn solve_coefficients(r: f64, scl: f64, gamma: f64, eta: f64, selection: RootSelection) -> Solve<RmsaCoefficients> {
    let (eta, ak, gek, gamk) = dimensionless(r, scl, gamma, eta);
    let base = Base { eta, gek, ak };
    let (trial, ir) = match selection {
        RootSelection::Full => coefficients_full(&base)?,
        RootSelection::HayterPenfold => coefficients_hayter_penfold(&base, gamk)?,
    };
    Ok(RmsaCoefficients {
        ir: ir as i32,
        eta,
        gek,
        ak,
        gamk,
        a: trial.abcf.a,
        b: trial.abcf.b,
        c: trial.abcf.c,
        f: trial.abcf.f,
        u: trial.u,
        v: trial.v,
        seta: trial.seta,
        sgek: trial.sgek,
        sak: trial.sak,
        scal: trial.scal,
        g1: trial.g1,
    })
}

/// Structure factor of charged spheres in the rescaled mean spherical approximation
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `r` - Hard core radius in nm
/// * `scl` - Screening length in nm, non positive values give hard spheres
/// * `gamma` - Contact potential in kT, negative values are attractive
/// * `concentration` - Volume fraction or molarity
/// * `config` - Solver options
///
/// # Returns
///
/// Columns `q`, `Sq`. Numeric failures return an all zero S(q) with a negative `ir`
/// attribute and an `error` message instead of an error.
pub fn rmsa(
    q: &[f64],
    r: f64,
    scl: f64,
    gamma: f64,
    concentration: Concentration,
    config: &RmsaConfig,
) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    let (eta, molarity) = concentration.resolve(r)?;
    validate_volume_fraction(eta)?;

    let mut result = match solve_coefficients(r, scl, gamma, eta, config.root_selection) {
        Ok(coefficients) => {
            let q_sigma: Vec<f64> = q.iter().map(|qq| 2.0 * r * qq).collect();
            let mut result = sq_result(q, coefficients.structure_factor(&q_sigma))?;
            pin_coefficients(&mut result, &coefficients);
            result
        }
        Err(failure) => {
            warn!("RMSA failed for R={r}, scl={scl}, gamma={gamma}, eta={eta}: {}", failure.message());
            let mut result = sq_result(q, vec![0.0; q.len()])?;
            result.set_attr("ir", failure.code());
            result.set_attr("error", failure.message());
            result
        }
    };
    result.set_attr("volumeFraction", eta);
    result.set_attr("volume_fraction", eta);
    result.set_attr("molarity", molarity);
    result.set_attr("screeningLength", scl);
    result.set_attr("gamma", gamma);
    Ok(result)
}

fn pin_coefficients(result: &mut DataArray, k: &RmsaCoefficients) {
    result.set_attr("rescaledVolumeFraction", k.seta);
    result.set_attr("rescaled_volume_fraction", k.seta);
    result.set_attr("contactpotential", k.gek);
    result.set_attr("gamma_exp_minus_k", k.gek);
    result.set_attr("kappa_sigma", k.ak);
    result.set_attr("S0", -1.0 / k.a);
    result.set_attr("scalingfactor", k.scal);
    result.set_attr("scaling_factor", k.scal);
    result.set_attr("g1", k.g1);
    result.set_attr("g_plus_one", k.g1);
    result.set_attr("ir", k.ir);
    for (name, value) in [
        ("a", k.a),
        ("b", k.b),
        ("c", k.c),
        ("f", k.f),
        ("u", k.u),
        ("v", k.v),
        ("gamk", k.gamk),
        ("seta", k.seta),
        ("sgek", k.sgek),
        ("sak", k.sak),
        ("scal", k.scal),
    ] {
        result.set_attr(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure_factor::percus_yevick::percus_yevick_values;
    use crate::utils::math::linspace;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(2.0, 0.1)]
    #[case(3.0, 0.3)]
    #[case(5.0, 0.4)]
    fn test_hard_sphere_limit(#[case] radius: f64, #[case] eta: f64) {
        let q = linspace(0.05, 3.0, 60);
        let result = rmsa(&q, radius, 1.0, 0.0, eta.into(), &RmsaConfig::default()).unwrap();
        let sq = result.column("Sq").unwrap();
        let py = percus_yevick_values(&q, radius, eta);
        for (s, p) in sq.iter().zip(py.iter()) {
            assert!((s - p).abs() < 1e-3, "RMSA {s} vs PY {p}");
        }
    }

    #[test]
    fn test_repulsion_lowers_low_q_structure_factor() {
        let result = rmsa(&[0.5], 3.1, 2.0, 1.1, 0.3.into(), &RmsaConfig::default()).unwrap();
        let s = result.column("Sq").unwrap()[0];
        let py = percus_yevick_values(&[0.5], 3.1, 0.3)[0];
        assert!(s.is_finite() && s > 0.0);
        assert!(s < py);
        assert_eq!(result.attr_f64("ir"), Some(0.0));
        assert_eq!(result.attr_f64("volumeFraction"), Some(0.3));
    }

    #[test]
    fn test_dilute_strong_coupling_is_rescaled() {
        let k = RmsaCoefficients::solve(2.0, 10.0, 50.0, 0.01, RootSelection::Full).unwrap();
        assert!(k.ir > 0);
        assert!(k.seta > 0.01);
        assert!(k.g1.abs() < 1e-2);
    }

    #[test]
    fn test_large_screening_constant_is_hard_sphere() {
        let q = linspace(0.1, 2.0, 20);
        let result = rmsa(&q, 3.0, 0.0, 5.0, 0.2.into(), &RmsaConfig::default()).unwrap();
        assert_relative_eq!(result.attr_f64("kappa_sigma").unwrap(), MAX_K);
        let sq = result.column("Sq").unwrap();
        let py = percus_yevick_values(&q, 3.0, 0.2);
        for (s, p) in sq.iter().zip(py.iter()) {
            assert!((s - p).abs() < 1e-3);
        }
    }

    #[test]
    fn test_classic_algorithm_agrees_in_benign_region() {
        let q = linspace(0.1, 2.0, 20);
        let full = rmsa(&q, 3.0, 3.0, 2.0, 0.2.into(), &RmsaConfig::default()).unwrap();
        let config = RmsaConfig {
            root_selection: RootSelection::HayterPenfold,
        };
        let classic = rmsa(&q, 3.0, 3.0, 2.0, 0.2.into(), &config).unwrap();
        let a = full.column("Sq").unwrap();
        let b = classic.column("Sq").unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_failure_codes_and_config() {
        assert_eq!(RmsaFailure::NoPhysicalRoot.code(), -4);
        let error: StructureFactorError = RmsaFailure::CannotRescale.into();
        assert!(matches!(error, StructureFactorError::NoRescaling(_)));
        let config = RmsaConfig::from_json_str(r#"{"root_selection": "HayterPenfold"}"#).unwrap();
        assert_eq!(config.root_selection, RootSelection::HayterPenfold);
        assert_eq!(RmsaConfig::from_json_str("{}").unwrap(), RmsaConfig::default());
        assert!(rmsa(&[0.1], 3.0, 1.0, 1.0, 1.5.into(), &RmsaConfig::default()).is_err());
    }

    #[test]
    fn test_complex_pair_is_never_a_physical_root() {
        let roots = [
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(0.5, 0.8),
            Complex64::new(0.5, -0.8),
        ];
        // only the real part of the complex pair would give a hard core
        let g_core = |fa: f64| if fa == 0.5 { 0.0 } else { 0.5 };
        assert_eq!(
            select_physical_root(&roots, g_core),
            Err(RmsaFailure::NoPhysicalRoot)
        );
        assert_eq!(RmsaFailure::NoPhysicalRoot.code(), -4);

        let g_core = |fa: f64| if fa == 2.0 { 0.01 } else { 0.5 };
        assert_eq!(select_physical_root(&roots, g_core), Ok((2.0, 0.01)));

        let nearly_real = [Complex64::new(1.0, 1e-6), Complex64::new(1.0, -1e-6)];
        assert_eq!(real_roots(&nearly_real), vec![1.0, 1.0]);
    }
}
