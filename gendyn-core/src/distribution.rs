//! Stochastic step sampler.
//!
//! Every breakpoint crossing asks for two deviates in `[-1, 1]`, one for the
//! amplitude walk and one for the duration walk. A deviate is produced by
//! pulling a uniform `u ∈ [0, 1)` from the caller's random source, mapping it
//! through the selected distribution onto a `(0, 1)`-supported value `z`, and
//! returning `2z - 1`.
//!
//! Kinds
//! - [`DistributionKind`] : the closed selector exposed to the control plane
//! - [`Shape`]            : a kind resolved with its shape parameter
//!
//! Only `Uniform` is always exact. The other five kinds map to real
//! distributions when the crate feature `exact-distributions` is enabled and
//! otherwise sample uniformly. Nothing here allocates; the exact chi-squared
//! path uses rejection sampling and is constant time only in expectation.

use core::fmt;

use rand::Rng;

use crate::dsp::clamp;

/// Lower bound for shape parameters that must stay strictly positive.
pub const MIN_SHAPE: f64 = 1.0e-3;

/// Stochastic distribution selector.
///
/// The discriminants are the integer selectors used by message-based hosts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DistributionKind {
    #[default]
    Uniform = 0,
    Cauchy = 1,
    LogNormal = 2,
    ChiSquared = 3,
    Exponential = 4,
    ExtremeValue = 5,
}

impl DistributionKind {
    pub const ALL: [Self; 6] = [
        Self::Uniform,
        Self::Cauchy,
        Self::LogNormal,
        Self::ChiSquared,
        Self::Exponential,
        Self::ExtremeValue,
    ];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Integer selector → kind. `None` outside `0..=5`.
    #[inline]
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Uniform),
            1 => Some(Self::Cauchy),
            2 => Some(Self::LogNormal),
            3 => Some(Self::ChiSquared),
            4 => Some(Self::Exponential),
            5 => Some(Self::ExtremeValue),
            _ => None,
        }
    }

    /// Case-insensitive name lookup. Accepts the canonical names plus the
    /// aliases `lognormal`, `chisquared`, `chi2`, `exp`, `extreme`, `gumbel`.
    pub fn from_name(name: &str) -> Option<Self> {
        let n = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(n))
            .or_else(|| {
                let alias = |a: &str| a.eq_ignore_ascii_case(n);
                if alias("lognormal") {
                    Some(Self::LogNormal)
                } else if alias("chisquared") || alias("chi2") {
                    Some(Self::ChiSquared)
                } else if alias("exp") {
                    Some(Self::Exponential)
                } else if alias("extreme") || alias("gumbel") {
                    Some(Self::ExtremeValue)
                } else {
                    None
                }
            })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Cauchy => "cauchy",
            Self::LogNormal => "log-normal",
            Self::ChiSquared => "chi-squared",
            Self::Exponential => "exponential",
            Self::ExtremeValue => "extreme-value",
        }
    }

    /// Whether this kind samples its own distribution in this build, as
    /// opposed to falling back to uniform.
    pub const fn is_exact(self) -> bool {
        matches!(self, Self::Uniform) || cfg!(feature = "exact-distributions")
    }

    /// Resolve the kind with its shape parameter (clamped to `[0, 1]`).
    ///
    /// | kind          | interpretation of `param`            |
    /// |---------------|--------------------------------------|
    /// | uniform       | unused                               |
    /// | cauchy        | scale                                |
    /// | log-normal    | sigma (location fixed at 0.5)        |
    /// | chi-squared   | degrees of freedom `1 + 9 * param`   |
    /// | exponential   | rate                                 |
    /// | extreme-value | location `2 * param - 1`             |
    #[inline]
    pub fn shape(self, param: f64) -> Shape {
        let p = clamp(param, 0.0, 1.0);
        match self {
            Self::Uniform => Shape::Uniform,
            Self::Cauchy => Shape::Cauchy { scale: p.max(MIN_SHAPE) },
            Self::LogNormal => Shape::LogNormal { sigma: p },
            Self::ChiSquared => Shape::ChiSquared { dof: 1.0 + 9.0 * p },
            Self::Exponential => Shape::Exponential { rate: p.max(MIN_SHAPE) },
            Self::ExtremeValue => Shape::ExtremeValue { location: 2.0 * p - 1.0 },
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A distribution kind bound to its shape parameter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Uniform,
    Cauchy { scale: f64 },
    /// Location is fixed at 0.5.
    LogNormal { sigma: f64 },
    ChiSquared { dof: f64 },
    Exponential { rate: f64 },
    ExtremeValue { location: f64 },
}

impl Shape {
    #[inline]
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Uniform => DistributionKind::Uniform,
            Self::Cauchy { .. } => DistributionKind::Cauchy,
            Self::LogNormal { .. } => DistributionKind::LogNormal,
            Self::ChiSquared { .. } => DistributionKind::ChiSquared,
            Self::Exponential { .. } => DistributionKind::Exponential,
            Self::ExtremeValue { .. } => DistributionKind::ExtremeValue,
        }
    }

    /// Draw one deviate in `[-1, 1]`.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        2.0 * self.unit(rng) - 1.0
    }

    /// Draw the `(0, 1)`-supported transform `z`.
    #[cfg(not(feature = "exact-distributions"))]
    #[inline]
    fn unit<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // Non-uniform kinds are not implemented without `exact-distributions`.
        rng.gen::<f64>()
    }

    #[cfg(feature = "exact-distributions")]
    fn unit<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        use crate::dsp::{m_atan, m_exp};
        use core::f64::consts::PI;
        use rand_distr::{Cauchy, ChiSquared, Distribution, Exp, Gumbel, LogNormal};

        let z = match *self {
            Self::Uniform => None,
            Self::Cauchy { scale } => Cauchy::new(0.0, scale)
                .ok()
                .map(|d| 0.5 + m_atan(d.sample(rng)) / PI),
            Self::LogNormal { sigma } => LogNormal::new(0.5, sigma).ok().map(|d| {
                let x: f64 = d.sample(rng);
                x / (1.0 + x)
            }),
            Self::ChiSquared { dof } => ChiSquared::new(dof).ok().map(|d| {
                let x: f64 = d.sample(rng);
                x / (x + dof)
            }),
            Self::Exponential { rate } => Exp::new(rate)
                .ok()
                .map(|d| 1.0 - m_exp(-d.sample(rng))),
            Self::ExtremeValue { location } => Gumbel::new(location, 1.0)
                .ok()
                .map(|d| m_exp(-m_exp(-d.sample(rng)))),
        };

        match z {
            Some(z) => clamp(z, 0.0, 1.0),
            None => rng.gen::<f64>(),
        }
    }
}

/// Draw one deviate in `[-1, 1]` for `kind` with shape parameter `param`.
#[inline]
pub fn sample<R: Rng + ?Sized>(rng: &mut R, kind: DistributionKind, param: f64) -> f64 {
    kind.shape(param).sample(rng)
}
