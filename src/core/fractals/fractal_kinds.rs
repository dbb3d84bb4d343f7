use crate::core::data::complex::Complex;
use crate::core::data::orbit::Orbit;

/// |z| > 2 guarantees divergence; compared squared to avoid the sqrt.
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// The table of generating functions. The engine only ever dispatches
/// through this enum, so the set is fixed at build time but fully
/// polymorphic at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FractalKinds {
    #[default]
    Mandelbrot,
    Julia,
    #[cfg(feature = "all-functions")]
    OrdinarySquare,
    #[cfg(feature = "all-functions")]
    NotACircle,
    #[cfg(feature = "all-functions")]
    SquareBinomialCollapseY2,
    #[cfg(feature = "all-functions")]
    SquareBinomialIgnoreY2,
}

impl FractalKinds {
    pub const ALL: &'static [Self] = &[
        Self::Mandelbrot,
        Self::Julia,
        #[cfg(feature = "all-functions")]
        Self::OrdinarySquare,
        #[cfg(feature = "all-functions")]
        Self::NotACircle,
        #[cfg(feature = "all-functions")]
        Self::SquareBinomialCollapseY2,
        #[cfg(feature = "all-functions")]
        Self::SquareBinomialIgnoreY2,
    ];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Mandelbrot => "mandelbrot",
            Self::Julia => "julia",
            #[cfg(feature = "all-functions")]
            Self::OrdinarySquare => "ordinary_square",
            #[cfg(feature = "all-functions")]
            Self::NotACircle => "not_a_circle",
            #[cfg(feature = "all-functions")]
            Self::SquareBinomialCollapseY2 => "square_binomial_collapse_y2",
            #[cfg(feature = "all-functions")]
            Self::SquareBinomialIgnoreY2 => "square_binomial_ignore_y2",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&kind| kind == self).unwrap_or(0)
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The next entry in the table, wrapping at the end.
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Initialises a fresh orbit for the pixel coordinate `xy`.
    ///
    /// Mandelbrot-style variants start the orbit at the origin; the others
    /// start it at the coordinate itself. Only the Mandelbrot variant marks
    /// provably-interior points as trapped.
    pub fn init(self, orbit: &mut Orbit, xy: Complex, seed: Complex) {
        orbit.seed = seed;
        orbit.c = xy;
        orbit.escaped = 0;
        orbit.trapped = false;
        match self {
            Self::Mandelbrot => {
                orbit.z = Complex::new(0.0, 0.0);
                orbit.trapped = inside_cardioid_or_bulb(xy);
            }
            Self::Julia => {
                orbit.z = xy;
            }
            #[cfg(feature = "all-functions")]
            Self::OrdinarySquare | Self::NotACircle => {
                orbit.z = xy;
            }
            #[cfg(feature = "all-functions")]
            Self::SquareBinomialCollapseY2 | Self::SquareBinomialIgnoreY2 => {
                orbit.z = Complex::new(0.0, 0.0);
            }
        }
    }

    /// Advances the orbit by one iteration.
    pub fn step(self, orbit: &mut Orbit) {
        match self {
            // Z[n+1] = (Z[n])^2 + C
            Self::Mandelbrot => {
                orbit.z = orbit.z.square() + orbit.c;
            }
            // Z[n+1] = (Z[n])^2 + seed
            Self::Julia => {
                orbit.z = orbit.z.square() + orbit.seed;
            }
            #[cfg(feature = "all-functions")]
            Self::OrdinarySquare => {
                orbit.z.imag = orbit.z.imag * orbit.z.imag;
                orbit.z.real = orbit.z.real * orbit.z.real;
            }
            #[cfg(feature = "all-functions")]
            Self::NotACircle => {
                let xx = orbit.z.real * orbit.z.real;
                let yy = orbit.z.imag * orbit.z.imag;
                orbit.z.imag = yy + 0.5 * orbit.z.real;
                orbit.z.real = xx + 0.5 * orbit.z.imag;
            }
            // squaring the binomial but folding the y² term back into y
            #[cfg(feature = "all-functions")]
            Self::SquareBinomialCollapseY2 => {
                let xx = orbit.z.real * orbit.z.real;
                let yx = orbit.z.imag * orbit.z.real;
                let xy = orbit.z.real * orbit.z.imag;
                let yy = orbit.z.imag * orbit.z.imag;
                orbit.z.real = xx + orbit.c.real;
                orbit.z.imag = yx + xy + yy + orbit.c.imag;
            }
            #[cfg(feature = "all-functions")]
            Self::SquareBinomialIgnoreY2 => {
                let xx = orbit.z.real * orbit.z.real;
                let yx = orbit.z.imag * orbit.z.real;
                let xy = orbit.z.real * orbit.z.imag;
                orbit.z.real = xx + orbit.c.real;
                orbit.z.imag = xy + yx + orbit.c.imag;
            }
        }
    }

    /// True once the orbit has left the escape radius.
    #[must_use]
    pub fn escaped(self, z: Complex) -> bool {
        z.magnitude_squared() > ESCAPE_RADIUS_SQUARED
    }
}

/// Cheap a-priori membership test for the two largest Mandelbrot regions.
///
/// Main cardioid: with xm = x - 1/4 and q = xm² + y², membership is
/// q·(q + xm) < y²/4. Period-2 bulb: (x + 1)² + y² < 1/16. Points inside
/// either region never escape, so the engine need never iterate them.
#[must_use]
pub fn inside_cardioid_or_bulb(xy: Complex) -> bool {
    let xm = xy.real - 0.25;
    let q = xm * xm + xy.imag * xy.imag;
    if q * (q + xm) < 0.25 * xy.imag * xy.imag {
        return true;
    }
    (xy.real + 1.0) * (xy.real + 1.0) + xy.imag * xy.imag < 0.0625
}
