//! Command-line options and their rationalisation into a plane config.
//!
//! Parsing and defaulting are separate steps: clap collects what the user
//! actually said, and `resolve` fills in everything else, clamping
//! nonsense instead of rejecting it, so the explorer always starts.

use clap::{ArgAction, Parser};

use crate::core::data::complex::Complex;
use crate::core::data::plane::PlaneConfig;
use crate::core::fractals::fractal_kinds::FractalKinds;

#[derive(Parser, Debug, Default)]
#[command(
    name = "orbit_explorer",
    version,
    about = "Interactive escape-time exploration of the complex plane",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct CliOptions {
    /// Width of the window in pixels
    #[arg(long, short = 'w')]
    pub width: Option<i64>,

    /// Height of the window in pixels
    #[arg(long, short = 'h')]
    pub height: Option<i64>,

    /// Center of the x-axis
    #[arg(long = "center_x", short = 'x', allow_hyphen_values = true)]
    pub center_x: Option<f64>,

    /// Center of the y-axis
    #[arg(long = "center_y", short = 'y', allow_hyphen_values = true)]
    pub center_y: Option<f64>,

    /// Left edge of the x-axis
    #[arg(long, short = 'f', allow_hyphen_values = true)]
    pub from: Option<f64>,

    /// Right edge of the x-axis
    #[arg(long, short = 't', allow_hyphen_values = true)]
    pub to: Option<f64>,

    /// Function number: 0 for Mandelbrot, 1 for Julia
    #[arg(long, short = 'j')]
    pub function: Option<i64>,

    /// Real (x) part of the Julia seed
    #[arg(long = "seed_x", short = 'r', allow_hyphen_values = true)]
    pub seed_x: Option<f64>,

    /// Imaginary (y) part of the Julia seed
    #[arg(long = "seed_y", short = 'i', allow_hyphen_values = true)]
    pub seed_y: Option<f64>,

    /// Number of worker threads
    #[arg(long, short = 'c')]
    pub threads: Option<i64>,

    /// Halt after this many iterations, 0 iterates forever
    #[arg(long = "halt_after", short = 'a')]
    pub halt_after: Option<i64>,

    /// Number of leading palette entries left black
    #[arg(long = "skip_rounds", short = 's')]
    pub skip_rounds: Option<i64>,

    /// Print help and exit
    #[arg(long, short = 'H', action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Print version and exit
    #[arg(long, short = 'V', action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// Which frontend the defaults should suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    Ascii,
    Gui,
}

/// Fully-defaulted options, ready to build a plane from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    pub win_width: u32,
    pub win_height: u32,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub center: Complex,
    pub seed: Complex,
    pub kind: FractalKinds,
    pub threads: u32,
    pub halt_after: u64,
    pub skip_rounds: u32,
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

fn default_threads() -> u32 {
    let cpus = num_cpus::get() as u32;
    if cpus > 1 {
        cpus - 1
    } else {
        1
    }
}

impl CliOptions {
    /// Fills unset or unusable options with the frontend's defaults.
    #[must_use]
    pub fn resolve(&self, frontend: Frontend) -> ResolvedOptions {
        let win_width = match self.width {
            Some(w) if w >= 1 => w as u32,
            _ => match frontend {
                Frontend::Gui => 800,
                Frontend::Ascii => 79,
            },
        };
        let win_height = match self.height {
            Some(h) if h >= 1 => h as u32,
            _ => match frontend {
                Frontend::Gui => (win_width * 3) / 4,
                Frontend::Ascii => 24,
            },
        };

        let x_min = finite_or(self.from, -2.5);
        let x_max = finite_or(self.to, x_min + 4.0);

        let xy_ratio = f64::from(win_height) / f64::from(win_width);
        let y_range = (x_max - x_min).abs() * xy_ratio;
        let y_min = -(y_range / 2.0).max(1.5);
        let y_max = -y_min;

        let center = Complex::new(
            finite_or(self.center_x, -0.5),
            finite_or(self.center_y, 0.0),
        );
        let seed = Complex::new(
            finite_or(self.seed_x, -1.25643),
            finite_or(self.seed_y, -0.381086),
        );

        let kind = self
            .function
            .and_then(|f| usize::try_from(f).ok())
            .and_then(FractalKinds::from_index)
            .unwrap_or(FractalKinds::Mandelbrot);

        let threads = match self.threads {
            Some(t) if t >= 1 => t as u32,
            _ => default_threads(),
        };
        let halt_after = match self.halt_after {
            Some(h) if h >= 0 => h as u64,
            _ => 0,
        };
        let skip_rounds = match self.skip_rounds {
            Some(s) if s >= 0 => s as u32,
            _ => 0,
        };

        ResolvedOptions {
            win_width,
            win_height,
            x_min,
            x_max,
            y_min,
            y_max,
            center,
            seed,
            kind,
            threads,
            halt_after,
            skip_rounds,
        }
    }
}

impl ResolvedOptions {
    #[must_use]
    pub fn plane_config(&self) -> PlaneConfig {
        PlaneConfig {
            win_width: self.win_width,
            win_height: self.win_height,
            center: self.center,
            resolution_x: (self.x_max - self.x_min) / f64::from(self.win_width),
            resolution_y: (self.y_max - self.y_min) / f64::from(self.win_height),
            kind: self.kind,
            seed: self.seed,
            halt_after: self.halt_after,
            skip_rounds: self.skip_rounds,
            num_threads: self.threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_defaults() {
        let resolved = CliOptions::default().resolve(Frontend::Ascii);

        assert_eq!(resolved.win_width, 79);
        assert_eq!(resolved.win_height, 24);
        assert_eq!(resolved.x_min, -2.5);
        assert_eq!(resolved.x_max, 1.5);
        assert_eq!(resolved.y_min, -1.5);
        assert_eq!(resolved.y_max, 1.5);
        assert_eq!(resolved.center, Complex::new(-0.5, 0.0));
        assert_eq!(resolved.seed, Complex::new(-1.25643, -0.381086));
        assert_eq!(resolved.kind, FractalKinds::Mandelbrot);
        assert_eq!(resolved.halt_after, 0);
        assert_eq!(resolved.skip_rounds, 0);
        assert!(resolved.threads >= 1);
    }

    #[test]
    fn test_gui_defaults() {
        let resolved = CliOptions::default().resolve(Frontend::Gui);

        assert_eq!(resolved.win_width, 800);
        assert_eq!(resolved.win_height, 600);
    }

    #[test]
    fn test_gui_height_defaults_to_three_quarters_of_the_width() {
        let options = CliOptions {
            width: Some(400),
            ..CliOptions::default()
        };
        let resolved = options.resolve(Frontend::Gui);

        assert_eq!(resolved.win_height, 300);
    }

    #[test]
    fn test_to_defaults_to_from_plus_four() {
        let options = CliOptions {
            from: Some(-1.0),
            ..CliOptions::default()
        };
        let resolved = options.resolve(Frontend::Ascii);

        assert_eq!(resolved.x_min, -1.0);
        assert_eq!(resolved.x_max, 3.0);
    }

    #[test]
    fn test_non_finite_floats_fall_back_to_defaults() {
        let options = CliOptions {
            center_x: Some(f64::NAN),
            from: Some(f64::INFINITY),
            ..CliOptions::default()
        };
        let resolved = options.resolve(Frontend::Ascii);

        assert_eq!(resolved.center.real, -0.5);
        assert_eq!(resolved.x_min, -2.5);
    }

    #[test]
    fn test_y_span_floors_at_three() {
        // a wide flat window would give a tiny y range; it floors at ±1.5
        let options = CliOptions {
            width: Some(400),
            height: Some(10),
            ..CliOptions::default()
        };
        let resolved = options.resolve(Frontend::Gui);

        assert_eq!(resolved.y_min, -1.5);
        assert_eq!(resolved.y_max, 1.5);
    }

    #[test]
    fn test_tall_windows_grow_the_y_span() {
        let options = CliOptions {
            width: Some(100),
            height: Some(100),
            ..CliOptions::default()
        };
        let resolved = options.resolve(Frontend::Gui);

        assert_eq!(resolved.y_min, -2.0);
        assert_eq!(resolved.y_max, 2.0);
    }

    #[test]
    fn test_out_of_range_function_falls_back_to_mandelbrot() {
        for function in [Some(-1), Some(99)] {
            let options = CliOptions {
                function,
                ..CliOptions::default()
            };
            assert_eq!(
                options.resolve(Frontend::Ascii).kind,
                FractalKinds::Mandelbrot
            );
        }
    }

    #[test]
    fn test_function_one_selects_julia() {
        let options = CliOptions {
            function: Some(1),
            ..CliOptions::default()
        };
        assert_eq!(options.resolve(Frontend::Ascii).kind, FractalKinds::Julia);
    }

    #[test]
    fn test_negative_counters_clamp_to_zero() {
        let options = CliOptions {
            halt_after: Some(-5),
            skip_rounds: Some(-1),
            threads: Some(0),
            ..CliOptions::default()
        };
        let resolved = options.resolve(Frontend::Ascii);

        assert_eq!(resolved.halt_after, 0);
        assert_eq!(resolved.skip_rounds, 0);
        assert!(resolved.threads >= 1);
    }

    #[test]
    fn test_plane_config_derives_the_resolutions() {
        let resolved = CliOptions::default().resolve(Frontend::Ascii);
        let config = resolved.plane_config();

        assert_eq!(config.resolution_x, 4.0 / 79.0);
        assert_eq!(config.resolution_y, 3.0 / 24.0);
        assert_eq!(config.win_width, 79);
        assert_eq!(config.win_height, 24);
    }

    #[test]
    fn test_clap_parses_long_and_short_flags() {
        let options = CliOptions::parse_from([
            "orbit_explorer",
            "--width=79",
            "-h",
            "24",
            "--center_x=-0.5",
            "-a",
            "1000",
        ]);

        assert_eq!(options.width, Some(79));
        assert_eq!(options.height, Some(24));
        assert_eq!(options.center_x, Some(-0.5));
        assert_eq!(options.halt_after, Some(1000));
    }
}
