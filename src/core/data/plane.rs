//! The coordinate plane: every screen pixel is bound to a point on the
//! complex plane, and each point carries its own escape progress so the
//! engine can refine the picture incrementally across frames.

use std::error::Error;
use std::fmt;

use crate::core::actions::iterate_plane::{run_batch, BatchInput};
use crate::core::data::complex::Complex;
use crate::core::data::orbit::Orbit;
use crate::core::fractals::fractal_kinds::FractalKinds;
use crate::core::pool::{PoolError, ThreadPool};

#[derive(Debug)]
pub enum PlaneError {
    InvalidResolution {
        resolution_x: f64,
        resolution_y: f64,
    },
    Pool(PoolError),
}

impl fmt::Display for PlaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidResolution {
                resolution_x,
                resolution_y,
            } => {
                write!(
                    f,
                    "resolution must be positive: {} x {}",
                    resolution_x, resolution_y
                )
            }
            Self::Pool(err) => write!(f, "worker pool error: {}", err),
        }
    }
}

impl Error for PlaneError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidResolution { .. } => None,
            Self::Pool(err) => Some(err),
        }
    }
}

/// Everything needed to build a plane; produced by the option resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneConfig {
    pub win_width: u32,
    pub win_height: u32,
    pub center: Complex,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub kind: FractalKinds,
    pub seed: Complex,
    pub halt_after: u64,
    pub skip_rounds: u32,
    pub num_threads: u32,
}

pub struct CoordinatePlane {
    win_width: u32,
    win_height: u32,
    center: Complex,
    resolution_x: f64,
    resolution_y: f64,
    kind: FractalKinds,
    seed: Complex,
    skip_rounds: u32,
    halt_after: u64,
    num_threads: u32,

    iteration_count: u64,
    escaped: usize,
    trapped: usize,
    unchanged: u64,

    all_points: Vec<Orbit>,
    live: Vec<u32>,
    scratch: Vec<Vec<u32>>,
    pool: Option<ThreadPool>,
}

impl CoordinatePlane {
    pub fn new(config: PlaneConfig) -> Result<Self, PlaneError> {
        let mut plane = Self {
            win_width: 0,
            win_height: 0,
            center: Complex::default(),
            resolution_x: 0.0,
            resolution_y: 0.0,
            kind: config.kind,
            seed: config.seed,
            skip_rounds: config.skip_rounds,
            halt_after: config.halt_after,
            num_threads: config.num_threads.max(1),
            iteration_count: 0,
            escaped: 0,
            trapped: 0,
            unchanged: 0,
            all_points: Vec::new(),
            live: Vec::new(),
            scratch: Vec::new(),
            pool: None,
        };
        plane.reset(
            config.win_width,
            config.win_height,
            config.center,
            config.resolution_x,
            config.resolution_y,
            config.kind,
            config.seed,
        )?;
        Ok(plane)
    }

    /// Re-initialises every per-point record for a new view, keeping the
    /// existing allocations whenever they are large enough.
    ///
    /// Coordinates within half a resolution step of an axis are snapped to
    /// zero, so the axes land exactly on a pixel row/column when visible.
    #[allow(clippy::too_many_arguments)]
    pub fn reset(
        &mut self,
        win_width: u32,
        win_height: u32,
        center: Complex,
        resolution_x: f64,
        resolution_y: f64,
        kind: FractalKinds,
        seed: Complex,
    ) -> Result<(), PlaneError> {
        if !(resolution_x > 0.0 && resolution_y > 0.0) {
            return Err(PlaneError::InvalidResolution {
                resolution_x,
                resolution_y,
            });
        }

        self.win_width = win_width;
        self.win_height = win_height;
        self.center = center;
        self.resolution_x = resolution_x;
        self.resolution_y = resolution_y;
        self.kind = kind;
        self.seed = seed;

        self.iteration_count = 0;
        self.escaped = 0;
        self.trapped = 0;
        self.unchanged = 0;

        let needed = win_width as usize * win_height as usize;
        debug_assert!(needed <= u32::MAX as usize);
        self.all_points.clear();
        self.all_points.resize(needed, Orbit::default());
        self.live.clear();
        self.live.reserve(needed);

        let x_min = self.x_min();
        let y_max = self.y_max();
        for py in 0..win_height {
            let mut y = y_max - f64::from(py) * resolution_y;
            if y.abs() < resolution_y / 2.0 {
                // near enough to zero to call it zero
                y = 0.0;
            }
            for px in 0..win_width {
                let mut x = x_min + f64::from(px) * resolution_x;
                if x.abs() < resolution_x / 2.0 {
                    x = 0.0;
                }

                let i = py as usize * win_width as usize + px as usize;
                let orbit = &mut self.all_points[i];
                kind.init(orbit, Complex::new(x, y), seed);
                if orbit.trapped {
                    self.trapped += 1;
                } else {
                    self.live.push(i as u32);
                }
            }
        }
        Ok(())
    }

    /// Adjusts the pixel dimensions, deriving the new x resolution from
    /// the current x span. With `preserve_ratio` the y resolution is
    /// derived from the y span; otherwise pixels become square.
    pub fn resize(
        &mut self,
        new_width: u32,
        new_height: u32,
        preserve_ratio: bool,
    ) -> Result<(), PlaneError> {
        let resolution_x = (self.x_max() - self.x_min()) / f64::from(new_width);
        let resolution_y = if preserve_ratio {
            (self.y_max() - self.y_min()) / f64::from(new_height)
        } else {
            resolution_x
        };
        let (center, kind, seed) = (self.center, self.kind, self.seed);
        self.reset(
            new_width,
            new_height,
            center,
            resolution_x,
            resolution_y,
            kind,
            seed,
        )
    }

    /// Advances every live point by up to `steps` iterations and compacts
    /// the live list. Returns the number of points that escaped during
    /// this batch.
    pub fn iterate(&mut self, steps: u32) -> Result<usize, PlaneError> {
        let mut steps = u64::from(steps);
        if self.halt_after > 0 {
            steps = steps.min(self.halt_after.saturating_sub(self.iteration_count));
        }
        if steps == 0 || self.live.is_empty() {
            return Ok(0);
        }

        self.ensure_pool()?;

        let live_before = self.live.len();
        let live = std::mem::take(&mut self.live);
        let outcome = run_batch(BatchInput {
            points: &mut self.all_points,
            live,
            scratch: &mut self.scratch,
            kind: self.kind,
            steps,
            iteration_count: self.iteration_count,
            num_threads: self.num_threads,
            pool: self.pool.as_ref(),
        });

        self.live = outcome.live;
        self.escaped += outcome.newly_escaped;
        self.iteration_count += steps;
        if self.live.len() == live_before {
            self.unchanged += steps;
        } else {
            self.unchanged = 0;
        }
        Ok(outcome.newly_escaped)
    }

    // A pool is only (re)built when the desired count exceeds what we
    // have; dropping the desired count below the pool size keeps the old
    // pool (its extra workers just go unused by the stripe partition).
    fn ensure_pool(&mut self) -> Result<(), PlaneError> {
        if self.num_threads < 2 {
            return Ok(());
        }
        let desired = self.num_threads as usize;
        let needs_new = match &self.pool {
            None => true,
            Some(pool) => pool.size() < desired,
        };
        if needs_new {
            if let Some(mut old) = self.pool.take() {
                old.stop_and_free();
            }
            self.pool = Some(ThreadPool::new(desired).map_err(PlaneError::Pool)?);
        }
        Ok(())
    }

    /// Cycles to the next generating function. Crossing the Julia
    /// boundary in either direction swaps the roles of centre and seed,
    /// so cycling all the way around restores the original view.
    pub fn next_function(&mut self) -> Result<(), PlaneError> {
        let old_kind = self.kind;
        let new_kind = old_kind.next();

        let (center, seed) =
            if new_kind == FractalKinds::Julia || old_kind == FractalKinds::Julia {
                (self.seed, self.center)
            } else {
                (self.center, self.seed)
            };

        let (win_width, win_height) = (self.win_width, self.win_height);
        let (resolution_x, resolution_y) = (self.resolution_x, self.resolution_y);
        self.reset(
            win_width,
            win_height,
            center,
            resolution_x,
            resolution_y,
            new_kind,
            seed,
        )
    }

    pub fn zoom_in(&mut self) -> Result<(), PlaneError> {
        self.rescale(0.8)
    }

    pub fn zoom_out(&mut self) -> Result<(), PlaneError> {
        self.rescale(1.25)
    }

    fn rescale(&mut self, factor: f64) -> Result<(), PlaneError> {
        let resolution_x = self.resolution_x * factor;
        let resolution_y = self.resolution_y * factor;
        let (win_width, win_height) = (self.win_width, self.win_height);
        let (center, kind, seed) = (self.center, self.kind, self.seed);
        self.reset(
            win_width,
            win_height,
            center,
            resolution_x,
            resolution_y,
            kind,
            seed,
        )
    }

    pub fn pan_left(&mut self) -> Result<(), PlaneError> {
        let shift = (self.x_max() - self.x_min()) / 8.0;
        self.recenter_at(Complex::new(self.center.real - shift, self.center.imag))
    }

    pub fn pan_right(&mut self) -> Result<(), PlaneError> {
        let shift = (self.x_max() - self.x_min()) / 8.0;
        self.recenter_at(Complex::new(self.center.real + shift, self.center.imag))
    }

    pub fn pan_up(&mut self) -> Result<(), PlaneError> {
        let shift = (self.y_max() - self.y_min()) / 8.0;
        self.recenter_at(Complex::new(self.center.real, self.center.imag + shift))
    }

    pub fn pan_down(&mut self) -> Result<(), PlaneError> {
        let shift = (self.y_max() - self.y_min()) / 8.0;
        self.recenter_at(Complex::new(self.center.real, self.center.imag - shift))
    }

    /// Re-centres the view on the coordinate a pixel represents.
    /// Out-of-window pixels are ignored.
    pub fn recenter(&mut self, x: u32, y: u32) -> Result<(), PlaneError> {
        if x >= self.win_width || y >= self.win_height {
            return Ok(());
        }
        let i = y as usize * self.win_width as usize + x as usize;
        let center = self.all_points[i].c;
        self.recenter_at(center)
    }

    fn recenter_at(&mut self, center: Complex) -> Result<(), PlaneError> {
        let (win_width, win_height) = (self.win_width, self.win_height);
        let (resolution_x, resolution_y) = (self.resolution_x, self.resolution_y);
        let (kind, seed) = (self.kind, self.seed);
        self.reset(
            win_width,
            win_height,
            center,
            resolution_x,
            resolution_y,
            kind,
            seed,
        )
    }

    pub fn threads_more(&mut self) {
        self.num_threads += 1;
    }

    pub fn threads_less(&mut self) {
        if self.num_threads > 1 {
            self.num_threads -= 1;
        }
    }

    /// The command line that reproduces the current view.
    #[must_use]
    pub fn command_line(&self, program: &str) -> String {
        let mut line = format!("{} --function={}", program, self.kind.index());
        if self.kind == FractalKinds::Julia {
            line.push_str(&format!(
                " --seed_x={} --seed_y={}",
                self.seed.real, self.seed.imag
            ));
        }
        if self.skip_rounds != 0 {
            line.push_str(&format!(" --skip_rounds={}", self.skip_rounds));
        }
        line.push_str(&format!(
            " --center_x={} --center_y={} --from={} --to={} --width={} --height={}",
            self.center.real,
            self.center.imag,
            self.x_min(),
            self.x_max(),
            self.win_width,
            self.win_height
        ));
        line
    }

    #[must_use]
    pub fn win_width(&self) -> u32 {
        self.win_width
    }

    #[must_use]
    pub fn win_height(&self) -> u32 {
        self.win_height
    }

    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.center.real - self.resolution_x * f64::from(self.win_width / 2)
    }

    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.center.real + self.resolution_x * f64::from(self.win_width / 2)
    }

    #[must_use]
    pub fn y_min(&self) -> f64 {
        self.center.imag - self.resolution_y * f64::from(self.win_height / 2)
    }

    #[must_use]
    pub fn y_max(&self) -> f64 {
        self.center.imag + self.resolution_y * f64::from(self.win_height / 2)
    }

    #[must_use]
    pub fn center(&self) -> Complex {
        self.center
    }

    #[must_use]
    pub fn seed(&self) -> Complex {
        self.seed
    }

    #[must_use]
    pub fn resolution_x(&self) -> f64 {
        self.resolution_x
    }

    #[must_use]
    pub fn resolution_y(&self) -> f64 {
        self.resolution_y
    }

    #[must_use]
    pub fn kind(&self) -> FractalKinds {
        self.kind
    }

    #[must_use]
    pub fn function_name(&self) -> &'static str {
        self.kind.display_name()
    }

    #[must_use]
    pub fn halt_after(&self) -> u64 {
        self.halt_after
    }

    /// True once the halt_after cap has been reached (never with cap 0).
    #[must_use]
    pub fn halted(&self) -> bool {
        self.halt_after > 0 && self.iteration_count >= self.halt_after
    }

    #[must_use]
    pub fn skip_rounds(&self) -> u32 {
        self.skip_rounds
    }

    #[must_use]
    pub fn num_threads(&self) -> u32 {
        self.num_threads
    }

    #[must_use]
    pub fn iteration_count(&self) -> u64 {
        self.iteration_count
    }

    #[must_use]
    pub fn escaped_count(&self) -> usize {
        self.escaped
    }

    /// Every point whose orbit has not escaped, trapped points included.
    #[must_use]
    pub fn not_escaped_count(&self) -> usize {
        self.all_points.len() - self.escaped
    }

    #[must_use]
    pub fn trapped_count(&self) -> usize {
        self.trapped
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Iterations accumulated since the live list last shrank.
    #[must_use]
    pub fn unchanged(&self) -> u64 {
        self.unchanged
    }

    /// Escape iteration of the pixel at `(x, y)`; 0 means not escaped.
    #[must_use]
    pub fn escaped_at(&self, x: u32, y: u32) -> u64 {
        self.all_points[y as usize * self.win_width as usize + x as usize].escaped
    }

    /// Row-major per-pixel records.
    #[must_use]
    pub fn points(&self) -> &[Orbit] {
        &self.all_points
    }

    #[must_use]
    pub fn live_indices(&self) -> &[u32] {
        &self.live
    }

    #[must_use]
    pub fn pool(&self) -> Option<&ThreadPool> {
        self.pool.as_ref()
    }
}
