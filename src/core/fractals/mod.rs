pub mod fractal_kinds;
