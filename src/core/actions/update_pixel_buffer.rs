//! The colouring pass: maps every pixel's escape iteration through the
//! palette into packed ARGB words.
//!
//! Rows are independent and the output buffer is written sequentially, so
//! this pass partitions by contiguous row ranges rather than stripes:
//! locality on the pixel buffer matters more than work balance here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::core::data::orbit::Orbit;
use crate::core::data::pixel_buffer::{PixelBuffer, PixelBufferError};
use crate::core::data::plane::CoordinatePlane;

#[derive(Clone, Copy)]
struct FrameView {
    points: *const Orbit,
    palette: *const u32,
    palette_len: usize,
    pixels: *mut u32,
    width: u32,
}

// SAFETY: contexts write disjoint row ranges of the pixel buffer and only
// read the points and palette; neither backing store moves while the pass
// is in flight.
unsafe impl Send for FrameView {}
unsafe impl Sync for FrameView {}

impl FrameView {
    /// SAFETY: the caller must own row `y` for the current pass.
    unsafe fn fill_line(&self, y: u32) {
        for x in 0..self.width {
            let i = y as usize * self.width as usize + x as usize;
            let escaped = (*self.points.add(i)).escaped;
            let word = *self
                .palette
                .add((escaped % self.palette_len as u64) as usize);
            *self.pixels.add(i) = word;
        }
    }
}

struct LineRangeContext {
    view: FrameView,
    first_y: u32,
    lines: u32,
    done: AtomicBool,
}

fn fill_line_range(ctx: &LineRangeContext) {
    for i in 0..ctx.lines {
        // SAFETY: this context owns rows [first_y, first_y + lines)
        unsafe { ctx.view.fill_line(ctx.first_y + i) };
    }
    ctx.done.store(true, Ordering::Release);
}

/// Fills the pixel buffer from the plane's current escape state, using
/// the plane's worker pool when it has at least two workers.
pub fn update_pixel_buffer(
    plane: &CoordinatePlane,
    buf: &mut PixelBuffer,
) -> Result<(), PixelBufferError> {
    if buf.width() != plane.win_width() || buf.height() != plane.win_height() {
        return Err(PixelBufferError::DimensionsMismatch {
            buffer_width: buf.width(),
            buffer_height: buf.height(),
            plane_width: plane.win_width(),
            plane_height: plane.win_height(),
        });
    }

    let width = buf.width();
    let height = buf.height();
    if width == 0 || height == 0 {
        return Ok(());
    }

    let points = plane.points();
    let (pixels, palette) = buf.parts_mut();

    match plane.pool() {
        Some(pool) if pool.size() >= 2 => {
            let view = FrameView {
                points: points.as_ptr(),
                palette: palette.words().as_ptr(),
                palette_len: palette.len(),
                pixels: pixels.as_mut_ptr(),
                width,
            };

            let num_contexts = pool.size().min(height as usize) as u32;
            let lines = height / num_contexts;
            let leftover = height % num_contexts;

            let mut contexts = Vec::with_capacity(num_contexts as usize);
            for i in 0..num_contexts {
                let context_lines = if i == num_contexts - 1 {
                    lines + leftover
                } else {
                    lines
                };
                contexts.push(Arc::new(LineRangeContext {
                    view,
                    first_y: i * lines,
                    lines: context_lines,
                    done: AtomicBool::new(false),
                }));
            }

            for ctx in &contexts {
                let job_ctx = Arc::clone(ctx);
                if pool.add(move || fill_line_range(&job_ctx)).is_err() {
                    fill_line_range(ctx);
                }
            }
            for ctx in &contexts {
                while !ctx.done.load(Ordering::Acquire) {
                    thread::yield_now();
                }
            }
        }
        _ => {
            let palette_len = palette.len() as u64;
            let words = palette.words();
            for (pixel, orbit) in pixels.iter_mut().zip(points) {
                *pixel = words[(orbit.escaped % palette_len) as usize];
            }
        }
    }

    Ok(())
}
