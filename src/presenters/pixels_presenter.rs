use pixels::{Pixels, SurfaceTexture};
use winit::window::Window;

use crate::adapters::pixel_format::copy_argb_to_rgba;
use crate::core::data::pixel_buffer::PixelBuffer;

/// Owns the pixels surface and blits finished frames onto it.
pub struct PixelsPresenter {
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl PixelsPresenter {
    pub fn new(window: &'static Window) -> Result<Self, pixels::Error> {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(size.width, size.height, surface_texture)?;

        Ok(Self {
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    /// Keeps the swapchain and the frame buffer in sync with the window.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), pixels::TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        self.pixels.resize_buffer(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Converts the frame's ARGB words to the surface's RGBA bytes and
    /// renders. A frame of the wrong size (mid-resize) is skipped.
    pub fn present(&mut self, frame: &PixelBuffer) -> Result<(), pixels::Error> {
        if frame.width() != self.width || frame.height() != self.height {
            return Ok(());
        }
        copy_argb_to_rgba(frame.pixels(), self.pixels.frame_mut());
        self.pixels.render()
    }
}
