//! The windowed frontend: a winit event loop that feeds keyboard and
//! mouse state into the shared input dispatch, iterates the plane every
//! frame, and blits through the pixels presenter.

use std::error::Error;
use std::time::Instant;

use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use crate::controllers::frame_rate::{FrameRateController, ThroughputStats};
use crate::controllers::human_input::{process_input, HumanInput, KeyState, PlaneChange};
use crate::controllers::options::ResolvedOptions;
use crate::core::actions::update_pixel_buffer::update_pixel_buffer;
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::data::plane::CoordinatePlane;
use crate::presenters::pixels_presenter::PixelsPresenter;

const INITIAL_PALETTE_LEN: usize = 1024;

struct App {
    plane: CoordinatePlane,
    buffer: PixelBuffer,
    presenter: PixelsPresenter,
    frame_rate: FrameRateController,
    stats: ThroughputStats,
    input: HumanInput,
    cursor: PhysicalPosition<f64>,
}

impl App {
    /// Folds a winit key event into the per-frame input snapshot. A key
    /// repeat counts as was-down, which keeps pan and zoom edge-triggered
    /// while quit and function-cycling stay level-triggered.
    fn key_event(&mut self, event: &KeyEvent) {
        let key = KeyState {
            is_down: event.state == ElementState::Pressed,
            was_down: event.repeat || event.state == ElementState::Released,
        };
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match code {
            KeyCode::Escape => self.input.esc = key,
            KeyCode::KeyQ => self.input.q = key,
            KeyCode::Space => self.input.space = key,
            KeyCode::KeyW => self.input.w = key,
            KeyCode::ArrowUp => self.input.up = key,
            KeyCode::KeyA => self.input.a = key,
            KeyCode::ArrowLeft => self.input.left = key,
            KeyCode::KeyS => self.input.s = key,
            KeyCode::ArrowDown => self.input.down = key,
            KeyCode::KeyD => self.input.d = key,
            KeyCode::ArrowRight => self.input.right = key,
            KeyCode::KeyZ => self.input.z = key,
            KeyCode::PageDown => self.input.page_down = key,
            KeyCode::KeyX => self.input.x = key,
            KeyCode::PageUp => self.input.page_up = key,
            KeyCode::KeyM => self.input.m = key,
            KeyCode::KeyN => self.input.n = key,
            _ => {}
        }
    }

    fn frame(&mut self) -> Result<PlaneChange, Box<dyn Error>> {
        let input = std::mem::take(&mut self.input);
        let change = process_input(&input, &mut self.plane)?;
        if change == PlaneChange::Shutdown {
            return Ok(change);
        }
        if change == PlaneChange::Changed {
            print_directions(&self.plane);
        }

        let steps = self.frame_rate.it_per_frame();
        let started = Instant::now();
        self.plane.iterate(steps)?;
        self.frame_rate.observe(started.elapsed());
        self.stats.record_frame(u64::from(steps));

        // one palette entry per iteration so far, so late escapers keep
        // getting fresh colours instead of wrapping early
        let palette_len = self.buffer.palette().len();
        if self.plane.iteration_count() as usize >= palette_len {
            self.buffer.palette_mut().grow(palette_len);
        }

        update_pixel_buffer(&self.plane, &mut self.buffer)?;
        self.presenter.present(&self.buffer)?;

        if let Some(report) = self
            .stats
            .maybe_report(&self.plane, self.frame_rate.it_per_frame())
        {
            println!("{}", report);
        }
        Ok(change)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.presenter.resize(width, height)?;
        self.plane.resize(width, height, false)?;
        self.buffer.resize(width, height);
        Ok(())
    }
}

fn print_directions(plane: &CoordinatePlane) {
    let program = std::env::args().next().unwrap_or_else(|| "gui".into());
    println!("{}", plane.function_name());
    println!("{}", plane.command_line(&program));
    println!("use arrows or 'wasd' keys to pan");
    println!("use page_down/page_up or 'z' and 'x' keys to zoom in/out");
    println!("space will cycle through available functions");
    println!("'m' and 'n' add and remove worker threads");
    println!("click to recenter the image");
    println!("escape or 'q' to quit");
}

/// Opens the window and runs the explorer until shutdown.
pub fn run_gui(options: ResolvedOptions) -> Result<(), Box<dyn Error>> {
    let plane = CoordinatePlane::new(options.plane_config())?;

    let event_loop = EventLoop::new()?;
    let window: &'static Window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(plane.function_name())
            .with_inner_size(LogicalSize::new(
                f64::from(options.win_width),
                f64::from(options.win_height),
            ))
            .with_min_inner_size(LogicalSize::new(64.0, 64.0))
            .build(&event_loop)?,
    ));

    let presenter = PixelsPresenter::new(window)?;
    let mut app = App {
        buffer: PixelBuffer::new(
            plane.win_width(),
            plane.win_height(),
            INITIAL_PALETTE_LEN,
            plane.skip_rounds(),
        ),
        plane,
        presenter,
        frame_rate: FrameRateController::new(),
        stats: ThroughputStats::new(),
        input: HumanInput::default(),
        cursor: PhysicalPosition::new(0.0, 0.0),
    };

    // scaled displays hand us a physical size that differs from the
    // requested logical one
    let size = window.inner_size();
    if size.width != app.plane.win_width() || size.height != app.plane.win_height() {
        app.resize(size.width, size.height)?;
    }
    print_directions(&app.plane);

    event_loop.run(move |event, elwt| {
        // poll continuously: the picture refines even with no input
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::KeyboardInput { event, .. } => app.key_event(&event),
                WindowEvent::CursorMoved { position, .. } => app.cursor = position,
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    app.input.click = Some((
                        app.cursor.x.max(0.0) as u32,
                        app.cursor.y.max(0.0) as u32,
                    ));
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let direction = match delta {
                        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                        MouseScrollDelta::PixelDelta(position) => position.y,
                    };
                    if direction > 0.0 {
                        app.input.wheel_zoom = 1;
                    } else if direction < 0.0 {
                        app.input.wheel_zoom = -1;
                    }
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = app.resize(size.width, size.height) {
                        eprintln!("resize error: {}", err);
                        std::process::exit(1);
                    }
                }
                WindowEvent::RedrawRequested => match app.frame() {
                    Ok(PlaneChange::Shutdown) => elwt.exit(),
                    Ok(PlaneChange::Changed) => window.set_title(app.plane.function_name()),
                    Ok(PlaneChange::Unchanged) => {}
                    Err(err) => {
                        eprintln!("render error: {}", err);
                        std::process::exit(1);
                    }
                },
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        }
    })?;
    Ok(())
}
