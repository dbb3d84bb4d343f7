//! Keyboard/mouse state and its mapping onto plane operations.
//!
//! Each key carries an is-down/was-down pair so actions can be
//! edge-triggered: a pan fires once per press, while quit and
//! function-cycling are level-triggered and also fire on key repeat.

use crate::core::data::plane::{CoordinatePlane, PlaneError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    pub is_down: bool,
    pub was_down: bool,
}

impl KeyState {
    #[must_use]
    pub fn pressed_edge(self) -> bool {
        self.is_down && !self.was_down
    }
}

/// One frame's worth of input, rebuilt from the backend's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HumanInput {
    pub up: KeyState,
    pub w: KeyState,
    pub left: KeyState,
    pub a: KeyState,
    pub down: KeyState,
    pub s: KeyState,
    pub right: KeyState,
    pub d: KeyState,
    pub page_up: KeyState,
    pub x: KeyState,
    pub page_down: KeyState,
    pub z: KeyState,
    pub m: KeyState,
    pub n: KeyState,
    pub q: KeyState,
    pub space: KeyState,
    pub esc: KeyState,
    pub click: Option<(u32, u32)>,
    pub wheel_zoom: i32,
}

/// What an input frame did to the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneChange {
    Shutdown,
    /// The view changed; the plane was reset.
    Changed,
    Unchanged,
}

/// Applies at most one action per frame, in a fixed priority order.
pub fn process_input(
    input: &HumanInput,
    plane: &mut CoordinatePlane,
) -> Result<PlaneChange, PlaneError> {
    if input.esc.is_down || input.q.is_down {
        return Ok(PlaneChange::Shutdown);
    }

    if input.space.is_down {
        plane.next_function()?;
        return Ok(PlaneChange::Changed);
    }

    if input.m.pressed_edge() {
        plane.threads_more();
        return Ok(PlaneChange::Unchanged);
    }
    if input.n.pressed_edge() {
        plane.threads_less();
        return Ok(PlaneChange::Unchanged);
    }

    if input.w.pressed_edge() || input.up.pressed_edge() {
        plane.pan_up()?;
        return Ok(PlaneChange::Changed);
    }
    if input.s.pressed_edge() || input.down.pressed_edge() {
        plane.pan_down()?;
        return Ok(PlaneChange::Changed);
    }
    if input.a.pressed_edge() || input.left.pressed_edge() {
        plane.pan_left()?;
        return Ok(PlaneChange::Changed);
    }
    if input.d.pressed_edge() || input.right.pressed_edge() {
        plane.pan_right()?;
        return Ok(PlaneChange::Changed);
    }

    if input.x.pressed_edge() || input.page_up.pressed_edge() || input.wheel_zoom < 0 {
        plane.zoom_out()?;
        return Ok(PlaneChange::Changed);
    }
    if input.z.pressed_edge() || input.page_down.pressed_edge() || input.wheel_zoom > 0 {
        plane.zoom_in()?;
        return Ok(PlaneChange::Changed);
    }

    if let Some((x, y)) = input.click {
        plane.recenter(x, y)?;
        return Ok(PlaneChange::Changed);
    }

    Ok(PlaneChange::Unchanged)
}

/// Single-character dispatch for the line-oriented ASCII frontend.
pub fn process_char(c: char, plane: &mut CoordinatePlane) -> Result<PlaneChange, PlaneError> {
    match c {
        'q' => return Ok(PlaneChange::Shutdown),
        'j' | ' ' => plane.next_function()?,
        'm' => {
            plane.threads_more();
            return Ok(PlaneChange::Unchanged);
        }
        'n' => {
            plane.threads_less();
            return Ok(PlaneChange::Unchanged);
        }
        'w' => plane.pan_up()?,
        's' => plane.pan_down()?,
        'a' => plane.pan_left()?,
        'd' => plane.pan_right()?,
        'x' => plane.zoom_out()?,
        'z' => plane.zoom_in()?,
        _ => return Ok(PlaneChange::Unchanged),
    }
    Ok(PlaneChange::Changed)
}
