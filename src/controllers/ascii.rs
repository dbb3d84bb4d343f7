//! The headless frontend: renders escape counts as a character grid.
//!
//! With `halt_after` set it runs non-interactively until the iteration
//! cap (or an empty live set) and leaves the final status line for the
//! check harness. Without a cap it prompts between frames and feeds the
//! typed character through the shared key dispatch.

use std::error::Error;
use std::io::{BufRead, Write};

use crate::controllers::frame_rate::ThroughputStats;
use crate::controllers::human_input::{process_char, PlaneChange};
use crate::core::data::plane::CoordinatePlane;

pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[J";

/// Escape count to glyph: space for not-escaped, then digits, upper case,
/// lower case, and `*` for everything later.
#[must_use]
pub fn glyph_for_escape(escaped: u64) -> char {
    match escaped {
        0 => ' ',
        1..=9 => (b'0' + escaped as u8) as char,
        10..=35 => (b'A' + (escaped as u8 - 10)) as char,
        36..=61 => (b'a' + (escaped as u8 - 36)) as char,
        _ => '*',
    }
}

pub struct AsciiController {
    plane: CoordinatePlane,
    stats: ThroughputStats,
}

impl AsciiController {
    #[must_use]
    pub fn new(plane: CoordinatePlane) -> Self {
        Self {
            plane,
            stats: ThroughputStats::new(),
        }
    }

    pub fn render(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{}", CLEAR_SCREEN)?;
        for y in 0..self.plane.win_height() {
            for x in 0..self.plane.win_width() {
                write!(out, "{}", glyph_for_escape(self.plane.escaped_at(x, y)))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn status_line(&self, ordinal: u64) -> String {
        format!(
            "{} {} escaped: {} not: {}",
            self.plane.function_name(),
            ordinal,
            self.plane.escaped_count(),
            self.plane.not_escaped_count()
        )
    }

    /// Runs frames until the halt condition or a quit command.
    pub fn run(
        &mut self,
        out: &mut dyn Write,
        input: &mut dyn BufRead,
    ) -> Result<(), Box<dyn Error>> {
        let it_per_frame = 1;
        let interactive = self.plane.halt_after() == 0;

        let mut line = String::new();
        for ordinal in 0u64.. {
            self.plane.iterate(it_per_frame)?;
            self.stats.record_frame(u64::from(it_per_frame));
            if let Some(report) = self.stats.maybe_report(&self.plane, it_per_frame) {
                log::info!("{}", report);
            }

            self.render(out)?;
            write!(out, "{}", self.status_line(ordinal))?;
            out.flush()?;

            if !interactive {
                if self.plane.halted() || self.plane.live_count() == 0 {
                    writeln!(out)?;
                    break;
                }
                continue;
            }

            write!(out, " <enter> to continue, 'q<enter>' to quit: ")?;
            out.flush()?;
            line.clear();
            let read = input.read_line(&mut line)?;
            // end of input quits too, so piped sessions terminate
            let c = if read == 0 {
                'q'
            } else {
                line.chars().next().unwrap_or('\n')
            };
            if process_char(c, &mut self.plane)? == PlaneChange::Shutdown {
                writeln!(out)?;
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::options::{CliOptions, Frontend};
    use crate::core::data::plane::CoordinatePlane;

    fn controller(halt_after: u64, threads: u32) -> AsciiController {
        let mut resolved = CliOptions::default().resolve(Frontend::Ascii);
        resolved.halt_after = halt_after;
        resolved.threads = threads;
        AsciiController::new(CoordinatePlane::new(resolved.plane_config()).unwrap())
    }

    fn final_status(output: &[u8]) -> String {
        let text = String::from_utf8_lossy(output);
        text.lines()
            .rev()
            .find(|line| line.contains("escaped:"))
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_glyph_mapping() {
        assert_eq!(glyph_for_escape(0), ' ');
        assert_eq!(glyph_for_escape(1), '1');
        assert_eq!(glyph_for_escape(9), '9');
        assert_eq!(glyph_for_escape(10), 'A');
        assert_eq!(glyph_for_escape(35), 'Z');
        assert_eq!(glyph_for_escape(36), 'a');
        assert_eq!(glyph_for_escape(61), 'z');
        assert_eq!(glyph_for_escape(62), '*');
        assert_eq!(glyph_for_escape(100_000), '*');
    }

    #[test]
    fn test_render_emits_the_clear_sequence_and_full_grid() {
        let controller = controller(10, 1);
        let mut output = Vec::new();

        controller.render(&mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with(CLEAR_SCREEN));
        let rows: Vec<&str> = text.trim_start_matches(CLEAR_SCREEN).lines().collect();
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|row| row.chars().count() == 79));
    }

    #[test]
    fn test_status_line_names_function_ordinal_and_totals() {
        let mut controller = controller(5, 1);
        controller.plane.iterate(5).unwrap();

        let line = controller.status_line(4);

        assert!(line.starts_with("mandelbrot 4 escaped: "));
        assert!(line.contains(&format!(
            "escaped: {} not: {}",
            controller.plane.escaped_count(),
            controller.plane.not_escaped_count()
        )));
    }

    #[test]
    fn test_run_halts_at_the_iteration_cap() {
        let mut controller = controller(40, 1);
        let mut output = Vec::new();

        controller.run(&mut output, &mut &b""[..]).unwrap();

        assert_eq!(controller.plane.iteration_count(), 40);
    }

    #[test]
    fn test_interactive_quit_on_q() {
        let mut controller = controller(0, 1);
        let mut output = Vec::new();

        controller.run(&mut output, &mut &b"q\n"[..]).unwrap();

        assert_eq!(controller.plane.iteration_count(), 1);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("<enter> to continue"));
    }

    #[test]
    fn test_interactive_quits_at_end_of_input() {
        let mut controller = controller(0, 1);
        let mut output = Vec::new();

        controller.run(&mut output, &mut &b"\n\n"[..]).unwrap();

        // two empty lines then end-of-input
        assert_eq!(controller.plane.iteration_count(), 3);
    }

    #[test]
    fn test_interactive_commands_reach_the_plane() {
        let mut controller = controller(0, 1);
        let before = controller.plane.center();
        let mut output = Vec::new();

        controller.run(&mut output, &mut &b"d\nq\n"[..]).unwrap();

        assert!(controller.plane.center().real > before.real);
    }

    #[test]
    fn test_default_view_after_1000_iterations_matches_the_harness() {
        let mut controller = controller(1000, 1);
        let mut output = Vec::new();

        controller.run(&mut output, &mut &b""[..]).unwrap();

        assert_eq!(controller.plane.iteration_count(), 1000);
        assert_eq!(controller.plane.escaped_count(), 1642);
        assert_eq!(controller.plane.not_escaped_count(), 254);
        assert_eq!(controller.plane.trapped_count(), 213);
        assert_eq!(controller.plane.live_count(), 41);
        assert!(final_status(&output).ends_with("escaped: 1642 not: 254"));
    }

    #[test]
    fn test_harness_counts_are_thread_count_independent() {
        let mut single = controller(1000, 1);
        let mut pooled = controller(1000, 8);
        let mut sink = Vec::new();

        single.run(&mut sink, &mut &b""[..]).unwrap();
        sink.clear();
        pooled.run(&mut sink, &mut &b""[..]).unwrap();

        for y in 0..24 {
            for x in 0..79 {
                assert_eq!(
                    single.plane.escaped_at(x, y),
                    pooled.plane.escaped_at(x, y),
                    "pixel ({}, {})",
                    x,
                    y
                );
            }
        }
    }
}
