use clap::Parser;

use orbit_explorer::{AsciiController, CliOptions, CoordinatePlane, Frontend};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = CliOptions::parse().resolve(Frontend::Ascii);
    let plane = CoordinatePlane::new(options.plane_config())?;
    let mut controller = AsciiController::new(plane);

    let stdout = std::io::stdout();
    let stdin = std::io::stdin();
    controller.run(&mut stdout.lock(), &mut stdin.lock())?;

    Ok(())
}
