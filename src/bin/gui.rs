use clap::Parser;

use orbit_explorer::{CliOptions, Frontend};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = CliOptions::parse().resolve(Frontend::Gui);
    orbit_explorer::run_gui(options)
}
