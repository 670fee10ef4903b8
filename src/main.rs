use anyhow::Result;
use clap::Parser;

use jam::app::{App, Options};
use jam::state;

// Catches allocations in the audio callback during development; release
// builds run without the checks.
#[cfg(debug_assertions)]
#[global_allocator]
static ALLOCATOR: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

fn main() {
    match run() {
        Ok(_) => {}
        Err(err) => {
            eprintln!("error: {:?}", err);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let options = Options::parse();
    env_logger::init();
    log::info!(
        "starting with allow_overlap={} stop_on_toggle={}",
        options.allow_overlap,
        options.stop_on_toggle
    );

    let (control, engine) = state::controls(options.allow_overlap);
    App::new(control, engine, options).run()
}
