use std::env;
use std::sync::Arc;

use emberlog::config::Configurator;
use emberlog::level::Level;
use emberlog::sink::{FileSink, StdoutSink};
use emberlog::{debug, info, warn};

fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let global = if verbose { Level::Debug } else { Level::Info };

    let file_sink = FileSink::open("program.log")?;

    let mut configurator = Configurator::new()
        .level(global)
        .format_pattern("{date}[{class}][{level}] {message}")
        .writer(Arc::new(file_sink))
        .format_pattern("[{date:%H:%M}][{class}][{level}] {message}")
        .writer(Arc::new(StdoutSink::default()));

    if !verbose {
        // An overly chatty dependency we don't want cluttering stdout/the log file.
        configurator = configurator.level_for("overly_verbose_target", Some(Level::Warning));
    }

    configurator.activate()?;
    Ok(())
}

fn main() {
    let verbose = env::args().any(|arg| arg == "-v" || arg == "--verbose");

    setup_logging(verbose).expect("failed to initialize logging.");

    info!("MyProgram v0.0.1 starting up!");

    if verbose {
        info!("DEBUG output enabled.");
    }

    for i in 0..5 {
        info!("executing section: {}", i);
        debug!("section {} 1/4 complete.", i);
        debug!("section {} 1/2 complete.", i);
        debug!("section {} 3/4 complete.", i);
        info!("section {} completed!", i);
    }

    warn!("AHHH something's on fire.");

    info!("MyProgram operation completed, shutting down.");
}
