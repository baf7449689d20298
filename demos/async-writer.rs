use std::sync::Arc;

use emberlog::config::Configurator;
use emberlog::legacy::{LegacyFacade, Severity};
use emberlog::level::Level;
use emberlog::sink::StdoutSink;
use emberlog::{info, ThreadPriority};

fn setup_logging() -> Result<(), Box<dyn std::error::Error>> {
    Configurator::new()
        .level(Level::Debug)
        .format_pattern("[{thread}][{level}] {message}")
        .writer(Arc::new(StdoutSink::default()))
        .writing_thread_bounded(1024, false, ThreadPriority::Normal)
        .activate()?;

    Ok(())
}

fn main() {
    setup_logging().expect("failed to initialize logging.");

    for i in 0..5 {
        info!("queued record {}", i);
    }

    // Legacy callers using the older severity names still land on the same
    // writer thread and sinks.
    LegacyFacade::severe(&"legacy caller reporting in");
    LegacyFacade::log(Severity::Config, &"legacy config message");

    // The writer thread is non-daemon; dropping the active configuration's
    // last handle (process exit, here) joins it so every queued record is
    // flushed before the program actually ends.
}
