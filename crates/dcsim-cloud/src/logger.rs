//! Logging setup for simulations.

use std::io::Write;

use env_logger::Builder;

/// Initializes `env_logger` with a bare message format, the simulation macros already add time and component.
///
/// Log level is taken from the `RUST_LOG` environment variable. Repeated calls are ignored.
pub fn init_logger() {
    let _ = Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}
