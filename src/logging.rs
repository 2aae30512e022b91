use std::env;

use log::LevelFilter;

/// Initialize logging for the command-line tool. `debug_enabled` raises the default level from
/// `Info` to `Debug`; an explicit `RUST_LOG` takes precedence over both. Returns false if a
/// logger was already installed.
pub fn init_logger(debug_enabled: bool) -> bool {
    let level = if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    // RUST_LOG wins over the flag
    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    let installed = builder.try_init().is_ok();
    if installed {
        log::debug!("Logger initialized at {level:?} level");
    }
    installed
}

#[cfg(test)]
mod tests {
    use crate::logging::init_logger;

    #[test]
    fn test_repeated_initialization_is_harmless() {
        init_logger(true);
        assert!(!init_logger(false));
        log::debug!("still logging");
    }
}
