use log::LevelFilter;

/// Default level when `RUST_LOG` is not set.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the process-wide logger. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(default_level(verbose))
        .format_timestamp(None)
        .format_target(verbose)
        .parse_default_env();

    // A second call (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}
