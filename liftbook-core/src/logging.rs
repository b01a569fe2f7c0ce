//! Logger setup on top of `env_logger`. Without `RUST_LOG`, only this crate
//! logs, at `info`.

use std::io::Write;
use std::str::FromStr;

use env_logger::{Builder, Env, Logger};
use log::LevelFilter;

pub const DEFAULT_FILTER: &str = "liftbook=info";

fn base_builder() -> Builder {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            let ts = buf.timestamp_millis();
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stdout);
    builder
}

fn env_builder(env: Env<'_>) -> Builder {
    let mut builder = base_builder();
    builder.parse_env(env.default_filter_or(DEFAULT_FILTER));
    builder
}

fn filtered_builder(filters: &str) -> Builder {
    let mut builder = base_builder();
    builder.parse_filters(filters);
    builder
}

/// First logger wins; later calls leave it in place.
fn install(logger: Logger) {
    let max_level = logger.filter();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }
}

pub fn init_logger(level: LevelFilter) {
    let mut builder = base_builder();
    builder.filter_level(level);
    let _ = builder.try_init();

    log::set_max_level(level);
}

/// Applies `RUST_LOG` directives, e.g. `warn,liftbook::db=trace`.
pub fn init_from_env() {
    install(env_builder(Env::default()).build());
}

pub fn init_with_filters(filters: &str) {
    install(filtered_builder(filters).build());
}

pub fn set_log_level(level: &str) -> bool {
    let level = level.trim();
    let parsed = if level.eq_ignore_ascii_case("warning") {
        Ok(LevelFilter::Warn)
    } else {
        LevelFilter::from_str(level)
    };
    match parsed {
        Ok(lvl) => {
            init_logger(lvl);
            true
        }
        Err(_) => false,
    }
}
