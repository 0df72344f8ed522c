use std::env;

/// Writes `[LEVEL] message` lines to stderr.
struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{:>5}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

fn level_filter(level: Option<&str>) -> log::LevelFilter {
    match level.map(str::to_ascii_uppercase).as_deref() {
        Some("OFF") => log::LevelFilter::Off,
        Some("ERROR") => log::LevelFilter::Error,
        Some("INFO") => log::LevelFilter::Info,
        Some("DEBUG") => log::LevelFilter::Debug,
        Some("TRACE") => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    }
}

/// Installs the logger at the level named by `REGDEF_LOG`, `WARN` by default.
pub fn init() {
    static LOGGER: Logger = Logger;
    // Only fails when a logger is already installed, which leaves that one in charge.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level_filter(env::var("REGDEF_LOG").ok().as_deref()));
    }
}
