//! Logging initialization using `log` + `log4rs`.
//!
//! The crate itself only emits through the `log` macro facade; embedding
//! applications may install any logger. This initializer is for binaries and
//! integration harnesses that want console plus rolling-file output.

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy},
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use std::path::PathBuf;

const CONSOLE_APPENDER: &str = "stderr";
const LOG_FILE_APPENDER: &str = "log_file";
const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{({l}):5.5}] {m}{n}";
const LOG_FILE_NAME: &str = "weft.log";
const MAX_LOG_FILE_SIZE: u64 = 16 * 1024 * 1024;
const MAX_LOG_FILES: u32 = 8;

const DEFAULT_TARGET: &str = "weft_core";
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the logger with optional file output.
///
/// `filters` is a comma-separated list of `target=level` directives; a bare
/// level applies to `weft_core`. Filtering is whitelist-style: the root level
/// is `Off`, so only listed targets emit, and external crates stay quiet
/// unless opted in (for example `"weft_core=debug,figment=warn"`). Invalid
/// directives are reported and skipped; an empty string means `weft_core` at
/// info. The logger is global; repeated calls are ignored.
pub fn init_logger(log_dir: Option<&str>, filters: &str) {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders = vec![CONSOLE_APPENDER];

    if let Some(dir) = log_dir {
        let log_path: PathBuf = [dir, LOG_FILE_NAME].iter().collect();
        let roll_pattern = format!("{}.{{}}.gz", log_path.display());
        let policy = CompoundPolicy::new(
            Box::new(SizeTrigger::new(MAX_LOG_FILE_SIZE)),
            Box::new(FixedWindowRoller::builder().build(&roll_pattern, MAX_LOG_FILES).expect("log roller pattern")),
        );
        let file_appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
            .build(&log_path, Box::new(policy));
        match file_appender {
            Ok(appender) => {
                config_builder = config_builder.appender(Appender::builder().build(LOG_FILE_APPENDER, Box::new(appender)));
                appenders.push(LOG_FILE_APPENDER);
            }
            Err(err) => {
                eprintln!("weft: could not open log file under {}: {}", dir, err);
            }
        }
    }

    for (target, level) in parse_filters(filters) {
        config_builder =
            config_builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(target, level));
    }
    let config = config_builder.build(Root::builder().appenders(appenders).build(LevelFilter::Off));

    match config {
        Ok(config) => {
            // Ignore the error a second initialization returns.
            let _ = log4rs::init_config(config);
        }
        Err(err) => {
            eprintln!("weft: logger initialization failed: {}", err);
        }
    }
}

fn parse_filters(filters: &str) -> Vec<(String, LevelFilter)> {
    let mut directives = Vec::new();
    for directive in filters.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        let (target, level) = match directive.split_once('=') {
            Some((target, level)) => (target.trim(), level.trim()),
            None => (DEFAULT_TARGET, directive),
        };
        match level.parse::<LevelFilter>() {
            Ok(level) => directives.push((target.to_string(), level)),
            Err(_) => eprintln!("weft: ignoring log directive with unknown level: {}", directive),
        }
    }
    if directives.is_empty() {
        directives.push((DEFAULT_TARGET.to_string(), DEFAULT_LEVEL));
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_level_pairs_parse() {
        let parsed = parse_filters("weft_core=debug,figment=warn");
        assert_eq!(
            parsed,
            vec![("weft_core".to_string(), LevelFilter::Debug), ("figment".to_string(), LevelFilter::Warn)]
        );
    }

    #[test]
    fn a_bare_level_applies_to_the_crate() {
        assert_eq!(parse_filters("trace"), vec![("weft_core".to_string(), LevelFilter::Trace)]);
    }

    #[test]
    fn unknown_levels_are_skipped() {
        let parsed = parse_filters("weft_core=loud,figment=error");
        assert_eq!(parsed, vec![("figment".to_string(), LevelFilter::Error)]);
    }

    #[test]
    fn an_empty_string_falls_back_to_info() {
        assert_eq!(parse_filters(""), vec![("weft_core".to_string(), LevelFilter::Info)]);
        assert_eq!(parse_filters(" , "), vec![("weft_core".to_string(), LevelFilter::Info)]);
    }
}
