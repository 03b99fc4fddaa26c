#![cfg(feature = "std")]

//! Stderr logger configured by `ROCC_LOG`.
//!
//! `ROCC_LOG` is a comma separated list of directives. A bare level sets the
//! default, `target=level` overrides it for a module path and everything
//! below it, e.g. `warn,rocc_link::session=debug`. The longest matching
//! target wins. Malformed directives are ignored.

use std::env;
use log::{self, LevelFilter, Metadata, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Filter {
    default: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
}

impl Filter {
    fn parse(spec: &str) -> Self {
        let mut filter = Filter {
            default: LevelFilter::Info,
            targets: Vec::new(),
        };
        for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((target, level)) => {
                    let target = target.trim();
                    if let (false, Ok(level)) = (target.is_empty(), level.trim().parse()) {
                        filter.targets.push((target.to_string(), level));
                    }
                }
                None => {
                    if let Ok(level) = directive.parse() {
                        filter.default = level;
                    }
                }
            }
        }
        // Longest target first so the first match is the most specific.
        filter.targets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        filter
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(prefix, _)| {
                target == prefix
                    || (target.starts_with(prefix.as_str()) && target[prefix.len()..].starts_with("::"))
            })
            .map_or(self.default, |(_, level)| *level)
    }

    fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, Ord::max)
    }
}

struct SimpleLogger {
    filter: Filter,
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // stdout is reserved for rendered output.
            eprintln!("{} [{}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the stderr logger, configured from `ROCC_LOG` (default `info`).
/// A second call leaves the first logger in place.
pub fn init_logging() {
    let filter = Filter::parse(&env::var("ROCC_LOG").unwrap_or_default());
    let max = filter.max_level();
    if log::set_boxed_logger(Box::new(SimpleLogger { filter })).is_ok() {
        log::set_max_level(max);
    }
}
