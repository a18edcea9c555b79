//! Terminal logging setup.
//!
//! Records are printed as a yellow `LEVEL:timestamp:module:line` prefix
//! followed by the message. Records on the [`SUBPROCESS_TARGET`] target get a
//! red `[timestamp]:` prefix instead, so shell output stands apart.

use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Log target used for lines streamed from child processes.
pub const SUBPROCESS_TARGET: &str = "subprocess";

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Default filter for a run: `debug` in debug mode, `info` otherwise.
pub fn default_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Render the colored prefix for a regular record.
pub fn record_prefix(level: log::Level, timestamp: &str, module: &str, line: u32) -> String {
    format!(
        "{}{:>8}:{}:{}:{}{}",
        YELLOW, level, timestamp, module, line, RESET
    )
}

/// Render the colored prefix for a subprocess line.
pub fn subprocess_prefix(timestamp: &str) -> String {
    format!("{}[{}]:{}", RED, timestamp, RESET)
}

/// Install the global logger. `RUST_LOG` overrides the default level.
///
/// Returns `false` if a logger was already installed.
pub fn init_logger(debug: bool) -> bool {
    let env = Env::default().default_filter_or(default_level(debug).as_str());

    Builder::from_env(env)
        .format(|buf, record| {
            let timestamp = buf.timestamp_seconds().to_string();
            if record.target() == SUBPROCESS_TARGET {
                writeln!(buf, "{} {}", subprocess_prefix(&timestamp), record.args())
            } else {
                let module = record
                    .module_path()
                    .and_then(|m| m.rsplit("::").next())
                    .unwrap_or("?");
                writeln!(
                    buf,
                    "{} {}",
                    record_prefix(record.level(), &timestamp, module, record.line().unwrap_or(0)),
                    record.args()
                )
            }
        })
        .try_init()
        .is_ok()
}
