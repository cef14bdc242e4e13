//! CLI argument parsing for the quoteboard runner.
//!
//! Uses clap for argument parsing with environment variable fallbacks.

use std::path::PathBuf;

use clap::{Parser, ValueHint};

use crate::controller::REFRESH_INTERVAL_SECS;

/// Quoteboard - resilient market widget refresher
///
/// Drives one page of the site through placeholder, cache-first, and live
/// refresh passes against keyless public quote APIs reached through CORS
/// relays.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct BoardArgs {
    /// Page to drive, as a path or its last segment
    /// (krypto, aktien, indizes, rohstoffe, index)
    #[arg(
        short = 'p',
        long = "page",
        env = "BOARD_PAGE",
        default_value = "index.html"
    )]
    pub page: String,

    /// Seconds between refresh cycles
    #[arg(
        long = "interval",
        env = "BOARD_INTERVAL_SECS",
        default_value_t = REFRESH_INTERVAL_SECS
    )]
    pub interval_secs: u64,

    /// Per-relay attempt timeout in milliseconds
    #[arg(
        long = "attempt-timeout",
        env = "BOARD_ATTEMPT_TIMEOUT_MS",
        default_value = "8000"
    )]
    pub attempt_timeout_ms: u64,

    /// Directory holding the persisted quote cache
    #[arg(
        long = "cache-dir",
        env = "BOARD_CACHE_DIR",
        default_value = ".",
        value_hint = ValueHint::DirPath
    )]
    pub cache_dir: PathBuf,

    /// Run a single refresh cycle and exit
    #[arg(long = "once", default_value = "false")]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_page_contract() {
        let args = BoardArgs::parse_from(["quoteboard"]);
        assert_eq!(args.page, "index.html");
        assert_eq!(args.interval_secs, 60);
        assert_eq!(args.attempt_timeout_ms, 8000);
        assert!(!args.once);
    }

    #[test]
    fn page_and_once_flags_parse() {
        let args = BoardArgs::parse_from(["quoteboard", "-p", "krypto.html", "--once"]);
        assert_eq!(args.page, "krypto.html");
        assert!(args.once);
    }
}
