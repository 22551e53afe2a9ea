//! Available subcommands.

use clap::Subcommand;

use fetchq_core::QualityTier;

use crate::parser::parse_quality;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and progress stream
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "FETCHQ_PORT", default_value_t = 3000)]
        port: u16,
        /// Jobs allowed to transfer at once
        #[arg(long, env = "FETCHQ_MAX_CONCURRENT", default_value_t = 1)]
        max_concurrent: usize,
        /// Allowed CORS origins (comma separated); all origins when omitted
        #[arg(long = "allow-origin", env = "FETCHQ_ALLOWED_ORIGINS", value_delimiter = ',')]
        allowed_origins: Vec<String>,
        /// Seconds between progress stream keep-alive comments
        #[arg(long, env = "FETCHQ_KEEP_ALIVE", default_value_t = 15)]
        keep_alive: u64,
    },

    /// Download one source into the downloads directory, showing progress
    Get {
        /// Video id or full URL
        source: String,
        /// Quality tier (1080, 720, 480, 360)
        #[arg(short, long, default_value = "720", value_parser = parse_quality)]
        quality: QualityTier,
    },

    /// Resolve the format that would be used for a source and tier
    Probe {
        /// Video id or full URL
        source: String,
        /// Quality tier (1080, 720, 480, 360)
        #[arg(short, long, default_value = "720", value_parser = parse_quality)]
        quality: QualityTier,
    },

    /// Print exact sizes for every quality tier
    Sizes {
        /// Video id or full URL
        source: String,
    },

    /// List format selector candidates for a tier (no network access)
    Formats {
        /// Quality tier (1080, 720, 480, 360)
        #[arg(value_parser = parse_quality)]
        quality: QualityTier,
    },
}
