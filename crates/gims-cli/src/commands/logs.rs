//! `gims logs stream <script_id>`

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;

use gims_core::api::HttpGateway;
use gims_core::logs::{
    DEFAULT_END_MARKER, DEFAULT_MAX_SIZE_KB, DEFAULT_TIMEOUT_SECS, StreamOptions, stream_script_log,
};

use crate::output::EXIT_INTERRUPTED;

#[derive(Subcommand)]
pub enum LogsCommand {
    /// Tail the execution log of a script
    Stream {
        script_id: i64,
        /// Seconds to wait for the end marker
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
        /// Historical lines to replay (0 = only new lines)
        #[arg(long, default_value_t = 0)]
        tail: u32,
        /// Lines that end the stream
        #[arg(long, num_args = 1.., default_values_t = [DEFAULT_END_MARKER.to_string()])]
        end_markers: Vec<String>,
        /// Regex (or substring) a line must match to be kept
        #[arg(long)]
        filter: Option<String>,
        /// Keep the `YYYY-MM-DD HH:MM:SS,mmm [LEVEL]` prefix
        #[arg(long)]
        keep_timestamp: bool,
        /// Output budget in KB
        #[arg(long = "max-size", default_value_t = DEFAULT_MAX_SIZE_KB)]
        max_size_kb: u64,
    },
}

pub fn run(gateway: &HttpGateway, command: LogsCommand) -> Result<ExitCode> {
    match command {
        LogsCommand::Stream {
            script_id,
            timeout,
            tail,
            end_markers,
            filter,
            keep_timestamp,
            max_size_kb,
        } => {
            let options = StreamOptions::default()
                .with_timeout(Duration::from_secs(timeout))
                .with_tail(tail)
                .with_end_markers(end_markers)
                .with_filter(filter)
                .with_keep_timestamp(keep_timestamp)
                .with_max_size_kb(max_size_kb);

            let capture = stream_script_log(gateway, script_id, &options)?;
            for line in &capture.lines {
                println!("{line}");
            }
            for warning in &capture.warnings {
                eprintln!("{warning}");
            }

            if capture.interrupted {
                eprintln!("Interrupted");
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
            if capture.lines.is_empty() {
                eprintln!("No log data received");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
