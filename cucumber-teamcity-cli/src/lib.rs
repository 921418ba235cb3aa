// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for [`cucumber-teamcity`](cucumber_teamcity).
//!
//! Reads the NDJSON envelope stream produced by `cucumber-js --format
//! message` from a file or standard input and writes TeamCity service
//! messages to standard output. Diagnostics go to standard error so stdout
//! stays a clean protocol channel for the consumer.

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use cucumber_teamcity::{
    errors::{EnvelopeParseError, WriteMessageError},
    events::Envelope,
    output::{MessageSink, StdoutSink},
    reporter::TeamcityReporter,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};
use tracing_subscriber::{filter::LevelFilter, filter::Targets, prelude::*};

/// Environment variable controlling the stderr log filter, in
/// [`Targets`] syntax.
static LOG_ENV: &str = "CUCUMBER_TEAMCITY_LOG";

/// Translate a cucumber-js messages stream into TeamCity service messages.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct App {
    /// Directory against which relative feature-file paths are resolved for
    /// location hints. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    cwd: Option<Utf8PathBuf>,

    /// NDJSON messages file to read. Reads standard input when omitted.
    #[arg(value_name = "MESSAGES")]
    messages: Option<Utf8PathBuf>,
}

impl App {
    /// Initializes stderr logging from the `CUCUMBER_TEAMCITY_LOG`
    /// environment variable.
    pub fn init_logging(&self) {
        let level_str = std::env::var(LOG_ENV).unwrap_or_default();
        let targets = if level_str.is_empty() {
            Targets::new().with_default(LevelFilter::WARN)
        } else {
            level_str
                .parse()
                .unwrap_or_else(|_| panic!("unable to parse {LOG_ENV}"))
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_filter(targets);
        tracing_subscriber::registry().with(layer).init();
    }

    /// Runs the translation to completion.
    pub fn exec(self) -> Result<()> {
        let working_dir = match self.cwd {
            Some(dir) => dir,
            None => {
                let dir = std::env::current_dir().wrap_err("reading current directory")?;
                Utf8PathBuf::from_path_buf(dir)
                    .map_err(|dir| color_eyre::eyre::eyre!("working directory {dir:?} is not UTF-8"))?
            }
        };

        let mut reporter = TeamcityReporter::new(working_dir, StdoutSink::new());
        match &self.messages {
            Some(path) => {
                let file = File::open(path).wrap_err_with(|| format!("opening {path}"))?;
                translate(BufReader::new(file), &mut reporter)?;
            }
            None => {
                translate(io::stdin().lock(), &mut reporter)?;
            }
        }
        Ok(())
    }
}

/// Drains the NDJSON stream into the reporter.
///
/// Malformed lines are logged and skipped -- the stream must keep flowing --
/// but sink write failures end the run.
pub fn translate<S: MessageSink>(
    reader: impl BufRead,
    reporter: &mut TeamcityReporter<S>,
) -> Result<(), WriteMessageError> {
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(WriteMessageError::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Envelope>(&line) {
            Ok(envelope) => reporter.handle(&envelope)?,
            Err(err) => {
                let err = EnvelopeParseError::new(line_number + 1, err);
                tracing::warn!("skipping malformed envelope: {err}");
            }
        }
    }
    Ok(())
}
