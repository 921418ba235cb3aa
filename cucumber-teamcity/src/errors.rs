// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by cucumber-teamcity.

use thiserror::Error;

/// An error that occurred while writing a service message to the output
/// sink.
///
/// This is the only error the translator surfaces: lineage misses and
/// unresolved step names degrade silently by design, so that a translator
/// fault never interrupts delivery of further envelopes.
#[derive(Debug, Error)]
pub enum WriteMessageError {
    /// The underlying sink failed.
    #[error("error writing service message to output sink")]
    Io(#[from] std::io::Error),
}

/// An error parsing one line of the NDJSON envelope stream.
///
/// Parse failures are reportable but skippable: the stream must keep
/// flowing past a malformed line.
#[derive(Debug, Error)]
#[error("malformed envelope on line {line}")]
pub struct EnvelopeParseError {
    line: usize,
    #[source]
    err: serde_json::Error,
}

impl EnvelopeParseError {
    /// Creates a new error for the 1-based `line` of the stream.
    pub fn new(line: usize, err: serde_json::Error) -> Self {
        Self { line, err }
    }

    /// The 1-based line number of the malformed envelope.
    pub fn line(&self) -> usize {
        self.line
    }
}
