// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sinks that service messages are written to.
//!
//! The reporter never writes to stdout directly; it goes through
//! [`MessageSink`] so tests can capture the emitted messages. The consumer
//! reconstructs the suite tree from nesting order, not timestamps, so sinks
//! must preserve the emission order exactly.

use std::io::{self, Write};
use teamcity_message::ServiceMessage;

/// An ordered, append-only destination for service messages.
pub trait MessageSink {
    /// Appends one message. A message corresponds to one protocol line.
    fn message(&mut self, message: &ServiceMessage) -> io::Result<()>;
}

/// Captures messages unrendered, preserving order. Used in tests, where the
/// render-time timestamp would otherwise make assertions nondeterministic.
impl MessageSink for Vec<ServiceMessage> {
    fn message(&mut self, message: &ServiceMessage) -> io::Result<()> {
        self.push(message.clone());
        Ok(())
    }
}

impl<T: MessageSink + ?Sized> MessageSink for &mut T {
    fn message(&mut self, message: &ServiceMessage) -> io::Result<()> {
        (**self).message(message)
    }
}

/// Renders each message as one line on standard output, flushing per line.
///
/// The consumer tails the process output live, so lines must not sit in a
/// buffer until the run ends.
#[derive(Debug, Default)]
pub struct StdoutSink {}

impl StdoutSink {
    /// Creates a new stdout sink.
    pub fn new() -> Self {
        Self {}
    }
}

impl MessageSink for StdoutSink {
    fn message(&mut self, message: &ServiceMessage) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(message.render().as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()
    }
}
