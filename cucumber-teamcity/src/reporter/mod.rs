// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translate the envelope stream into TeamCity service messages.
//!
//! The main type here is [`TeamcityReporter`], which owns the lineage index
//! and the suite lifecycle tracker and is fed one [`Envelope`] at a time.

mod steps;
mod suite;

pub use suite::SuiteTracker;

use crate::{
    errors::WriteMessageError,
    events::{Envelope, EnvelopeKind},
    index::LineageIndex,
    output::MessageSink,
};
use camino::Utf8PathBuf;
use teamcity_message::ServiceMessage;

pub(crate) static ENTERED_THE_MATRIX: &str = "enteredTheMatrix";
pub(crate) static TEST_SUITE_STARTED: &str = "testSuiteStarted";
pub(crate) static TEST_SUITE_FINISHED: &str = "testSuiteFinished";
pub(crate) static TEST_STARTED: &str = "testStarted";
pub(crate) static TEST_FINISHED: &str = "testFinished";
pub(crate) static TEST_FAILED: &str = "testFailed";
pub(crate) static TEST_IGNORED: &str = "testIgnored";

pub(crate) static ATTR_NAME: &str = "name";
pub(crate) static ATTR_MESSAGE: &str = "message";
pub(crate) static ATTR_LOCATION_HINT: &str = "locationHint";
pub(crate) static ATTR_CAPTURE_STANDARD_OUTPUT: &str = "captureStandardOutput";

/// The streaming translator.
///
/// Call [`handle`](Self::handle) with each envelope in arrival order. The
/// lineage index is updated with the envelope before any lifecycle decision
/// is made for it, so "introduced before referenced" is all the ordering the
/// producer needs to guarantee.
pub struct TeamcityReporter<S> {
    index: LineageIndex,
    suites: SuiteTracker,
    sink: S,
}

impl<S: MessageSink> TeamcityReporter<S> {
    /// Creates a reporter resolving location hints against `working_dir`.
    pub fn new(working_dir: Utf8PathBuf, sink: S) -> Self {
        Self {
            index: LineageIndex::new(),
            suites: SuiteTracker::new(working_dir),
            sink,
        }
    }

    /// Processes one envelope, emitting any resulting messages.
    ///
    /// The only error surfaced is a sink write failure; lineage misses skip
    /// silently so a translator fault never interrupts the stream.
    pub fn handle(&mut self, envelope: &Envelope) -> Result<(), WriteMessageError> {
        self.index.absorb(envelope);

        match envelope.kind() {
            EnvelopeKind::TestRunStarted(_) => {
                self.sink.message(&ServiceMessage::new(ENTERED_THE_MATRIX))?;
                Ok(())
            }
            EnvelopeKind::TestCaseStarted(event) => {
                self.suites
                    .on_case_started(&self.index, event, &mut self.sink)
            }
            EnvelopeKind::TestStepStarted(event) => {
                steps::on_step_started(&self.index, event, &mut self.sink)
            }
            EnvelopeKind::TestStepFinished(event) => {
                steps::on_step_finished(&self.index, event, &mut self.sink)
            }
            // Closing is deferred to the next case-started or to
            // run-finished; see SuiteTracker.
            EnvelopeKind::TestCaseFinished(_) => Ok(()),
            EnvelopeKind::TestRunFinished(_) => self.suites.on_run_finished(&mut self.sink),
            _ => Ok(()),
        }
    }

    /// Consumes the reporter, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
