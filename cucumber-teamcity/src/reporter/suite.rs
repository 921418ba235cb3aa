// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The suite lifecycle state machine.
//!
//! The runner's stream carries no "close suite" signal: a `testCaseStarted`
//! event implies closing whatever suites the new case does not share with
//! the previous one, and `testRunFinished` closes whatever is left. Closing
//! on `testCaseFinished` would be premature -- the next case may be another
//! row of the same outline, which keeps the Scenario and Feature suites
//! open.
//!
//! The only mutable state is a rolling cursor describing what the most
//! recently started case opened. Everything emitted is a pure function of
//! that cursor plus the incoming case's lineage.

use super::{ATTR_LOCATION_HINT, ATTR_NAME, TEST_SUITE_FINISHED, TEST_SUITE_STARTED};
use crate::{
    errors::WriteMessageError,
    events::TestCaseStarted,
    index::{Lineage, LineageQuery},
    output::MessageSink,
};
use camino::{Utf8Path, Utf8PathBuf};
use teamcity_message::ServiceMessage;

/// The Example suite opened by the current outline row.
///
/// Identity is `(scenario id, index)` plus the resolved source line; the
/// display name never participates in open/close decisions, because two
/// Examples tables may render identical names.
#[derive(Clone, Debug)]
struct OpenExample {
    index: usize,
    name: String,
    line: u32,
}

/// What the most recently started case opened.
#[derive(Clone, Debug)]
struct OpenSuites {
    feature_uri: String,
    feature_name: String,
    scenario_id: String,
    scenario_name: String,
    example: Option<OpenExample>,
}

/// Decides which suite levels to close and open as cases start and the run
/// finishes.
#[derive(Debug)]
pub struct SuiteTracker {
    working_dir: Utf8PathBuf,
    open: Option<OpenSuites>,
}

impl SuiteTracker {
    /// Creates a tracker with no suites open. Relative pickle uris are
    /// resolved against `working_dir` for location hints.
    pub fn new(working_dir: Utf8PathBuf) -> Self {
        Self {
            working_dir,
            open: None,
        }
    }

    /// Handles a `testCaseStarted` event: closes the suite levels the new
    /// case does not share with the previous one, then opens the levels it
    /// needs, outermost first.
    ///
    /// A case whose lineage cannot be resolved is skipped without output.
    pub fn on_case_started(
        &mut self,
        index: &impl LineageQuery,
        event: &TestCaseStarted,
        mut sink: impl MessageSink,
    ) -> Result<(), WriteMessageError> {
        let Some(pickle) = index.pickle_of(&event.id) else {
            tracing::debug!(test_case_started_id = %event.id, "no pickle for test case, skipping");
            return Ok(());
        };
        let Some(lineage) = index.lineage_of(pickle) else {
            tracing::debug!(pickle_id = %pickle.id, "unresolved lineage, skipping");
            return Ok(());
        };
        if pickle.uri.is_none() {
            tracing::debug!(pickle_id = %pickle.id, "pickle has no uri, skipping");
            return Ok(());
        }

        let feature_changed = self
            .open
            .as_ref()
            .is_none_or(|open| open.feature_uri != lineage.feature.uri);
        let scenario_changed = self
            .open
            .as_ref()
            .is_none_or(|open| open.scenario_id != lineage.scenario.id);

        // Close phase: innermost first, and only the levels that change.
        if let Some(open) = self.open.take() {
            if feature_changed {
                if let Some(example) = &open.example {
                    close_suite(&mut sink, &example.name)?;
                }
                close_suite(&mut sink, &open.scenario_name)?;
                close_suite(&mut sink, &open.feature_name)?;
            } else if scenario_changed {
                if let Some(example) = &open.example {
                    close_suite(&mut sink, &example.name)?;
                }
                close_suite(&mut sink, &open.scenario_name)?;
            } else if let Some(example) = &open.example {
                // Same scenario, next example row.
                close_suite(&mut sink, &example.name)?;
            }
        }

        // Open phase: outermost first.
        let path = self.absolute_path(pickle.uri.as_deref().unwrap_or_default());

        let feature_name = format!("Feature: {}", lineage.feature.name);
        if feature_changed {
            open_suite(&mut sink, &feature_name, &path, lineage.feature.source_line)?;
        }

        let scenario_keyword = if lineage.example_index.is_some() {
            "Scenario Outline"
        } else {
            "Scenario"
        };
        let scenario_name = format!("{scenario_keyword}: {}", lineage.scenario.name);
        if scenario_changed {
            open_suite(
                &mut sink,
                &scenario_name,
                &path,
                lineage.scenario.source_line,
            )?;
        }

        let example = match lineage.example_index {
            Some(example_index) => {
                // The row line, falling back to the scenario header when the
                // row could not be resolved.
                let line = index
                    .location_of(pickle)
                    .map_or(lineage.scenario.source_line, |location| location.line);
                let name = example_display_name(&lineage, example_index);
                open_suite(&mut sink, &name, &path, line)?;
                Some(OpenExample {
                    index: example_index,
                    name,
                    line,
                })
            }
            None => None,
        };

        self.open = Some(OpenSuites {
            feature_uri: lineage.feature.uri,
            feature_name,
            scenario_id: lineage.scenario.id,
            scenario_name,
            example,
        });
        Ok(())
    }

    /// Handles `testRunFinished`: closes everything still open, innermost
    /// first, so that every opened suite gets its matching close even though
    /// no further case will arrive.
    pub fn on_run_finished(&mut self, mut sink: impl MessageSink) -> Result<(), WriteMessageError> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        if let Some(example) = &open.example {
            close_suite(&mut sink, &example.name)?;
        }
        close_suite(&mut sink, &open.scenario_name)?;
        close_suite(&mut sink, &open.feature_name)?;
        Ok(())
    }

    /// The zero-based index and resolved line of the currently open Example
    /// suite, if any.
    pub fn open_example(&self) -> Option<(usize, u32)> {
        let example = self.open.as_ref()?.example.as_ref()?;
        Some((example.index, example.line))
    }

    fn absolute_path(&self, uri: &str) -> Utf8PathBuf {
        let path = Utf8Path::new(uri);
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.working_dir.join(path)
        }
    }
}

fn example_display_name(lineage: &Lineage, example_index: usize) -> String {
    match &lineage.examples_name {
        Some(table_name) => format!("Example #{}: {table_name}", example_index + 1),
        None => format!("Example #{}", example_index + 1),
    }
}

fn open_suite(
    mut sink: impl MessageSink,
    name: &str,
    path: &Utf8Path,
    line: u32,
) -> Result<(), WriteMessageError> {
    let message = ServiceMessage::new(TEST_SUITE_STARTED)
        .attr(ATTR_NAME, name)
        .attr(ATTR_LOCATION_HINT, format!("file://{path}:{line}"));
    sink.message(&message)?;
    Ok(())
}

fn close_suite(mut sink: impl MessageSink, name: &str) -> Result<(), WriteMessageError> {
    sink.message(&ServiceMessage::new(TEST_SUITE_FINISHED).attr(ATTR_NAME, name))?;
    Ok(())
}
