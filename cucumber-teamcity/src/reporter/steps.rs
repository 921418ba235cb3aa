// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-step reporting: start, outcome, finish.
//!
//! Steps never open or close suites; they report inside whatever suite the
//! lifecycle tracker currently has open. A naming miss degrades to a
//! fallback display name rather than failing, because the translator must
//! never abort the stream.

use super::{
    ATTR_CAPTURE_STANDARD_OUTPUT, ATTR_MESSAGE, ATTR_NAME, TEST_FAILED, TEST_FINISHED,
    TEST_IGNORED, TEST_STARTED,
};
use crate::{
    errors::WriteMessageError,
    events::{StepStatus, TestStepFinished, TestStepStarted},
    index::LineageQuery,
    output::MessageSink,
};
use teamcity_message::ServiceMessage;

static HOOK_NAME: &str = "Hook";
static UNKNOWN_STEP_NAME: &str = "Unknown step";

static MSG_UNDEFINED: &str = "Step is undefined";
static MSG_AMBIGUOUS: &str = "Step is ambiguous";
static MSG_SKIPPED: &str = "Step was skipped";
static MSG_PENDING: &str = "Step is pending";

pub(super) fn on_step_started(
    index: &impl LineageQuery,
    event: &TestStepStarted,
    mut sink: impl MessageSink,
) -> Result<(), WriteMessageError> {
    let name = display_name(index, &event.test_case_started_id, &event.test_step_id);
    sink.message(
        &ServiceMessage::new(TEST_STARTED)
            .attr(ATTR_NAME, name)
            .attr(ATTR_CAPTURE_STANDARD_OUTPUT, "true"),
    )?;
    Ok(())
}

pub(super) fn on_step_finished(
    index: &impl LineageQuery,
    event: &TestStepFinished,
    mut sink: impl MessageSink,
) -> Result<(), WriteMessageError> {
    let name = display_name(index, &event.test_case_started_id, &event.test_step_id);

    match event.test_step_result.status {
        // Success is implicit: testFinished without an outcome record.
        StepStatus::Passed => {}
        StepStatus::Undefined => fail(&mut sink, &name, MSG_UNDEFINED)?,
        StepStatus::Ambiguous => fail(&mut sink, &name, MSG_AMBIGUOUS)?,
        StepStatus::Failed => {
            let message = event.test_step_result.message.as_deref().unwrap_or("");
            fail(&mut sink, &name, message)?;
        }
        StepStatus::Skipped => ignore(&mut sink, &name, MSG_SKIPPED)?,
        StepStatus::Pending => ignore(&mut sink, &name, MSG_PENDING)?,
        StepStatus::Unknown => {
            tracing::warn!(step = %name, "step finished with unknown status");
        }
    }

    sink.message(&ServiceMessage::new(TEST_FINISHED).attr(ATTR_NAME, name))?;
    Ok(())
}

/// Resolves what a step should be called in the report: the literal pickle
/// step text, `"Hook"` for hook invocations, the raw step id when the step
/// is known but maps to neither, and `"Unknown step"` when it cannot be
/// resolved at all.
fn display_name(index: &impl LineageQuery, test_case_started_id: &str, test_step_id: &str) -> String {
    let Some(step) = index.test_step_of(test_case_started_id, test_step_id) else {
        return UNKNOWN_STEP_NAME.to_owned();
    };
    if let Some(text) = index.pickle_step_text_of(step) {
        return text.to_owned();
    }
    if step.hook_id.is_some() {
        return HOOK_NAME.to_owned();
    }
    step.id.clone()
}

fn fail(mut sink: impl MessageSink, name: &str, message: &str) -> Result<(), WriteMessageError> {
    sink.message(
        &ServiceMessage::new(TEST_FAILED)
            .attr(ATTR_NAME, name)
            .attr(ATTR_MESSAGE, message),
    )?;
    Ok(())
}

fn ignore(mut sink: impl MessageSink, name: &str, message: &str) -> Result<(), WriteMessageError> {
    sink.message(
        &ServiceMessage::new(TEST_IGNORED)
            .attr(ATTR_NAME, name)
            .attr(ATTR_MESSAGE, message),
    )?;
    Ok(())
}
