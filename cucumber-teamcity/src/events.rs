// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The envelope stream data model.
//!
//! One [`Envelope`] corresponds to one line of the Cucumber messages NDJSON
//! stream. The upstream wire format is a JSON object with exactly one
//! populated key; this module models only the envelope kinds and fields the
//! translator reads, and ignores everything else.
//!
//! Ordering is guaranteed by the producer: an entity (document, pickle, test
//! case) is always introduced before a later event references it.

use serde::Deserialize;

/// One event of the Cucumber messages stream.
///
/// Exactly one field is populated per envelope; [`Envelope::kind`] collapses
/// the option fields into a discriminated view.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Envelope {
    /// The test run began.
    pub test_run_started: Option<TestRunStarted>,
    /// A parsed feature file.
    pub gherkin_document: Option<GherkinDocument>,
    /// A fully resolved scenario instance (one per Examples row for outlines).
    pub pickle: Option<Pickle>,
    /// A compiled, runnable test case for a pickle.
    pub test_case: Option<TestCase>,
    /// Execution of a test case began.
    pub test_case_started: Option<TestCaseStarted>,
    /// Execution of a step began.
    pub test_step_started: Option<TestStepStarted>,
    /// Execution of a step completed.
    pub test_step_finished: Option<TestStepFinished>,
    /// Execution of a test case completed.
    pub test_case_finished: Option<TestCaseFinished>,
    /// The test run completed.
    pub test_run_finished: Option<TestRunFinished>,
}

impl Envelope {
    /// Returns the populated event of this envelope, or
    /// [`EnvelopeKind::Other`] for envelope kinds the translator ignores
    /// (sources, parse errors, hook and step definitions, ...).
    pub fn kind(&self) -> EnvelopeKind<'_> {
        if let Some(e) = &self.test_run_started {
            EnvelopeKind::TestRunStarted(e)
        } else if let Some(e) = &self.gherkin_document {
            EnvelopeKind::GherkinDocument(e)
        } else if let Some(e) = &self.pickle {
            EnvelopeKind::Pickle(e)
        } else if let Some(e) = &self.test_case {
            EnvelopeKind::TestCase(e)
        } else if let Some(e) = &self.test_case_started {
            EnvelopeKind::TestCaseStarted(e)
        } else if let Some(e) = &self.test_step_started {
            EnvelopeKind::TestStepStarted(e)
        } else if let Some(e) = &self.test_step_finished {
            EnvelopeKind::TestStepFinished(e)
        } else if let Some(e) = &self.test_case_finished {
            EnvelopeKind::TestCaseFinished(e)
        } else if let Some(e) = &self.test_run_finished {
            EnvelopeKind::TestRunFinished(e)
        } else {
            EnvelopeKind::Other
        }
    }
}

/// A borrowed, discriminated view over [`Envelope`].
#[derive(Clone, Copy, Debug)]
pub enum EnvelopeKind<'a> {
    /// The test run began.
    TestRunStarted(&'a TestRunStarted),
    /// A parsed feature file.
    GherkinDocument(&'a GherkinDocument),
    /// A fully resolved scenario instance.
    Pickle(&'a Pickle),
    /// A compiled test case.
    TestCase(&'a TestCase),
    /// Execution of a test case began.
    TestCaseStarted(&'a TestCaseStarted),
    /// Execution of a step began.
    TestStepStarted(&'a TestStepStarted),
    /// Execution of a step completed.
    TestStepFinished(&'a TestStepFinished),
    /// Execution of a test case completed.
    TestCaseFinished(&'a TestCaseFinished),
    /// The test run completed.
    TestRunFinished(&'a TestRunFinished),
    /// An envelope kind the translator does not read.
    Other,
}

/// Marker payload for `testRunStarted`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestRunStarted {}

/// Marker payload for `testRunFinished`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestRunFinished {}

/// A parsed feature file, pre-compilation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GherkinDocument {
    /// Path of the feature file, relative to the working directory.
    pub uri: Option<String>,
    /// Absent when the file failed to parse.
    pub feature: Option<Feature>,
}

/// The `Feature:` node of a gherkin document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feature {
    /// Display name, without the `Feature:` keyword.
    pub name: String,
    /// Source position of the `Feature:` line.
    pub location: Location,
    /// Scenarios, backgrounds and rules, in source order.
    pub children: Vec<FeatureChild>,
}

/// One child of a feature: a scenario, a rule, or something this translator
/// does not read (e.g. a background).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureChild {
    /// A scenario or scenario outline.
    pub scenario: Option<Scenario>,
    /// A `Rule:` grouping; its scenarios are indexed like top-level ones.
    pub rule: Option<Rule>,
}

/// A `Rule:` node.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rule {
    /// Children of the rule, in source order.
    pub children: Vec<RuleChild>,
}

/// One child of a rule.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleChild {
    /// A scenario or scenario outline.
    pub scenario: Option<Scenario>,
}

/// A `Scenario:` or `Scenario Outline:` node.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    /// AST node id, referenced by pickles.
    pub id: String,
    /// Display name, without the keyword.
    pub name: String,
    /// Source position of the scenario header line.
    pub location: Location,
    /// Examples tables; empty for plain scenarios.
    pub examples: Vec<Examples>,
}

/// One `Examples:` table of a scenario outline.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Examples {
    /// Optional table name, e.g. `Examples: valid users`.
    pub name: Option<String>,
    /// Data rows, excluding the header row.
    pub table_body: Vec<TableRow>,
}

/// One data row of an Examples table.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRow {
    /// AST node id, referenced by outline pickles.
    pub id: String,
    /// Source position of the row.
    pub location: Location,
}

/// A 1-based source position. Only the line is read.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    /// 1-based line number.
    pub line: u32,
}

impl Default for Location {
    fn default() -> Self {
        Self { line: 1 }
    }
}

/// A fully resolved scenario instance: parameters substituted, one pickle
/// per plain scenario or per Examples row.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pickle {
    /// Pickle id, referenced by test cases.
    pub id: String,
    /// Path of the source feature file, relative to the working directory.
    pub uri: Option<String>,
    /// Display name of the pickle.
    pub name: String,
    /// Ids of the AST nodes this pickle derives from. For outline rows the
    /// last id is the Examples table row; the first is always the scenario.
    pub ast_node_ids: Vec<String>,
    /// Resolved steps, in execution order.
    pub steps: Vec<PickleStep>,
}

/// One resolved step of a pickle.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickleStep {
    /// Pickle step id, referenced by test steps.
    pub id: String,
    /// Literal step text, parameters substituted.
    pub text: String,
}

/// A compiled, runnable test case for a pickle.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCase {
    /// Test case id, referenced by `testCaseStarted`.
    pub id: String,
    /// The pickle this case executes.
    pub pickle_id: String,
    /// Steps and hook invocations, in execution order.
    pub test_steps: Vec<TestStep>,
}

/// One step of a test case: either a pickle step bound to glue code, or a
/// hook invocation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestStep {
    /// Test step id, referenced by step events.
    pub id: String,
    /// Set when this step executes a pickle step.
    pub pickle_step_id: Option<String>,
    /// Set when this step is a hook invocation.
    pub hook_id: Option<String>,
}

/// Execution of a test case began.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseStarted {
    /// Id of this execution, referenced by step and case-finished events.
    pub id: String,
    /// The test case being executed.
    pub test_case_id: String,
}

/// Execution of a test case completed. Carries no result; step results are
/// reported per step.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseFinished {
    /// The execution that completed.
    pub test_case_started_id: String,
}

/// Execution of a step began.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestStepStarted {
    /// The enclosing test case execution.
    pub test_case_started_id: String,
    /// The step being executed.
    pub test_step_id: String,
}

/// Execution of a step completed.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestStepFinished {
    /// The enclosing test case execution.
    pub test_case_started_id: String,
    /// The step that completed.
    pub test_step_id: String,
    /// Outcome of the step.
    pub test_step_result: TestStepResult,
}

/// Outcome of one step execution.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestStepResult {
    /// Resolved status.
    pub status: StepStatus,
    /// Runner-supplied failure text, when any.
    pub message: Option<String>,
}

/// Step execution status, as reported by the runner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// The step ran and succeeded.
    Passed,
    /// The step ran and failed.
    Failed,
    /// More than one glue definition matched the step text.
    Ambiguous,
    /// No glue definition matched the step text.
    Undefined,
    /// The step was not run (e.g. an earlier step failed).
    Skipped,
    /// The glue definition is marked pending.
    Pending,
    /// The runner could not determine a status.
    #[default]
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_kind_picks_the_populated_field() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"testCaseStarted":{"id":"tcs-1","testCaseId":"tc-1","timestamp":{"seconds":1,"nanos":0}}}"#,
        )
        .expect("envelope parses");
        match envelope.kind() {
            EnvelopeKind::TestCaseStarted(e) => {
                assert_eq!(e.id, "tcs-1");
                assert_eq!(e.test_case_id, "tc-1");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn unknown_envelope_kinds_are_other() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"stepDefinition":{"id":"sd-1"}}"#).expect("envelope parses");
        assert!(matches!(envelope.kind(), EnvelopeKind::Other));
    }

    #[test]
    fn step_status_parses_screaming_snake_case() {
        let result: TestStepResult =
            serde_json::from_str(r#"{"status":"UNDEFINED"}"#).expect("result parses");
        assert_eq!(result.status, StepStatus::Undefined);
        assert_eq!(result.message, None);
    }

    #[test]
    fn unrecognized_step_status_maps_to_unknown() {
        let result: TestStepResult =
            serde_json::from_str(r#"{"status":"SOMETHING_NEW"}"#).expect("result parses");
        assert_eq!(result.status, StepStatus::Unknown);
    }

    #[test]
    fn gherkin_document_parses_the_subset_we_read() {
        let doc: GherkinDocument = serde_json::from_str(
            r#"{
                "uri": "features/a.feature",
                "feature": {
                    "name": "Login",
                    "location": {"line": 1, "column": 1},
                    "keyword": "Feature",
                    "children": [
                        {"scenario": {
                            "id": "sc-1",
                            "name": "happy path",
                            "keyword": "Scenario",
                            "location": {"line": 3, "column": 3},
                            "examples": []
                        }},
                        {"background": {"id": "bg-1"}}
                    ]
                }
            }"#,
        )
        .expect("document parses");
        let feature = doc.feature.expect("feature present");
        assert_eq!(feature.name, "Login");
        assert_eq!(feature.location.line, 1);
        let scenario = feature.children[0].scenario.as_ref().expect("scenario");
        assert_eq!(scenario.id, "sc-1");
        assert_eq!(scenario.location.line, 3);
        assert!(feature.children[1].scenario.is_none());
    }
}
