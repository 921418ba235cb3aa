// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lineage index: which feature/scenario/example a test case belongs to.
//!
//! The reporter never owns this data. It reads it through the
//! [`LineageQuery`] contract, which [`LineageIndex`] implements by absorbing
//! envelopes as they arrive. The index must be updated with each envelope
//! *before* the reporter is asked to handle that envelope; the producer
//! guarantees that documents, pickles and test cases arrive before events
//! that reference them.

use crate::events::{
    Envelope, EnvelopeKind, Examples, GherkinDocument, Pickle, Scenario, TestStep,
};
use indexmap::IndexMap;

/// Feature-level ancestry of a pickle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeatureLineage {
    /// Uri of the feature document, relative to the working directory.
    pub uri: String,
    /// Feature display name, without the keyword.
    pub name: String,
    /// 1-based line of the `Feature:` header.
    pub source_line: u32,
}

/// Scenario-level ancestry of a pickle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioLineage {
    /// AST node id of the scenario. Stable across all pickles of one
    /// outline, and globally unique across documents.
    pub id: String,
    /// Scenario display name, without the keyword.
    pub name: String,
    /// 1-based line of the scenario header.
    pub source_line: u32,
}

/// The full ancestry resolved for one pickle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lineage {
    /// The enclosing feature.
    pub feature: FeatureLineage,
    /// The enclosing scenario or scenario outline.
    pub scenario: ScenarioLineage,
    /// Name of the Examples table, when the table has one.
    pub examples_name: Option<String>,
    /// Zero-based position within the Examples table body. Present exactly
    /// when the pickle is a scenario-outline row.
    pub example_index: Option<usize>,
}

/// A resolved file-and-line position for a pickle: the example-row line for
/// outline rows, the scenario header line otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceLocation {
    /// Uri of the feature document, relative to the working directory.
    pub uri: String,
    /// 1-based line number.
    pub line: u32,
}

/// Read-only lineage lookups, as consumed by the reporter.
///
/// The reporter takes this contract at its seams rather than a concrete
/// index, so tests can substitute a canned double.
pub trait LineageQuery {
    /// Resolves the pickle executed by the given `testCaseStarted` id.
    fn pickle_of(&self, test_case_started_id: &str) -> Option<&Pickle>;

    /// Resolves the feature/scenario/example ancestry of a pickle.
    fn lineage_of(&self, pickle: &Pickle) -> Option<Lineage>;

    /// Resolves the source position of a pickle.
    fn location_of(&self, pickle: &Pickle) -> Option<SourceLocation>;

    /// Resolves a test step within the given test case execution.
    fn test_step_of(&self, test_case_started_id: &str, test_step_id: &str) -> Option<&TestStep>;

    /// Resolves the literal text of the pickle step a test step executes.
    fn pickle_step_text_of(&self, test_step: &TestStep) -> Option<&str>;
}

/// Per-scenario facts recorded from a gherkin document.
#[derive(Clone, Debug)]
struct ScenarioMeta {
    feature_uri: String,
    feature_name: String,
    feature_line: u32,
    name: String,
    line: u32,
}

/// Per-example-row facts recorded from a gherkin document.
#[derive(Clone, Debug)]
struct ExampleRowMeta {
    line: u32,
    examples_name: Option<String>,
    /// Zero-based position across the scenario's Examples tables, counted
    /// the way the reporting protocol numbers rows: a single running index
    /// over all table bodies of the scenario.
    row_index: usize,
}

/// The concrete, incrementally built lineage index.
///
/// Rebuilt from scratch per run; all maps only grow.
#[derive(Debug, Default)]
pub struct LineageIndex {
    /// scenario AST id -> scenario and feature facts.
    scenarios: IndexMap<String, ScenarioMeta>,
    /// Examples table row AST id -> row facts.
    example_rows: IndexMap<String, ExampleRowMeta>,
    /// pickle id -> pickle.
    pickles: IndexMap<String, Pickle>,
    /// pickle step id -> literal step text.
    pickle_step_texts: IndexMap<String, String>,
    /// test case id -> (pickle id, test steps).
    test_cases: IndexMap<String, (String, Vec<TestStep>)>,
    /// testCaseStarted id -> test case id.
    started_cases: IndexMap<String, String>,
}

impl LineageIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one envelope into the index. Envelope kinds that carry no
    /// lineage data are ignored.
    pub fn absorb(&mut self, envelope: &Envelope) {
        match envelope.kind() {
            EnvelopeKind::GherkinDocument(doc) => self.absorb_document(doc),
            EnvelopeKind::Pickle(pickle) => self.absorb_pickle(pickle),
            EnvelopeKind::TestCase(test_case) => {
                self.test_cases.insert(
                    test_case.id.clone(),
                    (test_case.pickle_id.clone(), test_case.test_steps.clone()),
                );
            }
            EnvelopeKind::TestCaseStarted(started) => {
                self.started_cases
                    .insert(started.id.clone(), started.test_case_id.clone());
            }
            _ => {}
        }
    }

    fn absorb_document(&mut self, doc: &GherkinDocument) {
        let Some(feature) = &doc.feature else {
            return;
        };
        let Some(uri) = doc.uri.as_deref() else {
            return;
        };

        for child in &feature.children {
            if let Some(scenario) = &child.scenario {
                self.absorb_scenario(uri, &feature.name, feature.location.line, scenario);
            }
            // Scenarios nested under a Rule report against the feature
            // directly; the rule itself is not a suite level.
            if let Some(rule) = &child.rule {
                for rule_child in &rule.children {
                    if let Some(scenario) = &rule_child.scenario {
                        self.absorb_scenario(uri, &feature.name, feature.location.line, scenario);
                    }
                }
            }
        }
    }

    fn absorb_scenario(
        &mut self,
        feature_uri: &str,
        feature_name: &str,
        feature_line: u32,
        scenario: &Scenario,
    ) {
        self.scenarios.insert(
            scenario.id.clone(),
            ScenarioMeta {
                feature_uri: feature_uri.to_owned(),
                feature_name: feature_name.to_owned(),
                feature_line,
                name: scenario.name.clone(),
                line: scenario.location.line,
            },
        );

        let mut row_index = 0;
        for examples in &scenario.examples {
            self.absorb_examples(examples, &mut row_index);
        }
    }

    fn absorb_examples(&mut self, examples: &Examples, row_index: &mut usize) {
        for row in &examples.table_body {
            self.example_rows.insert(
                row.id.clone(),
                ExampleRowMeta {
                    line: row.location.line,
                    examples_name: examples.name.clone(),
                    row_index: *row_index,
                },
            );
            *row_index += 1;
        }
    }

    fn absorb_pickle(&mut self, pickle: &Pickle) {
        for step in &pickle.steps {
            self.pickle_step_texts
                .insert(step.id.clone(), step.text.clone());
        }
        self.pickles.insert(pickle.id.clone(), pickle.clone());
    }

    /// The Examples row this pickle derives from, if any. For outline rows
    /// the row id is the *last* AST node id; the first is the scenario.
    fn example_row_of(&self, pickle: &Pickle) -> Option<&ExampleRowMeta> {
        let row_id = pickle.ast_node_ids.last()?;
        if Some(row_id) == pickle.ast_node_ids.first() {
            // Single AST node: a plain scenario, not an outline row.
            return None;
        }
        self.example_rows.get(row_id)
    }
}

impl LineageQuery for LineageIndex {
    fn pickle_of(&self, test_case_started_id: &str) -> Option<&Pickle> {
        let test_case_id = self.started_cases.get(test_case_started_id)?;
        let (pickle_id, _) = self.test_cases.get(test_case_id)?;
        self.pickles.get(pickle_id)
    }

    fn lineage_of(&self, pickle: &Pickle) -> Option<Lineage> {
        let scenario_id = pickle.ast_node_ids.first()?;
        let meta = self.scenarios.get(scenario_id)?;
        let row = self.example_row_of(pickle);

        Some(Lineage {
            feature: FeatureLineage {
                uri: meta.feature_uri.clone(),
                name: meta.feature_name.clone(),
                source_line: meta.feature_line,
            },
            scenario: ScenarioLineage {
                id: scenario_id.clone(),
                name: meta.name.clone(),
                source_line: meta.line,
            },
            examples_name: row.and_then(|row| row.examples_name.clone()),
            example_index: row.map(|row| row.row_index),
        })
    }

    fn location_of(&self, pickle: &Pickle) -> Option<SourceLocation> {
        let uri = pickle.uri.clone()?;
        let line = match self.example_row_of(pickle) {
            Some(row) => row.line,
            None => {
                // Fall back to the scenario header, then to line 1 for
                // pickles whose AST nodes are unknown.
                pickle
                    .ast_node_ids
                    .first()
                    .and_then(|id| self.scenarios.get(id))
                    .map_or(1, |meta| meta.line)
            }
        };
        Some(SourceLocation { uri, line })
    }

    fn test_step_of(&self, test_case_started_id: &str, test_step_id: &str) -> Option<&TestStep> {
        let test_case_id = self.started_cases.get(test_case_started_id)?;
        let (_, steps) = self.test_cases.get(test_case_id)?;
        steps.iter().find(|step| step.id == test_step_id)
    }

    fn pickle_step_text_of(&self, test_step: &TestStep) -> Option<&str> {
        let pickle_step_id = test_step.pickle_step_id.as_deref()?;
        self.pickle_step_texts.get(pickle_step_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn absorb_json(index: &mut LineageIndex, json: &str) {
        let envelope: Envelope = serde_json::from_str(json).expect("envelope parses");
        index.absorb(&envelope);
    }

    fn outline_fixture() -> LineageIndex {
        let mut index = LineageIndex::new();
        absorb_json(
            &mut index,
            r#"{"gherkinDocument":{"uri":"features/login.feature","feature":{
                "name":"Login","location":{"line":1},
                "children":[{"scenario":{
                    "id":"sc-1","name":"Sign in as <user>","location":{"line":3},
                    "examples":[
                        {"name":"valid users","tableBody":[
                            {"id":"row-1","location":{"line":9}},
                            {"id":"row-2","location":{"line":10}}
                        ]},
                        {"tableBody":[
                            {"id":"row-3","location":{"line":13}}
                        ]}
                    ]
                }}]
            }}}"#,
        );
        absorb_json(
            &mut index,
            r#"{"pickle":{"id":"p-1","uri":"features/login.feature","name":"Sign in as alice",
                "astNodeIds":["sc-1","row-1"],
                "steps":[{"id":"ps-1","text":"I log in as alice"}]}}"#,
        );
        absorb_json(
            &mut index,
            r#"{"pickle":{"id":"p-3","uri":"features/login.feature","name":"Sign in as carol",
                "astNodeIds":["sc-1","row-3"],"steps":[]}}"#,
        );
        absorb_json(
            &mut index,
            r#"{"testCase":{"id":"tc-1","pickleId":"p-1","testSteps":[
                {"id":"ts-1","pickleStepId":"ps-1"},
                {"id":"ts-hook","hookId":"h-1"}
            ]}}"#,
        );
        absorb_json(
            &mut index,
            r#"{"testCaseStarted":{"id":"tcs-1","testCaseId":"tc-1"}}"#,
        );
        index
    }

    #[test]
    fn resolves_pickle_through_the_started_chain() {
        let index = outline_fixture();
        let pickle = index.pickle_of("tcs-1").expect("pickle resolves");
        assert_eq!(pickle.id, "p-1");
        assert!(index.pickle_of("tcs-unknown").is_none());
    }

    #[test]
    fn lineage_of_outline_row_carries_example_index_and_table_name() {
        let index = outline_fixture();
        let pickle = index.pickle_of("tcs-1").unwrap();
        let lineage = index.lineage_of(pickle).expect("lineage resolves");
        assert_eq!(
            lineage,
            Lineage {
                feature: FeatureLineage {
                    uri: "features/login.feature".into(),
                    name: "Login".into(),
                    source_line: 1,
                },
                scenario: ScenarioLineage {
                    id: "sc-1".into(),
                    name: "Sign in as <user>".into(),
                    source_line: 3,
                },
                examples_name: Some("valid users".into()),
                example_index: Some(0),
            }
        );
    }

    #[test]
    fn example_index_runs_across_tables() {
        let index = outline_fixture();
        let pickle = index.pickles.get("p-3").unwrap();
        let lineage = index.lineage_of(pickle).expect("lineage resolves");
        // Third row overall, in the scenario's second (unnamed) table.
        assert_eq!(lineage.example_index, Some(2));
        assert_eq!(lineage.examples_name, None);
    }

    #[test]
    fn location_of_outline_row_is_the_row_line() {
        let index = outline_fixture();
        let pickle = index.pickles.get("p-1").unwrap();
        assert_eq!(
            index.location_of(pickle),
            Some(SourceLocation {
                uri: "features/login.feature".into(),
                line: 9,
            })
        );
    }

    #[test]
    fn location_of_plain_scenario_is_the_scenario_line() {
        let mut index = LineageIndex::new();
        absorb_json(
            &mut index,
            r#"{"gherkinDocument":{"uri":"features/a.feature","feature":{
                "name":"A","location":{"line":1},
                "children":[{"scenario":{"id":"sc-9","name":"plain","location":{"line":5},"examples":[]}}]
            }}}"#,
        );
        absorb_json(
            &mut index,
            r#"{"pickle":{"id":"p-9","uri":"features/a.feature","name":"plain",
                "astNodeIds":["sc-9"],"steps":[]}}"#,
        );
        let pickle = index.pickles.get("p-9").unwrap();
        assert_eq!(
            index.location_of(pickle),
            Some(SourceLocation {
                uri: "features/a.feature".into(),
                line: 5,
            })
        );
        let lineage = index.lineage_of(pickle).unwrap();
        assert_eq!(lineage.example_index, None);
    }

    #[test]
    fn scenarios_under_rules_are_indexed() {
        let mut index = LineageIndex::new();
        absorb_json(
            &mut index,
            r#"{"gherkinDocument":{"uri":"features/r.feature","feature":{
                "name":"Ruled","location":{"line":1},
                "children":[{"rule":{"children":[
                    {"scenario":{"id":"sc-r","name":"inside a rule","location":{"line":7},"examples":[]}}
                ]}}]
            }}}"#,
        );
        absorb_json(
            &mut index,
            r#"{"pickle":{"id":"p-r","uri":"features/r.feature","name":"inside a rule",
                "astNodeIds":["sc-r"],"steps":[]}}"#,
        );
        let pickle = index.pickles.get("p-r").unwrap();
        let lineage = index.lineage_of(pickle).expect("rule scenario resolves");
        assert_eq!(lineage.feature.name, "Ruled");
        assert_eq!(lineage.scenario.name, "inside a rule");
    }

    #[test]
    fn step_lookups() {
        let index = outline_fixture();
        let step = index.test_step_of("tcs-1", "ts-1").expect("step resolves");
        assert_eq!(index.pickle_step_text_of(step), Some("I log in as alice"));

        let hook = index.test_step_of("tcs-1", "ts-hook").expect("hook resolves");
        assert_eq!(index.pickle_step_text_of(hook), None);
        assert!(hook.hook_id.is_some());

        assert!(index.test_step_of("tcs-1", "ts-unknown").is_none());
    }

    #[test]
    fn document_without_feature_is_ignored() {
        let mut index = LineageIndex::new();
        absorb_json(&mut index, r#"{"gherkinDocument":{"uri":"broken.feature"}}"#);
        assert!(index.scenarios.is_empty());
    }
}
