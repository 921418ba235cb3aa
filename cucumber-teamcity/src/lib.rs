// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core translation logic for [cucumber-teamcity](https://crates.io/crates/cucumber-teamcity).
//!
//! This crate consumes the ordered envelope stream emitted by
//! `cucumber-js --format message` (one JSON object per line) and emits
//! TeamCity service messages describing a nested test tree:
//! Feature → Scenario / Scenario Outline → Example → Step.
//!
//! The envelope stream is flat and carries no "close suite" signal, so the
//! heart of the crate is [`reporter::SuiteTracker`], a small state machine
//! that decides which suite levels to close and open on each
//! `testCaseStarted` event. Lineage lookups (which feature/scenario/example a
//! test case belongs to) go through the read-only [`index::LineageQuery`]
//! contract, implemented by [`index::LineageIndex`].

pub mod errors;
pub mod events;
pub mod index;
pub mod output;
pub mod reporter;
