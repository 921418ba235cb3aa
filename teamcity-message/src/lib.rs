// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model and serializer for [TeamCity service messages].
//!
//! A service message is a single line of the form
//! `##teamcity[<name> key='value' ... timestamp='...']`, recognized by
//! TeamCity and by the IDE test consoles built on top of its protocol.
//! This crate only builds and renders messages; deciding *which* messages to
//! emit is the caller's business.
//!
//! [TeamCity service messages]: https://www.jetbrains.com/help/teamcity/service-messages.html

mod message;
mod serialize;

pub use message::*;
