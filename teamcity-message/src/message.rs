// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::serialize::serialize_message;
use chrono::{DateTime, FixedOffset, Local};

/// A single TeamCity service message.
///
/// Attributes are rendered in insertion order, followed by a `timestamp`
/// attribute that is captured at render time.
///
/// # Examples
///
/// ```
/// use teamcity_message::ServiceMessage;
///
/// let message = ServiceMessage::new("testStarted")
///     .attr("name", "a step")
///     .attr("captureStandardOutput", "true");
/// let line = message.render();
/// assert!(line.starts_with("##teamcity[testStarted name='a step'"));
/// ```
#[derive(Clone, Debug)]
pub struct ServiceMessage {
    name: String,
    attributes: Vec<(String, String)>,
}

impl ServiceMessage {
    /// Creates a new message with the given command name and no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute. Attributes are rendered in the order they were
    /// added; the value is escaped at render time.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Returns the command name of this message.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes in insertion order, unescaped.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Returns the value of the attribute with the given key, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }

    /// Renders this message as one protocol line, stamped with the current
    /// local time.
    pub fn render(&self) -> String {
        self.render_at(Local::now().fixed_offset())
    }

    /// Renders this message with an explicit timestamp.
    ///
    /// This is the deterministic variant of [`render`](Self::render), meant
    /// for tests and for callers that stamp a whole batch with one clock
    /// reading.
    pub fn render_at(&self, timestamp: DateTime<FixedOffset>) -> String {
        serialize_message(&self.name, &self.attributes, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed_timestamp() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 7, 14, 30, 5)
            .unwrap()
    }

    #[test]
    fn renders_name_and_attributes_in_insertion_order() {
        let message = ServiceMessage::new("testStarted")
            .attr("name", "a step")
            .attr("captureStandardOutput", "true");
        assert_eq!(
            message.render_at(fixed_timestamp()),
            "##teamcity[testStarted name='a step' captureStandardOutput='true' \
             timestamp='2024-03-07T14:30:05.000+0100']",
        );
    }

    #[test]
    fn renders_without_attributes() {
        let message = ServiceMessage::new("enteredTheMatrix");
        assert_eq!(
            message.render_at(fixed_timestamp()),
            "##teamcity[enteredTheMatrix timestamp='2024-03-07T14:30:05.000+0100']",
        );
    }

    #[test]
    fn escapes_attribute_values() {
        let message = ServiceMessage::new("testFailed")
            .attr("name", "it's [done]")
            .attr("message", "a|b\nc\rd");
        let line = message.render_at(fixed_timestamp());
        assert_eq!(
            line,
            "##teamcity[testFailed name='it|'s |[done|]' message='a||b|nc|rd' \
             timestamp='2024-03-07T14:30:05.000+0100']",
        );
    }

    #[test]
    fn attribute_lookup_returns_unescaped_value() {
        let message = ServiceMessage::new("testFailed").attr("message", "it's [done]");
        assert_eq!(message.attribute("message"), Some("it's [done]"));
        assert_eq!(message.attribute("name"), None);
    }

    #[test]
    fn negative_offset_is_rendered_with_sign() {
        let timestamp = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 31, 23, 59, 59)
            .unwrap();
        let line = ServiceMessage::new("testFinished")
            .attr("name", "x")
            .render_at(timestamp);
        assert!(line.ends_with("timestamp='2024-12-31T23:59:59.000-0500']"));
    }
}
