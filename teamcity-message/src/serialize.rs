// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `ServiceMessage`.

use chrono::{DateTime, FixedOffset};

static MESSAGE_PREFIX: &str = "##teamcity[";
static MESSAGE_SUFFIX: &str = "]";
static TIMESTAMP_KEY: &str = "timestamp";

/// Local time with a numeric UTC offset, e.g. `2024-03-07T14:30:05.123+0100`.
static TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub(crate) fn serialize_message(
    name: &str,
    attributes: &[(String, String)],
    timestamp: DateTime<FixedOffset>,
) -> String {
    let mut out = String::with_capacity(64);
    out.push_str(MESSAGE_PREFIX);
    out.push_str(name);
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("='");
        escape_into(&mut out, value);
        out.push('\'');
    }
    out.push(' ');
    out.push_str(TIMESTAMP_KEY);
    out.push_str("='");
    out.push_str(&timestamp.format(TIMESTAMP_FORMAT).to_string());
    out.push('\'');
    out.push_str(MESSAGE_SUFFIX);
    out
}

/// Escapes a value per the service-message rules. The char-at-a-time walk
/// escapes each literal pipe exactly once, which is what the protocol's
/// "pipe before everything else" replacement order amounts to.
fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '|' => out.push_str("||"),
            '\'' => out.push_str("|'"),
            '\n' => out.push_str("|n"),
            '\r' => out.push_str("|r"),
            '[' => out.push_str("|["),
            ']' => out.push_str("|]"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_table() {
        let cases = [
            ("plain", "plain"),
            ("a|b", "a||b"),
            ("it's [done]", "it|'s |[done|]"),
            ("line1\nline2", "line1|nline2"),
            ("cr\rhere", "cr|rhere"),
            ("||", "||||"),
            ("", ""),
        ];
        for (input, expected) in cases {
            let mut out = String::new();
            escape_into(&mut out, input);
            assert_eq!(out, expected, "escaping {input:?}");
        }
    }
}
