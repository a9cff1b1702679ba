// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display helpers for times and feed text.

/// `m:ss` below an hour, `h:mm:ss` from an hour on
///
/// Fractions are dropped; negative or non-finite input reads as zero.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Sleep-timer countdown, always `m:ss`
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Feed descriptions as plain text: tags removed, entities decoded and
/// whitespace collapsed
pub fn plain_text(html: &str) -> String {
    let mut stripped = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_short_times_as_minutes() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.9), "0:05");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(3599.0), "59:59");
    }

    #[test]
    fn formats_long_times_with_hours() {
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(36_000.0), "10:00:00");
    }

    #[test]
    fn bad_input_reads_as_zero() {
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_time(-12.0), "0:00");
    }

    #[test]
    fn remaining_stays_in_minutes() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(59), "0:59");
        assert_eq!(format_remaining(300), "5:00");
        assert_eq!(format_remaining(3600), "60:00");
    }

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            plain_text("<p>Hello&nbsp;<b>world</b></p>\n<p>Tom &amp; Jerry</p>"),
            "Hello world Tom & Jerry"
        );
    }

    #[test]
    fn plain_text_keeps_text_without_tags() {
        assert_eq!(plain_text("Just   words"), "Just words");
    }
}
