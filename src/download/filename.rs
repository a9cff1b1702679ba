// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use sanitize_filename::{Options, sanitize_with_options};

/// Extension used when the MIME type does not name one
const DEFAULT_EXTENSION: &str = "mp3";

/// Stem used when nothing of the title survives sanitization
const FALLBACK_STEM: &str = "episode";

/// Build the file name an episode's audio is saved under
///
/// Format: "<title>.<MIME subtype>", e.g. "My Episode.mpeg" for
/// `audio/mpeg`, falling back to "mp3" when the type is missing or has no
/// subtype.
pub fn download_filename(title: &str, mime_type: Option<&str>) -> String {
    format!("{}.{}", sanitize_stem(title), extension_for(mime_type))
}

/// The subtype of a MIME type, without parameters, or "mp3"
pub fn extension_for(mime_type: Option<&str>) -> String {
    mime_type
        .and_then(|mime| mime.split_once('/'))
        .map(|(_, subtype)| subtype.split(';').next().unwrap_or_default().trim())
        .map(sanitize_part)
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
        .to_lowercase()
}

fn sanitize_stem(title: &str) -> String {
    let stem = sanitize_part(title.trim());
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

fn sanitize_part(part: &str) -> String {
    sanitize_with_options(
        part,
        Options {
            replacement: "-",
            ..Options::default()
        },
    )
}
