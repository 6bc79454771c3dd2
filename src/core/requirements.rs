//! Rewrite an installer's dependency listing into pinned requirements.
//!
//! `poetry show` prints columns like `requests  2.31.0  HTTP library`, with
//! markers such as `(!)` between name and version. The vulnerability scanner
//! wants `requests==2.31.0` lines.

use std::sync::OnceLock;

use regex::Regex;

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^([\w-]+)[ (!)]+([\d.a-z-]+).*$").unwrap()
    })
}

/// Pin each `name <markers> version ...` line to `name==version`.
///
/// Lines that do not look like a dependency row are kept unchanged, which
/// matches the scanner treating them as comments or garbage it ignores.
pub fn pin_versions(listing: &str) -> String {
    line_pattern().replace_all(listing, "$1==$2").into_owned()
}
