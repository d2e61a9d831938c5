//! Locating a requirement's text inside a markdown document.
//!
//! A node's `location` is a heading breadcrumb such as
//! `["Requirements", "Authentication"]`. Each entry names a heading nested
//! below the previous one; the section runs from the last heading to the next
//! heading of the same or a shallower level.
//!
//! Lines inside fenced code blocks are never treated as headings.

use std::{ops::Range, sync::LazyLock};

use regex::Regex;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$")
        .expect("heading pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading<'a> {
    line: usize,
    level: usize,
    title: &'a str,
}

/// Extract the section of `document` named by the heading breadcrumb
/// `location`.
///
/// An empty breadcrumb selects the whole document. Otherwise the body below
/// the final heading is returned, without the heading line itself and with
/// surrounding blank lines removed. Returns `None` if the breadcrumb does not
/// match the document.
///
/// ```
/// use contextgit::storage::extract_section;
///
/// let document = "# Requirements\n\n## Auth\n\nUsers log in.\n\n## Audit\n\nLog it.\n";
/// let location = ["Requirements".to_string(), "Auth".to_string()];
///
/// assert_eq!(extract_section(document, &location).as_deref(), Some("Users log in."));
/// assert_eq!(extract_section(document, &["Billing".to_string()]), None);
/// ```
#[must_use]
pub fn extract_section(document: &str, location: &[String]) -> Option<String> {
    if location.is_empty() {
        return Some(document.to_string());
    }

    let lines: Vec<&str> = document.lines().collect();
    let headings = headings(&lines);
    let body = section(&headings, location, lines.len())?;

    let body = &lines[body];
    let is_text = |line: &&str| !line.trim().is_empty();
    let Some(first) = body.iter().position(is_text) else {
        return Some(String::new());
    };
    let last = body.iter().rposition(is_text).unwrap_or(first);

    Some(body[first..=last].join("\n"))
}

/// The line range of the body below the heading `location` resolves to.
fn section(
    headings: &[Heading<'_>],
    location: &[String],
    line_count: usize,
) -> Option<Range<usize>> {
    let mut start = 0;
    let mut parent_level = 0;
    let mut found = None;

    for crumb in location {
        let position = headings[start..]
            .iter()
            .take_while(|heading| found.is_none() || heading.level > parent_level)
            .position(|heading| heading.level > parent_level && heading.title == crumb.trim())?;
        let index = start + position;
        found = Some(index);
        parent_level = headings[index].level;
        start = index + 1;
    }

    let heading = &headings[found?];
    let end = headings[start..]
        .iter()
        .find(|next| next.level <= heading.level)
        .map_or(line_count, |next| next.line);

    Some(heading.line + 1..end)
}

fn headings<'a>(lines: &[&'a str]) -> Vec<Heading<'a>> {
    let mut headings = Vec::new();
    let mut fence: Option<(char, usize)> = None;

    for (line, &text) in lines.iter().enumerate() {
        if let Some(marker) = fence_marker(text) {
            match fence {
                None => fence = Some(marker),
                Some((c, len)) if marker.0 == c && marker.1 >= len => fence = None,
                Some(_) => {}
            }
            continue;
        }
        if fence.is_some() {
            continue;
        }

        if let Some(captures) = HEADING.captures(text) {
            headings.push(Heading {
                line,
                level: captures[1].len(),
                title: captures.get(2).map_or("", |m| m.as_str().trim()),
            });
        }
    }

    headings
}

/// The character and run length of a code fence opening or closing `line`.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let c = rest.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = rest.len() - rest.trim_start_matches(c).len();
    (len >= 3).then_some((c, len))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    const DOCUMENT: &str = "\
# Requirements

Intro text.

## Authentication

Users must log in with a password.

### Tokens

Tokens expire after an hour.

## Logging

Log every request.

# Appendix

## Authentication

Unrelated appendix text.
";

    fn location(path: &[&str]) -> Vec<String> {
        path.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_location_is_whole_document() {
        assert_eq!(extract_section(DOCUMENT, &[]).as_deref(), Some(DOCUMENT));
    }

    #[test]
    fn section_includes_nested_headings() {
        let section = extract_section(DOCUMENT, &location(&["Requirements", "Authentication"]));

        assert_eq!(
            section.as_deref(),
            Some(
                "Users must log in with a password.\n\n### Tokens\n\nTokens expire after an hour."
            )
        );
    }

    #[test]
    fn section_ends_at_sibling_heading() {
        let section = extract_section(DOCUMENT, &location(&["Requirements", "Logging"]));
        assert_eq!(section.as_deref(), Some("Log every request."));
    }

    #[test]
    fn breadcrumb_disambiguates_repeated_titles() {
        let section = extract_section(DOCUMENT, &location(&["Appendix", "Authentication"]));
        assert_eq!(section.as_deref(), Some("Unrelated appendix text."));
    }

    #[test]
    fn deep_breadcrumb() {
        let section =
            extract_section(DOCUMENT, &location(&["Requirements", "Authentication", "Tokens"]));
        assert_eq!(section.as_deref(), Some("Tokens expire after an hour."));
    }

    #[test_case(&["Billing"]; "unknown top level")]
    #[test_case(&["Requirements", "Billing"]; "unknown child")]
    #[test_case(&["Appendix", "Logging"]; "child of another parent")]
    #[test_case(&["Authentication", "Requirements"]; "wrong order")]
    fn unmatched_breadcrumb_is_none(path: &[&str]) {
        assert_eq!(extract_section(DOCUMENT, &location(path)), None);
    }

    #[test]
    fn breadcrumbs_are_trimmed() {
        let section = extract_section(DOCUMENT, &location(&[" Requirements", "Logging\t"]));
        assert_eq!(section.as_deref(), Some("Log every request."));
    }

    #[test]
    fn first_crumb_may_be_any_level() {
        let section = extract_section(DOCUMENT, &location(&["Tokens"]));
        assert_eq!(section.as_deref(), Some("Tokens expire after an hour."));
    }

    #[test]
    fn headings_in_code_fences_are_ignored() {
        let document = "\
# Guide

```markdown
# Fake

Not a section.
```

Real text.

~~~
## Also fake
~~~
";
        assert_eq!(extract_section(document, &location(&["Fake"])), None);
        assert_eq!(extract_section(document, &location(&["Guide", "Also fake"])), None);
        let section = extract_section(document, &location(&["Guide"])).unwrap();
        assert!(section.ends_with("~~~"), "{section}");
    }

    #[test]
    fn closing_hashes_are_not_part_of_the_title() {
        let document = "## Auth ##\n\nbody\n## C#\n\nsharp\n";
        assert_eq!(extract_section(document, &location(&["Auth"])).as_deref(), Some("body"));
        assert_eq!(extract_section(document, &location(&["C#"])).as_deref(), Some("sharp"));
    }

    #[test]
    fn section_at_end_of_document() {
        let document = "# One\n\nfirst\n\n# Two\n\nsecond";
        assert_eq!(extract_section(document, &location(&["Two"])).as_deref(), Some("second"));
    }

    #[test]
    fn empty_section_is_empty_string() {
        let document = "# One\n\n# Two\n";
        assert_eq!(extract_section(document, &location(&["One"])).as_deref(), Some(""));
    }

    #[test_case("#Heading", None; "missing space")]
    #[test_case("####### Seven", None; "too deep")]
    #[test_case("    # Indented code", None; "indented code block")]
    #[test_case("   ### Indented", Some((3, "Indented")); "up to three spaces")]
    #[test_case("#", Some((1, "")); "empty heading")]
    fn heading_recognition(line: &str, expected: Option<(usize, &str)>) {
        let found = headings(&[line]);
        let found = found.first().map(|heading| (heading.level, heading.title));
        assert_eq!(found, expected);
    }
}
