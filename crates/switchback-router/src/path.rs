//! URL path canonicalization.

use std::borrow::Cow;

/// Canonicalize a URL path.
///
/// The result always begins with `/`, contains no empty or `.` segments,
/// and resolves every `..` against the segment before it (discarding it at
/// the root). A meaningful trailing slash is preserved. Cleaning is
/// idempotent, and a path that is already canonical is returned borrowed,
/// without allocating.
///
/// # Example
///
/// ```ignore
/// assert_eq!(clean_path("/abc//def"), "/abc/def");
/// assert_eq!(clean_path("/a/b/../c/"), "/a/c/");
/// assert_eq!(clean_path(""), "/");
/// ```
#[must_use]
pub fn clean_path(p: &str) -> Cow<'_, str> {
    if p.is_empty() {
        return Cow::Borrowed("/");
    }
    if is_clean(p) {
        return Cow::Borrowed(p);
    }

    // A trailing slash survives cleaning; a final "." keeps one too, while
    // a final ".." consumes the segment before it without leaving a slash.
    let trailing = p.ends_with('/') || p.ends_with("/.") || p == "." || p == "..";
    let trailing = trailing && !p.ends_with("..");

    let mut segments: Vec<&str> = Vec::new();
    for segment in p.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(p.len() + 1);
    out.push('/');
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(segment);
    }
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    Cow::Owned(out)
}

/// Fast check that `p` needs no rewriting: it begins with `/` and contains
/// no `//`, `/./`, or `/../` (including at the end).
fn is_clean(p: &str) -> bool {
    let bytes = p.as_bytes();
    if bytes[0] != b'/' {
        return false;
    }
    for (i, &c) in bytes.iter().enumerate() {
        if c != b'/' {
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'/') => return false,
            Some(b'.') => match bytes.get(i + 2) {
                None | Some(b'/') => return false,
                Some(b'.') => {
                    if matches!(bytes.get(i + 3), None | Some(b'/')) {
                        return false;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    true
}
