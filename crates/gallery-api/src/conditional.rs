//! `If-None-Match` evaluation

/// Whether an `If-None-Match` header matches `fingerprint`
///
/// Uses weak comparison: `W/` prefixes are ignored, `*` matches anything,
/// and a comma-separated list matches if any member does.
pub fn if_none_match_satisfied(header: &str, fingerprint: &str) -> bool {
    let current = opaque_tag(fingerprint);

    header
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| candidate == "*" || opaque_tag(candidate) == current)
}

fn opaque_tag(tag: &str) -> &str {
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    tag.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(tag)
}
