//! wildcard ssid pattern matching.

/// check whether `ssid` matches `pattern`.
///
/// matching is case-insensitive. a pattern without `*` must equal the
/// ssid exactly. with wildcards, the pattern is split on `*`; every
/// non-empty segment must occur in the ssid in left-to-right order, the
/// first segment anchors to the start unless the pattern begins with
/// `*`, and the last segment anchors to the end unless the pattern ends
/// with `*`. a bare `*` matches everything.
pub fn matches_pattern(ssid: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let ssid = ssid.to_lowercase();
    let pattern = pattern.to_lowercase();

    if !pattern.contains('*') {
        return ssid == pattern;
    }

    let anchored_start = !pattern.starts_with('*');
    let anchored_end = !pattern.ends_with('*');
    let segments: Vec<&str> = pattern.split('*').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        // pattern was only wildcards ("**", "***", ...)
        return true;
    }

    let n = segments.len();
    let mut pos = 0usize;

    if anchored_start {
        if !ssid.starts_with(segments[0]) {
            return false;
        }
        pos = segments[0].len();
    }

    // middle segments scan forward greedily; the trailing segment is
    // checked against the end of the ssid instead when anchored.
    let scan_from = usize::from(anchored_start);
    let scan_to = if anchored_end { n - 1 } else { n };
    for seg in &segments[scan_from..scan_to.max(scan_from)] {
        match ssid[pos..].find(*seg) {
            Some(idx) => pos += idx + seg.len(),
            None => return false,
        }
    }

    if anchored_end {
        let last = segments[n - 1];
        if !ssid.ends_with(last) {
            return false;
        }
        // the end occurrence must not overlap input already consumed
        if ssid.len() - last.len() < pos {
            return false;
        }
    }

    true
}
