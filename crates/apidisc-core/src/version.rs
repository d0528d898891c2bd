//! Version precedence for discovery ordering
//!
//! Versions shaped like `v<major>[(alpha|beta)<minor>]` sort by release
//! channel (GA, then beta, then alpha), then by descending major, then by
//! descending minor. Versions of any other shape sort after all of those,
//! lexically.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Channel {
    Ga,
    Beta,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedVersion {
    major: u64,
    channel: Channel,
    minor: u64,
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn parse(version: &str) -> Option<ParsedVersion> {
    let rest = version.strip_prefix('v')?;
    let (major, rest) = split_digits(rest);
    let major = major.parse().ok()?;

    if rest.is_empty() {
        return Some(ParsedVersion {
            major,
            channel: Channel::Ga,
            minor: 0,
        });
    }

    let (channel, rest) = if let Some(rest) = rest.strip_prefix("beta") {
        (Channel::Beta, rest)
    } else if let Some(rest) = rest.strip_prefix("alpha") {
        (Channel::Alpha, rest)
    } else {
        return None;
    };

    let (minor, rest) = split_digits(rest);
    if !rest.is_empty() {
        return None;
    }
    Some(ParsedVersion {
        major,
        channel,
        minor: minor.parse().ok()?,
    })
}

/// Compare two version strings by discovery precedence.
///
/// `Ordering::Less` means `a` is listed before `b`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(pa), Some(pb)) => pa
            .channel
            .cmp(&pb.channel)
            .then_with(|| pb.major.cmp(&pa.major))
            .then_with(|| pb.minor.cmp(&pa.minor))
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
