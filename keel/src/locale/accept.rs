//! Accept-Language parsing and negotiation.

use std::cmp::Reverse;
use std::fmt;

/// A quality weight in thousandths (`q=0.75` is `Quality(750)`).
///
/// Integer weights keep comparisons exact and ordering total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u16);

impl Quality {
    /// The implicit weight of an entry without `q=`.
    pub const MAX: Quality = Quality(1000);
    /// "Not acceptable".
    pub const ZERO: Quality = Quality(0);

    /// Parse a `q` value: a number in `[0, 1]` with at most three decimals.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (int, frac) = match value.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (value, ""),
        };
        if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut millis: u16 = frac.bytes().fold(0, |acc, b| acc * 10 + u16::from(b - b'0'));
        for _ in frac.len()..3 {
            millis *= 10;
        }
        match int {
            "0" => Some(Quality(millis)),
            "1" if millis == 0 => Some(Quality::MAX),
            _ => None,
        }
    }

    /// The weight in thousandths.
    pub fn millis(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

/// One `tag;q=weight` entry of an Accept-Language header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRange {
    tag: String,
    quality: Quality,
}

impl LanguageRange {
    /// Parse a single entry; `None` when it is malformed.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split(';');
        let tag = parts.next()?.trim();
        if !is_language_range(tag) {
            return None;
        }

        let mut quality = Quality::MAX;
        for param in parts {
            let (name, value) = match param.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value)),
                None => (param.trim(), None),
            };
            if name.eq_ignore_ascii_case("q") {
                // A bare `q` has no weight to read.
                quality = Quality::parse(value?)?;
            }
        }

        Some(Self {
            tag: tag.to_string(),
            quality,
        })
    }

    /// The language tag as sent by the client.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The primary subtag (`"fr"` for `"fr-FR"`).
    pub fn primary(&self) -> &str {
        primary_subtag(&self.tag)
    }

    /// The quality weight.
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Whether this is the `*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.tag == "*"
    }
}

/// A parsed Accept-Language header.
///
/// Parsing never fails: malformed entries and entries with `q=0` are
/// dropped and the rest are kept in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptLanguage {
    ranges: Vec<LanguageRange>,
}

impl AcceptLanguage {
    /// Parse a header value.
    pub fn parse(header: &str) -> Self {
        let ranges = header
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| {
                let range = LanguageRange::parse(entry);
                if range.is_none() {
                    tracing::trace!(entry = %entry.trim(), "skipping malformed Accept-Language entry");
                }
                range
            })
            .filter(|range| range.quality > Quality::ZERO)
            .collect();
        Self { ranges }
    }

    /// Entries in header order.
    pub fn ranges(&self) -> &[LanguageRange] {
        &self.ranges
    }

    /// Whether no usable entry was found.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Entries by descending quality; ties keep header order.
    pub fn ranked(&self) -> impl Iterator<Item = &LanguageRange> {
        let mut ranked: Vec<&LanguageRange> = self.ranges.iter().collect();
        ranked.sort_by_key(|range| Reverse(range.quality));
        ranked.into_iter()
    }

    /// The entry of `supported` the client prefers most.
    ///
    /// Ranges are visited by descending quality. For each range an exact
    /// (case-insensitive) match wins over a match on the primary subtag.
    /// The wildcard never selects anything. Returns the supported entry as
    /// configured.
    pub fn negotiate<'s, S: AsRef<str>>(&self, supported: &'s [S]) -> Option<&'s str> {
        for range in self.ranked().filter(|range| !range.is_wildcard()) {
            let exact = supported
                .iter()
                .map(AsRef::as_ref)
                .find(|locale| tags_equal(locale, range.tag()));
            if exact.is_some() {
                return exact;
            }

            let primary = supported
                .iter()
                .map(AsRef::as_ref)
                .find(|locale| tags_equal(locale, range.primary()));
            if primary.is_some() {
                return primary;
            }
        }
        None
    }
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Case-insensitive tag comparison treating `_` like `-`.
fn tags_equal(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes().zip(b.bytes()).all(|(x, y)| {
            let x = if x == b'_' { b'-' } else { x };
            let y = if y == b'_' { b'-' } else { y };
            x.eq_ignore_ascii_case(&y)
        })
}

/// `*`, or 1-8 letters followed by `-` subtags of 1-8 alphanumerics.
fn is_language_range(tag: &str) -> bool {
    if tag == "*" {
        return true;
    }
    let mut subtags = tag.split('-');
    let Some(primary) = subtags.next() else {
        return false;
    };
    let primary_ok =
        (1..=8).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_alphabetic());
    primary_ok
        && subtags.all(|sub| {
            (1..=8).contains(&sub.len()) && sub.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}
