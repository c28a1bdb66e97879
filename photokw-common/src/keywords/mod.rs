//! Hierarchical keyword model
//!
//! Keywords travel in three shapes:
//! - a delimiter-joined path string (`"People|Family|Jane Doe"`), see [`KeywordPath`]
//! - a nested tree keyed by topic, see [`KeywordTree`]
//! - tab-indented lines as written by the catalog's keyword export, see [`indented`]

pub mod filter;
pub mod indented;
pub mod people;
pub mod tree;

pub use filter::ExclusionFilter;
pub use people::{tidy_unknown_people, PeopleResolver, PersonEntry, ResolverSession};
pub use tree::KeywordTree;

use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Separator between topics of a serialized keyword path
pub const SEPARATOR: char = '|';

/// Ordered sequence of topics, e.g. `["People", "Unknown", "Jane Doe"]`
///
/// The first topic is the category (People, Events, Places or free-form).
/// No topic is empty and no topic contains [`SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeywordPath(Vec<String>);

impl KeywordPath {
    /// Build a path from individual topics, validating each one
    pub fn new<I, S>(topics: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        if topics.is_empty() {
            return Err(Error::InvalidKeyword("empty keyword path".to_string()));
        }
        for topic in &topics {
            validate_topic(topic)?;
        }
        Ok(Self(topics))
    }

    pub fn topics(&self) -> &[String] {
        &self.0
    }

    /// First topic (People / Events / Places / free-form)
    pub fn category(&self) -> &str {
        &self.0[0]
    }

    /// Last topic, the leaf name
    pub fn name(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive comparison of the category against `prefix`
    pub fn in_category(&self, prefix: &str) -> bool {
        eq_ignore_case(self.category(), prefix)
    }

    /// New path with `topic` appended
    pub fn child(&self, topic: impl Into<String>) -> Result<Self> {
        let topic = topic.into();
        validate_topic(&topic)?;
        let mut topics = self.0.clone();
        topics.push(topic);
        Ok(Self(topics))
    }
}

/// Unicode case-insensitive topic comparison
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(Error::InvalidKeyword("empty topic".to_string()));
    }
    if topic.contains(SEPARATOR) {
        return Err(Error::InvalidKeyword(format!(
            "topic '{}' contains '{}'",
            topic, SEPARATOR
        )));
    }
    Ok(())
}

impl FromStr for KeywordPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidKeyword("empty keyword".to_string()));
        }
        let topics: Vec<&str> = s.split(SEPARATOR).collect();
        if topics.iter().any(|t| t.is_empty()) {
            return Err(Error::InvalidKeyword(format!("'{}' has an empty topic", s)));
        }
        Ok(Self(topics.into_iter().map(str::to_string).collect()))
    }
}

impl fmt::Display for KeywordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for topic in &self.0 {
            if !first {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(topic)?;
            first = false;
        }
        Ok(())
    }
}

impl KeywordPath {
    /// Bytes of the serialized form, produced without allocating
    fn serialized_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().enumerate().flat_map(|(i, topic)| {
            (i > 0)
                .then_some(SEPARATOR as u8)
                .into_iter()
                .chain(topic.bytes())
        })
    }
}

// Ordered by serialized form so sorted output matches a plain string sort.
impl Ord for KeywordPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serialized_bytes().cmp(other.serialized_bytes())
    }
}

impl PartialOrd for KeywordPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Remove duplicates keeping the first occurrence of each item
pub fn remove_duplicates<T: Clone + Eq + std::hash::Hash>(items: Vec<T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> KeywordPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let p = path("People|Family|Jane Doe");
        assert_eq!(p.topics(), &["People", "Family", "Jane Doe"]);
        assert_eq!(p.category(), "People");
        assert_eq!(p.name(), "Jane Doe");
        assert_eq!(p.to_string(), "People|Family|Jane Doe");
    }

    #[test]
    fn test_rejects_empty_topics() {
        assert!("".parse::<KeywordPath>().is_err());
        assert!("People||Jane".parse::<KeywordPath>().is_err());
        assert!("People|".parse::<KeywordPath>().is_err());
    }

    #[test]
    fn test_new_rejects_separator_in_topic() {
        assert!(KeywordPath::new(["People", "A|B"]).is_err());
        assert!(KeywordPath::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_child_and_category() {
        let p = path("Places|Canada").child("Ontario").unwrap();
        assert_eq!(p.to_string(), "Places|Canada|Ontario");
        assert!(p.in_category("places"));
        assert!(!p.in_category("People"));
    }

    #[test]
    fn test_ordering_follows_string_form() {
        let mut paths = vec![path("A|B"), path("A B|C")];
        paths.sort();
        assert_eq!(paths[0].to_string(), "A B|C");
    }

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let deduped = remove_duplicates(vec!["b", "a", "b", "c", "a"]);
        assert_eq!(deduped, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_order_matches_serialized_string() {
        let samples = ["A|B", "A B", "AB|C", "A|BC", "A", "A|B|C", "Événements|Trip", "Zoo"];
        for a in samples {
            for b in samples {
                assert_eq!(path(a).cmp(&path(b)), a.cmp(b), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_category_ignores_unicode_case() {
        let p = path("Événements|Trip");
        assert!(p.in_category("événements"));
        assert!(p.in_category("ÉVÉNEMENTS"));
        assert!(!p.in_category("evenements"));
    }
}
