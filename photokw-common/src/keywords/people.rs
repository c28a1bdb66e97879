//! Face name → people keyword resolution
//!
//! Face regions carry a display name only. The resolver maps that name
//! (case-insensitively) to the configured people keyword path. Names without a
//! mapping get a placeholder path `<people prefix>|<unknown prefix>|<name>`
//! and a one-time warning per [`ResolverSession`].
//!
//! [`tidy_unknown_people`] later drops placeholders once the same name shows
//! up as a properly filed person anywhere in the keyword set.

use super::{eq_ignore_case, KeywordPath};
use crate::Result;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// A person detected on one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonEntry {
    /// Name as written in the face region
    pub name: String,
    /// Configured path, or the placeholder path for an unknown person
    pub path: KeywordPath,
    /// Whether `path` came from the people mapping
    pub known: bool,
}

impl PersonEntry {
    /// Configured path, `None` for unknown people
    pub fn resolved(&self) -> Option<&KeywordPath> {
        self.known.then_some(&self.path)
    }
}

/// Per-batch state: names already reported as missing from the people mapping
#[derive(Debug, Default)]
pub struct ResolverSession {
    warned: HashSet<String>,
}

impl ResolverSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `name` is seen in this session
    pub fn first_sighting(&mut self, name: &str) -> bool {
        self.warned.insert(name.to_string())
    }

    /// Every unknown name reported so far
    pub fn unknown_names(&self) -> impl Iterator<Item = &String> {
        self.warned.iter()
    }
}

/// Lowercased person name → people keyword path
#[derive(Debug, Clone)]
pub struct PeopleResolver {
    people: HashMap<String, KeywordPath>,
    people_prefix: String,
    unknown_prefix: String,
}

impl PeopleResolver {
    pub fn new(people_prefix: impl Into<String>, unknown_prefix: impl Into<String>) -> Self {
        Self {
            people: HashMap::new(),
            people_prefix: people_prefix.into(),
            unknown_prefix: unknown_prefix.into(),
        }
    }

    /// Register a person from a path relative to the people prefix
    ///
    /// `"Family|Jane Doe"` maps `jane doe` to `People|Family|Jane Doe`.
    /// Later registrations of the same name replace earlier ones.
    pub fn add(&mut self, relative: &KeywordPath) -> Result<()> {
        let mut path = KeywordPath::new([self.people_prefix.as_str()])?;
        for topic in relative.topics() {
            path = path.child(topic.as_str())?;
        }
        self.people.insert(relative.name().to_lowercase(), path);
        Ok(())
    }

    pub fn people_prefix(&self) -> &str {
        &self.people_prefix
    }

    pub fn unknown_prefix(&self) -> &str {
        &self.unknown_prefix
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Configured path for `name`, ignoring case
    pub fn lookup(&self, name: &str) -> Option<&KeywordPath> {
        self.people.get(&name.to_lowercase())
    }

    /// Map a detected face name to its keyword path
    ///
    /// Returns the path and whether it came from the mapping. Unknown names
    /// get `<people prefix>|<unknown prefix>|<name>`; the first sighting of
    /// each unknown name in `session` logs a warning.
    pub fn resolve_face(
        &self,
        name: &str,
        session: &mut ResolverSession,
    ) -> Result<(KeywordPath, bool)> {
        if let Some(path) = self.lookup(name) {
            debug!("Face '{}' resolved to {}", name, path);
            return Ok((path.clone(), true));
        }

        if session.first_sighting(name) {
            warn!("Missing person config for {}", name);
        }

        let path = KeywordPath::new([
            self.people_prefix.as_str(),
            self.unknown_prefix.as_str(),
            name,
        ])?;
        Ok((path, false))
    }

    /// Resolve a face into a [`PersonEntry`]
    pub fn person(&self, name: &str, session: &mut ResolverSession) -> Result<PersonEntry> {
        let (path, known) = self.resolve_face(name, session)?;
        Ok(PersonEntry {
            name: name.to_string(),
            path,
            known,
        })
    }

    /// Configured entries sorted by path
    pub fn entries(&self) -> Vec<(&String, &KeywordPath)> {
        let mut entries: Vec<_> = self.people.iter().collect();
        entries.sort_by(|a, b| a.1.cmp(b.1));
        entries
    }
}

/// Drop placeholder unknown-person keywords that a filed person supersedes
///
/// # Algorithm
/// 1. Partition keywords by category: non-people keywords are kept, people
///    keywords whose second topic is the unknown prefix are deferred, all
///    other people keywords are kept and their leaf name recorded as known.
/// 2. A deferred keyword survives only if its leaf name is not known.
/// 3. The result is de-duplicated and sorted by serialized path.
pub fn tidy_unknown_people<I>(keywords: I, people_prefix: &str, unknown_prefix: &str) -> Vec<KeywordPath>
where
    I: IntoIterator<Item = KeywordPath>,
{
    let mut tidy: BTreeSet<KeywordPath> = BTreeSet::new();
    let mut known_people: HashSet<String> = HashSet::new();
    let mut unknown_people: Vec<KeywordPath> = Vec::new();

    for keyword in keywords {
        if keyword.len() < 2 || !keyword.in_category(people_prefix) {
            tidy.insert(keyword);
        } else if eq_ignore_case(&keyword.topics()[1], unknown_prefix) {
            unknown_people.push(keyword);
        } else {
            known_people.insert(keyword.name().to_string());
            tidy.insert(keyword);
        }
    }

    for unknown in unknown_people {
        if known_people.contains(unknown.name()) {
            debug!("Dropping {} (filed elsewhere)", unknown);
        } else {
            tidy.insert(unknown);
        }
    }

    tidy.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> KeywordPath {
        s.parse().unwrap()
    }

    fn resolver() -> PeopleResolver {
        let mut resolver = PeopleResolver::new("People", "Unknown");
        resolver.add(&path("Family|Jane Doe")).unwrap();
        resolver
    }

    #[test]
    fn test_known_face_is_case_insensitive() {
        let mut session = ResolverSession::new();
        let (p, known) = resolver().resolve_face("JANE DOE", &mut session).unwrap();
        assert_eq!(p.to_string(), "People|Family|Jane Doe");
        assert!(known);
    }

    #[test]
    fn test_unknown_face_gets_placeholder() {
        let mut session = ResolverSession::new();
        let (p, known) = resolver().resolve_face("John Smith", &mut session).unwrap();
        assert_eq!(p.to_string(), "People|Unknown|John Smith");
        assert!(!known);
    }

    #[test]
    fn test_unknown_name_reported_once_per_session() {
        let resolver = resolver();
        let mut session = ResolverSession::new();
        resolver.resolve_face("John Smith", &mut session).unwrap();
        resolver.resolve_face("John Smith", &mut session).unwrap();
        resolver.resolve_face("Bob", &mut session).unwrap();

        let mut names: Vec<&String> = session.unknown_names().collect();
        names.sort();
        assert_eq!(names, vec!["Bob", "John Smith"]);
        assert!(!session.first_sighting("Bob"));
    }

    #[test]
    fn test_known_face_not_recorded_as_unknown() {
        let mut session = ResolverSession::new();
        resolver().resolve_face("Jane Doe", &mut session).unwrap();
        assert_eq!(session.unknown_names().count(), 0);
    }

    #[test]
    fn test_person_entry() {
        let mut session = ResolverSession::new();
        let r = resolver();
        let jane = r.person("jane doe", &mut session).unwrap();
        assert_eq!(jane.name, "jane doe");
        assert_eq!(jane.resolved().map(ToString::to_string).as_deref(), Some("People|Family|Jane Doe"));

        let bob = r.person("Bob", &mut session).unwrap();
        assert!(bob.resolved().is_none());
    }

    #[test]
    fn test_face_name_with_separator_is_error() {
        let mut session = ResolverSession::new();
        assert!(resolver().resolve_face("A|B", &mut session).is_err());
    }

    #[test]
    fn test_tidy_drops_superseded_unknown() {
        let input = vec![
            path("People|Unknown|Jane"),
            path("People|Family|Jane"),
            path("Events|Trip"),
        ];
        let tidy: Vec<String> = tidy_unknown_people(input, "People", "Unknown")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(tidy, vec!["Events|Trip", "People|Family|Jane"]);
    }

    #[test]
    fn test_tidy_keeps_unmatched_unknown_and_sorts() {
        let input = vec![
            path("Sunset"),
            path("People|unknown|Bob"),
            path("People|Family|Jane"),
            path("Events|Trip"),
            path("Events|Trip"),
        ];
        let tidy: Vec<String> = tidy_unknown_people(input, "people", "Unknown")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            tidy,
            vec!["Events|Trip", "People|Family|Jane", "People|unknown|Bob", "Sunset"]
        );
    }

    #[test]
    fn test_tidy_prefixes_ignore_unicode_case() {
        let input = vec![
            path("Personnes|Inconnus Été|Zoé"),
            path("PERSONNES|Famille|Zoé"),
        ];
        let tidy: Vec<String> = tidy_unknown_people(input, "personnes", "INCONNUS ÉTÉ")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(tidy, vec!["PERSONNES|Famille|Zoé"]);
    }
}
