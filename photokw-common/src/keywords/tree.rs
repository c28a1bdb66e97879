//! Keyword tree: topic name → leaf or child tree

use super::KeywordPath;
use std::collections::{BTreeMap, BTreeSet};

/// Nested keyword hierarchy
///
/// Each topic maps to `None` (a path terminates here) or a child tree.
/// Children are kept in a `BTreeMap` so iteration is always in sorted
/// topic order, which keeps exported files stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTree {
    nodes: BTreeMap<String, Option<KeywordTree>>,
}

impl KeywordTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a set of paths
    ///
    /// A path that is a prefix of another collapses into the branch: branches
    /// always win over a colliding leaf.
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a KeywordPath>,
    {
        let unique: BTreeSet<&KeywordPath> = paths.into_iter().collect();
        let mut tree = Self::new();
        for path in unique {
            tree.insert(path.topics());
        }
        tree
    }

    /// Walk/create nodes topic by topic
    pub fn insert(&mut self, topics: &[String]) {
        let Some((first, rest)) = topics.split_first() else {
            return;
        };

        if rest.is_empty() {
            self.add_leaf(first.clone());
            return;
        }

        let slot = self.nodes.entry(first.clone()).or_insert(None);
        slot.get_or_insert_with(KeywordTree::new).insert(rest);
    }

    /// Record `topic` as a leaf unless it already exists (leaf or branch)
    pub fn add_leaf(&mut self, topic: String) {
        self.nodes.entry(topic).or_insert(None);
    }

    /// Attach `child` below `topic`, merging with any existing branch
    pub fn add_branch(&mut self, topic: String, child: KeywordTree) {
        let slot = self.nodes.entry(topic).or_insert(None);
        match slot {
            Some(existing) => existing.merge(child),
            None => *slot = Some(child),
        }
    }

    /// Merge another tree into this one
    pub fn merge(&mut self, other: KeywordTree) {
        for (topic, node) in other.nodes {
            match node {
                Some(child) => self.add_branch(topic, child),
                None => self.add_leaf(topic),
            }
        }
    }

    /// Depth-first expansion back into paths
    pub fn to_paths(&self) -> BTreeSet<KeywordPath> {
        let mut paths = BTreeSet::new();
        let mut prefix = Vec::new();
        self.collect_paths(&mut prefix, &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &mut Vec<String>, out: &mut BTreeSet<KeywordPath>) {
        for (topic, node) in &self.nodes {
            prefix.push(topic.clone());
            match node {
                // Topics in a tree were validated on the way in
                None => {
                    if let Ok(path) = KeywordPath::new(prefix.iter().cloned()) {
                        out.insert(path);
                    }
                }
                Some(child) => child.collect_paths(prefix, out),
            }
            prefix.pop();
        }
    }

    /// Child tree under `topic`, if `topic` is a branch
    pub fn subtree(&self, topic: &str) -> Option<&KeywordTree> {
        self.nodes.get(topic).and_then(Option::as_ref)
    }

    pub fn get(&self, topic: &str) -> Option<&Option<KeywordTree>> {
        self.nodes.get(topic)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.nodes.contains_key(topic)
    }

    /// Iterate children in sorted topic order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<KeywordTree>)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<KeywordPath> {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_round_trip_prefix_free_set() {
        let input = paths(&[
            "People|Family|Jane Doe",
            "People|Friends|John Smith",
            "Events|2023|Trip",
            "Sunset",
        ]);
        let tree = KeywordTree::from_paths(&input);
        let back: Vec<KeywordPath> = tree.to_paths().into_iter().collect();

        let mut expected = input.clone();
        expected.sort();
        assert_eq!(back, expected);
    }

    #[test]
    fn test_branch_wins_over_leaf() {
        let input = paths(&["People|Family", "People|Family|Jane"]);
        let tree = KeywordTree::from_paths(&input);

        let people = tree.subtree("People").unwrap();
        assert!(people.subtree("Family").is_some());

        let back: Vec<String> = tree.to_paths().iter().map(ToString::to_string).collect();
        assert_eq!(back, vec!["People|Family|Jane"]);
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let forward = paths(&["A|B|C", "A|B", "A|D"]);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            KeywordTree::from_paths(&forward),
            KeywordTree::from_paths(&backward)
        );
    }

    #[test]
    fn test_building_twice_is_identical() {
        let input = paths(&["X|Y", "X|Z", "X|Y", "W"]);
        assert_eq!(KeywordTree::from_paths(&input), KeywordTree::from_paths(&input));
    }

    #[test]
    fn test_sibling_leaves_survive_rebinding() {
        let mut tree = KeywordTree::new();
        tree.insert(&["A".to_string(), "B".to_string()]);
        tree.insert(&["A".to_string(), "C".to_string()]);
        tree.insert(&["A".to_string(), "B".to_string(), "D".to_string()]);

        let a = tree.subtree("A").unwrap();
        assert_eq!(a.len(), 2);
        assert!(a.subtree("B").is_some());
        assert_eq!(a.get("C"), Some(&None));
    }

    #[test]
    fn test_merge_combines_branches() {
        let mut left = KeywordTree::from_paths(&paths(&["A|B"]));
        let right = KeywordTree::from_paths(&paths(&["A|C", "D"]));
        left.merge(right);

        let back: Vec<String> = left.to_paths().iter().map(ToString::to_string).collect();
        assert_eq!(back, vec!["A|B", "A|C", "D"]);
    }
}
