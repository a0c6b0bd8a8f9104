//! Glob matches and their provenance.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
};

use treeglob_store::{EntryType, ObjectId};

/// Identifies the root a glob was evaluated against, e.g. a commit or the id
/// of a snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootId(String);

impl RootId {
    /// Creates a new root id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ObjectId> for RootId {
    fn from(id: ObjectId) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RootId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for RootId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entry matched by a glob.
///
/// `origin` is borrowed from the caller of the evaluation. Two results are
/// only equal when they borrow the *same* origin; origins with equal contents
/// at different addresses are distinct. This lets results of evaluations
/// against different roots be merged without ever confusing their sources.
#[derive(Debug, Clone)]
pub struct GlobResult<'o> {
    /// The path of the entry, relative to the evaluation root.
    pub name: String,
    /// The kind of entry that matched.
    pub entry_type: EntryType,
    /// The root the entry was found under.
    pub origin: &'o RootId,
}

impl<'o> GlobResult<'o> {
    /// Creates a new result.
    pub fn new(name: impl Into<String>, entry_type: EntryType, origin: &'o RootId) -> Self {
        Self {
            name: name.into(),
            entry_type,
            origin,
        }
    }

    fn origin_addr(&self) -> *const RootId {
        self.origin
    }
}

impl PartialEq for GlobResult<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.entry_type == other.entry_type
            && std::ptr::eq(self.origin, other.origin)
    }
}

impl Eq for GlobResult<'_> {}

impl PartialOrd for GlobResult<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GlobResult<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then(self.entry_type.cmp(&other.entry_type))
            .then(self.origin_addr().cmp(&other.origin_addr()))
    }
}

impl Hash for GlobResult<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.entry_type.hash(state);
        self.origin_addr().hash(state);
    }
}

impl Display for GlobResult<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GlobResult{{\"{}\", {:?}}}", self.name, self.entry_type)
    }
}

/// An ordered set of [`GlobResult`]s without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobResultSet<'o> {
    results: Vec<GlobResult<'o>>,
}

impl<'o> GlobResultSet<'o> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts and deduplicates the given results.
    pub fn from_unsorted(mut results: Vec<GlobResult<'o>>) -> Self {
        results.sort_unstable();
        results.dedup();
        Self { results }
    }

    /// Merges another set into this one.
    pub fn merge(&mut self, other: GlobResultSet<'o>) {
        if other.is_empty() {
            return;
        }
        let mut results = std::mem::take(&mut self.results);
        results.extend(other.results);
        *self = Self::from_unsorted(results);
    }

    /// Keeps only the results for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&GlobResult<'o>) -> bool) {
        self.results.retain(keep);
    }

    /// Removes all results.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    /// Iterates over the results in order.
    pub fn iter(&self) -> std::slice::Iter<'_, GlobResult<'o>> {
        self.results.iter()
    }

    /// The number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the ordered results.
    pub fn into_vec(self) -> Vec<GlobResult<'o>> {
        self.results
    }
}

impl<'o> FromIterator<GlobResult<'o>> for GlobResultSet<'o> {
    fn from_iter<T: IntoIterator<Item = GlobResult<'o>>>(iter: T) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl<'o> IntoIterator for GlobResultSet<'o> {
    type Item = GlobResult<'o>;
    type IntoIter = std::vec::IntoIter<GlobResult<'o>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, 'o> IntoIterator for &'a GlobResultSet<'o> {
    type Item = &'a GlobResult<'o>;
    type IntoIter = std::slice::Iter<'a, GlobResult<'o>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_identity() {
        let first = RootId::from("commit");
        let second = RootId::from("commit");
        let a = GlobResult::new("a.txt", EntryType::RegularFile, &first);
        let b = GlobResult::new("a.txt", EntryType::RegularFile, &second);
        assert_eq!(first, second);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_ordering_is_total() {
        let origin = RootId::from("commit");
        let results = vec![
            GlobResult::new("b", EntryType::RegularFile, &origin),
            GlobResult::new("a", EntryType::Symlink, &origin),
            GlobResult::new("a", EntryType::Directory, &origin),
            GlobResult::new("b", EntryType::RegularFile, &origin),
        ];
        let set = GlobResultSet::from_unsorted(results);
        let names = set
            .iter()
            .map(|r| (r.name.as_str(), r.entry_type))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                ("a", EntryType::Directory),
                ("a", EntryType::Symlink),
                ("b", EntryType::RegularFile),
            ]
        );
    }

    #[test]
    fn test_merge_keeps_both_origins() {
        let first = RootId::from("first");
        let second = RootId::from("second");
        let mut set =
            GlobResultSet::from_unsorted(vec![GlobResult::new("x", EntryType::RegularFile, &first)]);
        set.merge(GlobResultSet::from_unsorted(vec![
            GlobResult::new("x", EntryType::RegularFile, &second),
            GlobResult::new("x", EntryType::RegularFile, &first),
        ]));
        assert_eq!(set.len(), 2);
        assert!(set.iter().any(|r| std::ptr::eq(r.origin, &first)));
        assert!(set.iter().any(|r| std::ptr::eq(r.origin, &second)));
    }

    #[test]
    fn test_display() {
        let origin = RootId::from("commit");
        let result = GlobResult::new("src/main.rs", EntryType::RegularFile, &origin);
        assert_eq!(result.to_string(), "GlobResult{\"src/main.rs\", RegularFile}");
    }
}
