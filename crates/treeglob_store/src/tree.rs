//! Immutable directory snapshots.

use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// The kind of a directory entry.
///
/// The declaration order is significant: it is the order in which entries of
/// equal name are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// A directory, backed by another [`Tree`].
    Directory,
    /// A regular file.
    RegularFile,
    /// A file with the executable bit set.
    ExecutableFile,
    /// A symbolic link, whose blob holds the link target.
    Symlink,
}

impl EntryType {
    /// Returns true if this entry is a directory.
    pub fn is_directory(self) -> bool {
        matches!(self, EntryType::Directory)
    }
}

/// A named entry of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// The name of the entry within its directory.
    pub name: String,

    /// What kind of object the entry refers to.
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// The id of the tree or blob holding the entry's content.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Creates a new entry.
    pub fn new(name: impl Into<String>, entry_type: EntryType, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            entry_type,
            id,
        }
    }
}

/// An immutable directory listing identified by the hash of its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    id: ObjectId,
    entries: Vec<TreeEntry>,
}

#[derive(Serialize)]
struct TreeEncodingRef<'a> {
    entries: &'a [TreeEntry],
}

#[derive(Deserialize)]
struct TreeEncoding {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Creates a tree from the given entries. Entries are sorted by name; when
    /// a name occurs more than once the last entry wins.
    pub fn from_entries(entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.reverse();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.dedup_by(|a, b| a.name == b.name);
        let id = ObjectId::for_content(encode_entries(&entries));
        Self { id, entries }
    }

    /// Decodes a tree previously produced by [`Tree::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let TreeEncoding { mut entries } = serde_json::from_slice(bytes)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            id: ObjectId::for_content(bytes),
            entries,
        })
    }

    /// Returns the canonical encoding of this tree. Its hash is [`Tree::id`].
    pub fn encode(&self) -> Vec<u8> {
        encode_entries(&self.entries)
    }

    /// The content id of the tree.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// The entries of the tree, sorted by name.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|entry| entry.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn encode_entries(entries: &[TreeEntry]) -> Vec<u8> {
    serde_json::to_vec(&TreeEncodingRef { entries })
        .expect("serializing a tree to json cannot fail")
}
