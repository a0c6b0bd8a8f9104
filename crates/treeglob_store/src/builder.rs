//! Assembling snapshots from individual paths.

use std::{collections::BTreeMap, path::Path};

use thiserror::Error;

use crate::{EntryType, ObjectId, ObjectWriter, Tree, TreeEntry};

/// Errors that can occur while adding paths to a [`SnapshotBuilder`].
#[derive(Debug, Error)]
pub enum SnapshotBuilderError {
    /// The path is empty or contains `.`, `..` or empty components.
    #[error("'{0}' is not a valid relative path")]
    InvalidPath(String),

    /// The path would place an entry below a file, or replace a directory.
    #[error("'{0}' conflicts with an existing entry")]
    Conflict(String),

    /// Reading a local directory failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
enum PendingNode {
    Leaf {
        entry_type: EntryType,
        content: Vec<u8>,
    },
    Directory(BTreeMap<String, PendingNode>),
}

/// Collects files, symlinks and directories by path and writes them as a
/// tree of [`Tree`] objects.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    root: BTreeMap<String, PendingNode>,
}

impl SnapshotBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a regular file. Missing parent directories are created.
    pub fn add_file(
        &mut self,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<&mut Self, SnapshotBuilderError> {
        self.add_leaf(path, EntryType::RegularFile, content.into())
    }

    /// Adds an executable file.
    pub fn add_executable(
        &mut self,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<&mut Self, SnapshotBuilderError> {
        self.add_leaf(path, EntryType::ExecutableFile, content.into())
    }

    /// Adds a symlink pointing at `target`.
    pub fn add_symlink(
        &mut self,
        path: &str,
        target: &str,
    ) -> Result<&mut Self, SnapshotBuilderError> {
        self.add_leaf(path, EntryType::Symlink, target.as_bytes().to_vec())
    }

    /// Adds a directory, which may stay empty.
    pub fn add_dir(&mut self, path: &str) -> Result<&mut Self, SnapshotBuilderError> {
        let components = split_path(path)?;
        let mut current = &mut self.root;
        for component in components {
            current = match current
                .entry(component.to_string())
                .or_insert_with(|| PendingNode::Directory(BTreeMap::new()))
            {
                PendingNode::Directory(children) => children,
                PendingNode::Leaf { .. } => {
                    return Err(SnapshotBuilderError::Conflict(path.to_string()))
                }
            };
        }
        Ok(self)
    }

    fn add_leaf(
        &mut self,
        path: &str,
        entry_type: EntryType,
        content: Vec<u8>,
    ) -> Result<&mut Self, SnapshotBuilderError> {
        let mut components = split_path(path)?;
        let name = components
            .pop()
            .ok_or_else(|| SnapshotBuilderError::InvalidPath(path.to_string()))?;
        let mut current = &mut self.root;
        for component in components {
            current = match current
                .entry(component.to_string())
                .or_insert_with(|| PendingNode::Directory(BTreeMap::new()))
            {
                PendingNode::Directory(children) => children,
                PendingNode::Leaf { .. } => {
                    return Err(SnapshotBuilderError::Conflict(path.to_string()))
                }
            };
        }
        if let Some(PendingNode::Directory(_)) = current.get(name) {
            return Err(SnapshotBuilderError::Conflict(path.to_string()));
        }
        current.insert(
            name.to_string(),
            PendingNode::Leaf {
                entry_type,
                content,
            },
        );
        Ok(self)
    }

    /// Adds the contents of a directory on the local filesystem below
    /// `prefix` (use `""` for the snapshot root).
    pub fn add_local_dir(
        &mut self,
        prefix: &str,
        dir: &Path,
    ) -> Result<&mut Self, SnapshotBuilderError> {
        if !prefix.is_empty() {
            self.add_dir(prefix)?;
        }
        for entry in fs_err::read_dir(dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
                tracing::warn!("skipping non utf-8 path {}", entry.path().display());
                continue;
            };
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                let target = fs_err::read_link(entry.path())?;
                self.add_symlink(&path, &target.to_string_lossy())?;
            } else if file_type.is_dir() {
                self.add_local_dir(&path, &entry.path())?;
            } else if is_executable(&entry.metadata()?) {
                self.add_executable(&path, fs_err::read(entry.path())?)?;
            } else {
                self.add_file(&path, fs_err::read(entry.path())?)?;
            }
        }
        Ok(self)
    }

    /// Writes all blobs and trees and returns the id of the root tree.
    pub fn write<W: ObjectWriter + ?Sized>(&self, writer: &W) -> std::io::Result<ObjectId> {
        write_directory(&self.root, writer)
    }
}

fn write_directory<W: ObjectWriter + ?Sized>(
    children: &BTreeMap<String, PendingNode>,
    writer: &W,
) -> std::io::Result<ObjectId> {
    let mut entries = Vec::with_capacity(children.len());
    for (name, node) in children {
        let entry = match node {
            PendingNode::Leaf {
                entry_type,
                content,
            } => TreeEntry::new(name.clone(), *entry_type, writer.put_blob(content)?),
            PendingNode::Directory(grand_children) => TreeEntry::new(
                name.clone(),
                EntryType::Directory,
                write_directory(grand_children, writer)?,
            ),
        };
        entries.push(entry);
    }
    writer.put_tree(&Tree::from_entries(entries))
}

fn split_path(path: &str) -> Result<Vec<&str>, SnapshotBuilderError> {
    let components: Vec<_> = path.split('/').collect();
    if path.is_empty()
        || components
            .iter()
            .any(|c| c.is_empty() || *c == "." || *c == "..")
    {
        return Err(SnapshotBuilderError::InvalidPath(path.to_string()));
    }
    Ok(components)
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}
