//! Directory tree removal and copying.
//!
//! Both walks are explicit depth-first traversals. Removal records every
//! entry in an arena in discovery order, so each parent sits before its
//! children; deleting the arena back to front removes children first.

use crate::install::{EntryKind, InstallError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether [`remove_tree`] deletes the root directory itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    /// Empty the directory, keep it.
    ContentsOnly,
    /// Delete the directory and everything below it.
    Everything,
}

#[derive(Debug)]
struct Node {
    path: PathBuf,
    kind: EntryKind,
}

/// Remove `root` post-order, children before parents.
///
/// A missing root is not an error. The first failed deletion aborts the walk
/// and is reported as `FilesystemRemovalFailed` tagged with `phase`.
///
/// With [`Removal::ContentsOnly`] a symlinked root is followed and the
/// directory it points to is emptied. Links below the root are never followed.
pub(crate) fn remove_tree(
    phase: &'static str,
    root: &Path,
    mode: Removal,
) -> Result<usize, InstallError> {
    let metadata = match mode {
        Removal::ContentsOnly => fs::metadata(root),
        Removal::Everything => fs::symlink_metadata(root),
    };
    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(InstallError::removal(
                phase,
                root.to_path_buf(),
                EntryKind::Directory,
                &e,
            ))
        }
    };

    if !metadata.is_dir() {
        if mode == Removal::ContentsOnly {
            return Ok(0);
        }
        let node = Node {
            path: root.to_path_buf(),
            kind: EntryKind::File,
        };
        delete(phase, &node)?;
        return Ok(1);
    }

    let arena = collect(phase, root)?;
    let skip = match mode {
        Removal::ContentsOnly => 1,
        Removal::Everything => 0,
    };

    let mut removed = 0;
    for node in arena.iter().skip(skip).rev() {
        delete(phase, node)?;
        removed += 1;
    }

    debug!(root = %root.display(), removed, "removed directory tree");
    Ok(removed)
}

fn collect(phase: &'static str, root: &Path) -> Result<Vec<Node>, InstallError> {
    let mut arena = vec![Node {
        path: root.to_path_buf(),
        kind: EntryKind::Directory,
    }];
    let mut pending = vec![0usize];

    while let Some(index) = pending.pop() {
        let dir = arena[index].path.clone();
        let unreadable =
            |e: io::Error| InstallError::removal(phase, dir.clone(), EntryKind::Directory, &e);
        let entries = fs::read_dir(&dir).map_err(unreadable)?;

        for entry in entries {
            let entry = entry.map_err(unreadable)?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| InstallError::removal(phase, path.clone(), EntryKind::File, &e))?;

            if file_type.is_dir() {
                arena.push(Node {
                    path,
                    kind: EntryKind::Directory,
                });
                pending.push(arena.len() - 1);
            } else {
                arena.push(Node {
                    path,
                    kind: EntryKind::File,
                });
            }
        }
    }

    Ok(arena)
}

fn delete(phase: &'static str, node: &Node) -> Result<(), InstallError> {
    let result = match node.kind {
        EntryKind::Directory => fs::remove_dir(&node.path),
        EntryKind::File => fs::remove_file(&node.path),
    };

    result.map_err(|e| {
        warn!(path = %node.path.display(), kind = %node.kind, error = %e, "removal failed");
        InstallError::removal(phase, node.path.clone(), node.kind, &e)
    })
}

/// Copy the directory `from` into `to`, creating directories as needed and
/// overwriting existing files.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> Result<usize, InstallError> {
    if !from.is_dir() {
        return Err(InstallError::copy(
            from.to_path_buf(),
            to.to_path_buf(),
            "source directory not found",
        ));
    }

    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    let mut copied = 0;

    while let Some((src_dir, dst_dir)) = pending.pop() {
        let failed =
            |e: io::Error| InstallError::copy(src_dir.clone(), dst_dir.clone(), e.to_string());
        fs::create_dir_all(&dst_dir).map_err(failed)?;

        for entry in fs::read_dir(&src_dir).map_err(failed)? {
            let entry = entry.map_err(failed)?;
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());

            if src.is_dir() {
                pending.push((src, dst));
            } else {
                fs::copy(&src, &dst)
                    .map_err(|e| InstallError::copy(src.clone(), dst.clone(), e.to_string()))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
