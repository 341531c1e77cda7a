//! Generic virtual-filesystem traversal.
//!
//! The traversal core is parameterised over a small capability set instead of
//! concrete reader types: an entry knows its names and kind, a directory can
//! enumerate and look up entries, and a context can materialise directories.
//! Format crates provide the concrete implementations; the algorithms in this
//! module operate only through the traits.

use std::rc::Rc;

use crate::error::FsError;
use crate::path::{self, WildcardPattern};

/// Maximum number of symbolic link hops followed during one lookup.
pub const MAX_SYMLINK_HOPS: usize = 20;

/// A lightweight handle to one directory entry.
pub trait VfsEntry: Clone {
    /// The display name of the entry.
    fn file_name(&self) -> &str;

    /// The cached [`path::search_name`] form used for matching.
    fn search_name(&self) -> &str;

    fn is_directory(&self) -> bool;

    fn is_symlink(&self) -> bool;

    /// The link target for symlink entries.
    fn symlink_target(&self) -> Option<&str> {
        None
    }

    /// A stable identifier used to memoise materialised objects.
    fn unique_cache_id(&self) -> u64;
}

/// A materialised directory: an ordered list of entries.
pub trait VfsDirectory {
    type Entry: VfsEntry;

    /// Entries in on-disc order, self and parent already filtered out.
    fn entries(&self) -> &[Self::Entry];

    /// Case-insensitive lookup by display name.
    fn entry_by_name(&self, name: &str) -> Option<&Self::Entry> {
        self.entries()
            .iter()
            .find(|e| e.file_name().eq_ignore_ascii_case(name))
    }
}

/// The reader-side capability to materialise directories.
pub trait VfsContext {
    type Entry: VfsEntry;
    type Directory: VfsDirectory<Entry = Self::Entry>;

    fn root_directory(&self) -> Result<Rc<Self::Directory>, FsError>;

    fn open_directory(&self, entry: &Self::Entry) -> Result<Rc<Self::Directory>, FsError>;
}

/// Which entry kinds an enumeration yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    All,
    Files,
    Directories,
}

impl EntryFilter {
    fn accepts<E: VfsEntry>(self, entry: &E) -> bool {
        match self {
            Self::All => true,
            Self::Files => !entry.is_directory(),
            Self::Directories => entry.is_directory(),
        }
    }
}

/// Resolve a path to its entry, following symbolic links.
///
/// Returns `Ok(None)` when a component does not exist (the root itself has no
/// entry and also resolves to `None`). A file in a non-final position fails
/// with [`FsError::NotADirectory`]; more than [`MAX_SYMLINK_HOPS`] link hops
/// fail with [`FsError::SymlinkLoop`].
pub fn resolve_entry<C: VfsContext>(ctx: &C, p: &str) -> Result<Option<C::Entry>, FsError> {
    let mut hops = MAX_SYMLINK_HOPS;
    resolve_with_budget(ctx, &path::normalize(p), &mut hops)
}

fn resolve_with_budget<C: VfsContext>(
    ctx: &C,
    p: &str,
    hops: &mut usize,
) -> Result<Option<C::Entry>, FsError> {
    let parts = path::split(p);
    if parts.is_empty() {
        return Ok(None);
    }

    let mut dir = ctx.root_directory()?;
    let mut dir_path = path::ROOT.to_string();
    for (i, part) in parts.iter().enumerate() {
        let entry = match dir.entry_by_name(part) {
            Some(e) => e.clone(),
            None => return Ok(None),
        };

        if entry.is_symlink() {
            if *hops == 0 {
                log::warn!("symbolic link chain exceeded {MAX_SYMLINK_HOPS} hops at {p}");
                return Err(FsError::symlink_loop(p));
            }
            *hops -= 1;
            let target = entry.symlink_target().unwrap_or("");
            let mut resolved = path::combine(&dir_path, target);
            for rest in &parts[i + 1..] {
                resolved = path::combine(&resolved, rest);
            }
            return resolve_with_budget(ctx, &resolved, hops);
        }

        if i == parts.len() - 1 {
            return Ok(Some(entry));
        }
        if !entry.is_directory() {
            return Err(FsError::not_a_directory(p));
        }
        dir_path = path::combine(&dir_path, part);
        dir = ctx.open_directory(&entry)?;
    }
    unreachable!("non-empty component list always returns from the loop")
}

/// Open the directory a path names, the root included.
pub fn open_directory_path<C: VfsContext>(
    ctx: &C,
    p: &str,
) -> Result<Rc<C::Directory>, FsError> {
    let normalized = path::normalize(p);
    if path::is_root(&normalized) {
        return ctx.root_directory();
    }
    match resolve_entry(ctx, &normalized)? {
        None => Err(FsError::directory_not_found(normalized)),
        Some(e) if !e.is_directory() => Err(FsError::not_a_directory(normalized)),
        Some(e) => ctx.open_directory(&e),
    }
}

/// Enumerate the entries under a directory, optionally wildcard-filtered and
/// recursive.
///
/// Results preserve on-disc order within each directory and are depth-first
/// across recursion: a matching directory is reported before its contents.
pub fn enumerate<C: VfsContext>(
    ctx: &C,
    base: &str,
    pattern: Option<&str>,
    recursive: bool,
    filter: EntryFilter,
) -> Result<Vec<String>, FsError> {
    let base = path::normalize(base);
    let dir = open_directory_path(ctx, &base)?;
    let matcher = pattern.map(WildcardPattern::new);

    let mut results = Vec::new();
    enumerate_into(ctx, &dir, &base, matcher.as_ref(), recursive, filter, &mut results)?;
    Ok(results)
}

fn enumerate_into<C: VfsContext>(
    ctx: &C,
    dir: &Rc<C::Directory>,
    dir_path: &str,
    matcher: Option<&WildcardPattern>,
    recursive: bool,
    filter: EntryFilter,
    results: &mut Vec<String>,
) -> Result<(), FsError> {
    for entry in dir.entries() {
        let full = path::combine(dir_path, entry.file_name());
        let matched = matcher.is_none_or(|m| m.matches(entry.search_name()));
        if matched && filter.accepts(entry) {
            results.push(full.clone());
        }
        if recursive && entry.is_directory() {
            let sub = ctx.open_directory(entry)?;
            enumerate_into(ctx, &sub, &full, matcher, recursive, filter, results)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/vfs_tests.rs"]
mod tests;
