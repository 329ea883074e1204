//! Recursive move-and-merge of directory trees.
//!
//! Existing data is never overwritten:
//! a conflicting item is left in place in the source directory and reported.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::{print_error, print_warning};

/// What to do with a single source item when merging it into a destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Destination does not exist: move the source there.
    Move,
    /// Both are directories: merge the contents recursively.
    Recurse,
    /// Destination exists and is not a directory pair: leave the source in place.
    Skip,
}

/// Outcome of a directory merge.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Number of files and directories moved into place.
    pub moved: usize,
    /// Source items left in place because the destination already existed.
    pub skipped: Vec<PathBuf>,
    /// Number of moves that failed.
    pub failed: usize,
}

/// Merges directory trees without ever overwriting existing items.
#[derive(Debug, Default)]
pub struct Merger {
    verbose: bool,
}

impl MergeSummary {
    /// True when every item from the source was moved.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed == 0
    }
}

impl Merger {
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            verbose: config.verbose,
        }
    }

    /// Merge all children of `source` into `destination`,
    /// then try to remove the source directory.
    ///
    /// Removal failure is ignored, since the source is not empty when conflicts were skipped.
    ///
    /// # Errors
    /// Returns an error if the source directory cannot be listed.
    pub fn merge_directories(&self, source: &Path, destination: &Path) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        for item in crate::sorted_dir_entries(source)? {
            let Some(name) = item.file_name() else {
                continue;
            };
            self.safe_move(&item, &destination.join(name), &mut summary);
        }
        let _ = fs::remove_dir(source);
        Ok(summary)
    }

    /// Move `source` to `destination`, merging directories that exist on both sides.
    pub fn safe_move(&self, source: &Path, destination: &Path, summary: &mut MergeSummary) {
        match merge_action(source, destination) {
            MergeAction::Move => match move_path(source, destination) {
                Ok(()) => {
                    if self.verbose {
                        println!("\tMoved {} -> {}", source.display(), destination.display());
                    }
                    summary.moved += 1;
                }
                Err(error) => {
                    print_error!("Failed to move {}: {error}", source.display());
                    summary.failed += 1;
                }
            },
            MergeAction::Recurse => match crate::sorted_dir_entries(source) {
                Ok(items) => {
                    for item in items {
                        let Some(name) = item.file_name() else {
                            continue;
                        };
                        self.safe_move(&item, &destination.join(name), summary);
                    }
                    let _ = fs::remove_dir(source);
                }
                Err(error) => {
                    print_error!("{error:#}");
                    summary.failed += 1;
                }
            },
            MergeAction::Skip => {
                print_warning!(
                    "\tSkipping {} because destination {} exists",
                    source.display(),
                    destination.display()
                );
                summary.skipped.push(source.to_path_buf());
            }
        }
    }
}

/// Decide how a source item should be merged into the destination path.
///
/// A dangling symlink at the destination counts as existing so it is never replaced.
#[must_use]
pub fn merge_action(source: &Path, destination: &Path) -> MergeAction {
    if fs::symlink_metadata(destination).is_err() {
        MergeAction::Move
    } else if source.is_dir() && destination.is_dir() {
        MergeAction::Recurse
    } else {
        MergeAction::Skip
    }
}

/// Rename a file or directory, falling back to copy and delete across file systems.
fn move_path(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
            if source.is_dir() {
                copy_dir_recursive(source, destination)?;
                fs::remove_dir_all(source)
            } else {
                fs::copy(source, destination)?;
                fs::remove_file(source)
            }
        }
        result => result,
    }
}

/// Recursively copy a directory and its contents.
fn copy_dir_recursive(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = target.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}
