//! Plan the removal of everything except the primary video file of each folder.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::config::Config;
use crate::media_type::{MediaType, is_season_name};
use crate::print_error;
use crate::script::{shell_quote, shell_quote_bytes};

/// A planned line in the cleanup script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupCommand {
    /// Remove the path with `rm -rf`.
    Remove { path: PathBuf, size: u64 },
    /// Path is too large to delete without a manual check.
    SkipOversized { path: PathBuf, size: u64 },
}

/// Decides which files and folders are redundant.
#[derive(Debug)]
pub struct CleanupPlanner<'a> {
    config: &'a Config,
}

impl CleanupCommand {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Remove { path, .. } | Self::SkipOversized { path, .. } => path,
        }
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        match self {
            Self::Remove { size, .. } | Self::SkipOversized { size, .. } => *size,
        }
    }

    #[must_use]
    pub const fn is_removal(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }

    /// The line written to the cleanup script, with the path bytes kept exactly.
    ///
    /// A removal whose path cannot be quoted exactly is commented out.
    #[must_use]
    pub fn script_line(&self) -> Vec<u8> {
        match self {
            Self::Remove { path, .. } => shell_quote_bytes(path).map_or_else(
                || format!("# Skipped deletion of {} as its name cannot be quoted", shell_quote(path)).into_bytes(),
                |quoted| [b"rm -rf ".as_slice(), quoted.as_slice()].concat(),
            ),
            Self::SkipOversized { path, size } => {
                let quoted = shell_quote_bytes(path).unwrap_or_else(|| shell_quote(path).into_bytes());
                [
                    b"# Skipped deletion of ".as_slice(),
                    quoted.as_slice(),
                    format!(" (size: {size} bytes) as it is over 1GB").as_bytes(),
                ]
                .concat()
            }
        }
    }
}

impl fmt::Display for CleanupCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.script_line()))
    }
}

impl<'a> CleanupPlanner<'a> {
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Plan cleanup commands for the given library type.
    ///
    /// # Errors
    /// Returns an error if the target directory cannot be listed.
    pub fn plan(&self, target: &Path, media_type: MediaType) -> Result<Vec<CleanupCommand>> {
        match media_type {
            MediaType::Movie => self.plan_movies(target),
            MediaType::Tv => self.plan_tv(target),
        }
    }

    /// Keep the largest video in each movie folder and remove everything else.
    ///
    /// # Errors
    /// Returns an error if the target directory cannot be listed.
    pub fn plan_movies(&self, target: &Path) -> Result<Vec<CleanupCommand>> {
        let mut commands = Vec::new();
        for folder in crate::sorted_subdirectories(target)? {
            self.plan_unit_folder(&folder, &mut commands);
        }
        Ok(commands)
    }

    /// Remove non-video files and all subdirectories from season folders.
    ///
    /// Show folders without any season folder are treated like a movie folder.
    ///
    /// # Errors
    /// Returns an error if the target directory cannot be listed.
    pub fn plan_tv(&self, target: &Path) -> Result<Vec<CleanupCommand>> {
        let mut commands = Vec::new();
        for show in crate::sorted_subdirectories(target)? {
            let seasons: Vec<PathBuf> = match crate::sorted_subdirectories(&show) {
                Ok(subdirectories) => subdirectories
                    .into_iter()
                    .filter(|path| is_season_name(&crate::path_to_filename_string(path)))
                    .collect(),
                Err(error) => {
                    print_error!("{error:#}");
                    continue;
                }
            };

            if seasons.is_empty() {
                self.plan_unit_folder(&show, &mut commands);
                continue;
            }

            for season in seasons {
                let items = match crate::sorted_dir_entries(&season) {
                    Ok(items) => items,
                    Err(error) => {
                        print_error!("{error:#}");
                        continue;
                    }
                };
                for item in items {
                    if !self.is_video_file(&item) {
                        commands.push(self.command_for(item));
                    }
                }
            }
        }
        Ok(commands)
    }

    /// Plan a single folder that should end up holding one video file.
    ///
    /// A folder without videos is removed as a whole.
    /// Otherwise the largest video is kept, the first one on equal sizes,
    /// and every other item is removed.
    fn plan_unit_folder(&self, folder: &Path, commands: &mut Vec<CleanupCommand>) {
        let items = match crate::sorted_dir_entries(folder) {
            Ok(items) => items,
            Err(error) => {
                print_error!("{error:#}");
                return;
            }
        };

        let keeper = items
            .iter()
            .filter(|path| self.is_video_file(path))
            .map(|path| (path, file_size(path)))
            .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
            .map(|(path, _)| path.clone());

        let Some(keeper) = keeper else {
            commands.push(self.command_for(folder.to_path_buf()));
            return;
        };

        commands.extend(
            items
                .into_iter()
                .filter(|path| *path != keeper)
                .map(|path| self.command_for(path)),
        );
    }

    /// Create the command for a delete target, checking the size limit.
    fn command_for(&self, path: PathBuf) -> CleanupCommand {
        let size = path_size(&path);
        if size > self.config.max_delete_size {
            CleanupCommand::SkipOversized { path, size }
        } else {
            CleanupCommand::Remove { path, size }
        }
    }

    fn is_video_file(&self, path: &Path) -> bool {
        path.is_file() && self.config.is_video_extension(&crate::path_to_dotted_extension_string(path))
    }
}

/// Size of a file, or the total size of all files under a directory.
///
/// Symlinked files count with the size of their target.
/// Symlinked directories are not descended into.
/// Entries that cannot be read count as zero.
#[must_use]
pub fn path_size(path: &Path) -> u64 {
    if path.is_file() {
        return file_size(path);
    }
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() || entry.path_is_symlink())
        .filter_map(|entry| fs::metadata(entry.path()).ok())
        .filter(fs::Metadata::is_file)
        .map(|metadata| metadata.len())
        .sum()
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|metadata| metadata.len()).unwrap_or(0)
}
