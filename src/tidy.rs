//! Rename and merge top-level folders, then plan and write the cleanup script.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;

use crate::cleanup::{CleanupCommand, CleanupPlanner};
use crate::config::Config;
use crate::media_type::{MediaType, determine_media_type};
use crate::merge::Merger;
use crate::name::{has_year_suffix, normalize_name, tv_normalize_name};
use crate::prompt::Prompter;
use crate::script::{SCRIPT_NAME, write_cleanup_script};
use crate::{print_bold, print_error, print_green, print_warning};

/// Top-level folder in the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    /// Directory name with Unicode normalized to NFC.
    pub name: String,
    /// Path on disk.
    pub path: PathBuf,
}

/// TV folders sharing the same bare show title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvGroup {
    /// Show title without year, used as the grouping key.
    pub title: String,
    /// Member folders in the order they were encountered.
    pub members: Vec<FolderEntry>,
}

/// Normalizes, merges and cleans up a media library directory.
#[derive(Debug)]
pub struct MediaTidy {
    root: PathBuf,
    config: Config,
}

/// Number of folder changes made in the rename and merge pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenameStats {
    pub renamed: usize,
    pub merged: usize,
}

impl FolderEntry {
    /// Create an entry from a directory path.
    ///
    /// # Errors
    /// Returns an error if the path has no file name.
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let name = crate::get_normalized_dir_name(&path)?;
        Ok(Self { name, path })
    }
}

impl TvGroup {
    /// The folder other members are merged into:
    /// the first member ending in "(YYYY)", otherwise the first member.
    #[must_use]
    pub fn canonical(&self) -> Option<&FolderEntry> {
        self.members
            .iter()
            .find(|member| has_year_suffix(&member.name))
            .or_else(|| self.members.first())
    }
}

/// Group folders by their bare TV show title, keeping first-encountered order.
#[must_use]
pub fn group_tv_folders(folders: Vec<FolderEntry>) -> Vec<TvGroup> {
    let mut groups: Vec<TvGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for folder in folders {
        let title = tv_normalize_name(&folder.name);
        if let Some(&position) = index.get(&title) {
            groups[position].members.push(folder);
        } else {
            index.insert(title.clone(), groups.len());
            groups.push(TvGroup {
                title,
                members: vec![folder],
            });
        }
    }
    groups
}

impl MediaTidy {
    #[must_use]
    pub const fn new(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }

    /// Run interactively using stdin and stdout.
    ///
    /// Returns the path of the written cleanup script, if any.
    ///
    /// # Errors
    /// Returns an error if the target directory cannot be read or the script cannot be written.
    pub fn run(&self) -> Result<Option<PathBuf>> {
        let mut prompter = Prompter::stdio(&self.config);
        self.run_with_prompter(&mut prompter)
    }

    /// Run the full pass using the given prompter for all decisions.
    ///
    /// # Errors
    /// Returns an error if the target directory cannot be read or the script cannot be written.
    pub fn run_with_prompter<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<Option<PathBuf>> {
        if self.config.debug {
            eprintln!("{self}");
        }

        println!("Starting folder normalization and cleanup process in:");
        println!("\t{}\n", self.root.display());

        let media_type = determine_media_type(&self.root, &self.config, prompter)?;
        println!("Detected media type: {}\n", media_type.to_string().to_uppercase());

        let stats = self.rename_and_merge(media_type, prompter)?;
        if self.config.verbose {
            println!("Renamed {} and merged {} folder(s)", stats.renamed, stats.merged);
        }

        print_bold!("\n=== Cleanup Section ===");
        let commands = CleanupPlanner::new(&self.config).plan(&self.root, media_type)?;
        let script = self.emit_commands(&commands, media_type)?;

        println!("\nProcess complete.");
        Ok(script)
    }

    /// Rename and merge the top-level folders according to the media type.
    ///
    /// # Errors
    /// Returns an error if the target directory cannot be listed or prompting fails.
    pub fn rename_and_merge<R: BufRead, W: Write>(
        &self,
        media_type: MediaType,
        prompter: &mut Prompter<R, W>,
    ) -> Result<RenameStats> {
        print_bold!("=== Renaming/Merging Section ===");
        match media_type {
            MediaType::Movie => self.rename_and_merge_movies(prompter),
            MediaType::Tv => self.merge_tv_groups(prompter),
        }
    }

    fn rename_and_merge_movies<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<RenameStats> {
        println!("(For renaming: press Enter to accept default, type a new name, or 's' to skip.)");
        println!("(For merging: press Enter to merge, or 's' to skip.)\n");

        let mut stats = RenameStats::default();
        for folder in self.collect_folders()? {
            // Earlier merges may have removed a folder from the snapshot.
            if !folder.path.is_dir() {
                continue;
            }
            let canonical = normalize_name(&folder.name);
            if folder.name == canonical {
                continue;
            }
            if canonical.is_empty() {
                print_warning!("\tSkipping '{}': no name left after normalization", folder.name);
                continue;
            }

            let canonical_path = self.root.join(&canonical);
            if canonical_path.is_dir() {
                if self.merge_folder(&folder, &canonical, &canonical_path, prompter)? {
                    stats.merged += 1;
                }
            } else if self.rename_folder(&folder, &canonical, prompter)? {
                stats.renamed += 1;
            }
        }
        Ok(stats)
    }

    fn merge_tv_groups<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<RenameStats> {
        println!("(TV: Grouping by title; folders with a trailing year are preferred as canonical.)");

        let mut stats = RenameStats::default();
        for group in group_tv_folders(self.collect_folders()?) {
            if group.members.len() < 2 {
                continue;
            }
            let Some(canonical) = group.canonical() else {
                continue;
            };
            if self.config.verbose {
                println!("{}: {} folders", group.title.cyan().bold(), group.members.len());
            }
            for member in group.members.iter().filter(|member| member.path != canonical.path) {
                if self.merge_folder(member, &canonical.name, &canonical.path, prompter)? {
                    stats.merged += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Ask to merge a folder into another one and merge on confirmation.
    fn merge_folder<R: BufRead, W: Write>(
        &self,
        folder: &FolderEntry,
        destination_name: &str,
        destination: &Path,
        prompter: &mut Prompter<R, W>,
    ) -> Result<bool> {
        if self.config.dryrun {
            println!("\tWould merge '{}' into '{destination_name}'", folder.name);
            return Ok(false);
        }
        if !prompter.confirm_merge(&folder.name, destination_name)? {
            return Ok(false);
        }

        match Merger::new(&self.config).merge_directories(&folder.path, destination) {
            Ok(summary) => {
                if summary.failed > 0 {
                    print_error!("{} item(s) failed to move from '{}'", summary.failed, folder.name);
                }
                if !summary.skipped.is_empty() {
                    print_warning!(
                        "\t{} conflicting item(s) left in '{}'",
                        summary.skipped.len(),
                        folder.name
                    );
                }
                if summary.is_complete() {
                    println!("\tMerged '{}' into '{destination_name}'", folder.name);
                    Ok(true)
                } else if summary.moved > 0 {
                    print_warning!("\tPartially merged '{}' into '{destination_name}'", folder.name);
                    Ok(true)
                } else {
                    print_warning!("\tNothing merged from '{}' into '{destination_name}'", folder.name);
                    Ok(false)
                }
            }
            Err(error) => {
                print_error!("Failed to merge '{}': {error:#}", folder.name);
                Ok(false)
            }
        }
    }

    /// Ask for a new name for a folder and rename on confirmation.
    fn rename_folder<R: BufRead, W: Write>(
        &self,
        folder: &FolderEntry,
        canonical: &str,
        prompter: &mut Prompter<R, W>,
    ) -> Result<bool> {
        if self.config.dryrun {
            println!("\tWould rename '{}' to '{canonical}'", folder.name);
            return Ok(false);
        }
        let Some(new_name) = prompter.confirm_rename(&folder.name, canonical)? else {
            return Ok(false);
        };
        if new_name == folder.name {
            return Ok(false);
        }
        if !is_valid_folder_name(&new_name) {
            print_warning!("\tSkipping rename for '{}': invalid name '{new_name}'", folder.name);
            return Ok(false);
        }

        let new_path = self.root.join(&new_name);
        if fs::symlink_metadata(&new_path).is_ok() {
            print_warning!(
                "\tSkipping rename for '{}': '{new_name}' already exists",
                folder.name
            );
            return Ok(false);
        }

        match fs::rename(&folder.path, &new_path) {
            Ok(()) => {
                println!("\tRenamed '{}' to '{new_name}'", folder.name);
                Ok(true)
            }
            Err(error) => {
                print_error!("Failed to rename '{}': {error}", folder.name);
                Ok(false)
            }
        }
    }

    /// Write the cleanup script, or print the commands in dryrun mode.
    fn emit_commands(&self, commands: &[CleanupCommand], media_type: MediaType) -> Result<Option<PathBuf>> {
        if commands.is_empty() {
            println!("\tNo extra files/folders detected in {media_type} folders.");
            return Ok(None);
        }

        if self.config.verbose || self.config.dryrun {
            for command in commands {
                let size = crate::format_size(command.size());
                if command.is_removal() {
                    println!("\t{} ({size})", crate::get_relative_path_or_filename(command.path(), &self.root));
                } else {
                    println!(
                        "\t{}",
                        format!(
                            "{} ({size}) too large, needs manual review",
                            crate::get_relative_path_or_filename(command.path(), &self.root)
                        )
                        .yellow()
                    );
                }
            }
        }

        if self.config.dryrun {
            println!("Dryrun: would have written {} command(s) to {SCRIPT_NAME}", commands.len());
            return Ok(None);
        }

        let script = write_cleanup_script(&self.root, commands)?;
        if let Some(path) = &script {
            print_green!("\tCleanup script created: {}", path.display());
            println!("\tReview the script and run it manually to remove extra files/folders.");
        } else {
            println!("\tNo cleanup script created (no extra files detected).");
        }
        Ok(script)
    }

    /// Snapshot the top-level folders of the target directory.
    fn collect_folders(&self) -> Result<Vec<FolderEntry>> {
        let mut folders = Vec::new();
        for path in crate::sorted_subdirectories(&self.root)? {
            match FolderEntry::from_path(path) {
                Ok(folder) => folders.push(folder),
                Err(error) => print_error!("{error:#}"),
            }
        }
        Ok(folders)
    }
}

impl fmt::Display for MediaTidy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Root: {}", self.root.display())?;
        write!(f, "Config: {:#?}", self.config)
    }
}

/// A new folder name must stay directly inside the target directory.
fn is_valid_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains(std::path::MAIN_SEPARATOR)
}
