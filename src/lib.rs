//! Normalize, merge and clean up media library folders.
//!
//! The library is organised around a single pass over a target directory:
//! detect the media type, rename and merge the top-level folders,
//! then plan the removal of everything that is not the primary video file
//! and write those commands to a shell script for manual review.

pub mod cleanup;
pub mod config;
pub mod media_type;
pub mod merge;
pub mod name;
pub mod prompt;
pub mod script;
pub mod tidy;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::Colorize;
use difference::{Changeset, Difference};
use unicode_normalization::UnicodeNormalization;

/// Get the normalized directory name from a Path with special characters retained.
pub fn get_normalized_dir_name(path: &Path) -> Result<String> {
    let dir_name = os_str_to_string(path.file_name().context("Failed to get directory name")?);

    // Rust uses Unicode NFD (Normalization Form Decomposed) on some file systems,
    // which converts special chars like "å" to "a\u{30a}".
    // Use NFC (Normalization Form Composed) so folder names compare equal to
    // the canonical names computed from them.
    Ok(dir_name.nfc().collect::<String>())
}

/// Resolves the provided input path to a directory to an absolute path.
///
/// If `path` is `None`, the current working directory is used.
/// An empty path is an error.
/// The function verifies that the provided path exists and is accessible,
/// returning an error if it does not.
/// ```rust
/// use std::path::Path;
/// use media_tidy::resolve_input_path;
///
/// let path = Path::new("src");
/// let absolute_path = resolve_input_path(Some(path)).unwrap();
/// assert!(absolute_path.is_absolute());
/// ```
#[inline]
pub fn resolve_input_path(path: Option<&Path>) -> Result<PathBuf> {
    let filepath = match path {
        None => env::current_dir().context("Failed to get current working directory")?,
        // Only valid Unicode can be trimmed, other paths are used as is.
        Some(path) => match path.to_str() {
            Some(input_path) if input_path.trim().is_empty() => anyhow::bail!("Input path is empty"),
            Some(input_path) => PathBuf::from(input_path.trim()),
            None => path.to_path_buf(),
        },
    };
    if !filepath.exists() {
        anyhow::bail!(
            "Input path does not exist or is not accessible: '{}'",
            filepath.display()
        );
    }

    let absolute_input_path = dunce::canonicalize(&filepath)?;

    // Canonicalize fails for network drives on Windows :(
    if path_to_string(&absolute_input_path).starts_with(r"\\?") && !path_to_string(&filepath).starts_with(r"\\?") {
        Ok(filepath)
    } else {
        Ok(absolute_input_path)
    }
}

/// List the immediate children of a directory sorted by name.
///
/// Sorting keeps prompts and the generated cleanup script in the same order between runs.
pub fn sorted_dir_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read directory entry in: {}", dir.display()))?;

    paths.sort();
    Ok(paths)
}

/// List the immediate subdirectories of a directory sorted by name.
pub fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_dir_entries(dir)?.into_iter().filter(|path| path.is_dir()).collect())
}

/// Gets the relative path or filename from a full path based on a root directory.
///
/// If the full path is within the root directory, the function returns the relative path.
/// Otherwise, it returns just the filename. If the filename cannot be determined, the
/// full path is returned.
///
/// ```rust
/// use std::path::Path;
/// use media_tidy::get_relative_path_or_filename;
///
/// let root = Path::new("/media/movies");
/// let full_path = root.join("Alien (1979)/poster.jpg");
/// assert_eq!(get_relative_path_or_filename(&full_path, root), "Alien (1979)/poster.jpg");
/// ```
#[must_use]
pub fn get_relative_path_or_filename(full_path: &Path, root: &Path) -> String {
    if full_path == root {
        return full_path.file_name().unwrap_or_default().to_string_lossy().to_string();
    }
    full_path.strip_prefix(root).map_or_else(
        |_| {
            full_path.file_name().map_or_else(
                || full_path.display().to_string(),
                |name| name.to_string_lossy().to_string(),
            )
        },
        |relative_path| relative_path.display().to_string(),
    )
}

/// Convert `OsStr` to String with invalid Unicode handling.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to string with invalid Unicode handling.
pub fn path_to_string(path: &Path) -> String {
    path.to_str().map_or_else(
        || path.to_string_lossy().to_string().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to filename string with invalid Unicode handling.
#[must_use]
pub fn path_to_filename_string(path: &Path) -> String {
    os_str_to_string(path.file_name().unwrap_or_default())
}

/// Convert given path to file extension lowercase string with invalid Unicode handling.
///
/// The returned extension includes the leading dot, or is empty if the path has no extension.
#[must_use]
pub fn path_to_dotted_extension_string(path: &Path) -> String {
    let extension = os_str_to_string(path.extension().unwrap_or_default()).to_lowercase();
    if extension.is_empty() {
        extension
    } else {
        format!(".{extension}")
    }
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

#[inline]
pub fn print_bold(message: &str) {
    println!("{}", message.bold());
}

#[macro_export]
macro_rules! print_bold {
    ($($arg:tt)*) => {
        $crate::print_bold(&format!($($arg)*))
    };
}

#[inline]
pub fn print_green(message: &str) {
    println!("{}", message.green());
}

#[macro_export]
macro_rules! print_green {
    ($($arg:tt)*) => {
        $crate::print_green(&format!($($arg)*))
    };
}

/// Create a coloured diff for the given strings.
///
/// Returns the old and new string with removed parts in red and added parts in green.
#[must_use]
pub fn color_diff(old: &str, new: &str) -> (String, String) {
    let changeset = Changeset::new(old, new, "");
    let mut old_diff = String::new();
    let mut new_diff = String::new();

    for diff in changeset.diffs {
        match diff {
            Difference::Same(ref x) => {
                old_diff.push_str(x);
                new_diff.push_str(x);
            }
            Difference::Add(ref x) => {
                if x.chars().all(char::is_whitespace) {
                    new_diff.push_str(&x.on_green().to_string());
                } else {
                    new_diff.push_str(&x.green().to_string());
                }
            }
            Difference::Rem(ref x) => {
                if x.chars().all(char::is_whitespace) {
                    old_diff.push_str(&x.on_red().to_string());
                } else {
                    old_diff.push_str(&x.red().to_string());
                }
            }
        }
    }

    (old_diff, new_diff)
}

/// Format bytes as human-readable size
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    }
}

/// Generate a shell completion script for the given shell.
pub fn generate_shell_completion(shell: Shell, mut command: Command, install: bool, command_name: &str) -> Result<()> {
    if install {
        let out_dir = get_shell_completion_dir(shell, command_name)?;
        let path = clap_complete::generate_to(shell, &mut command, command_name, out_dir)?;
        println!("Completion file generated to: {}", path.display());
    } else {
        clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
    }
    Ok(())
}

/// Determine the appropriate directory for storing shell completions.
///
/// First checks if the user-specific directory exists,
/// then checks for the global directory.
/// If neither exist, creates and uses the user-specific dir.
fn get_shell_completion_dir(shell: Shell, name: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;

    // Special handling for oh-my-zsh.
    // Create custom "plugin", which will then have to be loaded in .zshrc
    if shell == Shell::Zsh {
        let omz_plugins = home.join(".oh-my-zsh/custom/plugins");
        if omz_plugins.exists() {
            let plugin_dir = omz_plugins.join(name);
            std::fs::create_dir_all(&plugin_dir)?;
            return Ok(plugin_dir);
        }
    }

    let user_dir = match shell {
        Shell::PowerShell => {
            if cfg!(windows) {
                home.join(r"Documents\PowerShell\completions")
            } else {
                home.join(".config/powershell/completions")
            }
        }
        Shell::Bash => home.join(".bash_completion.d"),
        Shell::Elvish => home.join(".elvish"),
        Shell::Fish => home.join(".config/fish/completions"),
        Shell::Zsh => home.join(".zsh/completions"),
        _ => anyhow::bail!("Unsupported shell"),
    };

    if user_dir.exists() {
        return Ok(user_dir);
    }

    let global_dir = match shell {
        Shell::PowerShell => user_dir.clone(),
        Shell::Bash => PathBuf::from("/etc/bash_completion.d"),
        Shell::Fish => PathBuf::from("/usr/share/fish/completions"),
        Shell::Zsh => PathBuf::from("/usr/share/zsh/site-functions"),
        _ => anyhow::bail!("Unsupported shell"),
    };

    if global_dir.exists() {
        return Ok(global_dir);
    }

    std::fs::create_dir_all(&user_dir)?;
    Ok(user_dir)
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_resolve_input_path_valid() {
        let dir = tempdir().unwrap();
        let resolved = resolve_input_path(Some(dir.path()));
        assert!(resolved.is_ok());
    }

    #[test]
    fn test_resolve_input_path_nonexistent() {
        let path = Path::new("nonexistent-media-folder");
        let resolved = resolve_input_path(Some(path));
        assert!(resolved.is_err());
    }

    #[test]
    fn test_resolve_input_path_default() {
        let resolved = resolve_input_path(None);
        assert!(resolved.is_ok());
        assert_eq!(resolved.unwrap(), env::current_dir().unwrap());
    }

    #[test]
    fn test_resolve_input_path_empty_is_error() {
        assert!(resolve_input_path(Some(Path::new(""))).is_err());
        assert!(resolve_input_path(Some(Path::new("  "))).is_err());
    }

    #[test]
    fn test_resolve_input_path_trims_whitespace() {
        let dir = tempdir().unwrap();
        let padded = format!(" {} ", dir.path().display());
        let resolved = resolve_input_path(Some(Path::new(&padded))).unwrap();
        assert_eq!(resolved, dunce::canonicalize(dir.path()).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resolve_input_path_non_unicode_directory() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let target = dir.path().join(OsStr::from_bytes(b"library\xff"));
        fs::create_dir(&target).unwrap();

        let resolved = resolve_input_path(Some(&target)).unwrap();
        assert_eq!(resolved, dunce::canonicalize(&target).unwrap());
        assert_ne!(resolved, env::current_dir().unwrap());
    }

    #[test]
    fn test_dotted_extension_is_lowercase() {
        assert_eq!(path_to_dotted_extension_string(Path::new("Movie.MKV")), ".mkv");
        assert_eq!(path_to_dotted_extension_string(Path::new("dir/poster.jpg")), ".jpg");
        assert_eq!(path_to_dotted_extension_string(Path::new("README")), "");
    }

    #[test]
    fn test_normalized_dir_name_composes_characters() {
        let decomposed = PathBuf::from("/media/A\u{30a}ngstro\u{308}m (2001)");
        assert_eq!(get_normalized_dir_name(&decomposed).unwrap(), "\u{c5}ngstr\u{f6}m (2001)");
    }

    #[test]
    fn test_relative_path_outside_root_returns_filename() {
        let root = Path::new("/media/movies");
        assert_eq!(get_relative_path_or_filename(Path::new("/other/file.mkv"), root), "file.mkv");
    }

    #[test]
    fn test_sorted_dir_entries_are_ordered() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("c.txt"), "c").unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();

        let names: Vec<String> = sorted_dir_entries(dir.path())
            .unwrap()
            .iter()
            .map(|p| path_to_filename_string(p))
            .collect();
        assert_eq!(names, vec!["a", "b", "c.txt"]);

        let dirs: Vec<String> = sorted_subdirectories(dir.path())
            .unwrap()
            .iter()
            .map(|p| path_to_filename_string(p))
            .collect();
        assert_eq!(dirs, vec!["a", "b"]);
    }

    #[test]
    fn test_sorted_dir_entries_missing_directory() {
        assert!(sorted_dir_entries(Path::new("/nonexistent/media/dir")).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512 * 1024), "512.00 KB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
    }
}
