//! Write planned cleanup commands to a shell script for manual review.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cleanup::CleanupCommand;

/// File name of the generated script inside the target directory.
pub const SCRIPT_NAME: &str = "cleanup.sh";

/// Quote a path for a POSIX shell using single quotes.
///
/// Invalid Unicode is shown lossily, so use [`shell_quote_bytes`] for script contents.
///
/// ```rust
/// use std::path::Path;
/// use media_tidy::script::shell_quote;
///
/// assert_eq!(shell_quote(Path::new("/media/Heat (1995)")), "'/media/Heat (1995)'");
/// assert_eq!(shell_quote(Path::new("It's")), r"'It'\''s'");
/// ```
#[must_use]
pub fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Quote a path for a POSIX shell keeping the exact bytes of the path.
#[cfg(unix)]
#[must_use]
pub fn shell_quote_bytes(path: &Path) -> Option<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    Some(quote_bytes(path.as_os_str().as_bytes()))
}

/// Quote a path for a POSIX shell.
///
/// Returns `None` if the path is not valid Unicode and cannot be written exactly.
#[cfg(not(unix))]
#[must_use]
pub fn shell_quote_bytes(path: &Path) -> Option<Vec<u8>> {
    path.to_str().map(|path| quote_bytes(path.as_bytes()))
}

fn quote_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &byte in bytes {
        if byte == b'\'' {
            quoted.extend_from_slice(br"'\''");
        } else {
            quoted.push(byte);
        }
    }
    quoted.push(b'\'');
    quoted
}

/// Render the full script contents.
#[must_use]
pub fn render_script(commands: &[CleanupCommand]) -> Vec<u8> {
    let mut script = b"#!/bin/sh\n\n".to_vec();
    for command in commands {
        script.extend(command.script_line());
        script.push(b'\n');
    }
    script
}

/// Write the commands to `cleanup.sh` in the target directory and make it executable.
///
/// Nothing is written when there are no commands.
/// The script is never executed.
///
/// # Errors
/// Returns an error if the script cannot be written.
pub fn write_cleanup_script(target: &Path, commands: &[CleanupCommand]) -> Result<Option<PathBuf>> {
    if commands.is_empty() {
        return Ok(None);
    }

    let script_path = target.join(SCRIPT_NAME);
    fs::write(&script_path, render_script(commands))
        .with_context(|| format!("Failed to write cleanup script: {}", script_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make script executable: {}", script_path.display()))?;
    }

    Ok(Some(script_path))
}
