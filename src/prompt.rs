//! Interactive confirmations with a force-mode bypass.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;

/// Operator answer to a prompt that offers a default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Empty input: use the offered default.
    Default,
    /// Operator typed a different value.
    Custom(String),
    /// Operator entered the skip sentinel `s`.
    Skip,
}

/// Asks the operator to confirm renames, merges and the media type.
///
/// In force mode every prompt resolves to its default without reading input,
/// and the chosen action is echoed instead.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
    force: bool,
}

impl Answer {
    /// Interpret a raw input line.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            Self::Default
        } else if input.eq_ignore_ascii_case("s") {
            Self::Skip
        } else {
            Self::Custom(input.to_string())
        }
    }

    /// Resolve the answer to the final value, or `None` when skipped.
    #[must_use]
    pub fn resolve(self, default: &str) -> Option<String> {
        match self {
            Self::Default => Some(default.to_string()),
            Self::Custom(value) => Some(value),
            Self::Skip => None,
        }
    }
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Create a prompter reading from stdin and writing to stdout.
    #[must_use]
    pub fn stdio(config: &Config) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), config.force)
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    #[must_use]
    pub const fn new(reader: R, writer: W, force: bool) -> Self {
        Self { reader, writer, force }
    }

    /// True when prompts are answered automatically.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        self.force
    }

    /// Consume the prompter and return the output writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Ask for the new name of a folder.
    ///
    /// Returns the name to use, or `None` if the operator skipped the rename.
    ///
    /// # Errors
    /// Returns an error if reading input or writing output fails.
    pub fn confirm_rename(&mut self, folder: &str, canonical: &str) -> Result<Option<String>> {
        if self.force {
            writeln!(self.writer, "\tAutomatically renaming '{folder}' to '{canonical}'")?;
            return Ok(Some(canonical.to_string()));
        }

        let (old_diff, new_diff) = crate::color_diff(folder, canonical);
        writeln!(self.writer, "{old_diff}")?;
        writeln!(self.writer, "{new_diff}")?;
        let prompt = format!("Rename: {folder} -> [{canonical}]: ");
        let answer = self.ask(&prompt)?;
        let new_name = Answer::parse(&answer).resolve(canonical);
        if new_name.is_none() {
            writeln!(self.writer, "\tSkipping rename for '{folder}'")?;
        }
        Ok(new_name)
    }

    /// Ask whether a folder should be merged into another one.
    ///
    /// Anything other than the skip sentinel confirms the merge.
    ///
    /// # Errors
    /// Returns an error if reading input or writing output fails.
    pub fn confirm_merge(&mut self, source: &str, destination: &str) -> Result<bool> {
        if self.force {
            writeln!(self.writer, "\tAutomatically merging '{source}' into '{destination}'")?;
            return Ok(true);
        }

        let prompt = format!("Merge: {source} into {destination}? (Enter=merge, 's'=skip): ");
        let answer = self.ask(&prompt)?;
        if Answer::parse(&answer) == Answer::Skip {
            writeln!(self.writer, "\tSkipping merge for '{source}'")?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Ask whether an undetermined directory holds TV shows.
    ///
    /// Answers starting with "y" mean TV, anything else means movies.
    ///
    /// # Errors
    /// Returns an error if reading input or writing output fails.
    pub fn ask_is_tv(&mut self) -> Result<bool> {
        if self.force {
            writeln!(self.writer, "Media type undetermined. Defaulting to MOVIE in forced mode.")?;
            return Ok(false);
        }

        let answer = self.ask("Media type undetermined. Is this a TV directory? (y/n): ")?;
        Ok(answer.trim().to_lowercase().starts_with('y'))
    }

    /// Print a prompt and read one line of input.
    ///
    /// End of input is treated as an empty answer.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.writer, "{}", prompt.magenta())?;
        self.writer.flush()?;

        let mut input = String::new();
        self.reader.read_line(&mut input).context("Failed to read input")?;
        Ok(input)
    }
}

#[cfg(test)]
mod prompt_tests {
    use super::*;

    use std::io::Cursor;

    fn prompter(input: &str, force: bool) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), force)
    }

    fn output(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_writer()).unwrap()
    }

    #[test]
    fn answer_parsing() {
        assert_eq!(Answer::parse(""), Answer::Default);
        assert_eq!(Answer::parse("  \n"), Answer::Default);
        assert_eq!(Answer::parse("s\n"), Answer::Skip);
        assert_eq!(Answer::parse("S"), Answer::Skip);
        assert_eq!(Answer::parse(" Other Name \n"), Answer::Custom("Other Name".to_string()));
        assert_eq!(Answer::parse("skip"), Answer::Custom("skip".to_string()));
    }

    #[test]
    fn answer_resolves_to_value() {
        assert_eq!(Answer::Default.resolve("Heat (1995)"), Some("Heat (1995)".to_string()));
        assert_eq!(
            Answer::Custom("Heat".to_string()).resolve("Heat (1995)"),
            Some("Heat".to_string())
        );
        assert_eq!(Answer::Skip.resolve("Heat (1995)"), None);
    }

    #[test]
    fn rename_accepts_default_on_empty_input() {
        let mut prompter = prompter("\n", false);
        let result = prompter.confirm_rename("Heat.1995.1080p", "Heat (1995)").unwrap();
        assert_eq!(result, Some("Heat (1995)".to_string()));
        assert!(output(prompter).contains("Rename: Heat.1995.1080p -> [Heat (1995)]: "));
    }

    #[test]
    fn rename_uses_custom_value() {
        let mut prompter = prompter("Heat (1995) Directors Cut\n", false);
        let result = prompter.confirm_rename("Heat.1995.1080p", "Heat (1995)").unwrap();
        assert_eq!(result, Some("Heat (1995) Directors Cut".to_string()));
    }

    #[test]
    fn rename_can_be_skipped() {
        let mut prompter = prompter("s\n", false);
        let result = prompter.confirm_rename("Heat.1995.1080p", "Heat (1995)").unwrap();
        assert_eq!(result, None);
        assert!(output(prompter).contains("Skipping rename for 'Heat.1995.1080p'"));
    }

    #[test]
    fn rename_end_of_input_accepts_default() {
        let mut prompter = prompter("", false);
        let result = prompter.confirm_rename("Heat.1995", "Heat (1995)").unwrap();
        assert_eq!(result, Some("Heat (1995)".to_string()));
    }

    #[test]
    fn merge_confirmed_with_enter_and_skipped_with_s() {
        let mut prompter = prompter("\ns\nyes\n", false);
        assert!(prompter.confirm_merge("Heat.1995", "Heat (1995)").unwrap());
        assert!(!prompter.confirm_merge("Heat.1995.720p", "Heat (1995)").unwrap());
        assert!(prompter.confirm_merge("Heat 1995", "Heat (1995)").unwrap());
        let text = output(prompter);
        assert!(text.contains("Merge: Heat.1995 into Heat (1995)? (Enter=merge, 's'=skip): "));
        assert!(text.contains("Skipping merge for 'Heat.1995.720p'"));
    }

    #[test]
    fn media_type_question() {
        let mut prompter = prompter("y\nYes\nn\n\nmaybe\n", false);
        assert!(prompter.ask_is_tv().unwrap());
        assert!(prompter.ask_is_tv().unwrap());
        assert!(!prompter.ask_is_tv().unwrap());
        assert!(!prompter.ask_is_tv().unwrap());
        assert!(!prompter.ask_is_tv().unwrap());
    }

    #[test]
    fn force_mode_never_reads_input() {
        let mut prompter = prompter("s\ns\ny\n", true);
        assert!(prompter.is_forced());
        assert_eq!(
            prompter.confirm_rename("Heat.1995", "Heat (1995)").unwrap(),
            Some("Heat (1995)".to_string())
        );
        assert!(prompter.confirm_merge("Heat.1995.720p", "Heat (1995)").unwrap());
        assert!(!prompter.ask_is_tv().unwrap());
        assert_eq!(prompter.reader.position(), 0);

        let text = output(prompter);
        assert!(text.contains("Automatically renaming 'Heat.1995' to 'Heat (1995)'"));
        assert!(text.contains("Automatically merging 'Heat.1995.720p' into 'Heat (1995)'"));
        assert!(text.contains("Defaulting to MOVIE in forced mode"));
        assert!(!text.contains("(Enter=merge"));
    }
}
