//! Heuristic classification of a media library as movies or TV shows.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;
use crate::prompt::Prompter;

static RE_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)season").expect("Failed to create regex pattern for season"));

static RE_SEASON_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^s\d+").expect("Failed to create regex pattern for short season"));

/// Kind of media library in the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Classify a library from keywords in its own directory name.
    ///
    /// ```rust
    /// use media_tidy::media_type::MediaType;
    ///
    /// assert_eq!(MediaType::from_directory_name("Movies"), Some(MediaType::Movie));
    /// assert_eq!(MediaType::from_directory_name("TV Shows"), Some(MediaType::Tv));
    /// assert_eq!(MediaType::from_directory_name("Downloads"), None);
    /// ```
    #[must_use]
    pub fn from_directory_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("movie") {
            Some(Self::Movie)
        } else if name.contains("tv") || name.contains("show") {
            Some(Self::Tv)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Tv => write!(f, "tv"),
        }
    }
}

/// Check if a name looks like a season folder: "Season 1", "Specials (season 0)" or "S01".
#[must_use]
pub fn is_season_name(name: &str) -> bool {
    RE_SEASON.is_match(name) || RE_SEASON_SHORT.is_match(name)
}

/// Detect the media type from the directory name and its contents.
///
/// Returns `None` if neither gives a clear answer.
///
/// # Errors
/// Returns an error if the target directory cannot be listed.
pub fn detect_media_type(target: &Path) -> Result<Option<MediaType>> {
    let base = crate::path_to_filename_string(target);
    if let Some(media_type) = MediaType::from_directory_name(&base) {
        return Ok(Some(media_type));
    }

    for folder in crate::sorted_subdirectories(target)? {
        let Ok(entries) = crate::sorted_dir_entries(&folder) else {
            continue;
        };
        if entries
            .iter()
            .any(|entry| is_season_name(&crate::path_to_filename_string(entry)))
        {
            return Ok(Some(MediaType::Tv));
        }
    }

    Ok(None)
}

/// Determine the media type, asking the operator when it cannot be detected.
///
/// A media type given in the config skips detection entirely.
/// Dryrun never prompts and defaults to movie like force mode.
///
/// # Errors
/// Returns an error if the target cannot be listed or prompting fails.
pub fn determine_media_type<R: BufRead, W: Write>(
    target: &Path,
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<MediaType> {
    if let Some(media_type) = config.media_type {
        return Ok(media_type);
    }
    if let Some(media_type) = detect_media_type(target)? {
        return Ok(media_type);
    }
    if config.dryrun {
        println!("Media type undetermined. Defaulting to MOVIE in dryrun mode.");
        return Ok(MediaType::Movie);
    }
    if prompter.ask_is_tv()? {
        Ok(MediaType::Tv)
    } else {
        Ok(MediaType::Movie)
    }
}

#[cfg(test)]
mod media_type_tests {
    use super::*;

    use std::fs;
    use std::io::Cursor;

    use tempfile::TempDir;

    fn prompter(input: &str, force: bool) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), force)
    }

    #[test]
    fn directory_name_keywords() {
        assert_eq!(MediaType::from_directory_name("movies"), Some(MediaType::Movie));
        assert_eq!(MediaType::from_directory_name("My Movie Collection"), Some(MediaType::Movie));
        assert_eq!(MediaType::from_directory_name("TV"), Some(MediaType::Tv));
        assert_eq!(MediaType::from_directory_name("Shows"), Some(MediaType::Tv));
        assert_eq!(MediaType::from_directory_name("media"), None);
    }

    #[test]
    fn movie_keyword_takes_precedence() {
        assert_eq!(MediaType::from_directory_name("TV Movies"), Some(MediaType::Movie));
    }

    #[test]
    fn season_names() {
        assert!(is_season_name("Season 1"));
        assert!(is_season_name("SEASON.02"));
        assert!(is_season_name("Specials season 0"));
        assert!(is_season_name("S01"));
        assert!(is_season_name("s2 extras"));
        assert!(!is_season_name("Subs"));
        assert!(!is_season_name("Extras S01"));
        assert!(!is_season_name("Sample"));
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(MediaType::Movie.to_string(), "movie");
        assert_eq!(MediaType::Tv.to_string(), "tv");
    }

    #[test]
    fn detects_tv_from_season_folders() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        fs::create_dir_all(root.join("Some Show/Season 1")).unwrap();
        fs::create_dir_all(root.join("Other Film")).unwrap();
        assert_eq!(detect_media_type(&root).unwrap(), Some(MediaType::Tv));
    }

    #[test]
    fn season_like_file_also_counts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        fs::create_dir_all(root.join("Some Show")).unwrap();
        fs::write(root.join("Some Show/S01E01.mkv"), "episode").unwrap();
        assert_eq!(detect_media_type(&root).unwrap(), Some(MediaType::Tv));
    }

    #[test]
    fn undetermined_without_keywords_or_seasons() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        fs::create_dir_all(root.join("Heat (1995)")).unwrap();
        fs::write(root.join("Heat (1995)/Heat.mkv"), "movie").unwrap();
        assert_eq!(detect_media_type(&root).unwrap(), None);
    }

    #[test]
    fn directory_name_wins_over_contents() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("movies");
        fs::create_dir_all(root.join("Some Show/Season 1")).unwrap();
        assert_eq!(detect_media_type(&root).unwrap(), Some(MediaType::Movie));
    }

    #[test]
    fn undetermined_asks_operator() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        fs::create_dir_all(&root).unwrap();
        let config = Config::default();

        let mut yes = prompter("y\n", false);
        assert_eq!(determine_media_type(&root, &config, &mut yes).unwrap(), MediaType::Tv);

        let mut no = prompter("n\n", false);
        assert_eq!(determine_media_type(&root, &config, &mut no).unwrap(), MediaType::Movie);
    }

    #[test]
    fn undetermined_defaults_to_movie_when_forced() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        fs::create_dir_all(&root).unwrap();
        let mut forced = prompter("y\n", true);
        assert_eq!(
            determine_media_type(&root, &Config::forced(), &mut forced).unwrap(),
            MediaType::Movie
        );
    }

    #[test]
    fn undetermined_defaults_to_movie_in_dryrun_without_prompting() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        fs::create_dir_all(root.join("Heat.1995")).unwrap();
        let config = Config {
            dryrun: true,
            ..Config::default()
        };

        let mut prompter = prompter("y\n", false);
        assert_eq!(determine_media_type(&root, &config, &mut prompter).unwrap(), MediaType::Movie);
        assert!(prompter.into_writer().is_empty());
    }

    #[test]
    fn configured_media_type_skips_detection() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("movies");
        fs::create_dir_all(&root).unwrap();
        let config = Config {
            media_type: Some(MediaType::Tv),
            ..Config::default()
        };
        let mut prompter = prompter("", false);
        assert_eq!(determine_media_type(&root, &config, &mut prompter).unwrap(), MediaType::Tv);
    }
}
