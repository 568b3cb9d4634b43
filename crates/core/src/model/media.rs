use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Locator for a playable audio resource: a remote URL or a local file.
///
/// A step may legitimately carry no locator at all; that case is represented
/// by `Option<MediaUri>` at the call site and only becomes an error when
/// playback is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaUri {
    Url(Url),
    FilePath(PathBuf),
}

impl MediaUri {
    /// Parse a raw locator string.
    ///
    /// Empty or whitespace-only input yields `None`. Anything that does not
    /// parse as an absolute URL is treated as a file path.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(url) = Url::parse(s) {
            return Some(MediaUri::Url(url));
        }
        Some(MediaUri::FilePath(PathBuf::from(s)))
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            MediaUri::Url(u) => Some(u),
            MediaUri::FilePath(_) => None,
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            MediaUri::FilePath(p) => Some(p.as_path()),
            MediaUri::Url(_) => None,
        }
    }
}

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaUri::Url(u) => write!(f, "{u}"),
            MediaUri::FilePath(p) => write!(f, "{}", p.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_url() {
        let uri = MediaUri::parse("https://cdn.example.com/a.mp3").unwrap();
        assert!(uri.as_url().is_some());
    }

    #[test]
    fn bare_name_falls_back_to_file_path() {
        let uri = MediaUri::parse("clips/intro.mp3").unwrap();
        assert_eq!(uri.as_path(), Some(Path::new("clips/intro.mp3")));
    }

    #[test]
    fn blank_input_is_none() {
        assert!(MediaUri::parse("   ").is_none());
        assert!(MediaUri::parse("").is_none());
    }
}
