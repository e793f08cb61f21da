//! CLI command implementations.

pub(crate) mod baseline;
pub(crate) mod convert;

pub(crate) use baseline::BaselineArgs;
pub(crate) use convert::ConvertArgs;

use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::CliError;

/// Read markdown from `input`, or from stdin when it is missing or `-`.
pub(crate) fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    match as_file(input) {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut markdown = String::new();
            io::stdin().read_to_string(&mut markdown)?;
            Ok(markdown)
        }
    }
}

/// Write `content` to `output`, or to stdout when it is missing or `-`.
pub(crate) fn write_output(output: Option<&Path>, content: &str) -> Result<(), CliError> {
    match as_file(output) {
        Some(path) => std::fs::write(path, content).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// `path` unless it is missing or names a standard stream.
pub(crate) fn as_file(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| *p != Path::new("-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.md");
        let output = dir.path().join("out.html");
        std::fs::write(&input, "# Title").unwrap();

        let markdown = read_input(Some(&input)).unwrap();
        write_output(Some(&output), &markdown).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "# Title");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(Some(&dir.path().join("missing.md"))).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_as_file() {
        assert_eq!(as_file(Some(Path::new("a.html"))), Some(Path::new("a.html")));
        assert_eq!(as_file(Some(Path::new("-"))), None);
        assert_eq!(as_file(None), None);
    }
}
