use crate::error::WtError;
use std::ffi::OsStr;
use std::path::Path;

/// Maps worktree names to sibling directory names (`repo@name`) and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NameCodec {
    delimiter: String,
}

impl NameCodec {
    pub(crate) fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub(crate) fn encode(&self, project_basename: &str, name: &str) -> String {
        format!("{project_basename}{}{name}", self.delimiter)
    }

    /// Returns the worktree name for a sibling directory, or `None` when the
    /// directory does not carry this project's prefix.
    pub(crate) fn decode(&self, dir_basename: &str, project_basename: &str) -> Option<String> {
        let name = dir_basename
            .strip_prefix(project_basename)?
            .strip_prefix(self.delimiter.as_str())?;
        if name.is_empty() {
            return None;
        }
        Some(name.to_string())
    }
}

pub(crate) fn validate_worktree_name(name: &str) -> Result<(), WtError> {
    let invalid = |reason| {
        Err(WtError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("name must not be empty");
    }
    if name == "." || name == ".." {
        return invalid("name must not be a relative directory marker");
    }
    if name.contains('/') || name.contains('\\') {
        return invalid("path separators are not allowed");
    }
    let path = Path::new(name);
    if path.is_absolute() || path.file_name() != Some(OsStr::new(name)) {
        return invalid("name must be a plain directory name");
    }
    Ok(())
}
