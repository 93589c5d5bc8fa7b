use crate::constants::CURRENT_WORKTREE_MARKER;
use crate::error::WtError;
use crate::git::{Vcs, project_root_from_common_dir};
use crate::naming::{NameCodec, validate_worktree_name};
use std::path::{Path, PathBuf};

/// Finds the project root and its sibling worktrees.
///
/// Every query goes back to the VCS; nothing is cached because the worktree
/// registry can change between two calls.
pub(crate) struct WorktreeLocator<V> {
    vcs: V,
    codec: NameCodec,
}

impl<V: Vcs> WorktreeLocator<V> {
    pub(crate) fn new(vcs: V, codec: NameCodec) -> Self {
        Self { vcs, codec }
    }

    pub(crate) fn vcs(&self) -> &V {
        &self.vcs
    }

    pub(crate) fn project_root(&self) -> Result<PathBuf, WtError> {
        let common_dir = self.vcs.common_dir()?;
        project_root_from_common_dir(&common_dir).ok_or(WtError::NotARepository)
    }

    pub(crate) fn current_worktree_root(&self) -> Result<PathBuf, WtError> {
        self.vcs.show_toplevel()
    }

    pub(crate) fn current_worktree_name(&self) -> Result<String, WtError> {
        let current_root = self.current_worktree_root()?;
        let project_root = self.project_root()?;
        if paths_equal(&current_root, &project_root) {
            return Err(WtError::NotInNamedWorktree {
                reason: "currently in the main worktree, not a named worktree",
                root: current_root,
            });
        }
        let project_basename = basename(&project_root).ok_or(WtError::NotARepository)?;
        match basename(&current_root).and_then(|dir| self.codec.decode(&dir, &project_basename)) {
            Some(name) => Ok(name),
            None => Err(WtError::NotInNamedWorktree {
                reason: "current directory is not in a recognized worktree",
                root: current_root,
            }),
        }
    }

    /// Names of registered sibling worktrees starting with `prefix`, in the
    /// order git lists them.
    pub(crate) fn enumerate(&self, prefix: &str) -> Result<Vec<String>, WtError> {
        let project_root = self.project_root()?;
        let Some(parent_dir) = project_root.parent() else {
            return Ok(Vec::new());
        };
        let Some(project_basename) = basename(&project_root) else {
            return Ok(Vec::new());
        };

        let mut names = Vec::new();
        for path in self.vcs.list_worktrees()? {
            if paths_equal(&path, &project_root) {
                continue;
            }
            if !path
                .parent()
                .is_some_and(|parent| paths_equal(parent, parent_dir))
            {
                continue;
            }
            if let Some(name) =
                basename(&path).and_then(|dir| self.codec.decode(&dir, &project_basename))
                && name.starts_with(prefix)
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Path a worktree with this name has (or would have). Existence is not
    /// checked.
    pub(crate) fn resolve_path(&self, name: &str) -> Result<PathBuf, WtError> {
        validate_worktree_name(name)?;
        let project_root = self.project_root()?;
        let parent_dir = project_root.parent().ok_or(WtError::NotARepository)?;
        let project_basename = basename(&project_root).ok_or(WtError::NotARepository)?;
        Ok(parent_dir.join(self.codec.encode(&project_basename, name)))
    }

    /// Resolves an explicit name argument, where `.` means the current
    /// worktree.
    pub(crate) fn resolve_name_arg(&self, name: &str) -> Result<String, WtError> {
        if name == CURRENT_WORKTREE_MARKER {
            return self.current_worktree_name();
        }
        validate_worktree_name(name)?;
        Ok(name.to_string())
    }
}

pub(crate) fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|value| value.to_string_lossy().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn paths_equal(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
