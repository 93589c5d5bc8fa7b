//! Deciding which worktree a command's arguments refer to.
//!
//! Commands are shaped `[worktree-ref] [payload...]`. A leading token counts as
//! a worktree reference only when it is `.` or exactly names a registered
//! worktree, so a payload whose first word happens to equal a worktree name is
//! taken as that worktree. Users avoid this by naming the worktree (or `.`)
//! explicitly before the payload.

use crate::constants::CURRENT_WORKTREE_MARKER;
use crate::error::WtError;
use crate::git::Vcs;
use crate::locator::{WorktreeLocator, paths_equal};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorktreeArgs {
    pub(crate) name: String,
    pub(crate) payload: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkspaceFolder {
    pub(crate) path: PathBuf,
    pub(crate) payload: Vec<String>,
}

impl<V: Vcs> WorktreeLocator<V> {
    pub(crate) fn split_worktree_args(&self, args: &[String]) -> Result<WorktreeArgs, WtError> {
        let Some((first, rest)) = args.split_first() else {
            return Ok(WorktreeArgs {
                name: self.current_worktree_name()?,
                payload: Vec::new(),
            });
        };

        if first == CURRENT_WORKTREE_MARKER {
            return Ok(WorktreeArgs {
                name: self.current_worktree_name()?,
                payload: rest.to_vec(),
            });
        }

        let known = self.enumerate("").unwrap_or_else(|err| {
            log::debug!("could not list worktrees: {err}");
            Vec::new()
        });
        if known.iter().any(|name| name == first) {
            return Ok(WorktreeArgs {
                name: first.clone(),
                payload: rest.to_vec(),
            });
        }

        Ok(WorktreeArgs {
            name: self.current_worktree_name()?,
            payload: args.to_vec(),
        })
    }

    /// Like [`Self::split_worktree_args`], but from the primary checkout an
    /// unqualified command targets the project root itself.
    pub(crate) fn resolve_workspace_folder(
        &self,
        args: &[String],
    ) -> Result<WorkspaceFolder, WtError> {
        let err = match self.split_worktree_args(args) {
            Ok(WorktreeArgs { name, payload }) => {
                return Ok(WorkspaceFolder {
                    path: self.resolve_path(&name)?,
                    payload,
                });
            }
            Err(err) => err,
        };

        let Ok(project_root) = self.project_root() else {
            return Err(err);
        };
        match self.current_worktree_root() {
            Ok(current_root) if paths_equal(&current_root, &project_root) => {
                Ok(WorkspaceFolder {
                    path: project_root,
                    payload: args.to_vec(),
                })
            }
            _ => Err(err),
        }
    }
}
