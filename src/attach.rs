use crate::constants::{ATTACHED_CONTAINER_HANDLER, ATTACHED_CONTAINER_SCHEME};
use crate::error::WtError;
use crate::process::{path_to_str, run_tee};
use serde::Deserialize;
use std::path::Path;

/// The devcontainer CLI's "bring up" operation.
pub(crate) trait Devcontainer {
    /// Starts (or reuses) the environment for `workspace_folder` and returns
    /// its stdout transcript.
    fn bring_up(&self, workspace_folder: &Path) -> Result<String, WtError>;
}

#[derive(Debug, Clone)]
pub(crate) struct DevcontainerCli {
    bin: String,
}

impl DevcontainerCli {
    pub(crate) fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub(crate) fn bin(&self) -> &str {
        &self.bin
    }

    pub(crate) fn available(&self) -> bool {
        which::which(&self.bin).is_ok()
    }
}

impl Devcontainer for DevcontainerCli {
    fn bring_up(&self, workspace_folder: &Path) -> Result<String, WtError> {
        let folder =
            path_to_str(workspace_folder).map_err(|err| WtError::tool(&self.bin, err.to_string()))?;
        let output = run_tee(&self.bin, &["up", "--workspace-folder", folder], None)
            .map_err(|err| WtError::tool(&self.bin, format!("{err:#}")))?;
        if !output.status.success() {
            return Err(WtError::tool(
                &self.bin,
                format!("devcontainer up exited with status {}", output.status),
            ));
        }
        Ok(output.stdout)
    }
}

/// What `devcontainer up` reports about the container it attached to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDescriptor {
    pub(crate) container_id: String,
    pub(crate) remote_workspace_folder: String,
}

/// Last line of the transcript that looks like a JSON object. Progress lines
/// are interleaved with the summary, and earlier JSON lines may be partial.
pub(crate) fn last_json_line(transcript: &str) -> Option<&str> {
    transcript
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| line.starts_with('{'))
}

pub(crate) fn parse_up_transcript(transcript: &str) -> Result<SessionDescriptor, WtError> {
    let line = last_json_line(transcript).ok_or(WtError::NoStructuredOutput)?;
    serde_json::from_str(line).map_err(|source| WtError::MalformedSessionOutput {
        line: line.to_string(),
        source,
    })
}

/// Editor URI for attaching to a running container. The id is hex encoded
/// because it is used as part of the URI authority.
pub(crate) fn attached_container_uri(session: &SessionDescriptor) -> String {
    format!(
        "{ATTACHED_CONTAINER_SCHEME}://{ATTACHED_CONTAINER_HANDLER}+{}{}",
        hex::encode(session.container_id.as_bytes()),
        session.remote_workspace_folder
    )
}

pub(crate) fn discover_session<D: Devcontainer>(
    devcontainer: &D,
    workspace_folder: &Path,
) -> Result<SessionDescriptor, WtError> {
    let transcript = devcontainer.bring_up(workspace_folder)?;
    parse_up_transcript(&transcript)
}
