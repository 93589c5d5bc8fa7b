use crate::error::WtError;
use crate::process::{best_error_line, run_capture, run_stream};
use anyhow::Result;

/// The container runtime queries session discovery relies on. Implementations
/// return the runtime's raw output; parsing lives in [`crate::session`].
pub(crate) trait ContainerRuntime {
    /// Identifiers of containers carrying `label`, one per line.
    fn find_by_label(&self, label: &str, include_stopped: bool) -> Result<String, WtError>;
    /// `host:port` lines published for `internal_port`, or `None` when the
    /// runtime reports no mapping.
    fn published_port(
        &self,
        container_id: &str,
        internal_port: u16,
    ) -> Result<Option<String>, WtError>;
}

#[derive(Debug, Clone)]
pub(crate) struct DockerCli {
    bin: String,
}

impl DockerCli {
    pub(crate) fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub(crate) fn remove(&self, container_id: &str) -> Result<()> {
        run_stream(&self.bin, &["rm", "-f", container_id], None)
    }
}

impl ContainerRuntime for DockerCli {
    fn find_by_label(&self, label: &str, include_stopped: bool) -> Result<String, WtError> {
        let filter = format!("label={label}");
        let list_flag = if include_stopped { "-aq" } else { "-q" };
        let output = run_capture(&self.bin, &["ps", list_flag, "--filter", &filter], None)
            .map_err(|err| WtError::tool(&self.bin, format!("failed to query docker: {err:#}")))?;
        if !output.status.success() {
            return Err(WtError::tool(
                &self.bin,
                format!("failed to query docker: {}", best_error_line(&output.stderr)),
            ));
        }
        Ok(output.stdout)
    }

    fn published_port(
        &self,
        container_id: &str,
        internal_port: u16,
    ) -> Result<Option<String>, WtError> {
        let port = internal_port.to_string();
        let output = run_capture(&self.bin, &["port", container_id, &port], None)
            .map_err(|err| WtError::tool(&self.bin, format!("{err:#}")))?;
        if !output.status.success() {
            log::debug!(
                "docker port {container_id} {port}: {}",
                best_error_line(&output.stderr)
            );
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}
