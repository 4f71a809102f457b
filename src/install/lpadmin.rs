use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::InstallError;

use super::queue::{QueueAdmin, QueueSpec};

/// Queue administration through the CUPS `lpstat` and `lpadmin` tools.
#[derive(Debug, Clone)]
pub struct LpAdmin {
    lpstat: String,
    lpadmin: String,
}

impl LpAdmin {
    pub fn new(lpstat: impl Into<String>, lpadmin: impl Into<String>) -> Self {
        Self {
            lpstat: lpstat.into(),
            lpadmin: lpadmin.into(),
        }
    }

    async fn run_lpadmin(&self, args: &[&str]) -> Result<(), InstallError> {
        tracing::debug!("Running {} {}", self.lpadmin, args.join(" "));

        let output = Command::new(&self.lpadmin)
            .args(args)
            .output()
            .await
            .map_err(|e| InstallError::Command(format!("failed to run {}: {e}", self.lpadmin)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(InstallError::Command(failure_text(&output)))
        }
    }
}

impl Default for LpAdmin {
    fn default() -> Self {
        Self::new("lpstat", "lpadmin")
    }
}

#[async_trait]
impl QueueAdmin for LpAdmin {
    async fn exists(&self, name: &str) -> bool {
        match Command::new(&self.lpstat).args(["-p", name]).output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::debug!("{} not available: {e}", self.lpstat);
                false
            }
        }
    }

    async fn remove(&self, name: &str) -> Result<(), InstallError> {
        self.run_lpadmin(&["-x", name]).await
    }

    async fn create(&self, queue: &QueueSpec<'_>) -> Result<(), InstallError> {
        let driver = queue.driver.to_string_lossy();
        self.run_lpadmin(&[
            "-p",
            queue.name,
            "-v",
            queue.uri,
            "-P",
            &*driver,
            "-E",
            "-D",
            queue.description,
        ])
        .await
    }
}

/// Combined stdout and stderr of a failed command, or a fixed fallback.
fn failure_text(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let text = text.trim();
    if text.is_empty() {
        "unknown error".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::path::Path;
    use std::process::ExitStatus;

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn failure_text_combines_streams() {
        let out = output(1, "warning\n", "lpadmin: Bad device-uri\n");
        assert_eq!(failure_text(&out), "warning\nlpadmin: Bad device-uri");
    }

    #[test]
    fn empty_output_is_unknown_error() {
        assert_eq!(failure_text(&output(1, "", "  \n")), "unknown error");
    }

    #[tokio::test]
    async fn exit_status_decides_success() {
        let admin = LpAdmin::new("true", "false");
        assert!(admin.exists("anything").await);

        let err = admin.remove("anything").await.unwrap_err();
        assert_eq!(err, InstallError::Command("unknown error".into()));
    }

    #[tokio::test]
    async fn create_passes_queue_arguments() {
        // `echo` succeeds, so a clean exit means the arguments were accepted.
        let admin = LpAdmin::new("false", "echo");
        assert!(!admin.exists("A").await);

        let spec = QueueSpec {
            name: "A",
            uri: "ipp://10.0.0.1/ipp/print",
            driver: Path::new("/tmp/a.ppd"),
            description: "A (M1)",
        };
        admin.create(&spec).await.unwrap();
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let admin = LpAdmin::new("/nonexistent/lpstat", "/nonexistent/lpadmin");
        assert!(!admin.exists("A").await);

        let err = admin.remove("A").await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lpadmin"), "{err}");
    }
}
