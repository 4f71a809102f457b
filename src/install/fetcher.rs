use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use url::Url;

use crate::error::InstallError;

/// A downloaded driver staged in a temp file. The file is removed when this is dropped.
#[derive(Debug)]
pub struct DriverFile {
    file: NamedTempFile,
}

impl DriverFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Download the driver at `url` into a fresh temp file.
pub async fn fetch_driver(client: &reqwest::Client, url: &Url) -> Result<DriverFile, InstallError> {
    let local_io = |e: std::io::Error| InstallError::LocalIo {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let network = |e: reqwest::Error| InstallError::Network {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let mut file = tempfile::Builder::new()
        .prefix("printer-")
        .suffix(".ppd")
        .tempfile()
        .map_err(local_io)?;

    tracing::debug!("Downloading driver {url} to {}", file.path().display());

    let mut resp = client.get(url.clone()).send().await.map_err(network)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(InstallError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut written = 0usize;
    while let Some(chunk) = resp.chunk().await.map_err(network)? {
        file.write_all(&chunk).map_err(local_io)?;
        written += chunk.len();
    }
    file.flush().map_err(local_io)?;

    tracing::debug!("Driver saved ({written} bytes)");

    Ok(DriverFile { file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, unreachable_url};
    use axum::{
        http::{StatusCode, Uri},
        routing::get,
        Router,
    };

    const PPD: &str = "*PPD-Adobe: \"4.3\"\n*ModelName: \"Test\"\n";

    #[tokio::test]
    async fn downloads_body_verbatim() {
        let addr = serve(Router::new().route("/a.ppd", get(|| async { PPD }))).await;
        let client = reqwest::Client::new();
        let url = Url::parse(&format!("http://{addr}/a.ppd")).unwrap();

        let driver = fetch_driver(&client, &url).await.unwrap();
        let saved = std::fs::read_to_string(driver.path()).unwrap();
        assert_eq!(saved, PPD);
        assert!(driver
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("printer-") && n.ends_with(".ppd")));
    }

    #[tokio::test]
    async fn temp_file_is_removed_on_drop() {
        let addr = serve(Router::new().route("/a.ppd", get(|| async { PPD }))).await;
        let client = reqwest::Client::new();
        let url = Url::parse(&format!("http://{addr}/a.ppd")).unwrap();

        let driver = fetch_driver(&client, &url).await.unwrap();
        let path = driver.path().to_path_buf();
        assert!(path.exists());

        drop(driver);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn request_targets_encoded_filename() {
        // Echo the raw request path back as the driver content.
        let addr = serve(Router::new().fallback(|uri: Uri| async move { uri.path().to_string() })).await;
        let client = reqwest::Client::new();
        let raw = format!("http://{addr}/drivers/HP LaserJet.ppd");
        let url = Url::parse(&crate::install::resolver::encode_last_segment(&raw)).unwrap();

        let driver = fetch_driver(&client, &url).await.unwrap();
        let requested = std::fs::read_to_string(driver.path()).unwrap();
        assert_eq!(requested, "/drivers/HP%20LaserJet.ppd");
    }

    #[tokio::test]
    async fn http_error_includes_url() {
        let addr = serve(Router::new().route(
            "/missing.ppd",
            get(|| async { (StatusCode::NOT_FOUND, "no") }),
        ))
        .await;
        let client = reqwest::Client::new();
        let url = Url::parse(&format!("http://{addr}/missing.ppd")).unwrap();

        let err = fetch_driver(&client, &url).await.unwrap_err();
        assert_eq!(
            err,
            InstallError::HttpStatus {
                url: url.to_string(),
                status: 404
            }
        );
        assert!(err.to_string().contains("/missing.ppd"));
    }

    #[tokio::test]
    async fn network_error_includes_url() {
        let client = reqwest::Client::new();
        let url = Url::parse(&unreachable_url("/a.ppd").await).unwrap();

        let err = fetch_driver(&client, &url).await.unwrap_err();
        match &err {
            InstallError::Network { url: failed, .. } => assert_eq!(failed, url.as_str()),
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
