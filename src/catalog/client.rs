use crate::error::LoadError;

use super::types::PrinterConfig;

/// Fetch and parse the printer configuration.
///
/// The whole body is parsed before anything is returned, so callers only ever
/// see a complete configuration or an error.
pub async fn fetch_config(
    client: &reqwest::Client,
    config_url: &str,
) -> Result<PrinterConfig, LoadError> {
    tracing::debug!("Fetching printer configuration from {config_url}");

    let resp = client
        .get(config_url)
        .send()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| LoadError::Network(format!("failed to read response: {e}")))?;

    let config: PrinterConfig =
        serde_json::from_slice(&body).map_err(|e| LoadError::Parse(e.to_string()))?;

    tracing::info!(
        "Loaded configuration: {} location(s), {} model(s)",
        config.locations.len(),
        config.printer_models.len()
    );

    Ok(config)
}
