use std::path::Path;

use async_trait::async_trait;

use crate::catalog::Printer;
use crate::error::InstallError;

/// Longest queue name CUPS accepts.
const MAX_QUEUE_NAME: usize = 127;

/// Characters the printing subsystem refuses in queue names.
const FORBIDDEN_QUEUE_CHARS: &[char] = &[' ', '\t', '/', '\\', '\'', '"', ',', '#'];

/// Everything needed to create one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec<'a> {
    pub name: &'a str,
    pub uri: &'a str,
    pub driver: &'a Path,
    pub description: &'a str,
}

/// The system printer administration commands.
#[async_trait]
pub trait QueueAdmin: Send + Sync {
    /// Whether a queue called `name` is currently configured.
    async fn exists(&self, name: &str) -> bool;

    async fn remove(&self, name: &str) -> Result<(), InstallError>;

    /// Create and enable a queue.
    async fn create(&self, queue: &QueueSpec<'_>) -> Result<(), InstallError>;
}

pub fn validate_queue_name(name: &str) -> Result<(), InstallError> {
    let invalid = |reason: &str| InstallError::InvalidQueueName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_QUEUE_NAME {
        return Err(invalid("name is longer than 127 bytes"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_QUEUE_CHARS.contains(c)) {
        return Err(invalid(&format!("contains forbidden character {c:?}")));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("contains control characters"));
    }
    Ok(())
}

/// The printer's explicit URI, or an IPP Everywhere endpoint on its address.
pub fn connection_uri(printer: &Printer) -> Result<String, InstallError> {
    if let Some(uri) = printer.explicit_uri() {
        return Ok(uri.to_string());
    }
    printer
        .address()
        .map(|ip| format!("ipp://{ip}/ipp/print"))
        .ok_or(InstallError::MissingAddress)
}

pub fn description(printer: &Printer) -> String {
    format!("{} ({})", printer.name, printer.model)
}

/// Replace any queue with the printer's name by a fresh one using `driver`.
pub async fn install_queue(
    admin: &dyn QueueAdmin,
    printer: &Printer,
    uri: &str,
    driver: &Path,
) -> Result<(), InstallError> {
    if admin.exists(&printer.name).await {
        tracing::debug!("Queue {} already exists, removing it first", printer.name);
        if let Err(e) = admin.remove(&printer.name).await {
            tracing::warn!("Could not remove existing queue {}: {e}", printer.name);
        }
    }

    let description = description(printer);
    admin
        .create(&QueueSpec {
            name: &printer.name,
            uri,
            driver,
            description: &description,
        })
        .await
}
