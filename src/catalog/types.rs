use std::collections::HashMap;

use serde::Deserialize;

/// Printers per location plus the model → driver mapping, as served by the
/// configuration endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrinterConfig {
    pub locations: HashMap<String, Vec<Printer>>,
    pub printer_models: HashMap<String, ModelInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Printer {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub ppd: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub ppd_url: Option<String>,
}

impl PrinterConfig {
    /// Location names in display order.
    pub fn location_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn printers_at(&self, location: &str) -> &[Printer] {
        self.locations
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Printer {
    /// The explicit connection URI, if one is configured. Empty strings count as absent.
    pub fn explicit_uri(&self) -> Option<&str> {
        non_empty(self.uri.as_deref())
    }

    pub fn address(&self) -> Option<&str> {
        non_empty(self.ip.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
