use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::{Printer, PrinterConfig};
use crate::error::LoadError;

/// What the operator is looking at: the loaded configuration, the chosen
/// location and the checked rows.
///
/// The configuration is only ever replaced as a whole; batches get their own
/// `Arc` snapshot and owned printer copies, so a refresh never reaches a
/// running installation.
#[derive(Debug, Default)]
pub struct Session {
    config: Option<Arc<PrinterConfig>>,
    location: Option<String>,
    checked: BTreeSet<usize>,
}

impl Session {
    /// Swap in a freshly loaded configuration.
    ///
    /// Keeps the current location if it still exists, otherwise picks the first one.
    pub fn replace_config(&mut self, config: PrinterConfig) {
        let locations = config.location_names();
        let keep = self
            .location
            .as_ref()
            .is_some_and(|current| locations.contains(current));
        if !keep {
            self.location = locations.into_iter().next();
        }
        self.config = Some(Arc::new(config));
        self.checked.clear();
    }

    /// Apply the result of a configuration load. A failed load changes nothing.
    pub fn apply_load(&mut self, result: Result<PrinterConfig, LoadError>) -> Result<(), LoadError> {
        self.replace_config(result?);
        Ok(())
    }

    pub fn config(&self) -> Option<Arc<PrinterConfig>> {
        self.config.clone()
    }

    pub fn locations(&self) -> Vec<String> {
        self.config
            .as_ref()
            .map(|c| c.location_names())
            .unwrap_or_default()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn select_location(&mut self, location: String) {
        if self.location.as_ref() != Some(&location) {
            self.checked.clear();
        }
        self.location = Some(location);
    }

    /// Printers at the chosen location.
    pub fn printers(&self) -> &[Printer] {
        match (&self.config, &self.location) {
            (Some(config), Some(location)) => config.printers_at(location),
            _ => &[],
        }
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.contains(&index)
    }

    pub fn set_checked(&mut self, index: usize, checked: bool) {
        if checked && index < self.printers().len() {
            self.checked.insert(index);
        } else {
            self.checked.remove(&index);
        }
    }

    pub fn check_all(&mut self) {
        self.checked = (0..self.printers().len()).collect();
    }

    pub fn clear_checked(&mut self) {
        self.checked.clear();
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Owned copies of the checked printers, in list order.
    pub fn selected_printers(&self) -> Vec<Printer> {
        let printers = self.printers();
        self.checked
            .iter()
            .filter_map(|&i| printers.get(i).cloned())
            .collect()
    }
}
