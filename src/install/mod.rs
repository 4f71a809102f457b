pub mod batch;
pub mod fetcher;
pub mod lpadmin;
pub mod queue;
pub mod resolver;
pub mod subscription;

#[cfg(test)]
pub mod testing;

pub use batch::{Batch, BatchEvent, BatchResult, InstallOutcome, InstallPolicy, Installer};
pub use lpadmin::LpAdmin;
