use std::path::{Path, PathBuf};

use iced::window::{icon, Icon};

const ICON_FILE: &str = "printer_icon.png";

/// Window icon from next to the executable, the working directory or `assets/`.
pub fn load_window_icon() -> Option<Icon> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    let icon = first_icon(icon_candidates(exe_dir.as_deref()));
    if icon.is_none() {
        tracing::debug!("No {ICON_FILE} found; using the default window icon");
    }
    icon
}

fn icon_candidates(exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = exe_dir.map(|dir| dir.join(ICON_FILE)).into_iter().collect();
    candidates.push(PathBuf::from(ICON_FILE));
    candidates.push(Path::new("assets").join(ICON_FILE));
    candidates
}

fn first_icon(candidates: Vec<PathBuf>) -> Option<Icon> {
    candidates
        .into_iter()
        .filter(|path| path.is_file())
        .find_map(|path| match icon::from_file(&path) {
            Ok(icon) => {
                tracing::info!("Using window icon {}", path.display());
                Some(icon)
            }
            Err(e) => {
                tracing::warn!("Could not load window icon {}: {e}", path.display());
                None
            }
        })
}
