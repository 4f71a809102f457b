use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
mod linux;

/// Problems that would make every installation fail, worth telling the operator up front.
///
/// Runs `id`/`groups` on Linux, so call it off the UI thread.
pub fn check_prerequisites(lpstat: &str, lpadmin: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    let path_var = std::env::var_os("PATH");

    for tool in [lpstat, lpadmin] {
        match find_program(tool, path_var.as_deref()) {
            Some(path) => tracing::debug!("Found {tool} at {}", path.display()),
            None => warnings.push(format!(
                "'{tool}' was not found. Install the CUPS client tools to add printers."
            )),
        }
    }

    #[cfg(target_os = "linux")]
    {
        warnings.extend(linux::check_admin_rights());
    }

    warnings
}

/// Resolve `program` the way a shell would, without running it.
///
/// Names containing a path separator are checked as given; bare names are
/// searched in `path_var`.
fn find_program(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let program_path = Path::new(program);
    if program_path.components().count() > 1 {
        return is_executable(program_path).then(|| program_path.to_path_buf());
    }

    std::env::split_paths(path_var?)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
