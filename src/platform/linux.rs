use std::process::Command;

/// Groups CUPS accepts for administrative requests on common distributions.
const ADMIN_GROUPS: &[&str] = &["lpadmin", "sys", "wheel", "root"];

pub fn check_admin_rights() -> Vec<String> {
    let mut warnings = Vec::new();

    if let Ok(output) = Command::new("id").arg("-u").output() {
        if String::from_utf8_lossy(&output.stdout).trim() == "0" {
            return warnings;
        }
    }

    if let Ok(output) = Command::new("groups").output() {
        let groups = String::from_utf8_lossy(&output.stdout);
        if !in_admin_group(&groups) {
            warnings.push(
                "Linux: Current user is not in the 'lpadmin' group. \
                 Adding printers may be refused by CUPS."
                    .to_string(),
            );
        }
    }

    warnings
}

fn in_admin_group(groups: &str) -> bool {
    groups
        .split_whitespace()
        .any(|g| ADMIN_GROUPS.contains(&g))
}
