use std::path::{Path, PathBuf};
use std::process::Command;

/// Family names that identify a Kai (brush script) CJK font, preferred when present.
const KAI_KEYWORDS: &[&str] = &["KaiTi", "楷体", "Kai", "UKai", "AR PL UKai", "KAITI"];

/// Fallback CJK font locations, checked in order.
const WELL_KNOWN_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJKsc-Regular.otf",
    "/usr/share/fonts/truetype/noto-cjk/NotoSansCJKsc-Regular.otf",
    "/usr/share/fonts/noto-cjk/NotoSansCJKsc-Regular.otf",
    "/usr/share/fonts/truetype/ukui/ukui-default.ttf",
    "/usr/share/fonts/ukui/ukui-default.ttf",
    "/usr/share/fonts/truetype/kylin-font/kylin-font.ttf",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttf",
    "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttf",
    "/usr/share/fonts/truetype/arphic/uming.ttf",
    "/usr/share/fonts/truetype/arphic/ukai.ttf",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// Set through `PRINTER_INSTALLER_FONT`.
    Explicit(PathBuf),
    /// Reported by `fc-list`.
    FontConfig(PathBuf),
    WellKnown(PathBuf),
}

impl FontSource {
    pub fn path(&self) -> &Path {
        match self {
            FontSource::Explicit(p) | FontSource::FontConfig(p) | FontSource::WellKnown(p) => p,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub source: FontSource,
    pub bytes: Vec<u8>,
}

/// Find a font able to render Chinese text, or `None` to use the toolkit default.
pub fn discover_font(explicit: Option<&str>) -> Option<ResolvedFont> {
    let fc_list = list_system_fonts();
    let candidates = font_candidates(explicit, fc_list.as_deref());
    let resolved = first_readable(candidates, |path| std::fs::read(path).ok());

    match &resolved {
        Some(font) => tracing::info!(
            "Using font {} ({:?}, {} bytes)",
            font.source.path().display(),
            font.source,
            font.bytes.len()
        ),
        None => tracing::warn!("No CJK font found; install fonts-noto-cjk for Chinese text"),
    }
    resolved
}

/// Font files to try, highest priority first.
pub fn font_candidates(explicit: Option<&str>, fc_list: Option<&str>) -> Vec<FontSource> {
    let mut candidates = Vec::new();

    if let Some(path) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        candidates.push(FontSource::Explicit(PathBuf::from(path)));
    }

    if let Some(output) = fc_list {
        let entries: Vec<(&str, &str)> = output.lines().filter_map(parse_fc_line).collect();
        let (kai, other): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|(_, families)| KAI_KEYWORDS.iter().any(|k| families.contains(k)));
        candidates.extend(
            kai.into_iter()
                .chain(other)
                .map(|(path, _)| FontSource::FontConfig(PathBuf::from(path))),
        );
    }

    candidates.extend(
        WELL_KNOWN_FONTS
            .iter()
            .filter(|path| !is_collection(path))
            .map(|path| FontSource::WellKnown(PathBuf::from(path))),
    );

    candidates
}

fn first_readable(
    candidates: Vec<FontSource>,
    read: impl Fn(&Path) -> Option<Vec<u8>>,
) -> Option<ResolvedFont> {
    candidates.into_iter().find_map(|source| {
        let bytes = read(source.path()).filter(|b| !b.is_empty())?;
        Some(ResolvedFont { source, bytes })
    })
}

/// `"<path>: <families>"` → `(path, families)`, skipping font collections.
fn parse_fc_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (path, families) = line.split_once(':').unwrap_or((line, ""));
    let path = path.trim();
    if path.is_empty() || is_collection(path) {
        return None;
    }
    Some((path, families.trim()))
}

/// `.ttc` collections are not loaded reliably.
fn is_collection(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".ttc")
}

fn list_system_fonts() -> Option<String> {
    match Command::new("fc-list")
        .args([":lang=zh", "file", "family"])
        .output()
    {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::debug!("fc-list exited with {}", output.status);
            None
        }
        Err(e) => {
            tracing::debug!("fc-list not available: {e}");
            None
        }
    }
}
