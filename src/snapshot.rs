use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::BestsellerSnapshot;

/// Replaces `path` with the pretty-printed snapshot. The file is only swapped in once fully written.
pub fn write_snapshot(path: &Path, snapshot: &BestsellerSnapshot) -> anyhow::Result<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create snapshot dir: {}", parent_dir.display()))?;

    let json = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("create temp file in: {}", parent_dir.display()))?;
    tmp.write_all(json.as_bytes())
        .context("write snapshot temp file")?;
    tmp.flush().context("flush snapshot temp file")?;
    // Temp files are created owner-only; the snapshot is a plain shared data file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .context("set snapshot permissions")?;
    }
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("persist snapshot: {}", path.display()))?;

    Ok(())
}

pub fn read_snapshot(path: &Path) -> anyhow::Result<BestsellerSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read snapshot: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse snapshot: {}", path.display()))
}
