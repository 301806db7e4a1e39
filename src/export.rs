use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const DEFAULT_EXPORT_STEM: &str = "ratchakitcha-note";
const MAX_STEM_CHARS: usize = 120;

/// Writes the note to `<dir>/<sanitized title>.md` and returns the path.
pub fn export_markdown(dir: &Path, title: Option<&str>, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    let stem = title
        .map(sanitize_stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_STEM.to_string());
    let path = dir.join(format!("{stem}.md"));
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = text.len(), "markdown exported");
    Ok(path)
}

pub fn sanitize_stem(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|ch| {
            if ch == '/' || ch == '\\' || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();
    replaced.trim().chars().take(MAX_STEM_CHARS).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_file_named_after_title() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = export_markdown(temp.path(), Some("ประกาศ กระทรวง/การคลัง"), "# note")?;
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("ประกาศ กระทรวง_การคลัง.md")
        );
        assert_eq!(fs::read_to_string(&path)?, "# note");
        Ok(())
    }

    #[test]
    fn falls_back_to_default_name() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let nested = temp.path().join("exports");
        let path = export_markdown(&nested, None, "a")?;
        assert_eq!(path, nested.join("ratchakitcha-note.md"));
        let path = export_markdown(&nested, Some("   "), "b")?;
        assert_eq!(path, nested.join("ratchakitcha-note.md"));
        assert_eq!(fs::read_to_string(path)?, "b");
        Ok(())
    }

    #[test]
    fn sanitizing_trims_and_caps() {
        assert_eq!(sanitize_stem("  a\tb\\c  "), "a_b_c");
        let long = "ก".repeat(300);
        assert_eq!(sanitize_stem(&long).chars().count(), 120);
    }
}
