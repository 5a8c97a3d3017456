use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ResolvedPaths {
    /// Default location for a rendered résumé.
    pub fn resume_pdf(&self) -> PathBuf {
        self.output_dir.join("resume.pdf")
    }
}

pub fn ensure_directories(cfg: &DirectoryConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let output_dir = ensure_dir(&cfg.output_dir)?;

    let probe_file = output_dir.join(".write-test");
    fs::write(&probe_file, b"ok")
        .with_context(|| format!("output directory {} is not writable", output_dir.display()))?;
    fs::remove_file(&probe_file)?;
    Ok(ResolvedPaths {
        logs_dir,
        output_dir,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}
