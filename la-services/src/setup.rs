//! Workspace preparation for a fresh checkout or container volume.
//!
//! Creates the data and log directories and seeds `.env` from its template.
//! Running it again changes nothing: existing directories are kept and an
//! existing `.env` is never touched.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use la_core::config::SetupConfig;
use la_core::error::LaResult;

/// What happened to the environment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvSeed {
    /// `.env` was copied from the template.
    Created,
    /// `.env` already existed and was left alone.
    AlreadyPresent,
    /// Neither `.env` nor its template exist.
    TemplateMissing,
}

/// Outcome of [`WorkspaceSetup::run`].
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    /// Directories that did not exist before this run.
    pub created_dirs: Vec<PathBuf>,
    pub env: EnvSeed,
    pub env_path: PathBuf,
}

impl SetupReport {
    /// Human-readable status lines for the CLI.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .created_dirs
            .iter()
            .map(|d| format!("created directory {}", d.display()))
            .collect();
        if self.created_dirs.is_empty() {
            lines.push("directories already present".to_string());
        }
        lines.push(match self.env {
            EnvSeed::Created => format!(
                "created {} from template, edit it to add your tokens",
                self.env_path.display()
            ),
            EnvSeed::AlreadyPresent => format!("{} already exists, left unchanged", self.env_path.display()),
            EnvSeed::TemplateMissing => format!(
                "{} not found and no template to copy, create it by hand",
                self.env_path.display()
            ),
        });
        lines
    }
}

/// Prepares the on-disk layout rooted at a base directory.
pub struct WorkspaceSetup {
    root: PathBuf,
    config: SetupConfig,
}

impl WorkspaceSetup {
    pub fn new(root: impl Into<PathBuf>, config: &SetupConfig) -> Self {
        Self {
            root: root.into(),
            config: config.clone(),
        }
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        let p = Path::new(rel);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Create directories and seed the env file. Permission problems
    /// surface as `Io` errors.
    pub fn run(&self) -> LaResult<SetupReport> {
        let mut created_dirs = Vec::new();
        for dir in [&self.config.data_dir, &self.config.logs_dir] {
            let path = self.resolve(dir);
            if !path.is_dir() {
                std::fs::create_dir_all(&path)?;
                info!("created directory {}", path.display());
                created_dirs.push(path);
            }
        }

        let env_path = self.resolve(&self.config.env_file);
        let template = self.resolve(&self.config.env_template);
        let env = seed_env_file(&env_path, &template)?;

        Ok(SetupReport {
            created_dirs,
            env,
            env_path,
        })
    }
}

fn seed_env_file(env_path: &Path, template: &Path) -> LaResult<EnvSeed> {
    if env_path.exists() {
        return Ok(EnvSeed::AlreadyPresent);
    }
    if !template.is_file() {
        warn!("no {} and no template at {}", env_path.display(), template.display());
        return Ok(EnvSeed::TemplateMissing);
    }

    let contents = std::fs::read(template)?;
    // create_new refuses to clobber a file that appeared in the meantime
    let mut file = match OpenOptions::new().write(true).create_new(true).open(env_path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(EnvSeed::AlreadyPresent),
        Err(e) => return Err(e.into()),
    };
    file.write_all(&contents)?;
    info!("seeded {} from {}", env_path.display(), template.display());
    Ok(EnvSeed::Created)
}
