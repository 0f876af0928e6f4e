// SPDX-License-Identifier: MIT

//! TOML manifest describing one chown job, and its merge with command-line flags.

use anyhow::{Context, bail};
use rimapfs::prelude::VolumeRole;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Role as written in a manifest: `role = "data"`, `role = 0x40` or `role = 64`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RoleSpec {
    Number(u16),
    Name(String),
}

impl RoleSpec {
    pub fn to_role(&self) -> anyhow::Result<VolumeRole> {
        match self {
            RoleSpec::Number(n) => Ok(VolumeRole(*n)),
            RoleSpec::Name(name) => name
                .parse()
                .with_context(|| format!("invalid volume role {name:?}")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Directory relative `image` paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
    pub image: Option<PathBuf>,
    pub role: Option<RoleSpec>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .canonicalize()?;
        Self::parse(&content, base_dir)
            .with_context(|| format!("parsing manifest {}", path.display()))
    }

    pub fn parse(content: &str, base_dir: PathBuf) -> anyhow::Result<Self> {
        let mut manifest: Manifest = toml::from_str(content)?;
        manifest.image = manifest.image.map(|image| base_dir.join(image));
        manifest.base_dir = base_dir;
        Ok(manifest)
    }
}

/// Values given on the command line; each one overrides the manifest.
#[derive(Debug, Default)]
pub struct Overrides {
    pub image: Option<PathBuf>,
    pub role: Option<VolumeRole>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub paths: Vec<String>,
}

/// A fully specified chown job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChownRequest {
    pub image: PathBuf,
    pub role: VolumeRole,
    pub uid: u32,
    pub gid: u32,
    pub paths: Vec<String>,
}

impl ChownRequest {
    /// Merges flags over the manifest. The role defaults to the Data volume.
    pub fn resolve(cli: Overrides, manifest: Option<Manifest>) -> anyhow::Result<Self> {
        let manifest = manifest.unwrap_or_default();
        let role = match (cli.role, &manifest.role) {
            (Some(role), _) => role,
            (None, Some(spec)) => spec.to_role()?,
            (None, None) => VolumeRole::DATA,
        };
        let paths = if cli.paths.is_empty() {
            manifest.paths
        } else {
            cli.paths
        };
        let Some(image) = cli.image.or(manifest.image) else {
            bail!("no image given (use --image or set `image` in the manifest)");
        };
        let Some(uid) = cli.uid.or(manifest.uid) else {
            bail!("no uid given (use --uid or set `uid` in the manifest)");
        };
        let Some(gid) = cli.gid.or(manifest.gid) else {
            bail!("no gid given (use --gid or set `gid` in the manifest)");
        };
        Ok(Self {
            image,
            role,
            uid,
            gid,
            paths,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.paths.is_empty() {
            bail!("no paths to chown");
        }
        if !self.image.is_file() {
            bail!("image {} does not exist", self.image.display());
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        log::info!(
            "image {} / volume role {} / owner {}:{}",
            self.image.display(),
            self.role,
            self.uid,
            self.gid
        );
        for path in &self.paths {
            log::debug!("  - {path}");
        }
    }
}
