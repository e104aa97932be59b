//! Generic config file loader; the file format is chosen by the file
//! name extension.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
    Ron,
}

impl ConfigBackend {
    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        match self {
            ConfigBackend::Json5 => serde_json5::from_str(&s)
                .with_context(|| anyhow!("decoding JSON5 from config file {path:?}")),
            ConfigBackend::Yaml => serde_yml::from_str(&s)
                .with_context(|| anyhow!("decoding YAML from config file {path:?}")),
            ConfigBackend::Ron => {
                ron::from_str(&s).with_context(|| anyhow!("decoding RON from config file {path:?}"))
            }
        }
    }

    pub fn save_config_file<T: Serialize>(self, path: &Path, value: &T) -> Result<()> {
        let s = match self {
            ConfigBackend::Json5 => serde_json5::to_string(value)
                .with_context(|| anyhow!("encoding config as JSON5"))?,
            ConfigBackend::Yaml => {
                serde_yml::to_string(value).with_context(|| anyhow!("encoding config as YAML"))?
            }
            ConfigBackend::Ron => {
                ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
                    .with_context(|| anyhow!("encoding config as RON"))?
            }
        };
        std::fs::write(path, s).with_context(|| anyhow!("writing config file to {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
    ("ron", ConfigBackend::Ron),
];

/// `"extension: format"` for each supported extension.
pub fn supported_formats() -> Vec<String> {
    FILE_EXTENSIONS
        .iter()
        .map(|(extension, backend)| format!("{extension}: {backend:?}"))
        .collect()
}

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path has an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path has an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    }
}

pub fn save_config_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let backend = backend_from_path(path)?;
    backend.save_config_file(path, value)?;
    info!("wrote config to {path:?}");
    Ok(())
}

fn with_extension_appended(path: &Path, extension: &str) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("path is missing a file name: {path:?}"))?;
    let mut file_name = file_name.to_owned();
    file_name.push(".");
    file_name.push(extension);
    Ok(path.with_file_name(file_name))
}

pub trait LoadConfigFile: DeserializeOwned + Default {
    /// One of the `FILE_EXTENSIONS` is appended to this path and each
    /// is tried.
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>>;

    /// If `path` is given, the file must exist or an error is
    /// returned. Otherwise the default location is checked with each
    /// supported extension; exactly one existing file is loaded,
    /// several are an error, none yields `Default::default()`.
    fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            let backend = backend_from_path(path)?;
            return backend.load_config_file(path);
        }
        let Some(base) = Self::default_config_path_without_suffix()? else {
            return Ok(Self::default());
        };
        let mut found = Vec::new();
        for (extension, backend) in FILE_EXTENSIONS {
            let path = with_extension_appended(&base, extension)?;
            if path.exists() {
                found.push((path, *backend));
            }
        }
        match found.as_slice() {
            [] => {
                debug!("no config file at {base:?}.*, using defaults");
                Ok(Self::default())
            }
            [(path, backend)] => {
                info!("loading config from {path:?}");
                backend.load_config_file(path)
            }
            _ => {
                let paths: Vec<_> = found.iter().map(|(path, _)| path).collect();
                bail!("multiple config file paths found, leading to ambiguity: {paths:?}")
            }
        }
    }
}
