use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use log::{info, warn};
use url::Url;

use super::{AppError, Artifact};
use crate::config::ManagerConfig;
use crate::utils::{is_plain_filename, sanitize_dir_name};

/// Static table of models plus their on-disk layout.
///
/// Each model lives in `<models_dir>/<sanitized name>/<filename>`. Whether a
/// model is downloaded is always read back from the filesystem.
#[derive(Debug, Clone)]
pub struct Catalog {
    models_dir: PathBuf,
    artifacts: BTreeMap<String, Artifact>,
}

impl Catalog {
    /// Creates `models_dir` if needed and validates the table.
    pub fn new(
        models_dir: impl Into<PathBuf>,
        artifacts: impl IntoIterator<Item = Artifact>,
    ) -> Result<Self, AppError> {
        let models_dir = models_dir.into();
        let mut table = BTreeMap::new();
        let mut folders: HashMap<String, String> = HashMap::new();

        for artifact in artifacts {
            validate_artifact(&artifact)?;

            let folder = sanitize_dir_name(&artifact.name);
            if folder.is_empty() {
                return Err(AppError::Config(format!(
                    "model name '{}' has no usable folder characters",
                    artifact.name
                )));
            }
            if let Some(other) = folders.insert(folder.clone(), artifact.name.clone()) {
                return Err(AppError::Config(format!(
                    "models '{}' and '{}' share the folder '{}'",
                    other, artifact.name, folder
                )));
            }

            table.insert(artifact.name.clone(), artifact);
        }

        std::fs::create_dir_all(&models_dir).map_err(|e| {
            AppError::Io(format!(
                "Failed to create models directory {}: {}",
                models_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            models_dir,
            artifacts: table,
        })
    }

    /// Opens the catalog described by `config`: the JSON file when one is
    /// configured, the built-in table otherwise.
    pub fn open(config: &ManagerConfig) -> Result<Self, AppError> {
        let artifacts = match &config.catalog_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Failed to read catalog {}: {}", path.display(), e))
                })?;
                let artifacts = parse_catalog(&raw)?;
                info!(
                    "Loaded {} models from catalog {}",
                    artifacts.len(),
                    path.display()
                );
                artifacts
            }
            None => builtin_artifacts(),
        };

        Self::new(&config.models_dir, artifacts)
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// All models, sorted by name
    pub fn list_artifacts(&self) -> Vec<Artifact> {
        self.artifacts.values().cloned().collect()
    }

    /// Models sorted by name, each paired with its current presence
    pub fn entries(&self) -> Vec<(Artifact, bool)> {
        self.artifacts
            .values()
            .map(|a| (a.clone(), self.is_present(&a.name)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<&Artifact, AppError> {
        self.artifacts
            .get(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    pub fn resolve_directory(&self, name: &str) -> Result<PathBuf, AppError> {
        let artifact = self.get(name)?;
        Ok(self.models_dir.join(sanitize_dir_name(&artifact.name)))
    }

    pub fn destination_path(&self, name: &str) -> Result<PathBuf, AppError> {
        let artifact = self.get(name)?;
        Ok(self.resolve_directory(name)?.join(&artifact.filename))
    }

    /// True iff the model folder exists and holds the expected file.
    /// Unknown names and I/O failures read as "not downloaded".
    pub fn is_present(&self, name: &str) -> bool {
        let (Ok(dir), Ok(file)) = (self.resolve_directory(name), self.destination_path(name)) else {
            return false;
        };
        dir.is_dir() && file.is_file()
    }

    /// Deletes the model folder and everything in it.
    pub fn remove_artifact(&self, name: &str) -> Result<(), AppError> {
        let dir = self.resolve_directory(name)?;

        if !dir.is_dir() {
            return Err(AppError::Removal {
                path: dir,
                cause: "folder does not exist".to_string(),
            });
        }

        std::fs::remove_dir_all(&dir).map_err(|e| {
            warn!("Failed to remove {}: {}", dir.display(), e);
            AppError::Removal {
                path: dir.clone(),
                cause: e.to_string(),
            }
        })?;

        info!("Removed model {} ({})", name, dir.display());
        Ok(())
    }
}

/// Parses a JSON object of `name -> { url, filename, description }`.
pub fn parse_catalog(raw: &str) -> Result<Vec<Artifact>, AppError> {
    let table: BTreeMap<String, Artifact> = serde_json::from_str(raw)
        .map_err(|e| AppError::Config(format!("Invalid catalog JSON: {}", e)))?;

    Ok(table
        .into_iter()
        .map(|(name, mut artifact)| {
            artifact.name = name;
            artifact
        })
        .collect())
}

fn validate_artifact(artifact: &Artifact) -> Result<(), AppError> {
    let url = Url::parse(&artifact.url).map_err(|e| {
        AppError::Config(format!("model '{}' has an invalid URL: {}", artifact.name, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "model '{}' uses unsupported scheme '{}'",
            artifact.name,
            url.scheme()
        )));
    }
    if !is_plain_filename(&artifact.filename) {
        return Err(AppError::Config(format!(
            "model '{}' has an invalid filename '{}'",
            artifact.name, artifact.filename
        )));
    }
    Ok(())
}

pub fn builtin_artifacts() -> Vec<Artifact> {
    vec![
        Artifact::new(
            "DeepSeek-Coder-1.3b",
            "https://huggingface.co/deepseek-ai/deepseek-coder-1.3b-instruct/resolve/main/pytorch_model.bin?download=true",
            "deepseek-coder-1.3b-instruct.bin",
            "DeepSeek Coder 1.3B Instruct Model",
        ),
        Artifact::new(
            "Mistral-7B-Instruct-v0.1",
            "https://huggingface.co/mistralai/Mistral-7B-Instruct-v0.1/resolve/main/pytorch_model.bin.index.json?download=true",
            "mistral-7b-instruct-v0.1.json",
            "Mistral 7B Instruct v0.1",
        ),
        Artifact::new(
            "TinyLlama-1.1B-Chat",
            "https://huggingface.co/TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF/resolve/main/tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf?download=true",
            "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            "TinyLlama 1.1B Chat v1.0 (GGUF)",
        ),
    ]
}
