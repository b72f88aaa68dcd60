use crate::error::{LensError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_ROOT: &str = "https://streamlit-self-driving.s3-us-west-2.amazonaws.com/";
const DEFAULT_LABELS_FILE: &str = "labels.csv.gz";
const DEFAULT_WEIGHTS_FILE: &str = "yolov3.onnx";
const DEFAULT_INPUT_SIZE: u32 = 416;

/// Everything the pipeline needs to know about where data lives and how to draw it.
///
/// Built once at startup (defaults, then an optional TOML file, then CLI
/// overrides) and handed to components by reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub palette: LabelPalette,
    pub weights: WeightsConfig,
    pub detector: DetectorConfig,
}

impl AppConfig {
    /// Load from a TOML file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(LensError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|e| LensError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| LensError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// URL (or local directory) holding the labels file and every frame image.
    pub url_root: String,
    pub labels_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            url_root: DEFAULT_DATA_ROOT.into(),
            labels_file: DEFAULT_LABELS_FILE.into(),
        }
    }
}

impl DataConfig {
    pub fn labels_url(&self) -> String {
        join_url(&self.url_root, &self.labels_file)
    }

    pub fn frame_url(&self, frame: &str) -> String {
        join_url(&self.url_root, frame)
    }
}

fn join_url(root: &str, name: &str) -> String {
    if root.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Fixed label to RGB mapping used by the box overlay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LabelPalette(BTreeMap<String, [u8; 3]>);

impl Default for LabelPalette {
    fn default() -> Self {
        Self::from_entries([
            ("car", [255, 0, 0]),
            ("pedestrian", [0, 255, 0]),
            ("truck", [0, 0, 255]),
            ("trafficLight", [255, 255, 0]),
            ("biker", [255, 0, 255]),
        ])
    }
}

impl LabelPalette {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, [u8; 3])>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(label, color)| (label.to_string(), color))
                .collect(),
        )
    }

    pub fn color(&self, label: &str) -> Option<[u8; 3]> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub url: Option<String>,
    /// Hex SHA-256 of the known-good weights file.
    pub sha256: Option<String>,
    pub file_name: String,
    pub dir: PathBuf,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            url: None,
            sha256: None,
            file_name: DEFAULT_WEIGHTS_FILE.into(),
            dir: PathBuf::from("."),
        }
    }
}

impl WeightsConfig {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Source URL and expected digest, both required before anything can be downloaded.
    pub fn remote(&self) -> Result<(&str, &str)> {
        match (self.url.as_deref(), self.sha256.as_deref()) {
            (Some(url), Some(sha)) if !url.is_empty() && !sha.is_empty() => Ok((url, sha)),
            _ => Err(LensError::MissingWeightsConfig),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Square model input edge in pixels.
    pub input_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}
