use crate::core::selector::TraversalPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub split: SplitConfig,
    pub alignment: AlignmentConfig,
    pub correspondence: CorrespondenceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Minimum pairwise identity (inclusive) for two leaves to share a cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
    pub policy: TraversalPolicy,
    /// Compute the identity matrix on the rayon pool
    pub parallel_matrix: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub gap_char: char,
}

/// How tree leaf names are linked to alignment identifiers: the leaf name is
/// split on `leaf_delimiter` and token `leaf_token` is compared with token
/// `sequence_token` of the identifier split on `sequence_delimiter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrespondenceConfig {
    pub leaf_delimiter: String,
    pub leaf_token: usize,
    pub sequence_delimiter: String,
    pub sequence_token: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeFormat {
    Newick,
    PhyloXml,
}

impl TreeFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TreeFormat::Newick => "nwk",
            TreeFormat::PhyloXml => "xml",
        }
    }
}

impl std::str::FromStr for TreeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newick" | "nwk" => Ok(TreeFormat::Newick),
            "phyloxml" | "xml" => Ok(TreeFormat::PhyloXml),
            _ => Err(format!("Unknown tree format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub basename: String,
    pub directory: PathBuf,
    pub msa_suffix: String,
    pub tree_format: TreeFormat,
    pub write_alignments: bool,
    pub write_trees: bool,
    /// Drop unnamed leaves left behind by pruning before writing trees
    pub clean_empty_clades: bool,
    /// Print each cluster tree to the terminal
    pub draw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_json: Option<PathBuf>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            cutoff: None,
            policy: TraversalPolicy::Max,
            parallel_matrix: true,
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self { gap_char: '-' }
    }
}

impl Default for CorrespondenceConfig {
    fn default() -> Self {
        Self {
            leaf_delimiter: "_".to_string(),
            leaf_token: 0,
            sequence_delimiter: "|".to_string(),
            sequence_token: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            basename: "output".to_string(),
            directory: PathBuf::from("."),
            msa_suffix: "a2m".to_string(),
            tree_format: TreeFormat::PhyloXml,
            write_alignments: true,
            write_trees: true,
            clean_empty_clades: false,
            draw: false,
            summary_json: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), crate::KerfError> {
        if let Some(cutoff) = self.split.cutoff {
            validate_cutoff(cutoff)?;
        }
        if !self.alignment.gap_char.is_ascii() {
            return Err(crate::KerfError::Config(format!(
                "gap_char must be ASCII, got '{}'",
                self.alignment.gap_char
            )));
        }
        if self.correspondence.leaf_delimiter.is_empty()
            || self.correspondence.sequence_delimiter.is_empty()
        {
            return Err(crate::KerfError::Config(
                "correspondence delimiters must not be empty".to_string(),
            ));
        }
        if self.output.basename.is_empty() {
            return Err(crate::KerfError::Config("output basename must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn gap_byte(&self) -> u8 {
        self.alignment.gap_char as u8
    }
}

pub fn validate_cutoff(cutoff: f64) -> Result<(), crate::KerfError> {
    if !cutoff.is_finite() || cutoff < 0.0 {
        return Err(crate::KerfError::Config(format!(
            "cutoff must be a finite, non-negative identity fraction, got {}",
            cutoff
        )));
    }
    Ok(())
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::KerfError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::KerfError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::KerfError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::KerfError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Default per-user config location, `<config dir>/kerf/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kerf").join("config.toml"))
}

/// Resolve the effective configuration: an explicit path wins, then
/// `KERF_CONFIG`, then the per-user file if present, then defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config, crate::KerfError> {
    if let Some(path) = explicit {
        debug!("Loading config from {}", path.display());
        return load_config(path);
    }
    if let Ok(path) = std::env::var("KERF_CONFIG") {
        debug!("Loading config from KERF_CONFIG={}", path);
        return load_config(path);
    }
    match user_config_path() {
        Some(path) if path.exists() => {
            debug!("Loading config from {}", path.display());
            load_config(path)
        }
        _ => Ok(Config::default()),
    }
}
