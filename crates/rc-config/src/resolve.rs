//! Config file discovery and parsing.
//!
//! Resolution order: explicit path → `RC_CONFIG` env var → XDG config dir →
//! built-in defaults. The first source that names a file wins; a named file
//! that cannot be read or parsed is an error rather than a silent fallback.

use crate::pipeline::PipelineConfig;
use crate::validate::{validate_config, ValidationError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "RC_CONFIG";

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
        }
    }

    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ValidationError::UnsupportedFormat { extension: ext }),
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    Explicit(PathBuf),
    Env(PathBuf),
    Xdg(PathBuf),
    Defaults,
}

/// Parse a config from a string in the given format.
pub fn parse_config_str(
    content: &str,
    format: ConfigFormat,
) -> Result<PipelineConfig, ValidationError> {
    let parse_err = |message: String| {
        ValidationError::ParseError(format!("invalid {}: {}", format.as_str(), message))
    };
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Load and validate a config file.
pub fn load_config_from_path(path: &Path) -> Result<PipelineConfig, ValidationError> {
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let cfg = parse_config_str(&content, format)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Default per-user config location, if a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("riskcut").join("config.toml"))
}

/// Resolve the effective config using the process environment.
pub fn resolve_config(
    explicit: Option<&Path>,
) -> Result<(PipelineConfig, ConfigSource), ValidationError> {
    let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    resolve_config_with(explicit, env_path, default_config_path())
}

/// Resolution with every input injected, so the chain is testable.
pub fn resolve_config_with(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    xdg_path: Option<PathBuf>,
) -> Result<(PipelineConfig, ConfigSource), ValidationError> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config from explicit path");
        let cfg = load_config_from_path(path)?;
        return Ok((cfg, ConfigSource::Explicit(path.to_path_buf())));
    }

    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        debug!(path = %path.display(), env = CONFIG_ENV_VAR, "loading config from env");
        let cfg = load_config_from_path(&path)?;
        return Ok((cfg, ConfigSource::Env(path)));
    }

    if let Some(path) = xdg_path.filter(|p| p.is_file()) {
        debug!(path = %path.display(), "loading config from user config dir");
        let cfg = load_config_from_path(&path)?;
        return Ok((cfg, ConfigSource::Xdg(path)));
    }

    debug!("no config file found, using defaults");
    Ok((PipelineConfig::default(), ConfigSource::Defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn detects_formats_by_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("a.ini")),
            Err(ValidationError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn parses_each_format() {
        let toml_cfg = parse_config_str("[folds]\ncount = 5\n", ConfigFormat::Toml).unwrap();
        assert_eq!(toml_cfg.folds.count, 5);

        let yaml_cfg =
            parse_config_str("costs:\n  false_negative: 25.0\n", ConfigFormat::Yaml).unwrap();
        assert_eq!(yaml_cfg.costs.false_negative, 25.0);

        let json_cfg =
            parse_config_str(r#"{"grid": {"points": 7}}"#, ConfigFormat::Json).unwrap();
        assert_eq!(json_cfg.grid.points, 7);
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_file(&dir, "a.toml", "[folds]\ncount = 4\n");
        let env = write_file(&dir, "b.toml", "[folds]\ncount = 6\n");
        let (cfg, source) = resolve_config_with(Some(&explicit), Some(env), None).unwrap();
        assert_eq!(cfg.folds.count, 4);
        assert_eq!(source, ConfigSource::Explicit(explicit));
    }

    #[test]
    fn env_then_xdg_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let env = write_file(&dir, "env.json", r#"{"folds": {"count": 3}}"#);
        let xdg = write_file(&dir, "config.toml", "[folds]\ncount = 8\n");

        let (cfg, source) = resolve_config_with(None, Some(env.clone()), Some(xdg.clone())).unwrap();
        assert_eq!(cfg.folds.count, 3);
        assert_eq!(source, ConfigSource::Env(env));

        let (cfg, source) = resolve_config_with(None, None, Some(xdg.clone())).unwrap();
        assert_eq!(cfg.folds.count, 8);
        assert_eq!(source, ConfigSource::Xdg(xdg));

        let missing = dir.path().join("missing.toml");
        let (cfg, source) = resolve_config_with(None, None, Some(missing)).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[test]
    fn invalid_file_is_an_error_not_a_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_file(&dir, "bad.toml", "[grid]\nlow = 0.0\n");
        assert!(resolve_config_with(Some(&bad), None, None).is_err());

        let garbled = write_file(&dir, "garbled.json", "{not json");
        assert!(matches!(
            load_config_from_path(&garbled),
            Err(ValidationError::ParseError(_))
        ));
    }
}
