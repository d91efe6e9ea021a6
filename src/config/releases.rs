use crate::domain::model::ReleaseSource;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 內建的預設發行版清單（Microsoft 自 Windows 10 2004 起的頁面）
const DEFAULT_RELEASES_TOML: &str = include_str!("../../releases.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesConfig {
    pub pipeline: PipelineConfig,
    pub load: LoadConfig,
    /// Chronological order, oldest first; the last entry per vendor is the
    /// baseline release.
    pub releases: Vec<ReleaseSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

impl ReleasesConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// The embedded default release list; lets both binaries run with no
    /// config file at all.
    pub fn builtin() -> Self {
        // include_str! content is part of the build; a parse failure is a
        // packaging bug, caught by tests.
        Self::from_toml_str(DEFAULT_RELEASES_TOML)
            .expect("embedded releases.toml must be valid")
    }

    /// 替換環境變數 (例如 ${SNAPSHOT_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for ReleasesConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("load.output_path", &self.load.output_path)?;

        if self.releases.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "releases".to_string(),
            });
        }

        for release in &self.releases {
            validation::validate_non_empty_string("releases.label", &release.label)?;
            validation::validate_url("releases.url", &release.url)?;
        }

        Ok(())
    }
}
