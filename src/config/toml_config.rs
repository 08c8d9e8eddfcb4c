use crate::core::intake::SUPPORTED_EXTENSIONS;
use crate::core::mapping::Layout;
use crate::core::orientation::OrientationMode;
use crate::core::time_domain::TimeDomain;
use crate::domain::ports::{ConfigProvider, ImportMetadata};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_range,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub datasource: DatasourceConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub variable: VariableConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub orientation: OrientationMode,
    #[serde(default)]
    pub time_domain: TimeDomain,
    pub variable_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasourceConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableConfig {
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub strict_entities: bool,
    #[serde(default)]
    pub skip_entity_check: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> String {
    "./output".to_string()
}

impl ImportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${IMPORT_BASE_URL})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        validate_url("server.base_url", &self.server.base_url)?;
        if let Some(timeout) = self.server.timeout_seconds {
            validate_range("server.timeout_seconds", timeout, 1, 3600)?;
        }

        validate_path("input.path", &self.input.path)?;
        validate_file_extension("input.path", &self.input.path, &SUPPORTED_EXTENSIONS)?;

        if self.input.layout == Layout::Wide {
            let name = validate_required_field("input.variable_name", &self.input.variable_name)?;
            validate_non_empty_string("input.variable_name", name)?;
        }

        // dry run 不會呼叫匯入 API，所以不需要 dataset 名稱
        if !self.output.dry_run {
            validate_non_empty_string("dataset.name", &self.dataset.name)?;
        } else {
            validate_path("output.path", &self.output.path)?;
        }

        if let (Some(category), Some(subcategory)) = (self.dataset.category_id, self.dataset.subcategory_id) {
            if category <= 0 || subcategory <= 0 {
                return Err(ImportError::ConfigValidationError {
                    field: "dataset".to_string(),
                    message: "category_id and subcategory_id must be positive".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for ImportConfig {
    fn base_url(&self) -> &str {
        &self.server.base_url
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.server.timeout_seconds
    }

    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn layout(&self) -> Layout {
        self.input.layout
    }

    fn orientation(&self) -> OrientationMode {
        self.input.orientation
    }

    fn time_domain(&self) -> TimeDomain {
        self.input.time_domain
    }

    fn variable_name(&self) -> Option<&str> {
        self.input.variable_name.as_deref()
    }

    fn strict_entities(&self) -> bool {
        self.validation.strict_entities
    }

    fn skip_entity_check(&self) -> bool {
        self.validation.skip_entity_check
    }

    fn dry_run(&self) -> bool {
        self.output.dry_run
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn metadata(&self) -> ImportMetadata {
        // 未設定 datasource 名稱時沿用 dataset 名稱
        let datasource_name = if self.datasource.name.trim().is_empty() {
            self.dataset.name.clone()
        } else {
            self.datasource.name.clone()
        };

        ImportMetadata {
            datasource_name,
            datasource_description: self.datasource.description.clone(),
            datasource_link: self.datasource.link.clone(),
            dataset_name: self.dataset.name.clone(),
            dataset_description: self.dataset.description.clone(),
            category_id: self.dataset.category_id,
            subcategory_id: self.dataset.subcategory_id,
            variable_unit: self.variable.unit.clone(),
            variable_description: self.variable.description.clone(),
        }
    }
}
