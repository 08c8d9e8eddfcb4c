use crate::core::mapping::Layout;
use crate::core::orientation::OrientationMode;
use crate::core::time_domain::TimeDomain;
use crate::domain::model::{MappedImport, ParsedFile};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 匯入時寫入 datasource / dataset / variable 的描述資訊
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportMetadata {
    pub datasource_name: String,
    pub datasource_description: String,
    pub datasource_link: String,
    pub dataset_name: String,
    pub dataset_description: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub variable_unit: String,
    pub variable_description: String,
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
    fn input_path(&self) -> &str;
    fn layout(&self) -> Layout;
    fn orientation(&self) -> OrientationMode;
    fn time_domain(&self) -> TimeDomain;
    fn variable_name(&self) -> Option<&str>;
    fn strict_entities(&self) -> bool;
    fn skip_entity_check(&self) -> bool;
    fn dry_run(&self) -> bool;
    fn output_path(&self) -> &str;
    fn metadata(&self) -> ImportMetadata;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ParsedFile>;
    async fn transform(&self, parsed: ParsedFile) -> Result<MappedImport>;
    async fn load(&self, mapped: MappedImport) -> Result<String>;
}

/// The `{success, data}` envelope every import endpoint replies with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Backend import API. Each call POSTs a JSON payload to `path`.
#[async_trait]
pub trait ImportApi: Send + Sync {
    async fn post(&self, path: &str, payload: &serde_json::Value) -> Result<ApiResponse>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityReport {
    pub checked: usize,
    pub unmatched: Vec<String>,
}

impl EntityReport {
    pub fn is_valid(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Checks entity names against the server's canonical name list.
#[async_trait]
pub trait EntityValidator: Send + Sync {
    async fn validate_entities(&self, names: &[String]) -> Result<EntityReport>;
}
