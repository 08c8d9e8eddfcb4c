use crate::adapters::http::{HttpEntityValidator, HttpImportApi};
use crate::core::dispatcher::Dispatcher;
use crate::core::entity_validation::{check_entities, precheck_entities};
use crate::core::import_workflow::{ImportRequest, ImportWorkflow};
use crate::core::intake::{delimiter_for, parse_csv};
use crate::core::mapping::{map_data, Layout, MappingOptions};
use crate::core::orientation::{normalize, OrientationMode};
use crate::core::time_domain::validate_time_labels;
use crate::domain::model::{MappedImport, Orientation, ParsedFile};
use crate::domain::ports::{ConfigProvider, EntityValidator, ImportApi, Pipeline, Storage};
use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Upload → normalize → validate → map → import, expressed as extract/transform/load.
pub struct CsvImportPipeline<S: Storage, C: ConfigProvider, A: ImportApi, V: EntityValidator> {
    storage: S,
    config: C,
    workflow: ImportWorkflow<A>,
    validator: V,
}

impl<S: Storage, C: ConfigProvider, A: ImportApi, V: EntityValidator> CsvImportPipeline<S, C, A, V> {
    pub fn new(storage: S, config: C, api: A, validator: V, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            storage,
            config,
            workflow: ImportWorkflow::new(api, dispatcher),
            validator,
        }
    }

    fn file_name(&self) -> String {
        Path::new(self.config.input_path())
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.config.input_path().to_string())
    }

    async fn write_dry_run(&self, mapped: &MappedImport) -> Result<String> {
        let stem = Path::new(&mapped.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "import".to_string());
        let output_file = format!("{}/{}_mapped.json", self.config.output_path(), stem);

        // 依標籤排序，輸出內容才穩定
        let times: BTreeMap<&String, _> = mapped.times.iter().collect();
        let document = serde_json::json!({
            "variables": mapped.data.variables,
            "times": times,
            "unmatchedEntities": mapped.unmatched_entities,
        });
        let json = serde_json::to_string_pretty(&document)?;

        tracing::debug!("Writing mapped JSON ({} bytes) to storage", json.len());
        self.storage.write_file(&output_file, json.as_bytes()).await?;
        Ok(output_file)
    }
}

impl<S: Storage, C: ConfigProvider> CsvImportPipeline<S, C, HttpImportApi, HttpEntityValidator> {
    /// Wires the pipeline to the HTTP backend named by `config.base_url()`.
    pub fn with_http(storage: S, config: C, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let api = HttpImportApi::new(config.base_url(), config.timeout_seconds())?;
        let validator = HttpEntityValidator::new(api.clone());
        Ok(Self::new(storage, config, api, validator, dispatcher))
    }
}

#[async_trait::async_trait]
impl<S, C, A, V> Pipeline for CsvImportPipeline<S, C, A, V>
where
    S: Storage,
    C: ConfigProvider,
    A: ImportApi,
    V: EntityValidator,
{
    async fn extract(&self) -> Result<ParsedFile> {
        let path = self.config.input_path();
        tracing::debug!("Reading input file: {}", path);

        let bytes = self.storage.read_file(path).await?;
        let raw_data = String::from_utf8_lossy(&bytes).to_string();
        let rows = parse_csv(&bytes, delimiter_for(path))?;

        let (rows, orientation) = match self.config.layout() {
            Layout::Wide => normalize(rows, self.config.orientation()),
            Layout::Long => {
                if self.config.orientation() != OrientationMode::Auto {
                    tracing::warn!("⚠️ Orientation setting is ignored for the long layout");
                }
                (rows, Orientation::Normal)
            }
        };

        Ok(ParsedFile {
            file_name: self.file_name(),
            raw_data,
            rows,
            orientation,
        })
    }

    async fn transform(&self, parsed: ParsedFile) -> Result<MappedImport> {
        let options = MappingOptions {
            layout: self.config.layout(),
            variable_name: self.config.variable_name().map(str::to_string),
        };
        let data = map_data(&parsed.rows, &options)?;
        precheck_entities(&data)?;

        let domain = self.config.time_domain();
        let labels = data.time_labels();
        let times = validate_time_labels(&labels, domain).into_result(domain)?;
        tracing::info!("🕒 {} time label(s) valid for domain '{}'", times.len(), domain);

        let unmatched_entities = if self.config.skip_entity_check() {
            tracing::info!("⏭️ Skipping server-side entity validation");
            Vec::new()
        } else {
            check_entities(&self.validator, &data.entity_names(), self.config.strict_entities())
                .await?
                .unmatched
        };

        Ok(MappedImport {
            file_name: parsed.file_name,
            raw_data: parsed.raw_data,
            data,
            times,
            unmatched_entities,
        })
    }

    async fn load(&self, mapped: MappedImport) -> Result<String> {
        if self.config.dry_run() {
            tracing::info!("🔍 DRY RUN MODE - writing mapped data instead of importing");
            return self.write_dry_run(&mapped).await;
        }

        let request = ImportRequest {
            file_name: mapped.file_name,
            raw_data: mapped.raw_data,
            metadata: self.config.metadata(),
            data: mapped.data,
            times: mapped.times,
        };

        let summary = self.workflow.run(&request).await?;
        Ok(format!(
            "dataset {} ({} variable(s), {} entity import(s), {} step(s))",
            summary.dataset_id,
            summary.variable_ids.len(),
            summary.entity_ids.len(),
            summary.steps
        ))
    }
}
