use crate::core::dispatcher::{Dispatcher, ImportProgress, IMPORT_PROGRESS};
use crate::domain::model::{ImportData, TimeValue};
use crate::domain::ports::{ApiResponse, ImportApi, ImportMetadata};
use crate::utils::error::{ImportError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 匯入流程的各個步驟，依序執行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStep {
    CreateInputFile,
    CreateDatasource,
    CreateDataset,
    CreateVariables,
    CreateEntities,
    CreateEntity,
}

impl ImportStep {
    pub fn name(&self) -> &'static str {
        match self {
            ImportStep::CreateInputFile => "createInputFile",
            ImportStep::CreateDatasource => "createDatasource",
            ImportStep::CreateDataset => "createDataset",
            ImportStep::CreateVariables => "createVariables",
            ImportStep::CreateEntities => "createEntities",
            ImportStep::CreateEntity => "createEntity",
        }
    }

    /// Endpoint the step posts to. `CreateEntities` is the per-entity loop, so it
    /// shares the endpoint of `CreateEntity`.
    pub fn path(&self) -> &'static str {
        match self {
            ImportStep::CreateInputFile => "/inputfile/import",
            ImportStep::CreateDatasource => "/datasource/import",
            ImportStep::CreateDataset => "/dataset/import",
            ImportStep::CreateVariables => "/variable/import",
            ImportStep::CreateEntities | ImportStep::CreateEntity => "/entity/import",
        }
    }

    /// Key under `data` holding the id of the created record.
    pub fn id_key(&self) -> &'static str {
        match self {
            ImportStep::CreateInputFile => "inputFileId",
            ImportStep::CreateDatasource => "datasourceId",
            ImportStep::CreateDataset => "datasetId",
            ImportStep::CreateVariables => "variableId",
            ImportStep::CreateEntities | ImportStep::CreateEntity => "entityId",
        }
    }
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file_name: String,
    pub raw_data: String,
    pub metadata: ImportMetadata,
    pub data: ImportData,
    pub times: HashMap<String, TimeValue>,
}

impl ImportRequest {
    /// Number of progress steps a full run reports.
    pub fn total_steps(&self) -> usize {
        3 + self.data.variables.len()
            + self
                .data
                .variables
                .iter()
                .map(|variable| variable.values.len())
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub input_file_id: i64,
    pub datasource_id: i64,
    pub dataset_id: i64,
    pub variable_ids: Vec<(String, i64)>,
    pub entity_ids: Vec<i64>,
    pub steps: usize,
}

struct StepCounter {
    step: usize,
    total: usize,
}

/// Runs the chained import: each request waits for the previous one and the
/// first failure stops the chain. Nothing created before the failure is rolled back.
pub struct ImportWorkflow<A: ImportApi> {
    api: A,
    dispatcher: Arc<Dispatcher>,
}

impl<A: ImportApi> ImportWorkflow<A> {
    pub fn new(api: A, dispatcher: Arc<Dispatcher>) -> Self {
        Self { api, dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub async fn run(&self, request: &ImportRequest) -> Result<ImportSummary> {
        let mut counter = StepCounter {
            step: 0,
            total: request.total_steps(),
        };
        let meta = &request.metadata;
        let mut summary = ImportSummary::default();

        tracing::info!("🚀 Starting import: {} step(s)", counter.total);

        summary.input_file_id = self
            .call(
                ImportStep::CreateInputFile,
                json!({ "name": request.file_name, "rawData": request.raw_data }),
                &mut counter,
                format!("Uploaded input file '{}'", request.file_name),
            )
            .await?;

        summary.datasource_id = self
            .call(
                ImportStep::CreateDatasource,
                json!({
                    "name": meta.datasource_name,
                    "description": meta.datasource_description,
                    "link": meta.datasource_link,
                    "inputFileId": summary.input_file_id,
                }),
                &mut counter,
                format!("Created datasource '{}'", meta.datasource_name),
            )
            .await?;

        summary.dataset_id = self
            .call(
                ImportStep::CreateDataset,
                json!({
                    "name": meta.dataset_name,
                    "description": meta.dataset_description,
                    "categoryId": meta.category_id,
                    "subcategoryId": meta.subcategory_id,
                    "datasourceId": summary.datasource_id,
                }),
                &mut counter,
                format!("Created dataset '{}'", meta.dataset_name),
            )
            .await?;

        for variable in &request.data.variables {
            let variable_id = self
                .call(
                    ImportStep::CreateVariables,
                    json!({
                        "name": variable.name,
                        "unit": meta.variable_unit,
                        "description": meta.variable_description,
                        "datasetId": summary.dataset_id,
                        "datasourceId": summary.datasource_id,
                    }),
                    &mut counter,
                    format!("Created variable '{}'", variable.name),
                )
                .await?;
            summary.variable_ids.push((variable.name.clone(), variable_id));
        }

        for (variable, (_, variable_id)) in request.data.variables.iter().zip(summary.variable_ids.clone()) {
            tracing::debug!(
                "{} for variable '{}': {} entities",
                ImportStep::CreateEntities,
                variable.name,
                variable.values.len()
            );

            for entity in &variable.values {
                let values = match Self::entity_values(entity, &request.times) {
                    Ok(values) => values,
                    Err(e) => {
                        self.report_failure(&counter, &e);
                        return Err(e);
                    }
                };

                let entity_id = self
                    .call(
                        ImportStep::CreateEntity,
                        json!({
                            "variableId": variable_id,
                            "name": entity.key,
                            "values": values,
                        }),
                        &mut counter,
                        format!("Imported '{}' for variable '{}'", entity.key, variable.name),
                    )
                    .await?;
                summary.entity_ids.push(entity_id);
            }
        }

        summary.steps = counter.step;
        self.dispatcher.trigger(
            IMPORT_PROGRESS,
            &ImportProgress {
                message: format!("Import of dataset '{}' complete", meta.dataset_name),
                success: true,
                step: counter.step,
                total: counter.total,
            },
        );

        Ok(summary)
    }

    fn entity_values(
        entity: &crate::domain::model::EntityValues,
        times: &HashMap<String, TimeValue>,
    ) -> Result<Vec<serde_json::Value>> {
        entity
            .values
            .iter()
            .map(|point| {
                let time = times.get(&point.x).ok_or_else(|| ImportError::ProcessingError {
                    message: format!("time label '{}' of entity '{}' was not validated", point.x, entity.key),
                })?;
                Ok(json!({ "value": point.y, "time": time }))
            })
            .collect()
    }

    async fn call(
        &self,
        step: ImportStep,
        payload: serde_json::Value,
        counter: &mut StepCounter,
        message: String,
    ) -> Result<i64> {
        let path = step.path();
        tracing::debug!("POST {} ({})", path, step);
        let outcome = self
            .api
            .post(path, &payload)
            .await
            .map_err(|e| Self::step_error(step, e))
            .and_then(|response| Self::extract_id(step, &response));

        match outcome {
            Ok(id) => {
                counter.step += 1;
                self.dispatcher.trigger(
                    IMPORT_PROGRESS,
                    &ImportProgress {
                        message,
                        success: true,
                        step: counter.step,
                        total: counter.total,
                    },
                );
                Ok(id)
            }
            Err(e) => {
                self.report_failure(counter, &e);
                Err(e)
            }
        }
    }

    fn report_failure(&self, counter: &StepCounter, error: &ImportError) {
        self.dispatcher.trigger(
            IMPORT_PROGRESS,
            &ImportProgress {
                message: error.user_friendly_message(),
                success: false,
                step: counter.step,
                total: counter.total,
            },
        );
    }

    fn step_error(step: ImportStep, error: ImportError) -> ImportError {
        let message = match error {
            ImportError::ApiError { message, .. } => message,
            other => other.to_string(),
        };
        ImportError::ApiError {
            step: step.name().to_string(),
            message,
        }
    }

    fn extract_id(step: ImportStep, response: &ApiResponse) -> Result<i64> {
        if !response.success {
            let message = response
                .data
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| response.data.as_str())
                .unwrap_or("server reported failure")
                .to_string();
            return Err(ImportError::ApiError {
                step: step.name().to_string(),
                message,
            });
        }

        let key = step.id_key();
        let value = response.data.get(key);
        value
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .ok_or_else(|| ImportError::ApiError {
                step: step.name().to_string(),
                message: format!("response is missing '{}'", key),
            })
    }
}
