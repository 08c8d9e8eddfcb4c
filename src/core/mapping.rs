use crate::domain::model::{Cell, EntityValues, ImportData, Point, PointValue, RowMatrix, Variable};
use crate::utils::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 上傳檔案的欄位配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `[label, t1, t2, ...]` header, one row per entity, single variable.
    #[default]
    Wide,
    /// `[entity, time, var1, var2, ...]` header, one row per entity/time pair.
    Long,
}

#[derive(Debug, Clone, Default)]
pub struct MappingOptions {
    pub layout: Layout,
    pub variable_name: Option<String>,
}

/// Reshapes a normalized matrix into variables × entities × time.
pub fn map_data(rows: &RowMatrix, options: &MappingOptions) -> Result<ImportData> {
    if rows.len() < 2 {
        return Err(ImportError::EmptyInputError);
    }

    let data = match options.layout {
        Layout::Wide => map_wide(rows, options)?,
        Layout::Long => map_long(rows)?,
    };

    tracing::debug!(
        "Mapped {} variable(s), {} entities, {} point(s)",
        data.variables.len(),
        data.entity_names().len(),
        data.point_count()
    );
    Ok(data)
}

fn entity_key(row: &[Cell], row_number: usize) -> Result<String> {
    let key = row.first().map(|cell| cell.label()).unwrap_or_default();
    if key.trim().is_empty() {
        return Err(ImportError::ValidationError {
            message: format!("Row {} has no entity name", row_number),
        });
    }
    Ok(key)
}

fn map_wide(rows: &RowMatrix, options: &MappingOptions) -> Result<ImportData> {
    let name = options
        .variable_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ImportError::MissingConfigError {
            field: "input.variable_name".to_string(),
        })?;

    let header: Vec<String> = rows[0].iter().map(|cell| cell.label()).collect();
    if let Some(column) = header.iter().skip(1).position(|label| label.trim().is_empty()) {
        return Err(ImportError::ValidationError {
            message: format!("Column {} has no time label", column + 2),
        });
    }

    let mut values = Vec::new();
    for (index, row) in rows.iter().skip(1).enumerate() {
        // 第一列為標題，所以資料列從第 2 列開始
        let key = entity_key(row, index + 2)?;
        let points: Vec<Point> = row
            .iter()
            .zip(header.iter())
            .skip(1)
            .filter_map(|(cell, x)| {
                PointValue::from_cell(cell).map(|y| Point { x: x.clone(), y })
            })
            .collect();

        if points.is_empty() {
            tracing::debug!("Entity '{}' has no values, skipping", key);
            continue;
        }
        values.push(EntityValues { id: index, key, values: points });
    }

    Ok(ImportData {
        variables: vec![Variable { name: name.to_string(), values }],
    })
}

fn map_long(rows: &RowMatrix) -> Result<ImportData> {
    let header = &rows[0];
    if header.len() < 3 {
        return Err(ImportError::ValidationError {
            message: "Long layout needs an entity column, a time column and at least one variable column"
                .to_string(),
        });
    }

    let mut variables: Vec<Variable> = header
        .iter()
        .enumerate()
        .skip(2)
        .map(|(column, cell)| {
            let label = cell.label();
            Variable {
                name: if label.trim().is_empty() {
                    format!("Variable {}", column - 1)
                } else {
                    label
                },
                values: Vec::new(),
            }
        })
        .collect();

    let mut entity_ids: HashMap<String, usize> = HashMap::new();
    let mut positions: Vec<HashMap<usize, usize>> = vec![HashMap::new(); variables.len()];

    for (index, row) in rows.iter().enumerate().skip(1) {
        let key = entity_key(row, index + 1)?;
        let time = row.get(1).map(|cell| cell.label()).unwrap_or_default();
        if time.trim().is_empty() {
            return Err(ImportError::ValidationError {
                message: format!("Row {} has no time label", index + 1),
            });
        }

        let next_id = entity_ids.len();
        let id = *entity_ids.entry(key.clone()).or_insert(next_id);

        for (offset, cell) in row.iter().skip(2).take(variables.len()).enumerate() {
            let Some(y) = PointValue::from_cell(cell) else {
                continue;
            };
            let variable = &mut variables[offset];
            let slot = *positions[offset].entry(id).or_insert_with(|| {
                variable.values.push(EntityValues {
                    id,
                    key: key.clone(),
                    values: Vec::new(),
                });
                variable.values.len() - 1
            });
            variable.values[slot].values.push(Point { x: time.clone(), y });
        }
    }

    Ok(ImportData { variables })
}
