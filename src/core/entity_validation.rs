use crate::domain::model::ImportData;
use crate::domain::ports::{EntityReport, EntityValidator};
use crate::utils::error::{ImportError, Result};
use std::collections::HashSet;

pub const VALIDATE_ENTITIES_PATH: &str = "/entityIsoNames/validateData";

/// Local checks that need no server: blank keys, an entity listed twice in a
/// variable, and a time label repeated within one entity.
pub fn precheck_entities(data: &ImportData) -> Result<()> {
    let mut problems = Vec::new();

    for variable in &data.variables {
        let mut keys = HashSet::new();
        for entity in &variable.values {
            if entity.key.trim().is_empty() {
                problems.push(format!("variable '{}' has an entity without a name", variable.name));
                continue;
            }
            if !keys.insert(entity.key.as_str()) {
                problems.push(format!(
                    "entity '{}' appears more than once in variable '{}'",
                    entity.key, variable.name
                ));
            }

            let mut times = HashSet::new();
            for point in &entity.values {
                if !times.insert(point.x.as_str()) {
                    problems.push(format!(
                        "entity '{}' has more than one value for '{}' in variable '{}'",
                        entity.key, point.x, variable.name
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ImportError::ValidationError {
            message: problems.join("; "),
        })
    }
}

/// Runs the server round-trip and applies the strictness policy.
///
/// Unmatched names are only warnings by default; the server creates them on import.
pub async fn check_entities<V: EntityValidator + ?Sized>(
    validator: &V,
    names: &[String],
    strict: bool,
) -> Result<EntityReport> {
    if names.is_empty() {
        return Ok(EntityReport::default());
    }

    tracing::info!("🔎 Validating {} entity name(s) against the server", names.len());
    let report = validator.validate_entities(names).await?;

    if report.is_valid() {
        tracing::info!("✅ All {} entity name(s) matched", report.checked);
        return Ok(report);
    }

    if strict {
        return Err(ImportError::ValidationError {
            message: format!(
                "{} entity name(s) are not in the canonical list: {}",
                report.unmatched.len(),
                report.unmatched.join(", ")
            ),
        });
    }

    for name in &report.unmatched {
        tracing::warn!("⚠️ Entity '{}' is not in the canonical list and will be created", name);
    }
    Ok(report)
}
