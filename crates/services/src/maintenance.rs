use crate::error::ServiceError;
use core_types::{MaintainedTable, MaintenanceMode};
use database::{DbRepository, TableBackup, TableCleanup, TableValidation};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum MaintenanceOutcome {
    Validate(TableValidation),
    Clean(TableCleanup),
    Backup(TableBackup),
}

/// Result for one table in a `run_all`. A failing table does not stop the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TableOutcome {
    Ok { result: MaintenanceOutcome },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct MaintenanceService {
    repo: DbRepository,
}

impl MaintenanceService {
    pub fn new(repo: DbRepository) -> Self {
        Self { repo }
    }

    pub async fn run(
        &self,
        table: MaintainedTable,
        mode: MaintenanceMode,
        actor: &str,
    ) -> Result<MaintenanceOutcome, ServiceError> {
        let outcome = match mode {
            MaintenanceMode::Validate => {
                MaintenanceOutcome::Validate(self.repo.validate_table(table, actor).await?)
            }
            MaintenanceMode::Clean => MaintenanceOutcome::Clean(self.repo.clean_table(table, actor).await?),
            MaintenanceMode::Backup => {
                MaintenanceOutcome::Backup(self.repo.backup_table(table, actor).await?)
            }
        };
        Ok(outcome)
    }

    /// Runs `mode` over every maintained table, one after the other.
    pub async fn run_all(
        &self,
        mode: MaintenanceMode,
        actor: &str,
    ) -> BTreeMap<MaintainedTable, TableOutcome> {
        let mut results = BTreeMap::new();
        for table in MaintainedTable::ALL {
            let outcome = match self.run(table, mode, actor).await {
                Ok(result) => TableOutcome::Ok { result },
                Err(e) => {
                    tracing::error!(%table, %mode, error = %e, "Maintenance run failed.");
                    TableOutcome::Failed { error: e.to_string() }
                }
            };
            results.insert(table, outcome);
        }
        results
    }
}
