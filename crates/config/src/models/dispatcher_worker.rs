use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// Upper bound accepted for `max_files` and `max_workers`
const HARD_LIMIT: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub input_dir: String,
    /// Identities of every participating worker
    pub workers: Vec<String>,
    /// Workers that never receive blur tasks
    pub blur_excluded_workers: Vec<String>,
    pub max_files: usize,
    pub max_path_len: usize,
    pub max_workers: usize,
    pub report_path: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            input_dir: "images".to_string(),
            workers: (1..=4).map(|id| id.to_string()).collect(),
            blur_excluded_workers: vec!["10".to_string(), "11".to_string()],
            max_files: 600,
            max_path_len: 100,
            max_workers: 128,
            report_path: "results.txt".to_string(),
        }
    }
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_bind_address(&self.bind_address, "dispatcher.bind_address")?;
        ValidationUtils::validate_not_empty(&self.input_dir, "dispatcher.input_dir")?;
        ValidationUtils::validate_not_empty(&self.report_path, "dispatcher.report_path")?;

        ValidationUtils::validate_count(self.max_files, "dispatcher.max_files", HARD_LIMIT)?;
        ValidationUtils::validate_count(self.max_workers, "dispatcher.max_workers", HARD_LIMIT)?;
        ValidationUtils::validate_count(self.max_path_len, "dispatcher.max_path_len", 4096)?;

        ValidationUtils::validate_count(self.workers.len(), "dispatcher.workers", self.max_workers)?;
        ValidationUtils::validate_unique(&self.workers, "dispatcher.workers")?;
        ValidationUtils::validate_unique(
            &self.blur_excluded_workers,
            "dispatcher.blur_excluded_workers",
        )?;

        Ok(())
    }
}

impl DispatcherConfig {
    /// Roster members that are allowed to take blur tasks
    pub fn blur_eligible_workers(&self) -> impl Iterator<Item = &String> {
        self.workers
            .iter()
            .filter(|id| !self.blur_excluded_workers.contains(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub worker_id: String,
    pub dispatcher_url: String,
    pub output_dir: String,
    pub request_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            worker_id: "1".to_string(),
            dispatcher_url: "http://127.0.0.1:8080".to_string(),
            output_dir: "results".to_string(),
            request_timeout_seconds: 300,
        }
    }
}

impl ConfigValidator for WorkerConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.worker_id, "worker.worker_id")?;
        ValidationUtils::validate_url(&self.dispatcher_url, "worker.dispatcher_url")?;
        ValidationUtils::validate_not_empty(&self.output_dir, "worker.output_dir")?;
        ValidationUtils::validate_timeout_seconds(self.request_timeout_seconds)?;
        Ok(())
    }
}
