use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    models::TaskKind,
    traits::{ExecutorRegistry, TaskExecutor},
    FleetResult,
};

pub struct DefaultExecutorRegistry {
    executors: Arc<RwLock<HashMap<TaskKind, Arc<dyn TaskExecutor>>>>,
}

impl DefaultExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register_batch(&mut self, executors: Vec<Arc<dyn TaskExecutor>>) -> FleetResult<()> {
        for executor in executors {
            self.register(executor).await?;
        }
        Ok(())
    }
}

impl Default for DefaultExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutorRegistry for DefaultExecutorRegistry {
    async fn register(&mut self, executor: Arc<dyn TaskExecutor>) -> FleetResult<()> {
        let mut registry = self.executors.write().await;
        let kind = executor.kind();
        if let Some(previous) = registry.insert(kind, executor) {
            warn!("任务类别 {} 的执行器 '{}' 已被替换", kind, previous.name());
        }
        Ok(())
    }

    async fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskExecutor>> {
        let registry = self.executors.read().await;
        registry.get(&kind).cloned()
    }

    async fn contains(&self, kind: TaskKind) -> bool {
        let registry = self.executors.read().await;
        registry.contains_key(&kind)
    }

    async fn count(&self) -> usize {
        let registry = self.executors.read().await;
        registry.len()
    }

    async fn list_executors(&self) -> HashMap<TaskKind, String> {
        let registry = self.executors.read().await;
        registry
            .iter()
            .map(|(kind, executor)| (*kind, executor.name().to_string()))
            .collect()
    }
}
