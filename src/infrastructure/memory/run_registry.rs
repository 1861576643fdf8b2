//! Run Registry - 项目运行租约
//!
//! 每个项目同一时刻至多一个驱动任务。租约附带取消令牌用于协作式暂停。

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::project::ProjectId;

/// 租约错误
#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("Project is already running: {0}")]
    AlreadyRunning(ProjectId),
}

struct ActiveRun {
    generation: u64,
    token: CancellationToken,
}

/// 内存运行租约表
pub struct RunRegistry {
    /// project_id -> 当前运行
    runs: DashMap<ProjectId, ActiveRun>,
    next_generation: AtomicU64,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 获取项目租约；已有运行时返回 AlreadyRunning
    pub fn acquire(self: &Arc<Self>, project_id: &ProjectId) -> Result<RunLease, LeaseError> {
        match self.runs.entry(project_id.clone()) {
            Entry::Occupied(_) => Err(LeaseError::AlreadyRunning(project_id.clone())),
            Entry::Vacant(vacant) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let token = CancellationToken::new();
                vacant.insert(ActiveRun {
                    generation,
                    token: token.clone(),
                });

                tracing::debug!(project_id = %project_id, generation, "Run lease acquired");

                Ok(RunLease {
                    registry: Arc::clone(self),
                    project_id: project_id.clone(),
                    generation,
                    token,
                })
            }
        }
    }

    /// 请求取消当前运行，返回是否存在运行
    pub fn cancel(&self, project_id: &ProjectId) -> bool {
        match self.runs.get(project_id) {
            Some(run) => {
                run.token.cancel();
                tracing::debug!(project_id = %project_id, "Run cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, project_id: &ProjectId) -> bool {
        self.runs.contains_key(project_id)
    }

    fn release(&self, project_id: &ProjectId, generation: u64) {
        let removed = self
            .runs
            .remove_if(project_id, |_, run| run.generation == generation)
            .is_some();
        if removed {
            tracing::debug!(project_id = %project_id, generation, "Run lease released");
        }
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 项目运行租约，Drop 时释放
pub struct RunLease {
    registry: Arc<RunRegistry>,
    project_id: ProjectId,
    generation: u64,
    token: CancellationToken,
}

impl RunLease {
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// 是否已请求暂停
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        self.registry.release(&self.project_id, self.generation);
    }
}

impl std::fmt::Debug for RunLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLease")
            .field("project_id", &self.project_id)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_conflicts() {
        let registry = RunRegistry::new().arc();
        let project_id = ProjectId::new();

        let lease = registry.acquire(&project_id).unwrap();
        assert!(registry.is_running(&project_id));
        assert!(matches!(
            registry.acquire(&project_id),
            Err(LeaseError::AlreadyRunning(_))
        ));

        drop(lease);
        assert!(!registry.is_running(&project_id));
        assert!(registry.acquire(&project_id).is_ok());
    }

    #[test]
    fn test_cancel_signals_lease() {
        let registry = RunRegistry::new().arc();
        let project_id = ProjectId::new();

        assert!(!registry.cancel(&project_id));

        let lease = registry.acquire(&project_id).unwrap();
        assert!(!lease.is_cancelled());
        assert!(registry.cancel(&project_id));
        assert!(lease.is_cancelled());
    }

    #[test]
    fn test_distinct_projects_run_independently() {
        let registry = RunRegistry::new().arc();
        let a = registry.acquire(&ProjectId::new()).unwrap();
        let b = registry.acquire(&ProjectId::new()).unwrap();

        registry.cancel(a.project_id());
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
    }
}
