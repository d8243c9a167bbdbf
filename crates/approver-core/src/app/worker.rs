//! ApprovalWorker - 承認ワーカーの組み立て
//!
//! config・registry・lock・broker から、2 つの操作を登録済みの
//! `ConnectionSupervisor` を作ります。

use std::sync::Arc;

use tracing::info;

use super::approvals::ApprovalAdapter;
use super::builder::{BuildError, DispatcherBuilder};
use super::dispatcher::Dispatcher;
use super::handlers::{ApproveJobHandler, JobsAwaitingApprovalHandler};
use super::lock_guard::LockGuard;
use super::supervisor::ConnectionSupervisor;
use crate::config::{ConfigError, WorkerConfig};
use crate::domain::ApprovalRegistry;
use crate::ports::{AdvisoryLock, Broker};
use crate::typed::{ApproveJob, GetJobsAwaitingApproval, Operation, RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Dispatcher serving `approveJob` and `getJobsAwaitingApproval`.
pub fn approval_dispatcher(
    registry: ApprovalRegistry,
    guard: LockGuard,
) -> Result<Dispatcher, WorkerError> {
    let approvals = ApprovalAdapter::new(registry);
    let dispatcher = DispatcherBuilder::new()
        .register::<ApproveJob, _>(ApproveJobHandler::new(approvals.clone()))?
        .register::<GetJobsAwaitingApproval, _>(JobsAwaitingApprovalHandler::new(approvals, guard))?
        .expect_operations(&[ApproveJob::NAME, GetJobsAwaitingApproval::NAME])
        .build()?;
    Ok(dispatcher)
}

pub struct ApprovalWorker {
    config: WorkerConfig,
    registry: ApprovalRegistry,
    lock: Arc<dyn AdvisoryLock>,
}

impl ApprovalWorker {
    pub fn new(config: WorkerConfig, registry: ApprovalRegistry, lock: Arc<dyn AdvisoryLock>) -> Self {
        Self {
            config,
            registry,
            lock,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Wire the supervisor against `broker`. Nothing connects until it runs.
    pub fn supervisor(&self, broker: Arc<dyn Broker>) -> Result<ConnectionSupervisor, WorkerError> {
        let client_id = self.config.identity.client_id()?;
        let guard = LockGuard::new(self.lock.clone(), self.config.lock.policy());
        let dispatcher = approval_dispatcher(self.registry.clone(), guard)?;
        info!(
            %client_id,
            endpoint = %broker.endpoint(),
            operations = ?dispatcher.operations(),
            "approval worker assembled"
        );
        Ok(ConnectionSupervisor::new(
            broker,
            Arc::new(dispatcher),
            client_id,
            self.config.backoff.policy(),
        ))
    }
}
