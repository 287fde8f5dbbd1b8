// Contract between the gateway and the domain managers.
//
// Domain managers are supplied by the embedding application. Each one is
// built from an owned ExecutionContext and lives for a single request.

pub mod model;
pub mod unavailable;

pub use model::{CronJob, CronJobChange, Document, Group, RamUsage, User};
pub use unavailable::Unavailable;

use async_trait::async_trait;

use crate::auth::ExecutionContext;
use crate::failure::DomainFailure;

pub type ManagerResult<T> = Result<T, DomainFailure>;

#[async_trait]
pub trait UserManager: Send + Sync {
    async fn get_users(&self) -> ManagerResult<Vec<User>>;
    async fn get_user(&self, name: &str) -> ManagerResult<User>;
    /// Create the user and return it as stored
    async fn add_user(&self, user: User) -> ManagerResult<User>;
    /// Apply changes (possibly a rename) and return the user as stored
    async fn edit_user(&self, name: &str, changes: User) -> ManagerResult<User>;
    async fn delete_user(&self, name: &str) -> ManagerResult<()>;
}

#[async_trait]
pub trait GroupManager: Send + Sync {
    async fn get_groups(&self) -> ManagerResult<Vec<Group>>;
    async fn get_group(&self, name: &str) -> ManagerResult<Group>;
    async fn add_group(&self, group: Group) -> ManagerResult<Group>;
    async fn edit_group(&self, name: &str, group: Group) -> ManagerResult<Group>;
    async fn add_user_to_group(&self, group: &str, user: &str) -> ManagerResult<Group>;
    async fn remove_user_from_group(&self, group: &str, user: &str) -> ManagerResult<Group>;
    async fn delete_group(&self, name: &str) -> ManagerResult<()>;
}

/// Crontab of the context's identity
#[async_trait]
pub trait CrontabManager: Send + Sync {
    async fn get_cron_jobs(&self) -> ManagerResult<Vec<CronJob>>;
    async fn add_cron_job(&self, job: CronJob) -> ManagerResult<CronJob>;
    async fn edit_cron_job(&self, old: CronJob, new: CronJob) -> ManagerResult<CronJob>;
    async fn delete_cron_job(&self, job: CronJob) -> ManagerResult<()>;
}

#[async_trait]
pub trait HostManager: Send + Sync {
    async fn get_host(&self) -> ManagerResult<Document>;
}

#[async_trait]
pub trait DiskManager: Send + Sync {
    async fn get_disks(&self) -> ManagerResult<Vec<Document>>;
}

#[async_trait]
pub trait CpuManager: Send + Sync {
    async fn get_cpu(&self) -> ManagerResult<Document>;
    async fn get_cpu_use(&self) -> ManagerResult<f64>;
    async fn get_cpu_temperature(&self) -> ManagerResult<f64>;
}

/// GPU queries raise UnsupportedDevice when the card or its driver tooling
/// is absent
#[async_trait]
pub trait GpuManager: Send + Sync {
    async fn get_gpu(&self) -> ManagerResult<Document>;
    async fn get_use(&self) -> ManagerResult<f64>;
    async fn get_temperature(&self) -> ManagerResult<f64>;
}

#[async_trait]
pub trait RamManager: Send + Sync {
    async fn get_ram(&self) -> ManagerResult<Vec<Document>>;
    async fn get_use(&self) -> ManagerResult<RamUsage>;
}

/// Builds request-scoped managers. Injected into GatewayState at startup.
pub trait ManagerFactory: Send + Sync {
    fn users(&self, ctx: ExecutionContext) -> Box<dyn UserManager>;
    fn groups(&self, ctx: ExecutionContext) -> Box<dyn GroupManager>;
    fn crontab(&self, ctx: ExecutionContext) -> Box<dyn CrontabManager>;
    fn host(&self, ctx: ExecutionContext) -> Box<dyn HostManager>;
    fn disks(&self, ctx: ExecutionContext) -> Box<dyn DiskManager>;
    fn cpu(&self, ctx: ExecutionContext) -> Box<dyn CpuManager>;
    fn gpu(&self, ctx: ExecutionContext) -> Box<dyn GpuManager>;
    fn ram(&self, ctx: ExecutionContext) -> Box<dyn RamManager>;
}
