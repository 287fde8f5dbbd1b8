use async_trait::async_trait;

use super::*;

/// Manager factory used when the binary runs without domain managers linked
/// in. Authentication still happens; every operation then reports an
/// execution failure naming the missing manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

struct Detached {
    domain: &'static str,
    _ctx: ExecutionContext,
}

impl Detached {
    fn boxed(domain: &'static str, ctx: ExecutionContext) -> Box<Self> {
        tracing::debug!("No {} manager installed (caller {})", domain, ctx.identity());
        Box::new(Self { domain, _ctx: ctx })
    }

    fn fail<T>(&self) -> ManagerResult<T> {
        Err(DomainFailure::execution(format!("no {} manager is installed", self.domain)))
    }
}

impl ManagerFactory for Unavailable {
    fn users(&self, ctx: ExecutionContext) -> Box<dyn UserManager> {
        Detached::boxed("user", ctx)
    }

    fn groups(&self, ctx: ExecutionContext) -> Box<dyn GroupManager> {
        Detached::boxed("group", ctx)
    }

    fn crontab(&self, ctx: ExecutionContext) -> Box<dyn CrontabManager> {
        Detached::boxed("crontab", ctx)
    }

    fn host(&self, ctx: ExecutionContext) -> Box<dyn HostManager> {
        Detached::boxed("host", ctx)
    }

    fn disks(&self, ctx: ExecutionContext) -> Box<dyn DiskManager> {
        Detached::boxed("disk", ctx)
    }

    fn cpu(&self, ctx: ExecutionContext) -> Box<dyn CpuManager> {
        Detached::boxed("cpu", ctx)
    }

    fn gpu(&self, ctx: ExecutionContext) -> Box<dyn GpuManager> {
        Detached::boxed("gpu", ctx)
    }

    fn ram(&self, ctx: ExecutionContext) -> Box<dyn RamManager> {
        Detached::boxed("ram", ctx)
    }
}

#[async_trait]
impl UserManager for Detached {
    async fn get_users(&self) -> ManagerResult<Vec<User>> {
        self.fail()
    }
    async fn get_user(&self, _name: &str) -> ManagerResult<User> {
        self.fail()
    }
    async fn add_user(&self, _user: User) -> ManagerResult<User> {
        self.fail()
    }
    async fn edit_user(&self, _name: &str, _changes: User) -> ManagerResult<User> {
        self.fail()
    }
    async fn delete_user(&self, _name: &str) -> ManagerResult<()> {
        self.fail()
    }
}

#[async_trait]
impl GroupManager for Detached {
    async fn get_groups(&self) -> ManagerResult<Vec<Group>> {
        self.fail()
    }
    async fn get_group(&self, _name: &str) -> ManagerResult<Group> {
        self.fail()
    }
    async fn add_group(&self, _group: Group) -> ManagerResult<Group> {
        self.fail()
    }
    async fn edit_group(&self, _name: &str, _group: Group) -> ManagerResult<Group> {
        self.fail()
    }
    async fn add_user_to_group(&self, _group: &str, _user: &str) -> ManagerResult<Group> {
        self.fail()
    }
    async fn remove_user_from_group(&self, _group: &str, _user: &str) -> ManagerResult<Group> {
        self.fail()
    }
    async fn delete_group(&self, _name: &str) -> ManagerResult<()> {
        self.fail()
    }
}

#[async_trait]
impl CrontabManager for Detached {
    async fn get_cron_jobs(&self) -> ManagerResult<Vec<CronJob>> {
        self.fail()
    }
    async fn add_cron_job(&self, _job: CronJob) -> ManagerResult<CronJob> {
        self.fail()
    }
    async fn edit_cron_job(&self, _old: CronJob, _new: CronJob) -> ManagerResult<CronJob> {
        self.fail()
    }
    async fn delete_cron_job(&self, _job: CronJob) -> ManagerResult<()> {
        self.fail()
    }
}

#[async_trait]
impl HostManager for Detached {
    async fn get_host(&self) -> ManagerResult<Document> {
        self.fail()
    }
}

#[async_trait]
impl DiskManager for Detached {
    async fn get_disks(&self) -> ManagerResult<Vec<Document>> {
        self.fail()
    }
}

#[async_trait]
impl CpuManager for Detached {
    async fn get_cpu(&self) -> ManagerResult<Document> {
        self.fail()
    }
    async fn get_cpu_use(&self) -> ManagerResult<f64> {
        self.fail()
    }
    async fn get_cpu_temperature(&self) -> ManagerResult<f64> {
        self.fail()
    }
}

#[async_trait]
impl GpuManager for Detached {
    async fn get_gpu(&self) -> ManagerResult<Document> {
        self.fail()
    }
    async fn get_use(&self) -> ManagerResult<f64> {
        self.fail()
    }
    async fn get_temperature(&self) -> ManagerResult<f64> {
        self.fail()
    }
}

#[async_trait]
impl RamManager for Detached {
    async fn get_ram(&self) -> ManagerResult<Vec<Document>> {
        self.fail()
    }
    async fn get_use(&self) -> ManagerResult<RamUsage> {
        self.fail()
    }
}
