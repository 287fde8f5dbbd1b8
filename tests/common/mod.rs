#![allow(dead_code)]

// In-process test server backed by fake collaborators: an account table in
// place of su, a sudoers list in place of sudo, and managers that keep their
// state in memory.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use host_admin_api::auth::{ContextFactory, ExecutionContext, IdentityVerifier, Secret, VerifyError};
use host_admin_api::config::{AppConfig, CredentialSchemes};
use host_admin_api::failure::{DomainFailure, ResourceKind};
use host_admin_api::managers::{
    CpuManager, CronJob, CrontabManager, DiskManager, Document, GpuManager, Group, GroupManager, HostManager,
    ManagerFactory, ManagerResult, RamManager, RamUsage, User, UserManager,
};
use host_admin_api::shell::{privilege_refusal, CommandOutput, CommandRunner, ShellCommand};
use host_admin_api::GatewayState;

pub const ALICE: (&str, &str) = ("alice", "alice-secret");
pub const BOB: (&str, &str) = ("bob", "bob-secret");
pub const ROOT: (&str, &str) = ("root", "root-secret");
/// Verifier cannot reach the account database for this one
pub const BROKEN: (&str, &str) = ("broken", "broken-secret");

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub verifier_calls: Arc<AtomicUsize>,
    pub commands: Arc<Mutex<Vec<RecordedCommand>>>,
    pub inventory: Arc<Mutex<Inventory>>,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path))
    }

    pub fn verifier_calls(&self) -> usize {
        self.verifier_calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands.lock().unwrap().clone()
    }
}

/// Attach the `username` / `password` header pair
pub trait WithCredentials {
    fn credentials(self, account: (&str, &str)) -> Self;
}

impl WithCredentials for reqwest::RequestBuilder {
    fn credentials(self, (user, password): (&str, &str)) -> Self {
        self.header("username", user).header("password", encode(password))
    }
}

pub fn encode(secret: &str) -> String {
    STANDARD.encode(secret)
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(CredentialSchemes::default()).await
}

pub async fn spawn_server_with(schemes: CredentialSchemes) -> Result<TestServer> {
    let verifier = FakeVerifier::new();
    let verifier_calls = Arc::clone(&verifier.calls);
    let runner = FakeRunner::new(&[ROOT.0]);
    let commands = Arc::clone(&runner.commands);
    let inventory = Arc::new(Mutex::new(Inventory::seeded()));

    let contexts = ContextFactory::new(Arc::new(verifier), Arc::new(runner)).with_audit(true);
    let managers = InMemory {
        inventory: Arc::clone(&inventory),
    };
    let state = GatewayState::new(contexts, Arc::new(managers)).with_schemes(schemes);
    let router = host_admin_api::app(state, &AppConfig::development());

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        verifier_calls,
        commands,
        inventory,
        handle,
    })
}

// --- Identity verification ---

struct FakeVerifier {
    accounts: HashMap<&'static str, &'static str>,
    calls: Arc<AtomicUsize>,
}

impl FakeVerifier {
    fn new() -> Self {
        let accounts = [ALICE, BOB, ROOT, BROKEN].into_iter().collect();
        Self {
            accounts,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, identity: &str, secret: &Secret) -> Result<(), VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if identity == BROKEN.0 {
            return Err(VerifyError::Unavailable("getent timed out".into()));
        }
        match self.accounts.get(identity) {
            None => Err(VerifyError::UnknownIdentity),
            Some(expected) if *expected == secret.expose() => Ok(()),
            Some(_) => Err(VerifyError::SecretRejected),
        }
    }
}

// --- Command execution ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub identity: String,
    pub line: String,
    pub privileged: bool,
}

struct FakeRunner {
    sudoers: HashSet<String>,
    commands: Arc<Mutex<Vec<RecordedCommand>>>,
}

impl FakeRunner {
    fn new(sudoers: &[&str]) -> Self {
        Self {
            sudoers: sudoers.iter().map(|s| s.to_string()).collect(),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run_as(
        &self,
        identity: &str,
        _secret: &Secret,
        command: &ShellCommand,
        privileged: bool,
    ) -> Result<CommandOutput, DomainFailure> {
        self.commands.lock().unwrap().push(RecordedCommand {
            identity: identity.to_string(),
            line: command.to_shell_line(),
            privileged,
        });

        if privileged && !self.sudoers.contains(identity) {
            let stderr = format!("{} is not in the sudoers file.  This incident will be reported.", identity);
            return Err(privilege_refusal(&stderr).unwrap_or_else(|| DomainFailure::privileges(stderr)));
        }
        Ok(CommandOutput::default())
    }
}

// --- Managers ---

/// Host state the in-memory managers act on
#[derive(Debug, Default)]
pub struct Inventory {
    pub users: BTreeMap<String, User>,
    pub groups: BTreeMap<String, Group>,
    pub crontabs: HashMap<String, Vec<CronJob>>,
}

impl Inventory {
    fn seeded() -> Self {
        let mut inventory = Inventory::default();
        for (name, attributes) in [
            ("alice", json!({"uid": 1001, "shell": "/bin/bash", "primary_group": "staff"})),
            ("bob", json!({"uid": 1002, "shell": "/bin/zsh", "logged_in": true})),
            ("root", json!({"uid": 0, "shell": "/bin/bash"})),
        ] {
            let mut user = User::named(name);
            user.attributes = object(attributes);
            inventory.users.insert(name.to_string(), user);
        }
        for (name, attributes) in [
            ("staff", json!({"gid": 50, "members": ["alice"]})),
            ("wheel", json!({"gid": 10, "members": ["root"]})),
        ] {
            let mut group = Group::named(name);
            group.attributes = object(attributes);
            inventory.groups.insert(name.to_string(), group);
        }
        inventory.crontabs.insert(
            "alice".to_string(),
            vec![cron_job(json!({"minute": "0", "hour": "*", "command": "backup.sh"}))],
        );
        inventory
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn cron_job(value: Value) -> CronJob {
    CronJob(object(value))
}

struct InMemory {
    inventory: Arc<Mutex<Inventory>>,
}

impl InMemory {
    fn scoped(&self, ctx: ExecutionContext) -> Box<Scoped> {
        Box::new(Scoped {
            ctx,
            inventory: Arc::clone(&self.inventory),
        })
    }
}

impl ManagerFactory for InMemory {
    fn users(&self, ctx: ExecutionContext) -> Box<dyn UserManager> {
        self.scoped(ctx)
    }
    fn groups(&self, ctx: ExecutionContext) -> Box<dyn GroupManager> {
        self.scoped(ctx)
    }
    fn crontab(&self, ctx: ExecutionContext) -> Box<dyn CrontabManager> {
        self.scoped(ctx)
    }
    fn host(&self, ctx: ExecutionContext) -> Box<dyn HostManager> {
        self.scoped(ctx)
    }
    fn disks(&self, ctx: ExecutionContext) -> Box<dyn DiskManager> {
        self.scoped(ctx)
    }
    fn cpu(&self, ctx: ExecutionContext) -> Box<dyn CpuManager> {
        self.scoped(ctx)
    }
    fn gpu(&self, ctx: ExecutionContext) -> Box<dyn GpuManager> {
        self.scoped(ctx)
    }
    fn ram(&self, ctx: ExecutionContext) -> Box<dyn RamManager> {
        self.scoped(ctx)
    }
}

struct Scoped {
    ctx: ExecutionContext,
    inventory: Arc<Mutex<Inventory>>,
}

impl Scoped {
    async fn privileged(&self, program: &str, name: &str) -> ManagerResult<()> {
        self.ctx.run_privileged(&ShellCommand::new(program).arg(name)).await?;
        Ok(())
    }

    async fn plain(&self, program: &str) -> ManagerResult<()> {
        self.ctx.run(&ShellCommand::new(program)).await?;
        Ok(())
    }
}

fn merge(target: &mut Map<String, Value>, changes: Map<String, Value>) {
    for (key, value) in changes {
        target.insert(key, value);
    }
}

fn members_mut(group: &mut Group) -> &mut Vec<Value> {
    let members = group
        .attributes
        .entry("members")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !members.is_array() {
        *members = Value::Array(Vec::new());
    }
    members.as_array_mut().expect("members is an array")
}

#[async_trait]
impl UserManager for Scoped {
    async fn get_users(&self) -> ManagerResult<Vec<User>> {
        self.plain("getent").await?;
        Ok(self.inventory.lock().unwrap().users.values().cloned().collect())
    }

    async fn get_user(&self, name: &str) -> ManagerResult<User> {
        self.plain("getent").await?;
        self.inventory
            .lock()
            .unwrap()
            .users
            .get(name)
            .cloned()
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::User, name))
    }

    async fn add_user(&self, user: User) -> ManagerResult<User> {
        let name = user.name.clone().unwrap_or_default();
        self.privileged("useradd", &name).await?;
        let mut inventory = self.inventory.lock().unwrap();
        if inventory.users.contains_key(&name) {
            return Err(DomainFailure::already_exists(ResourceKind::User, name));
        }
        inventory.users.insert(name, user.clone());
        Ok(user)
    }

    async fn edit_user(&self, name: &str, changes: User) -> ManagerResult<User> {
        self.privileged("usermod", name).await?;
        let mut inventory = self.inventory.lock().unwrap();
        let mut user = inventory
            .users
            .get(name)
            .cloned()
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::User, name))?;

        let new_name = changes.name.clone().unwrap_or_else(|| name.to_string());
        if new_name != name && inventory.users.contains_key(&new_name) {
            return Err(DomainFailure::already_exists(ResourceKind::User, new_name));
        }
        merge(&mut user.attributes, changes.attributes);
        user.name = Some(new_name.clone());
        inventory.users.remove(name);
        inventory.users.insert(new_name, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, name: &str) -> ManagerResult<()> {
        self.privileged("userdel", name).await?;
        let mut inventory = self.inventory.lock().unwrap();
        let user = inventory
            .users
            .get(name)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::User, name))?;
        if user.attributes.get("logged_in") == Some(&Value::Bool(true)) {
            return Err(DomainFailure::in_use(ResourceKind::User, name));
        }
        inventory.users.remove(name);
        Ok(())
    }
}

#[async_trait]
impl GroupManager for Scoped {
    async fn get_groups(&self) -> ManagerResult<Vec<Group>> {
        self.plain("getent").await?;
        Ok(self.inventory.lock().unwrap().groups.values().cloned().collect())
    }

    async fn get_group(&self, name: &str) -> ManagerResult<Group> {
        self.plain("getent").await?;
        self.inventory
            .lock()
            .unwrap()
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::Group, name))
    }

    async fn add_group(&self, group: Group) -> ManagerResult<Group> {
        let name = group.name.clone().unwrap_or_default();
        self.privileged("groupadd", &name).await?;
        let mut inventory = self.inventory.lock().unwrap();
        if inventory.groups.contains_key(&name) {
            return Err(DomainFailure::already_exists(ResourceKind::Group, name));
        }
        inventory.groups.insert(name, group.clone());
        Ok(group)
    }

    async fn edit_group(&self, name: &str, changes: Group) -> ManagerResult<Group> {
        self.privileged("groupmod", name).await?;
        let mut inventory = self.inventory.lock().unwrap();
        let mut group = inventory
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::Group, name))?;

        let new_name = changes.name.clone().unwrap_or_else(|| name.to_string());
        if new_name != name && inventory.groups.contains_key(&new_name) {
            return Err(DomainFailure::already_exists(ResourceKind::Group, new_name));
        }
        merge(&mut group.attributes, changes.attributes);
        group.name = Some(new_name.clone());
        inventory.groups.remove(name);
        inventory.groups.insert(new_name, group.clone());
        Ok(group)
    }

    async fn add_user_to_group(&self, group: &str, user: &str) -> ManagerResult<Group> {
        self.privileged("gpasswd", group).await?;
        let mut inventory = self.inventory.lock().unwrap();
        if !inventory.users.contains_key(user) {
            return Err(DomainFailure::not_found(ResourceKind::User, user));
        }
        let entry = inventory
            .groups
            .get_mut(group)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::Group, group))?;
        let members = members_mut(entry);
        if !members.iter().any(|m| m == user) {
            members.push(Value::String(user.to_string()));
        }
        Ok(entry.clone())
    }

    async fn remove_user_from_group(&self, group: &str, user: &str) -> ManagerResult<Group> {
        self.privileged("gpasswd", group).await?;
        let mut inventory = self.inventory.lock().unwrap();
        let entry = inventory
            .groups
            .get_mut(group)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::Group, group))?;
        let members = members_mut(entry);
        let before = members.len();
        members.retain(|m| m != user);
        if members.len() == before {
            return Err(DomainFailure::not_found(ResourceKind::User, user));
        }
        Ok(entry.clone())
    }

    async fn delete_group(&self, name: &str) -> ManagerResult<()> {
        self.privileged("groupdel", name).await?;
        let mut inventory = self.inventory.lock().unwrap();
        if !inventory.groups.contains_key(name) {
            return Err(DomainFailure::not_found(ResourceKind::Group, name));
        }
        let primary = inventory
            .users
            .values()
            .any(|u| u.attributes.get("primary_group").and_then(Value::as_str) == Some(name));
        if primary {
            return Err(DomainFailure::in_use(ResourceKind::Group, name));
        }
        inventory.groups.remove(name);
        Ok(())
    }
}

#[async_trait]
impl CrontabManager for Scoped {
    async fn get_cron_jobs(&self) -> ManagerResult<Vec<CronJob>> {
        self.plain("crontab").await?;
        let identity = self.ctx.identity();
        self.inventory
            .lock()
            .unwrap()
            .crontabs
            .get(identity)
            .cloned()
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::CronFile, identity))
    }

    async fn add_cron_job(&self, job: CronJob) -> ManagerResult<CronJob> {
        if !job.0.contains_key("command") {
            return Err(DomainFailure::invalid_format("cron job has no command"));
        }
        self.plain("crontab").await?;
        let mut inventory = self.inventory.lock().unwrap();
        inventory
            .crontabs
            .entry(self.ctx.identity().to_string())
            .or_default()
            .push(job.clone());
        Ok(job)
    }

    async fn edit_cron_job(&self, old: CronJob, new: CronJob) -> ManagerResult<CronJob> {
        self.plain("crontab").await?;
        let identity = self.ctx.identity();
        let mut inventory = self.inventory.lock().unwrap();
        let jobs = inventory
            .crontabs
            .get_mut(identity)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::CronFile, identity))?;
        let slot = jobs
            .iter_mut()
            .find(|job| **job == old)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::CronJob, "entry"))?;
        *slot = new.clone();
        Ok(new)
    }

    async fn delete_cron_job(&self, job: CronJob) -> ManagerResult<()> {
        self.plain("crontab").await?;
        let identity = self.ctx.identity();
        let mut inventory = self.inventory.lock().unwrap();
        let jobs = inventory
            .crontabs
            .get_mut(identity)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::CronFile, identity))?;
        let position = jobs
            .iter()
            .position(|j| *j == job)
            .ok_or_else(|| DomainFailure::not_found(ResourceKind::CronJob, "entry"))?;
        jobs.remove(position);
        Ok(())
    }
}

#[async_trait]
impl HostManager for Scoped {
    async fn get_host(&self) -> ManagerResult<Document> {
        self.plain("hostnamectl").await?;
        Ok(json!({"hostname": "testbox", "os": "Linux", "kernel": "6.1.0"}))
    }
}

#[async_trait]
impl DiskManager for Scoped {
    async fn get_disks(&self) -> ManagerResult<Vec<Document>> {
        self.plain("lsblk").await?;
        Ok(vec![
            json!({"name": "sda", "size": 512_000_000_000u64, "type": "disk"}),
            json!({"name": "sdb", "size": 1_000_000_000_000u64, "type": "disk"}),
        ])
    }
}

#[async_trait]
impl CpuManager for Scoped {
    async fn get_cpu(&self) -> ManagerResult<Document> {
        self.plain("lscpu").await?;
        Ok(json!({"model": "Test CPU", "cores": 8}))
    }

    async fn get_cpu_use(&self) -> ManagerResult<f64> {
        Ok(12.5)
    }

    async fn get_cpu_temperature(&self) -> ManagerResult<f64> {
        Ok(48.0)
    }
}

#[async_trait]
impl GpuManager for Scoped {
    async fn get_gpu(&self) -> ManagerResult<Document> {
        Err(DomainFailure::unsupported_device("no supported GPU detected"))
    }

    async fn get_use(&self) -> ManagerResult<f64> {
        Err(DomainFailure::unsupported_device("no supported GPU detected"))
    }

    async fn get_temperature(&self) -> ManagerResult<f64> {
        Err(DomainFailure::unsupported_device("no supported GPU detected"))
    }
}

#[async_trait]
impl RamManager for Scoped {
    async fn get_ram(&self) -> ManagerResult<Vec<Document>> {
        self.plain("dmidecode").await?;
        Ok(vec![json!({"size": 8_589_934_592u64, "type": "DDR4"})])
    }

    async fn get_use(&self) -> ManagerResult<RamUsage> {
        Ok(RamUsage {
            size: 16_000_000_000,
            used: 4_000_000_000,
        })
    }
}
