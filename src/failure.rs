// Domain failures raised by the gateway and by domain managers.
//
// Every failure carries exactly one FailureKind tag. The mapping from tag to
// HTTP response lives in error.rs and nowhere else.

use std::fmt;
use thiserror::Error;

/// Resource family a not-found / exists / in-use failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Group,
    CronFile,
    CronJob,
    Disk,
    Device,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::User => "user",
            ResourceKind::Group => "group",
            ResourceKind::CronFile => "crontab file",
            ResourceKind::CronJob => "cron job",
            ResourceKind::Disk => "disk",
            ResourceKind::Device => "device",
        };
        f.write_str(name)
    }
}

/// Closed set of reasons an operation could not complete
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainFailure {
    #[error("Required headers are missing.")]
    MissingCredentials,

    #[error("Invalid credential encoding: {0}")]
    MalformedEncoding(String),

    #[error("Authentication failure")]
    Authentication,

    #[error("Insufficient privileges: {0}")]
    Privileges(String),

    #[error("The {kind} {name} does not exist")]
    NotFound { kind: ResourceKind, name: String },

    #[error("The {kind} {name} already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("The {kind} {name} is in use")]
    InUse { kind: ResourceKind, name: String },

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    UnsupportedDevice(String),

    #[error("Command error: {0}")]
    Execution(String),
}

/// Fieldless tag of a DomainFailure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MissingCredentials,
    MalformedEncoding,
    Authentication,
    Privileges,
    NotFound,
    AlreadyExists,
    InUse,
    InvalidFormat,
    UnsupportedDevice,
    Execution,
}

impl FailureKind {
    pub const ALL: [FailureKind; 10] = [
        FailureKind::MissingCredentials,
        FailureKind::MalformedEncoding,
        FailureKind::Authentication,
        FailureKind::Privileges,
        FailureKind::NotFound,
        FailureKind::AlreadyExists,
        FailureKind::InUse,
        FailureKind::InvalidFormat,
        FailureKind::UnsupportedDevice,
        FailureKind::Execution,
    ];
}

impl DomainFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            DomainFailure::MissingCredentials => FailureKind::MissingCredentials,
            DomainFailure::MalformedEncoding(_) => FailureKind::MalformedEncoding,
            DomainFailure::Authentication => FailureKind::Authentication,
            DomainFailure::Privileges(_) => FailureKind::Privileges,
            DomainFailure::NotFound { .. } => FailureKind::NotFound,
            DomainFailure::AlreadyExists { .. } => FailureKind::AlreadyExists,
            DomainFailure::InUse { .. } => FailureKind::InUse,
            DomainFailure::InvalidFormat(_) => FailureKind::InvalidFormat,
            DomainFailure::UnsupportedDevice(_) => FailureKind::UnsupportedDevice,
            DomainFailure::Execution(_) => FailureKind::Execution,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        DomainFailure::MalformedEncoding(message.into())
    }

    pub fn privileges(message: impl Into<String>) -> Self {
        DomainFailure::Privileges(message.into())
    }

    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        DomainFailure::NotFound { kind, name: name.into() }
    }

    pub fn already_exists(kind: ResourceKind, name: impl Into<String>) -> Self {
        DomainFailure::AlreadyExists { kind, name: name.into() }
    }

    pub fn in_use(kind: ResourceKind, name: impl Into<String>) -> Self {
        DomainFailure::InUse { kind, name: name.into() }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        DomainFailure::InvalidFormat(message.into())
    }

    pub fn unsupported_device(message: impl Into<String>) -> Self {
        DomainFailure::UnsupportedDevice(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        DomainFailure::Execution(message.into())
    }

    /// Classify an arbitrary error chain. A DomainFailure anywhere in the
    /// chain wins; anything else is an execution failure.
    pub fn classify(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<DomainFailure>())
            .cloned()
            .unwrap_or_else(|| DomainFailure::Execution(format!("{:#}", err)))
    }
}

impl From<anyhow::Error> for DomainFailure {
    fn from(err: anyhow::Error) -> Self {
        DomainFailure::classify(&err)
    }
}

impl From<std::io::Error> for DomainFailure {
    fn from(err: std::io::Error) -> Self {
        DomainFailure::Execution(err.to_string())
    }
}
