// handlers/protected/mod.rs - Handlers that run as the caller's system identity
//
// Every handler here takes `Credentials` as an extractor, so a request without
// usable credentials is rejected before the handler body runs. The body then
// follows the dispatcher contract in crate::dispatch.

pub mod crontab;
pub mod group;
pub mod hardware;
pub mod host;
pub mod storage;
pub mod user;
