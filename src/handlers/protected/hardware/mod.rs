// handlers/protected/hardware - /hardware/{cpu,gpu,ram}
//
// Read-only telemetry. GPU queries surface UnsupportedDevice (422) when the
// card or its vendor tooling is missing.

pub mod cpu;
pub mod gpu;
pub mod ram;
