// handlers/mod.rs - Two-tier handler layout
//
// Public (no credentials) → Protected (credentials, executed as the caller)

pub mod public; // Tier 1: service descriptor and health
pub mod protected; // Tier 2: every administrative resource
