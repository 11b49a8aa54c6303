//! # VIGIL - Governance for Decentralized Sensor Crews
//!
//! A deterministic governance and consensus state machine providing:
//! - **Identity**: agent registration with anti-Sybil node quotas and
//!   reputation-weighted trust
//! - **Consensus**: Byzantine-fault-tolerant voting rounds scoped to
//!   ad-hoc sensor crews
//! - **Audit**: signed, replay-protected decision records with
//!   deterministic multi-party conflict resolution
//! - **Policy**: tunable governance parameters behind an authorization gate
//!
//! Every public operation is a complete atomic state transition: an external
//! total-order layer delivers calls one at a time with their timestamps, and
//! a failed call leaves no trace. Replicas executing the same call sequence
//! reach identical state.
//!
//! ## Quick Start
//!
//! ```rust
//! use vigil::core::{now, sha3_256, AccessControl};
//! use vigil::events::NotificationLog;
//! use vigil::identity::{AgentRole, IdentityRegistry};
//! use vigil::policy::PolicyStore;
//!
//! let acl = AccessControl::new("admin");
//! let policy = PolicyStore::new();
//! let mut registry = IdentityRegistry::new();
//! let mut events = NotificationLog::new();
//!
//! for (i, role) in AgentRole::ALL.iter().enumerate() {
//!     let id = format!("agent-{i}");
//!     registry
//!         .register("admin", &acl, &id, &format!("node-{i}"), *role, now(), &mut events)
//!         .unwrap();
//! }
//! let members: Vec<String> = (0..4).map(|i| format!("agent-{i}")).collect();
//! let crew_id = registry
//!     .form_crew(&policy, sha3_256(b"anomaly"), &members, 5500, now(), &mut events)
//!     .unwrap();
//! assert_eq!(crew_id, 1);
//! ```

pub mod audit;
pub mod consensus;
pub mod core;
pub mod events;
pub mod identity;
pub mod policy;

pub use crate::core::error::{Error, Result};
