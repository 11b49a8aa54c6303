//! Authorization checks for administrative operations.
//!
//! A capability gate replaces any identity-scheme-specific "owner" notion:
//! each admin entry point names the capability it needs and the caller
//! presenting it. Capabilities are tracked per identity, so a caller can
//! hold one without the other.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A capability required to perform a gated operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Register agents, change agent status, adjust reputation.
    ManageAgents,
    /// Update governance policy parameters.
    ManagePolicy,
}

impl Capability {
    /// Every capability, as granted to the bootstrap administrator.
    pub const ALL: [Capability; 2] = [Capability::ManageAgents, Capability::ManagePolicy];
}

/// Tracks which caller identities hold which capabilities.
///
/// The bootstrap administrator is granted every capability. A capability
/// can only be extended or withdrawn by an identity that holds it, and its
/// last holder cannot be revoked, so no capability ever becomes
/// unreachable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessControl {
    grants: HashMap<String, HashSet<Capability>>,
}

impl AccessControl {
    /// Create an access control list with a single bootstrap administrator
    /// holding every capability.
    pub fn new(admin: &str) -> Self {
        let mut grants = HashMap::new();
        grants.insert(admin.to_string(), Capability::ALL.into_iter().collect());
        Self { grants }
    }

    /// Check that `caller` holds `capability`, failing the operation otherwise.
    pub fn require(&self, caller: &str, capability: Capability) -> Result<()> {
        if self.holds(caller, capability) {
            Ok(())
        } else {
            Err(Error::AuthorizationError(caller.to_string()))
        }
    }

    /// Grant a capability to another identity. The caller must hold the
    /// capability being granted.
    pub fn grant(&mut self, caller: &str, grantee: &str, capability: Capability) -> Result<()> {
        self.require(caller, capability)?;
        self.grants
            .entry(grantee.to_string())
            .or_default()
            .insert(capability);
        Ok(())
    }

    /// Withdraw a capability from an identity. The caller must hold the
    /// capability; its last holder cannot be revoked.
    pub fn revoke(&mut self, caller: &str, target: &str, capability: Capability) -> Result<()> {
        self.require(caller, capability)?;
        if self.holds(target, capability) && self.holder_count(capability) == 1 {
            return Err(Error::InvalidParameter(format!(
                "cannot revoke the last holder of {capability:?}"
            )));
        }
        if let Some(caps) = self.grants.get_mut(target) {
            caps.remove(&capability);
        }
        Ok(())
    }

    /// Whether an identity holds a capability.
    pub fn holds(&self, caller: &str, capability: Capability) -> bool {
        self.grants
            .get(caller)
            .is_some_and(|caps| caps.contains(&capability))
    }

    fn holder_count(&self, capability: Capability) -> usize {
        self.grants
            .values()
            .filter(|caps| caps.contains(&capability))
            .count()
    }
}
