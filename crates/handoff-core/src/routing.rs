//! Default delegation routing.
//!
//! `NameMatchRouter` tests each delegate in declared order and picks the
//! first whose name appears in the input, ignoring case. The heuristic is
//! brittle: an input naming two delegates resolves by list order alone, and
//! an input that never spells out a delegate's name falls back to the invoked
//! agent. Swap in another `DelegationRouter` to change the policy.

use std::sync::Arc;

use crate::{agent::Agent, traits::DelegationRouter};

#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatchRouter;

impl DelegationRouter for NameMatchRouter {
    fn route<'a>(&self, agent: &'a Agent, input: &str) -> Option<&'a Arc<Agent>> {
        let haystack = input.to_lowercase();
        agent
            .delegates()
            .iter()
            .find(|delegate| {
                let needle = delegate.name().trim().to_lowercase();
                !needle.is_empty() && haystack.contains(&needle)
            })
    }
}
