use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{Bridge, Coordinator, NodeConfig, Result, WaveSyncError};

/// Factory that allows at most one live [`Coordinator`] at a time.
///
/// The registry is owned by the application's composition root. Separate
/// registries are independent, so tests can run several logical nodes side
/// by side.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    claimed: Arc<AtomicBool>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a node on top of `bridge` and starts bridge initialisation.
    pub fn create<B: Bridge + 'static>(
        &self,
        config: NodeConfig,
        bridge: B,
    ) -> Result<Coordinator<B>> {
        let claim = RegistryClaim::acquire(&self.claimed)?;
        Coordinator::new(config, bridge, claim)
    }

    pub fn has_live_node(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// Held by a coordinator for its lifetime; releases the registry on drop.
#[derive(Debug)]
pub(crate) struct RegistryClaim {
    flag: Arc<AtomicBool>,
}

impl RegistryClaim {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WaveSyncError::AlreadyCreated)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for RegistryClaim {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LoopbackBridge, NodeRole};

    #[test]
    fn second_node_is_refused_while_first_is_alive() {
        let registry = NodeRegistry::new();
        let (bridge, _handle) = LoopbackBridge::new();
        let first = registry
            .create(NodeConfig::new("lo", 1), bridge)
            .expect("first node should be created");

        let (bridge, _handle) = LoopbackBridge::new();
        let err = registry
            .create(NodeConfig::new("lo", 1).with_mode(NodeRole::Controller), bridge)
            .unwrap_err();
        assert!(matches!(err, WaveSyncError::AlreadyCreated));

        assert_eq!(first.mode(), NodeRole::Receiver);
        assert!(registry.has_live_node());
    }

    #[test]
    fn dropping_the_node_releases_the_registry() {
        let registry = NodeRegistry::new();
        let (bridge, _handle) = LoopbackBridge::new();
        let node = registry.create(NodeConfig::new("lo", 1), bridge).unwrap();
        drop(node);
        assert!(!registry.has_live_node());

        let (bridge, _handle) = LoopbackBridge::new();
        assert!(registry.create(NodeConfig::new("lo", 1), bridge).is_ok());
    }

    #[test]
    fn failed_construction_does_not_hold_the_claim() {
        let registry = NodeRegistry::new();
        let (bridge, _handle) = LoopbackBridge::new();
        assert!(registry.create(NodeConfig::new("", 1), bridge).is_err());
        assert!(!registry.has_live_node());
    }

    #[test]
    fn registries_are_independent() {
        let left = NodeRegistry::new();
        let right = NodeRegistry::new();
        let (bridge_a, _a) = LoopbackBridge::new();
        let (bridge_b, _b) = LoopbackBridge::new();

        let _left_node = left.create(NodeConfig::new("lo", 1), bridge_a).unwrap();
        let _right_node = right.create(NodeConfig::new("lo", 1), bridge_b).unwrap();
        assert!(left.has_live_node() && right.has_live_node());
    }
}
