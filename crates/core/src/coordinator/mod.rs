//! The public node object.
//!
//! A [`Coordinator`] owns the node's animation state, enforces role and
//! lifecycle rules, forwards validated mutations to its [`Bridge`] and
//! republishes inbound bridge notifications as [`NodeEvent`]s.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crossbeam_channel::Receiver;

use crate::{
    normalize, registry::RegistryClaim, Bridge, BridgeSettings, EventBus, GuardedOperation,
    LifecycleGuard, LifecycleState, NodeConfig, NodeEvent, NodeRole, Result, WaveParameters,
    WaveParametersInput, WaveSyncError,
};

/// State shared between the coordinator and the bridge callbacks.
#[derive(Debug)]
struct NodeState {
    guard: LifecycleGuard,
    wave_parameters: WaveParameters,
    power_state: bool,
    brightness: u8,
    events: EventBus,
}

impl NodeState {
    fn new(role: NodeRole) -> Self {
        Self {
            guard: LifecycleGuard::new(role),
            wave_parameters: WaveParameters::empty(),
            power_state: false,
            brightness: 0,
            events: EventBus::new(),
        }
    }
}

/// A node in the animation network, either controller or receiver.
///
/// Nodes are built through [`NodeRegistry::create`](crate::NodeRegistry::create).
pub struct Coordinator<B: Bridge + 'static> {
    config: NodeConfig,
    state: Arc<Mutex<NodeState>>,
    bridge: Arc<Mutex<B>>,
    _claim: RegistryClaim,
}

impl<B: Bridge + 'static> Coordinator<B> {
    pub(crate) fn new(config: NodeConfig, mut bridge: B, claim: RegistryClaim) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(Mutex::new(NodeState::new(config.mode)));
        register_receive_handlers(&mut bridge, &state);

        let bridge = Arc::new(Mutex::new(bridge));
        let on_ready = ready_callback(Arc::downgrade(&bridge), Arc::clone(&state));

        tracing::info!(
            mode = %config.mode,
            interface = %config.network_interface,
            channel = config.channel,
            port = config.port,
            "initialising node"
        );

        let node = Self {
            config,
            state,
            bridge,
            _claim: claim,
        };
        node.lock_bridge()?
            .initialize(BridgeSettings::from(&node.config), on_ready);

        Ok(node)
    }

    /// Registers a new event subscriber.
    ///
    /// Only events published after this call are delivered to the returned
    /// receiver.
    pub fn subscribe(&self) -> Result<Receiver<NodeEvent>> {
        Ok(self.lock_state()?.events.subscribe())
    }

    /// Begins frame transmission or reception on the bridge.
    pub fn start(&self) -> Result<()> {
        self.check(GuardedOperation::Start)?;
        self.lock_bridge()?.start();
        Ok(())
    }

    /// Halts frame transmission or reception. Local state is kept.
    pub fn stop(&self) -> Result<()> {
        self.check(GuardedOperation::Stop)?;
        self.lock_bridge()?.stop();
        Ok(())
    }

    /// Replaces the node's wave parameters and distributes them.
    ///
    /// Only an initialized controller may call this. The input is normalised
    /// to the fixed wave capacity; on failure the current state is kept. No
    /// event is emitted for the caller's own write.
    pub fn set_wave_parameters(&self, input: &WaveParametersInput) -> Result<()> {
        let parameters = {
            let mut state = self.lock_state()?;
            state
                .guard
                .check(GuardedOperation::SetWaveParameters)
                .inspect_err(|err| tracing::warn!(%err, "rejected wave parameters"))?;
            let parameters = normalize(input, self.config.mode)?;
            state.wave_parameters = parameters.clone();
            parameters
        };

        tracing::debug!(
            active_waves = parameters.active_waves(),
            time_period = parameters.time_period,
            distance_period = parameters.distance_period,
            "pushing wave parameters"
        );
        self.lock_bridge()?.push_wave_parameters(parameters);
        Ok(())
    }

    /// Forwards a power state to the bridge regardless of lifecycle state.
    /// The local value only changes once the bridge reports it back.
    pub fn set_power_state(&self, power_state: bool) -> Result<()> {
        tracing::debug!(power_state, "pushing power state");
        self.lock_bridge()?.push_power_state(power_state);
        Ok(())
    }

    /// Forwards a brightness to the bridge regardless of lifecycle state.
    /// The local value only changes once the bridge reports it back.
    pub fn set_brightness(&self, brightness: u8) -> Result<()> {
        tracing::debug!(brightness, "pushing brightness");
        self.lock_bridge()?.push_brightness(brightness);
        Ok(())
    }

    pub fn wave_parameters(&self) -> Result<WaveParameters> {
        Ok(self.lock_state()?.wave_parameters.clone())
    }

    pub fn mode(&self) -> NodeRole {
        self.config.mode
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn power_state(&self) -> Result<bool> {
        Ok(self.lock_state()?.power_state)
    }

    pub fn brightness(&self) -> Result<u8> {
        Ok(self.lock_state()?.brightness)
    }

    pub fn lifecycle_state(&self) -> Result<LifecycleState> {
        Ok(self.lock_state()?.guard.state())
    }

    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.lock_state()?.guard.is_initialized())
    }

    /// Animation time as reported by the bridge clock. Never cached.
    pub fn animation_time(&self) -> Result<u64> {
        Ok(self.lock_bridge()?.current_animation_time())
    }

    fn check(&self, operation: GuardedOperation) -> Result<()> {
        self.lock_state()?
            .guard
            .check(operation)
            .inspect_err(|err| tracing::warn!(%err, "rejected operation"))
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, NodeState>> {
        self.state
            .lock()
            .map_err(|_| WaveSyncError::Poisoned("node state"))
    }

    fn lock_bridge(&self) -> Result<MutexGuard<'_, B>> {
        self.bridge
            .lock()
            .map_err(|_| WaveSyncError::Poisoned("bridge"))
    }
}

impl<B: Bridge + 'static> std::fmt::Debug for Coordinator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Runs `apply` against the shared state from inside a bridge callback,
/// where there is no caller to hand an error back to.
fn with_state(state: &Mutex<NodeState>, apply: impl FnOnce(&mut NodeState)) {
    match state.lock() {
        Ok(mut node) => apply(&mut node),
        Err(_) => tracing::error!("node state poisoned, dropping bridge notification"),
    }
}

fn register_receive_handlers<B: Bridge>(bridge: &mut B, state: &Arc<Mutex<NodeState>>) {
    let shared = Arc::clone(state);
    bridge.on_wave_parameters_received(Box::new(move |parameters: WaveParameters| {
        tracing::debug!(
            active_waves = parameters.active_waves(),
            "wave parameters received"
        );
        with_state(&shared, |node| {
            node.wave_parameters = parameters.clone();
            node.events
                .publish(NodeEvent::WaveParametersUpdated(parameters));
        });
    }));

    let shared = Arc::clone(state);
    bridge.on_power_state_received(Box::new(move |power_state: bool| {
        tracing::debug!(power_state, "power state received");
        with_state(&shared, |node| {
            node.power_state = power_state;
            node.events.publish(NodeEvent::PowerStateUpdated(power_state));
        });
    }));

    let shared = Arc::clone(state);
    bridge.on_brightness_received(Box::new(move |brightness: u8| {
        tracing::debug!(brightness, "brightness received");
        with_state(&shared, |node| {
            node.brightness = brightness;
            node.events.publish(NodeEvent::BrightnessUpdated(brightness));
        });
    }));
}

/// The bridge is held weakly: it owns this callback, so a strong reference
/// would keep both alive forever.
fn ready_callback<B: Bridge + 'static>(
    bridge: Weak<Mutex<B>>,
    state: Arc<Mutex<NodeState>>,
) -> crate::bridge::ReadyCallback {
    Box::new(move || {
        let parameters = match state.lock() {
            Ok(node) if node.guard.is_initialized() => {
                tracing::debug!("duplicate ready signal ignored");
                return;
            }
            Ok(node) => node.wave_parameters.clone(),
            Err(_) => {
                tracing::error!("node state poisoned, cannot complete initialisation");
                return;
            }
        };

        let Some(bridge) = bridge.upgrade() else {
            return;
        };
        match bridge.lock() {
            Ok(mut bridge) => bridge.push_wave_parameters(parameters),
            Err(_) => {
                tracing::error!("bridge poisoned, cannot complete initialisation");
                return;
            }
        }

        with_state(&state, |node| {
            if node.guard.mark_initialized() {
                tracing::info!(mode = %node.guard.role(), "node initialized");
                node.events.publish(NodeEvent::Initialized);
            }
        });
    })
}
