//! Boundary to the external transport, clock synchronisation and output
//! engine.
//!
//! A [`Coordinator`](crate::Coordinator) talks to the network exclusively
//! through the [`Bridge`] trait. Implementations deliver their callbacks from
//! their own dispatch context and must serialise them: the ready callback and
//! the receive handlers are never run concurrently with each other, and the
//! ready callback is never invoked from inside a [`Bridge`] method call.
//! Receive handlers may be invoked from inside a push, which is how a bridge
//! echoes a controller's own broadcast back to it.

mod loopback;

pub use loopback::{LoopbackBridge, LoopbackHandle, PushedValue};

use crate::{LogLevel, NodeConfig, NodeRole, WaveParameters};

/// Signal raised once the transport (and clock sync, if enabled) is ready.
pub type ReadyCallback = Box<dyn FnMut() + Send>;

/// Persistent handler for values observed by the bridge.
pub type ReceiveHandler<T> = Box<dyn FnMut(T) + Send>;

/// Network and role configuration handed to [`Bridge::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub network_interface: String,
    pub port: u16,
    pub role: NodeRole,
    pub channel: u32,
    pub log_level: LogLevel,
    pub enable_clock_sync: bool,
}

impl From<&NodeConfig> for BridgeSettings {
    fn from(config: &NodeConfig) -> Self {
        Self {
            network_interface: config.network_interface.clone(),
            port: config.port,
            role: config.mode,
            channel: config.channel,
            log_level: config.log_level,
            enable_clock_sync: config.enable_clock_sync,
        }
    }
}

/// Transport, timing and output engine consumed by the coordinator.
pub trait Bridge: Send {
    /// Brings up the transport. `on_ready` fires once it can accept and emit
    /// state. Called at most once per bridge.
    fn initialize(&mut self, settings: BridgeSettings, on_ready: ReadyCallback);

    /// Begins transmitting or receiving animation frames.
    fn start(&mut self);

    /// Halts frame transmission or reception.
    fn stop(&mut self);

    fn push_wave_parameters(&mut self, parameters: WaveParameters);

    fn push_power_state(&mut self, power_state: bool);

    fn push_brightness(&mut self, brightness: u8);

    /// Bridge-owned monotonic animation clock, in milliseconds.
    fn current_animation_time(&self) -> u64;

    fn on_wave_parameters_received(&mut self, handler: ReceiveHandler<WaveParameters>);

    fn on_power_state_received(&mut self, handler: ReceiveHandler<bool>);

    fn on_brightness_received(&mut self, handler: ReceiveHandler<u8>);
}
