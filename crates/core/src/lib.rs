//! Core library for wave sync nodes.
//!
//! A node is either a *controller*, which computes wave parameters and
//! distributes them, or a *receiver*, which applies the parameters it is sent
//! while staying in step with the controller's animation clock. This crate
//! holds the coordination layer: the wave parameter model, the lifecycle and
//! role rules, the [`Bridge`] boundary to the transport, and the
//! [`Coordinator`] that ties them together and surfaces typed events.

pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod timeline;
pub mod wave;

pub use bridge::{Bridge, BridgeSettings, LoopbackBridge, LoopbackHandle, PushedValue};
pub use config::{AppConfig, LogLevel, NodeConfig, DEFAULT_PORT};
pub use coordinator::Coordinator;
pub use error::{Result, ValidationError, WaveSyncError};
pub use events::{EventBus, NodeEvent};
pub use lifecycle::{GuardedOperation, LifecycleGuard, LifecycleState, NodeRole};
pub use registry::NodeRegistry;
pub use timeline::AnimationClock;
pub use wave::{
    normalize, Wave, WaveChannel, WaveParameters, WaveParametersInput, DEFAULT_DISTANCE_PERIOD,
    DEFAULT_TIME_PERIOD, MAX_NUM_WAVES,
};
