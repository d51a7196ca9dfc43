use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Bridge, BridgeSettings, ReadyCallback, ReceiveHandler};
use crate::{AnimationClock, WaveParameters};

/// Value recorded by [`LoopbackBridge`] for every push it receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushedValue {
    WaveParameters(WaveParameters),
    PowerState(bool),
    Brightness(u8),
}

/// In-process bridge that keeps everything on the local machine.
///
/// Initialisation completes when [`LoopbackHandle::complete_initialization`]
/// is called, which stands in for the transport's event loop. With echo
/// enabled, pushes made while running are looped back to the receive
/// handlers, the way a broadcast transport lets a controller hear itself.
pub struct LoopbackBridge {
    shared: Arc<Shared>,
}

/// Test and demo side of a [`LoopbackBridge`]: injects inbound values and
/// inspects what the node pushed.
#[derive(Clone)]
pub struct LoopbackHandle {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    handlers: Mutex<Handlers>,
    ready: Mutex<Option<ReadyCallback>>,
}

#[derive(Default)]
struct State {
    settings: Option<BridgeSettings>,
    running: bool,
    echo: bool,
    clock: AnimationClock,
    pushed: Vec<PushedValue>,
}

#[derive(Default)]
struct Handlers {
    wave_parameters: Option<ReceiveHandler<WaveParameters>>,
    power_state: Option<ReceiveHandler<bool>>,
    brightness: Option<ReceiveHandler<u8>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LoopbackBridge {
    pub fn new() -> (Self, LoopbackHandle) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            LoopbackHandle { shared },
        )
    }

    /// Bridge that echoes pushes back to its own receive handlers while
    /// running.
    pub fn with_echo() -> (Self, LoopbackHandle) {
        let (bridge, handle) = Self::new();
        lock(&bridge.shared.state).echo = true;
        (bridge, handle)
    }

    fn record(&self, value: PushedValue) -> bool {
        let mut state = lock(&self.shared.state);
        tracing::debug!(?value, "loopback push");
        state.pushed.push(value);
        state.running && state.echo
    }
}

impl Shared {
    fn deliver<T>(
        &self,
        value: T,
        select: impl FnOnce(&mut Handlers) -> &mut Option<ReceiveHandler<T>>,
    ) -> bool {
        let mut handlers = lock(&self.handlers);
        match select(&mut handlers) {
            Some(handler) => {
                handler(value);
                true
            }
            None => false,
        }
    }
}

impl Bridge for LoopbackBridge {
    fn initialize(&mut self, settings: BridgeSettings, on_ready: ReadyCallback) {
        let mut state = lock(&self.shared.state);
        if state.settings.is_some() {
            tracing::warn!("loopback bridge initialised twice, ignoring");
            return;
        }

        tracing::info!(
            interface = %settings.network_interface,
            port = settings.port,
            role = %settings.role,
            channel = settings.channel,
            "loopback bridge initialising"
        );
        if settings.enable_clock_sync {
            tracing::debug!("clock sync requested, loopback uses the local clock");
        }

        state.settings = Some(settings);
        *lock(&self.shared.ready) = Some(on_ready);
    }

    fn start(&mut self) {
        lock(&self.shared.state).running = true;
    }

    fn stop(&mut self) {
        lock(&self.shared.state).running = false;
    }

    fn push_wave_parameters(&mut self, parameters: WaveParameters) {
        if self.record(PushedValue::WaveParameters(parameters.clone())) {
            self.shared
                .deliver(parameters, |handlers| &mut handlers.wave_parameters);
        }
    }

    fn push_power_state(&mut self, power_state: bool) {
        if self.record(PushedValue::PowerState(power_state)) {
            self.shared
                .deliver(power_state, |handlers| &mut handlers.power_state);
        }
    }

    fn push_brightness(&mut self, brightness: u8) {
        if self.record(PushedValue::Brightness(brightness)) {
            self.shared
                .deliver(brightness, |handlers| &mut handlers.brightness);
        }
    }

    fn current_animation_time(&self) -> u64 {
        lock(&self.shared.state).clock.now_ms()
    }

    fn on_wave_parameters_received(&mut self, handler: ReceiveHandler<WaveParameters>) {
        lock(&self.shared.handlers).wave_parameters = Some(handler);
    }

    fn on_power_state_received(&mut self, handler: ReceiveHandler<bool>) {
        lock(&self.shared.handlers).power_state = Some(handler);
    }

    fn on_brightness_received(&mut self, handler: ReceiveHandler<u8>) {
        lock(&self.shared.handlers).brightness = Some(handler);
    }
}

impl LoopbackHandle {
    /// Fires the ready signal registered by `initialize`.
    ///
    /// Returns `false` when the bridge has not been initialised yet. The
    /// callback is kept so that a repeated ready signal can be simulated.
    pub fn complete_initialization(&self) -> bool {
        // The slot lock is released before the callback runs: the callback
        // pushes state back into this bridge.
        let Some(mut on_ready) = lock(&self.shared.ready).take() else {
            return false;
        };
        on_ready();

        let mut slot = lock(&self.shared.ready);
        if slot.is_none() {
            *slot = Some(on_ready);
        }
        true
    }

    pub fn deliver_wave_parameters(&self, parameters: WaveParameters) -> bool {
        self.shared
            .deliver(parameters, |handlers| &mut handlers.wave_parameters)
    }

    pub fn deliver_power_state(&self, power_state: bool) -> bool {
        self.shared
            .deliver(power_state, |handlers| &mut handlers.power_state)
    }

    pub fn deliver_brightness(&self, brightness: u8) -> bool {
        self.shared
            .deliver(brightness, |handlers| &mut handlers.brightness)
    }

    pub fn pushed(&self) -> Vec<PushedValue> {
        lock(&self.shared.state).pushed.clone()
    }

    pub fn settings(&self) -> Option<BridgeSettings> {
        lock(&self.shared.state).settings.clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.state).running
    }

    /// Shifts the bridge clock, as a clock-sync round would.
    pub fn set_clock_offset_ms(&self, offset_ms: i64) {
        lock(&self.shared.state).clock.set_offset_ms(offset_ms);
    }
}

impl std::fmt::Debug for LoopbackBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackBridge").finish()
    }
}

impl std::fmt::Debug for LoopbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackHandle").finish()
    }
}
