use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wave_sync_core::{
    AppConfig, Coordinator, LogLevel, LoopbackBridge, LoopbackHandle, NodeConfig, NodeEvent,
    NodeRegistry, NodeRole, Wave, WaveChannel, WaveParameters, WaveParametersInput, DEFAULT_PORT,
};

fn main() -> wave_sync_core::Result<()> {
    let cli = Cli::parse();

    let (role, args) = match cli.command {
        Commands::Controller(args) => (NodeRole::Controller, args),
        Commands::Receiver(args) => (NodeRole::Receiver, args),
    };
    let config = node_config(role, args, cli.config.as_ref())?;
    init_tracing(config.log_level);

    let registry = NodeRegistry::new();
    match config.mode {
        NodeRole::Controller => run_controller(&registry, config),
        NodeRole::Receiver => run_receiver(&registry, config),
    }
}

fn node_config(
    role: NodeRole,
    args: NodeArgs,
    config_path: Option<&PathBuf>,
) -> wave_sync_core::Result<NodeConfig> {
    if let Some(path) = config_path {
        let mut config = AppConfig::load(path)?.node;
        config.mode = role;
        return Ok(config);
    }

    let interface = args.interface.ok_or_else(|| {
        wave_sync_core::WaveSyncError::config("--interface is required without --config")
    })?;
    let config = NodeConfig::new(interface, args.channel)
        .with_mode(role)
        .with_port(args.port)
        .with_log_level(args.log_level.parse()?)
        .with_clock_sync(args.clock_sync);
    config.validate()?;
    Ok(config)
}

fn run_controller(registry: &NodeRegistry, config: NodeConfig) -> wave_sync_core::Result<()> {
    tracing::info!(channel = config.channel, "starting controller");

    let (bridge, handle) = LoopbackBridge::with_echo();
    let node = registry.create(config, bridge)?;
    let events = node.subscribe()?;
    handle.complete_initialization();

    node.start()?;
    node.set_wave_parameters(&WaveParametersInput::new(demo_waves()).with_time_period(128))?;
    node.set_power_state(true)?;
    node.set_brightness(128)?;

    for event in events.try_iter() {
        log_event(&event);
    }
    report(&node)?;
    node.stop()
}

fn run_receiver(registry: &NodeRegistry, config: NodeConfig) -> wave_sync_core::Result<()> {
    tracing::info!(channel = config.channel, "starting receiver");

    let (bridge, handle) = LoopbackBridge::new();
    let node = registry.create(config, bridge)?;
    let events = node.subscribe()?;
    handle.complete_initialization();
    node.start()?;

    simulate_controller(&handle);

    for event in events.try_iter() {
        log_event(&event);
    }
    report(&node)?;
    node.stop()
}

/// Stands in for a remote controller broadcasting over the network.
fn simulate_controller(handle: &LoopbackHandle) {
    let mut parameters = WaveParameters::empty();
    for (slot, wave) in parameters.waves.iter_mut().zip(demo_waves()) {
        *slot = wave;
    }
    handle.deliver_wave_parameters(parameters);
    handle.deliver_power_state(true);
    handle.deliver_brightness(64);
}

fn demo_waves() -> Vec<Wave> {
    let rainbow = Wave {
        h: WaveChannel {
            a: 255,
            b: 0,
            w_t: 2,
            w_x: 4,
            phi: 0,
        },
        s: WaveChannel {
            b: 255,
            ..WaveChannel::default()
        },
        v: WaveChannel {
            b: 255,
            ..WaveChannel::default()
        },
        a: WaveChannel {
            b: 255,
            ..WaveChannel::default()
        },
    };
    let pulse = Wave {
        v: WaveChannel {
            a: 128,
            b: 127,
            w_t: 8,
            w_x: 0,
            phi: 64,
        },
        a: WaveChannel {
            b: 128,
            ..WaveChannel::default()
        },
        ..Wave::empty()
    };
    vec![rainbow, pulse]
}

fn log_event(event: &NodeEvent) {
    match event {
        NodeEvent::Initialized => tracing::info!("node initialized"),
        NodeEvent::WaveParametersUpdated(parameters) => tracing::info!(
            active_waves = parameters.active_waves(),
            time_period = parameters.time_period,
            distance_period = parameters.distance_period,
            "wave parameters updated"
        ),
        NodeEvent::PowerStateUpdated(power_state) => {
            tracing::info!(power_state, "power state updated")
        }
        NodeEvent::BrightnessUpdated(brightness) => {
            tracing::info!(brightness, "brightness updated")
        }
    }
}

fn report(node: &Coordinator<LoopbackBridge>) -> wave_sync_core::Result<()> {
    tracing::info!(
        mode = %node.mode(),
        power_state = node.power_state()?,
        brightness = node.brightness()?,
        active_waves = node.wave_parameters()?.active_waves(),
        animation_time_ms = node.animation_time()?,
        "node state"
    );
    Ok(())
}

fn init_tracing(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str())),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Wave sync animation node", long_about = None)]
struct Cli {
    /// JSON configuration file. Its `node` section replaces the node flags.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a node that computes and distributes wave parameters.
    Controller(NodeArgs),
    /// Run a node that applies wave parameters sent by a controller.
    Receiver(NodeArgs),
}

#[derive(Args, Debug)]
struct NodeArgs {
    /// Network interface the transport binds to.
    #[arg(short, long)]
    interface: Option<String>,
    /// Animation channel shared by the controller and its receivers.
    #[arg(long, default_value_t = 0)]
    channel: u32,
    /// Transport port.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Log verbosity: error, info or debug.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Enable clock synchronisation with the controller.
    #[arg(long)]
    clock_sync: bool,
}
