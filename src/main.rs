#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use rocc_link::{
    init_logging,
    simulator::{self, SimulatorConfig, TelemetryGenerator},
    transport::{in_memory, tcp::TcpPeripheral},
    Adapter, Cancellation, CardSink, ClientConfig, DeviceInfo, JsonSink, LogSink, NotificationSink,
    Session, TcpAdapter, DEFAULT_DISCOVERY_TIMEOUT, DEVICE_NAME_PREFIX,
};

#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use tokio::net::TcpListener;
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum Output {
    /// One log line per notification.
    Log,
    /// Operation parameters card for telemetry, log lines otherwise.
    Card,
    /// One JSON object per notification on stdout.
    Json,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Connect to a peripheral through a TCP bridge and monitor its status.
    Monitor {
        #[arg(long, default_value = "127.0.0.1:9750")]
        connect: String,
        #[arg(long, default_value = DEVICE_NAME_PREFIX)]
        name_prefix: String,
        #[arg(long, value_enum, default_value_t = Output::Card)]
        output: Output,
        #[arg(long, help = "Seconds to wait for a matching device", default_value_t = DEFAULT_DISCOVERY_TIMEOUT.as_secs())]
        discovery_timeout: u64,
    },
    /// Serve a simulated peripheral on a TCP bridge port.
    Simulate {
        #[arg(long, default_value = "127.0.0.1:9750")]
        bind: String,
        #[arg(long, default_value = "NRS-ROCC-SIM")]
        name: String,
        #[arg(long, help = "Fix RNG seed for reproducible telemetry (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
        #[arg(long, help = "Stop after this many telemetry frames")]
        count: Option<usize>,
    },
    /// Run a simulated peripheral and a monitor in one process.
    Local {
        #[arg(long, help = "Fix RNG seed for reproducible telemetry (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
        #[arg(long, default_value_t = 10)]
        count: usize,
        #[arg(long, value_enum, default_value_t = Output::Card)]
        output: Output,
    },
}

#[cfg(feature = "std")]
fn make_sink(output: Output) -> Box<dyn NotificationSink + Send> {
    match output {
        Output::Log => Box::new(LogSink),
        Output::Card => Box::new(CardSink::new(std::io::stdout())),
        Output::Json => Box::new(JsonSink::new(std::io::stdout())),
    }
}

#[cfg(feature = "std")]
async fn monitor<A: Adapter>(adapter: A, config: ClientConfig, output: Output) -> anyhow::Result<()> {
    let cancel = Cancellation::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut sink = make_sink(output);
    let mut session = Session::new(adapter, &mut *sink, config);
    session.connect(&cancel).await?;
    let stats = session.run(&cancel).await?;
    log::info!(
        "Session ended: {} decoded, {} recognized, {} unknown, {} truncated",
        stats.decoded,
        stats.recognized,
        stats.unknown,
        stats.truncated
    );
    Ok(())
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            connect,
            name_prefix,
            output,
            discovery_timeout,
        } => {
            let config = ClientConfig {
                name_prefix,
                discovery_timeout: Duration::from_secs(discovery_timeout),
                ..ClientConfig::default()
            };
            let adapter = TcpAdapter::with_timeout(connect, config.write_timeout);
            monitor(adapter, config, output).await?;
        }
        Commands::Simulate {
            bind,
            name,
            seed,
            interval_ms,
            count,
        } => {
            let listener = TcpListener::bind(&bind).await?;
            log::info!("Simulated peripheral {} listening on {}", name, listener.local_addr()?);
            if let Some(s) = seed {
                log::info!("Using fixed seed: {} (telemetry will be reproducible)", s);
            }
            let device = DeviceInfo::rocc(format!("sim-{}", bind), name);
            let sim_config = SimulatorConfig {
                interval: Duration::from_millis(interval_ms),
                count,
                ..SimulatorConfig::default()
            };
            let mut generator = TelemetryGenerator::new(seed);
            let mut port = TcpPeripheral::accept(&listener, &device).await?;
            let sent = simulator::run(&mut port, &mut generator, &sim_config).await?;
            log::info!("Simulation finished after {} telemetry frames", sent);
        }
        Commands::Local {
            seed,
            interval_ms,
            count,
            output,
        } => {
            let (adapter, mut peripheral) = in_memory::pair();
            peripheral.advertise(DeviceInfo::rocc("local-0", "NRS-ROCC-LOCAL"));
            let sim_config = SimulatorConfig {
                interval: Duration::from_millis(interval_ms),
                count: Some(count),
                ..SimulatorConfig::default()
            };
            let device_side = tokio::spawn(async move {
                let mut generator = TelemetryGenerator::new(seed);
                let sent = simulator::run(&mut peripheral, &mut generator, &sim_config).await;
                peripheral.disconnect();
                sent
            });
            monitor(adapter, ClientConfig::default(), output).await?;
            let sent = device_side.await??;
            log::info!("Simulated peripheral sent {} telemetry frames", sent);
        }
    }
    Ok(())
}
