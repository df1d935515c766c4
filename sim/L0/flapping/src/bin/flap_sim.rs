//! Headless flapping demo.
//!
//! Spawns one model with a revolute wing joint in a headless world, loads the
//! flapping plugin onto it and steps the world in real time. Parameters are
//! changed from the keyboard, one command per line:
//!
//! ```text
//! cargo run -p sim-flapping --bin flap-sim -- --start
//! RUST_LOG=sim_flapping=trace cargo run -p sim-flapping --bin flap-sim -- --duration 2
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use sim_flapping::teleop::{self, HELP};
use sim_flapping::{
    ControlTopics, ControlUpdate, FLAP_AXIS, FlappingConfig, FlappingPlugin, Teleop,
    TeleopCommand,
};
use sim_host::{HeadlessModel, HeadlessWorld, Joint, Model, PluginElement, PluginInstance, World};
use sim_transport::Bus;
use sim_types::{JointType, Point3, Pose};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run the flapping plugin on a headless world
#[derive(Parser, Debug)]
#[command(name = "flap-sim")]
#[command(about = "Headless flapping actuator demo", long_about = None)]
#[command(version)]
struct Cli {
    /// SDF file containing a <plugin> element; overrides the parameter flags
    #[arg(long)]
    plugin: Option<PathBuf>,

    /// Name of the wing joint to create on the model
    #[arg(long, default_value = "wing_joint")]
    joint: String,

    /// Initial flap amplitude (rad)
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    amplitude: f64,

    /// Initial flap frequency (Hz)
    #[arg(long, default_value_t = 2.0)]
    frequency: f64,

    /// Initial bounce amplitude (m)
    #[arg(long, default_value_t = 0.1, allow_negative_numbers = true)]
    z_amplitude: f64,

    /// Initial bounce frequency (Hz)
    #[arg(long, default_value_t = 1.0)]
    z_frequency: f64,

    /// Namespace for the control topics
    #[arg(long)]
    namespace: Option<String>,

    /// Simulation rate (steps per second)
    #[arg(long, default_value_t = 1000)]
    rate: u32,

    /// Seconds between state reports
    #[arg(long, default_value_t = 0.5)]
    report_every: f64,

    /// Start oscillating immediately
    #[arg(long)]
    start: bool,

    /// Run for this many seconds without reading the keyboard
    #[arg(long)]
    duration: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.rate == 0 {
        bail!("--rate must be at least 1");
    }
    let report_every = seconds("--report-every", cli.report_every)?;
    let duration = cli
        .duration
        .map(|secs| seconds("--duration", secs))
        .transpose()?;

    let element = plugin_element(&cli)?;
    let bus = Bus::new();
    let spinner = bus.spawn_spinner().context("failed to start bus spinner")?;

    let world = HeadlessWorld::new("default");
    let model = world.spawn_model("flapper", Pose::from_position(Point3::new(0.0, 0.0, 1.0)));
    model.add_joint(&cli.joint, JointType::Revolute);

    let plugin = PluginInstance::load(FlappingPlugin::new(bus.clone()), model.clone(), &element);
    if let Some(err) = plugin.load_error() {
        bail!("plugin {} did not load: {err}", plugin.name());
    }
    let topics = plugin
        .with(|p| p.config().map(|c| c.topics.clone()))
        .unwrap_or_default();

    if cli.start {
        ControlUpdate::Oscillation(true).publish(&bus, &topics)?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let sim = {
        let running = Arc::clone(&running);
        let world = world.clone();
        let model = Arc::clone(&model);
        let dt = Duration::from_secs(1) / cli.rate;
        let joint = cli.joint.clone();
        thread::Builder::new()
            .name("sim".into())
            .spawn(move || run_world(&world, &model, &joint, dt, report_every, &running))
            .context("failed to spawn simulation thread")?
    };

    match duration {
        Some(duration) => thread::sleep(duration),
        None => teleop_loop(&bus, &topics)?,
    }

    running.store(false, Ordering::Release);
    sim.join()
        .map_err(|_| anyhow!("simulation thread panicked"))?;

    plugin.with(|p| {
        info!(
            skipped_ticks = p.skipped_ticks(),
            tau = p.phase().map_or(0.0, |phase| phase.tau()),
            "simulation finished"
        );
    });
    plugin.unload();
    spinner.stop();
    Ok(())
}

/// A non-negative, finite number of seconds given for `flag`.
fn seconds(flag: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|err| anyhow!("{flag} must be a finite, non-negative number of seconds: {err}"))
}

/// The plugin descriptor, from a file or from the command line.
fn plugin_element(cli: &Cli) -> Result<PluginElement> {
    if let Some(path) = &cli.plugin {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return PluginElement::parse_str(&xml)
            .with_context(|| format!("failed to parse {}", path.display()));
    }

    let config = FlappingConfig::new(&cli.joint)
        .amplitude(cli.amplitude)
        .frequency(cli.frequency)
        .z_amplitude(cli.z_amplitude)
        .z_frequency(cli.z_frequency);
    config.validate()?;

    let mut element = config.to_element("flapping", "libflapping_plugin.so");
    if let Some(namespace) = &cli.namespace {
        element.set("namespace", namespace);
    }
    Ok(element)
}

/// Step `world` at `dt` intervals paced to the wall clock until told to stop.
fn run_world(
    world: &HeadlessWorld,
    model: &HeadlessModel,
    joint: &str,
    dt: Duration,
    report_every: Duration,
    running: &AtomicBool,
) {
    let joint = model.headless_joint(joint);
    let mut next_step = Instant::now();
    let mut next_report = Instant::now();

    while running.load(Ordering::Acquire) {
        world.step(dt);

        let now = Instant::now();
        if now >= next_report {
            let theta = joint
                .as_ref()
                .and_then(|j| j.position(FLAP_AXIS))
                .unwrap_or(0.0);
            info!(
                sim_time = %world.sim_time(),
                theta,
                z = model.world_pose().position.z,
                "state"
            );
            next_report = now + report_every;
        }

        next_step += dt;
        if let Some(wait) = next_step.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }
}

/// Read commands from stdin until `q` or end of input.
fn teleop_loop(bus: &Bus, topics: &ControlTopics) -> Result<()> {
    let mut keys = Teleop::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("{HELP}");
    loop {
        print!("Enter command: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        match keys.handle(&line) {
            TeleopCommand::Publish(update) => {
                update.publish(bus, topics)?;
                println!("{}", teleop::describe(&update));
            }
            TeleopCommand::Quit => return Ok(()),
            TeleopCommand::Unknown(_) => println!("Unknown command."),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_accepts_finite_values() {
        assert_eq!(seconds("--duration", 0.0).unwrap(), Duration::ZERO);
        assert_eq!(
            seconds("--report-every", 0.5).unwrap(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_seconds_rejects_infinite_negative_and_nan() {
        for bad in [f64::INFINITY, -1.0, f64::NAN] {
            let err = seconds("--duration", bad).unwrap_err();
            assert!(err.to_string().starts_with("--duration"));
        }
    }

    #[test]
    fn test_cli_parses_infinite_duration_without_panicking() {
        let cli = Cli::try_parse_from(["flap-sim", "--duration", "inf"]).unwrap();
        assert!(seconds("--duration", cli.duration.unwrap()).is_err());
    }
}
