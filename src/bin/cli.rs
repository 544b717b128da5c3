use anyhow::{anyhow, bail, Context, Result};
use camkit::config::CamkitConfig;
use camkit::executor::{Executor, ThreadedExecutor};
use camkit::permissions::{check_permission_detailed, PermissionStatus, StaticPermissions};
use camkit::setup::SetupPhase;
use camkit::{
    CameraProps, CameraView, ChangedProps, CodeFormat, EventHandler, PropName, SimulatorCamera,
};
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const USAGE: &str = "Usage: camkit-cli <capture|scan|permission|info> [args] [--json]";

#[tokio::main]
async fn main() -> Result<()> {
    camkit::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let json = args.iter().any(|a| a == "--json");
    match args[1].as_str() {
        "capture" => cmd_capture(&args[2..], json).await,
        "scan" => cmd_scan(&args[2..], json).await,
        "permission" => cmd_permission(json),
        "info" => cmd_info(),
        other => {
            eprintln!("Unknown command: {}\n{}", other, USAGE);
            std::process::exit(1);
        }
    }
}

/// Flag value following `name`, if present
fn flag<'a>(args: &'a [String], name: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == name) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| anyhow!("{} needs a value", name)),
        None => Ok(None),
    }
}

fn parse_flag<T>(args: &[String], name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match flag(args, name)? {
        Some(value) => value
            .parse()
            .map_err(|e| anyhow!("invalid {} '{}': {}", name, value, e)),
        None => Ok(default),
    }
}

fn load_config(args: &[String]) -> Result<CamkitConfig> {
    let mut config = match flag(args, "--config")? {
        Some(path) => CamkitConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => CamkitConfig::load_or_default(),
    };
    if let Some(dir) = flag(args, "--dir")? {
        config.storage.cache_root = Some(PathBuf::from(dir));
    }
    Ok(config)
}

struct SimulatorSession {
    view: CameraView,
    simulator: Arc<SimulatorCamera>,
    executor: Arc<ThreadedExecutor>,
}

/// A view on the simulator with permission already granted
fn simulator_view(config: CamkitConfig) -> Result<SimulatorSession> {
    let simulator = Arc::new(SimulatorCamera::from_config(&config.device));
    let executor = Arc::new(ThreadedExecutor::new().context("starting executor")?);
    let view = CameraView::builder(config)
        .device(simulator.clone())
        .executor(executor.clone())
        .permissions(Arc::new(StaticPermissions(PermissionStatus::Granted)))
        .build()
        .context("building camera view")?;
    Ok(SimulatorSession {
        view,
        simulator,
        executor,
    })
}

/// Wait until every UI task queued so far has run
async fn drain_ui(executor: &ThreadedExecutor) -> Result<()> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    executor.dispatch_ui(Box::new(move || {
        let _ = tx.send(());
    }));
    rx.await.map_err(|_| anyhow!("UI thread stopped"))
}

async fn wait_ready(view: &CameraView) -> Result<()> {
    for _ in 0..100 {
        if view.setup_phase() == SetupPhase::Ready {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    bail!("camera setup did not complete: {:?}", view.setup_phase())
}

async fn cmd_capture(args: &[String], json: bool) -> Result<()> {
    // capture [--width <px>] [--height <px>] [--count <n>] [--dir <path>] [--config <file>]
    let mut config = load_config(args)?;
    let width = parse_flag(args, "--width", config.device.simulator_resolution[0])?;
    let height = parse_flag(args, "--height", config.device.simulator_resolution[1])?;
    let count: u32 = parse_flag(args, "--count", 1)?;
    config.device.simulator_resolution = [width, height];

    let SimulatorSession { view, .. } = simulator_view(config)?;
    view.set_props(CameraProps::default(), &ChangedProps::all());
    wait_ready(&view).await?;

    let mut results = Vec::new();
    for _ in 0..count {
        let result = view.capture_async().await.context("capturing picture")?;
        if !json {
            println!(
                "{} {}x{} {} bytes {}",
                result.name, result.width, result.height, result.size, result.uri
            );
        }
        results.push(result);
    }
    if json {
        println!("{}", serde_json::to_string(&results)?);
    }
    view.remove_from_host();
    Ok(())
}

async fn cmd_scan(args: &[String], json: bool) -> Result<()> {
    // scan <value> [--format <code-format>] [--count <n>] [--interval-ms <ms>] [--throttle-ms <ms>]
    let value = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("Usage: camkit-cli scan <value> [--format qr] [--count n]"))?
        .clone();
    let format: CodeFormat = parse_flag(args, "--format", CodeFormat::Qr)?;
    let count: u32 = parse_flag(args, "--count", 5)?;
    let interval_ms: u64 = parse_flag(args, "--interval-ms", 500)?;

    let config = load_config(args)?;
    let throttle_ms: u64 = parse_flag(args, "--throttle-ms", config.scanner.throttle_ms)?;
    let SimulatorSession {
        view,
        simulator,
        executor,
    } = simulator_view(config)?;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let props = CameraProps {
        scan_barcode: true,
        scan_throttle_delay: throttle_ms,
        on_read_code: Some(EventHandler::new(move |event| {
            if let Ok(mut events) = sink.lock() {
                events.push(event);
            }
        })),
        ..CameraProps::default()
    };
    let changed: ChangedProps = [
        PropName::ScanBarcode,
        PropName::OnReadCode,
        PropName::ScanThrottleDelay,
    ]
    .into_iter()
    .collect();
    view.set_props(props, &changed);
    wait_ready(&view).await?;

    for i in 0..count {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
        simulator.simulate_code(&value, format);
    }
    drain_ui(&executor).await?;

    let events = events
        .lock()
        .map_err(|_| anyhow!("scan event log poisoned"))?
        .clone();
    if json {
        println!("{}", serde_json::to_string(&events)?);
    } else {
        println!("{} of {} decodes emitted", events.len(), count);
        for event in &events {
            println!("{} {}", event.code_format, event.code_string_value);
        }
    }
    view.remove_from_host();
    Ok(())
}

fn cmd_permission(json: bool) -> Result<()> {
    let info = check_permission_detailed();
    if json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{}: {}", info.status, info.message);
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&camkit::get_info())?);
    Ok(())
}
