use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use go2_panel::{
    api::{
        client::PanelApi,
        commands,
        models::{ConnectionMethod, SettingsPatch, TestMoveRequest},
    },
    camera::{
        http::{FrameRecorder, HttpCameraProbe},
        selector::CameraFeedSelector,
    },
    config::PanelConfig,
    panel::{
        status::{StatusPoller, status_report},
        view::PanelView,
    },
    stream::{connector::StreamConnector, transport::WebSocketTransport},
};
use tracing::info;
use tracing_appender::rolling;
use url::Url;

#[derive(Parser)]
#[command(name = "go2-panel", version, about = "Control panel client for a Go2 teleop backend")]
struct Cli {
    /// Backend origin; overrides PANEL_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Follow status, logs and camera until interrupted (default).
    Watch,
    Status,
    /// Ask the backend to connect to the robot.
    Connect {
        #[arg(long, default_value = "localsta")]
        method: ConnectionMethod,
        #[arg(long)]
        ip: Option<String>,
    },
    Disconnect,
    /// Send a named sport command, e.g. StandUp or FrontFlip.
    Cmd { name: String },
    /// List the accepted sport command names.
    Commands,
    Teleop {
        #[command(subcommand)]
        action: TeleopAction,
    },
    Stand,
    Sit,
    /// Soft stop of any ongoing motion.
    Stop,
    Move {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(allow_negative_numbers = true)]
        z: f64,
    },
    Yaw {
        #[arg(allow_negative_numbers = true)]
        wz: f64,
    },
    /// Dump the backend's raw gamepad state.
    Gamepad,
    Settings(SettingsArgs),
    /// Move for a bounded time, then stop.
    TestMove {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(allow_negative_numbers = true)]
        z: f64,
        #[arg(long, default_value_t = 500)]
        duration_ms: u64,
    },
}

#[derive(Subcommand)]
enum TeleopAction {
    Start,
    Stop,
}

#[derive(Args)]
struct SettingsArgs {
    #[arg(long)]
    rate_hz: Option<f64>,
    #[arg(long)]
    deadzone: Option<f64>,
    #[arg(long)]
    max_x: Option<f64>,
    #[arg(long)]
    max_y: Option<f64>,
    #[arg(long)]
    max_z: Option<f64>,
    #[arg(long)]
    default_method: Option<ConnectionMethod>,
}

impl From<SettingsArgs> for SettingsPatch {
    fn from(args: SettingsArgs) -> Self {
        Self {
            rate_hz: args.rate_hz,
            deadzone: args.deadzone,
            max_x: args.max_x,
            max_y: args.max_y,
            max_z: args.max_z,
            default_method: args.default_method,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = PanelConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    tokio::fs::create_dir_all(&config.log_dir)
        .await
        .with_context(|| format!("failed to create log dir {}", config.log_dir.display()))?;
    let file_appender = rolling::daily(&config.log_dir, "go2-panel.log");
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::INFO)
        .init();

    let api = PanelApi::new(config.base_url.clone(), config.request_timeout)?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&config, api).await?,
        Command::Status => print_status(&api).await?,
        Command::Connect { method, ip } => {
            api.connect(method, ip).await?;
            print_status(&api).await?;
        }
        Command::Disconnect => {
            api.disconnect().await?;
            print_status(&api).await?;
        }
        Command::Cmd { name } => {
            api.send_command(&name).await?;
            println!("sent {name}");
        }
        Command::Commands => {
            for name in commands::names() {
                println!("{name}");
            }
        }
        Command::Teleop { action } => match action {
            TeleopAction::Start => api.teleop_start().await?,
            TeleopAction::Stop => api.teleop_stop().await?,
        },
        Command::Stand => api.stand().await?,
        Command::Sit => api.sit().await?,
        Command::Stop => api.stop_move().await?,
        Command::Move { x, y, z } => api.move_body(x, y, z).await?,
        Command::Yaw { wz } => api.yaw(wz).await?,
        Command::Gamepad => {
            let state = api.gamepad_state().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Settings(args) => {
            let patch = SettingsPatch::from(args);
            if patch.is_empty() {
                bail!("nothing to update: pass at least one setting flag");
            }
            let settings = api.update_settings(&patch).await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::TestMove {
            x,
            y,
            z,
            duration_ms,
        } => {
            api.test_move(TestMoveRequest {
                x,
                y,
                z,
                duration_ms,
            })
            .await?
        }
    }

    Ok(())
}

async fn print_status(api: &PanelApi) -> anyhow::Result<()> {
    println!("{}", status_report(api).await?);
    Ok(())
}

async fn watch(config: &PanelConfig, api: PanelApi) -> anyhow::Result<()> {
    if let Some(parent) = config
        .snapshot_path
        .as_deref()
        .and_then(|path| path.parent())
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let view = Arc::new(PanelView::with_echo());
    let status_task =
        StatusPoller::new(api.clone(), view.clone(), config.status_poll_interval).spawn();

    let stream_task = StreamConnector::new(
        config.stream_url()?,
        WebSocketTransport,
        config.reconnect_policy(),
        view.clone(),
    )
    .spawn();

    let http = reqwest::Client::new();
    let surface = Arc::new(FrameRecorder::new(
        http.clone(),
        view.clone(),
        config.snapshot_path.clone(),
        config.request_timeout,
    ));
    let selector = Arc::new(CameraFeedSelector::new(
        config.camera_endpoints()?,
        config.camera_timing(),
        surface,
    ));
    let camera_task = selector.spawn(HttpCameraProbe::new(http));

    info!("panel watching {}", config.base_url);
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    info!("panel shutting down");
    camera_task.abort();
    selector.stop();
    stream_task.abort();
    status_task.abort();
    Ok(())
}
