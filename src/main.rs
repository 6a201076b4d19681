use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info, warn};

use status_widget::config::Config;
use status_widget::display::{profile_for, DisplayPayload, DisplaySink};
use status_widget::logging::init_logging;
use status_widget::scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler, TokioTimer};
use status_widget::settings::{
    JsonFileSettings, MemorySettings, SettingsStore, KEY_TARGET_ADDRESS,
};
use status_widget::status_client::{HealthReport, StatusClient};
use status_widget::{Clock, MonitorError, SystemClock};

/// One line on stdout.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Output<'a> {
    Display(&'a DisplayPayload),
    Status { report: String },
    Health(&'a HealthReport),
    Error { message: String },
}

impl Output<'_> {
    fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "Failed to encode output"),
        }
    }
}

/// Forwards rendered payloads to the host surface bridge on stdout.
struct StdoutSink;

impl DisplaySink for StdoutSink {
    fn show(&self, payload: &DisplayPayload) {
        Output::Display(payload).emit();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Target(String),
    Clear,
    Refresh,
    SurfaceAdded,
    SurfaceRemoved,
    Health,
    Status,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word {
        "target" if !rest.is_empty() => Some(Input::Target(rest.to_string())),
        "clear" => Some(Input::Clear),
        "refresh" => Some(Input::Refresh),
        "surface-added" => Some(Input::SurfaceAdded),
        "surface-removed" => Some(Input::SurfaceRemoved),
        "health" => Some(Input::Health),
        "status" => Some(Input::Status),
        "quit" | "exit" => Some(Input::Quit),
        _ => None,
    }
}

fn open_settings(config: &Config) -> Arc<dyn SettingsStore> {
    let opened = config
        .settings_file()
        .and_then(JsonFileSettings::open);
    match opened {
        Ok(settings) => {
            info!(path = %settings.path().display(), "Opened settings");
            Arc::new(settings)
        }
        Err(err) => {
            warn!(error = %err, "Settings file unavailable, nothing will survive a restart");
            Arc::new(MemorySettings::new())
        }
    }
}

fn seed_target(settings: &dyn SettingsStore, target: &str) -> Result<(), MonitorError> {
    let stored = settings.get_string(KEY_TARGET_ADDRESS)?.unwrap_or_default();
    if stored.trim().is_empty() {
        info!(host = target, "Seeding target from environment");
        settings.set_string(KEY_TARGET_ADDRESS, target)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    let loaded = Config::try_load().await;
    let level = match &loaded {
        Ok(config) => config.log_level.clone(),
        Err(_) => Config::default().log_level,
    };
    init_logging(&level);
    let config = Config::or_default(loaded);

    let settings = open_settings(&config);
    if let Some(target) = &config.initial_target {
        if let Err(err) = seed_target(settings.as_ref(), target) {
            warn!(error = %err, "Could not seed target");
        }
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = StatusClient::new()?;
    let (timer, wakes) = TokioTimer::new(clock.clone());
    let mut scheduler = SyncScheduler::new(
        settings,
        Arc::new(client.clone()),
        Arc::new(timer),
        Arc::new(StdoutSink),
        clock,
        SchedulerConfig {
            policy: config.schedule,
            profile: profile_for(&config.device),
            fetch_timeout: config.fetch_timeout(),
        },
    );
    scheduler.restore();
    let (handle, task) = SchedulerHandle::spawn(scheduler, wakes);

    let exit = tokio::select! {
        exit = run_commands(tokio::io::stdin(), &handle, &client, &config) => Some(exit?),
        signal = interrupted() => {
            signal?;
            None
        }
    };
    if exit == Some(Exit::InputClosed) {
        info!("stdin closed, polling until interrupted");
        interrupted().await?;
    }

    info!("Shutting down");
    handle.shutdown()?;
    if let Err(err) = task.await {
        warn!(error = %err, "Scheduler task ended abnormally");
    }
    Ok(())
}

/// How the command loop ended.
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Quit,
    InputClosed,
}

async fn run_commands<R>(
    reader: R,
    handle: &SchedulerHandle,
    client: &StatusClient,
    config: &Config,
) -> Result<Exit, MonitorError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(input) = parse_input(&line) else {
            Output::Error {
                message: format!("unknown command: {}", line.trim()),
            }
            .emit();
            continue;
        };

        let result = match input {
            Input::Target(raw) => handle.configure_target(raw),
            Input::Clear => handle.configure_target(""),
            Input::Refresh => handle.refresh_now(),
            Input::SurfaceAdded => handle.surface_added(),
            Input::SurfaceRemoved => handle.surface_removed(),
            Input::Status => handle
                .describe()
                .await
                .map(|report| Output::Status { report }.emit()),
            Input::Health => run_health(handle, client, config).await,
            Input::Quit => return Ok(Exit::Quit),
        };
        if let Err(err) = result {
            error!(error = %err, "Command failed");
            Output::Error {
                message: err.to_string(),
            }
            .emit();
        }
    }
    Ok(Exit::InputClosed)
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn interrupted() -> Result<(), MonitorError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    info!("Interrupted");
    Ok(())
}

async fn run_health(
    handle: &SchedulerHandle,
    client: &StatusClient,
    config: &Config,
) -> Result<(), MonitorError> {
    let target = handle.target().await?;
    let report = client.check_health(&target, config.fetch_timeout()).await?;
    Output::Health(&report).emit();
    Ok(())
}
