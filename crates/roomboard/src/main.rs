mod engine;
mod progress;

use anyhow::{Context, Result};
use chrono::Timelike;
use engine::Engine;
use roomboard_core::config::{self, Config};
use roomboard_core::ipc::{self, ClientMsg, RenderMsg};
use roomboard_core::schedule::Schedule;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// Shared state between the timer loop and IPC handlers. One mutex
/// gives every operation run-to-completion semantics.
struct Shared {
    config: Config,
    engine: Engine<Schedule>,
    dark_theme: bool,
    /// Channels to send instruction lines to connected renderers.
    renderer_txs: Vec<mpsc::UnboundedSender<String>>,
    last_interaction: Instant,
}

fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomboard=info".parse().unwrap()),
        )
        .init();

    info!("roomboard starting");

    let config = Config::load().context("loading config")?;
    let schedule_path = config.schedule_path();
    let schedule = Schedule::load_from(&schedule_path)
        .with_context(|| format!("loading schedule for room '{}'", config.general.room_id))?;
    info!(
        room = %config.general.room_id,
        days = schedule.days.len(),
        path = %schedule_path.display(),
        "schedule loaded"
    );

    let now = local_now();
    let mut engine = Engine::new(
        schedule,
        now.date(),
        Duration::from_millis(config.timing.popup_duration_ms),
    );
    let window = engine.window();
    info!(start = %window.start, end = %window.end, "academic window");

    // Initial display: today's schedule (or its empty state).
    engine.request_display(now.date(), now);

    let dark_theme = config.display.dark_theme;
    let shared = Arc::new(Mutex::new(Shared {
        config,
        engine,
        dark_theme,
        renderer_txs: Vec::new(),
        last_interaction: Instant::now(),
    }));

    // IPC listener.
    let socket_path = config::socket_path();
    let _ = std::fs::remove_file(&socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("binding socket {}", socket_path.display()))?;
    info!(path = %socket_path.display(), "IPC socket listening");

    let shared_ipc = Arc::clone(&shared);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let shared = Arc::clone(&shared_ipc);
                    tokio::spawn(handle_client(stream, shared));
                }
                Err(e) => {
                    warn!(error = %e, "IPC accept error");
                }
            }
        }
    });

    // One-second poll drives both the minute-boundary refresh and the
    // inactivity watchdog; the popup deadline gets its own arm so
    // dismissal is not quantized to the poll.
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let deadline = {
            let shared = shared.lock().await;
            shared.engine.next_deadline()
        };
        let has_deadline = deadline.is_some();
        let sleep_fut = match deadline {
            Some(dl) => tokio::time::sleep_until(tokio::time::Instant::from_std(dl)),
            None => tokio::time::sleep_until(
                tokio::time::Instant::now() + Duration::from_secs(86400),
            ),
        };

        tokio::select! {
            _ = tick.tick() => {
                let now = local_now();
                let mut shared = shared.lock().await;
                let mut msgs = Vec::new();
                // Minute boundary first, so an inactivity-triggered
                // redisplay in the same tick sees fresh progress.
                if now.second() == 0 {
                    msgs.push(RenderMsg::RefreshClock);
                    msgs.extend(shared.engine.refresh_progress(now));
                }
                let idle_ms = shared.last_interaction.elapsed().as_millis() as u64;
                if idle_ms >= shared.config.timing.inactive_duration_ms as u64 {
                    msgs.extend(shared.engine.request_display(now.date(), now));
                }
                broadcast(&mut shared, msgs);
            }
            _ = sleep_fut, if has_deadline => {
                let mut shared = shared.lock().await;
                let msgs = shared.engine.check_timer();
                broadcast(&mut shared, msgs);
            }
        }
    }
}

fn broadcast(shared: &mut Shared, msgs: Vec<RenderMsg>) {
    for msg in msgs {
        let line = ipc::encode(&msg);
        shared.renderer_txs.retain(|tx| tx.send(line.clone()).is_ok());
    }
}

async fn handle_client(stream: UnixStream, shared: Arc<Mutex<Shared>>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // Channel for sending messages back to this client.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let write_handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut is_renderer = false;

    while let Ok(Some(line)) = lines.next_line().await {
        let Some(msg) = ipc::decode_client(&line) else {
            continue;
        };

        let now = local_now();
        let mut shared = shared.lock().await;
        // Any client message counts as user activity.
        shared.last_interaction = Instant::now();

        match msg {
            ClientMsg::RegisterRenderer => {
                is_renderer = true;
                shared.renderer_txs.push(tx.clone());
                let ack = RenderMsg::Ack { ok: true, message: "renderer registered".into() };
                let _ = tx.send(ipc::encode(&ack));
                // Bring the newcomer up to date.
                let _ = tx.send(ipc::encode(&RenderMsg::SetTheme { dark: shared.dark_theme }));
                for msg in shared.engine.snapshot() {
                    let _ = tx.send(ipc::encode(&msg));
                }
            }
            ClientMsg::SelectDate { year, month, day } => {
                // Raw widget input gets normalized here, not in the engine.
                match chrono::NaiveDate::from_ymd_opt(year, month, day) {
                    Some(date) => {
                        info!(%date, "date selected");
                        let msgs = shared.engine.request_display(date, now);
                        broadcast(&mut shared, msgs);
                        let ack = RenderMsg::Ack {
                            ok: true,
                            message: format!("selected {}", date),
                        };
                        let _ = tx.send(ipc::encode(&ack));
                    }
                    None => {
                        let ack = RenderMsg::Ack {
                            ok: false,
                            message: format!("invalid date {}-{}-{}", year, month, day),
                        };
                        let _ = tx.send(ipc::encode(&ack));
                    }
                }
            }
            ClientMsg::OpenCalendar => {
                let msgs = shared.engine.open_calendar();
                broadcast(&mut shared, msgs);
                let ack = RenderMsg::Ack { ok: true, message: "calendar opened".into() };
                let _ = tx.send(ipc::encode(&ack));
            }
            ClientMsg::CloseCalendar => {
                let msgs = shared.engine.close_calendar(now);
                broadcast(&mut shared, msgs);
                let ack = RenderMsg::Ack { ok: true, message: "calendar closed".into() };
                let _ = tx.send(ipc::encode(&ack));
            }
            ClientMsg::NavigateMonth { delta } => {
                let msgs = shared.engine.navigate_month(delta);
                broadcast(&mut shared, msgs);
                let ack = RenderMsg::Ack {
                    ok: true,
                    message: format!("navigated {} month(s)", delta),
                };
                let _ = tx.send(ipc::encode(&ack));
            }
            ClientMsg::Touch => {
                // Interaction timestamp already updated above.
            }
            ClientMsg::ToggleTheme => {
                shared.dark_theme = !shared.dark_theme;
                info!(dark = shared.dark_theme, "theme toggled");
                let dark = shared.dark_theme;
                broadcast(&mut shared, vec![RenderMsg::SetTheme { dark }]);
                let ack = RenderMsg::Ack {
                    ok: true,
                    message: format!("dark theme: {}", dark),
                };
                let _ = tx.send(ipc::encode(&ack));
            }
            ClientMsg::GetStatus => {
                let status = shared.engine.status();
                let msg = RenderMsg::Status {
                    room_id: shared.config.general.room_id.clone(),
                    displayed_date: status.displayed_date.map(|d| d.to_string()),
                    lesson_count: status.lesson_count,
                    mode: status.mode.into(),
                    dark_theme: shared.dark_theme,
                    version: env!("CARGO_PKG_VERSION").to_string(),
                };
                let _ = tx.send(ipc::encode(&msg));
            }
        }
    }

    // Client disconnected; drop its renderer channel if it had one.
    if is_renderer {
        let mut shared = shared.lock().await;
        shared.renderer_txs.retain(|t| !t.is_closed());
    }

    write_handle.abort();
}
