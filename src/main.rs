//! Velocity client - headless offline match
//!
//! Plays a full offline match with the local car on autopilot and logs the
//! gameplay events a HUD would show. Settings come from the file named by
//! `VELOCITY_SETTINGS`, if set.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use velocity_client::net::EventWatcher;
    use velocity_client::settings::SETTINGS_ENV;
    use velocity_client::sim::state::format_clock;
    use velocity_client::sim::{BotController, MatchState};
    use velocity_client::{Session, Settings};

    env_logger::init();
    log::info!("Velocity client (headless) starting...");

    let settings = match std::env::var(SETTINGS_ENV) {
        Ok(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        Err(_) => Settings::default(),
    };

    const FRAME_DT: f64 = 1.0 / 60.0;
    // Regulation plus a minute of sudden death at most
    let max_frames = ((settings.match_duration_ms + 60_000) as f64 / 1000.0 / FRAME_DT) as u64;

    let mut session = Session::new();
    session.start_offline(&settings, "local");

    let mut autopilot = BotController;
    let mut watcher = EventWatcher::new();
    let mut latest: Option<MatchState> = None;
    let mut now_ms = 0i64;

    for _ in 0..max_frames {
        now_ms += (FRAME_DT * 1000.0) as i64;
        let mut sink = |snapshot: MatchState| latest = Some(snapshot);
        session.frame(FRAME_DT, now_ms, &mut autopilot, &mut sink);

        let Some(state) = latest.as_ref() else {
            continue;
        };
        if let Some(event) = watcher.observe(state) {
            log::info!(
                "[{}] {} (orange {} - blue {})",
                format_clock(state.score.time_remaining_ms),
                event.label(),
                state.score.orange,
                state.score.blue
            );
        }
        if state.is_over() {
            break;
        }
    }

    match latest {
        Some(state) => {
            let result = match state.winner() {
                Some(team) => format!("{} wins", team.as_str()),
                None => "no winner".to_string(),
            };
            println!(
                "Final: orange {} - blue {} ({}, {} ticks, {} left)",
                state.score.orange,
                state.score.blue,
                result,
                state.tick,
                format_clock(state.score.time_remaining_ms)
            );
        }
        None => println!("No frames simulated"),
    }
    session.stop();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser embedding drives `Session` directly
}
