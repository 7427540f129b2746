pub mod commands;
pub mod preview;
pub mod record;
pub mod telemetry;

pub use commands::{dispatch, dispatch_packet, MoveCommand};
pub use record::{record, RecordOptions, RecordSummary};
pub use telemetry::{SensorReading, SensorSimulator};

use crate::core::{EventTag, Pipeline};
use anyhow::{Context, Result};
use chrono::Local;
use crossbeam_channel::{bounded, select, tick, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use preview::Preview;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

const STATUS_LOG_LINES: usize = 5;

/// What a key press asks the console to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(MoveCommand),
    SaveFrame,
    SaveVideo,
    ToggleQuality,
    SaveLog,
    Quit,
}

/// Map a key event to an action. Held-key repeats and releases are ignored.
pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let action = match key.code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Action::Move(MoveCommand::Forward),
            's' => Action::Move(MoveCommand::Backward),
            'a' => Action::Move(MoveCommand::Left),
            'd' => Action::Move(MoveCommand::Right),
            ' ' => Action::Move(MoveCommand::Stop),
            'b' => Action::Move(MoveCommand::Sound),
            'o' => Action::Move(MoveCommand::MoveToObstacle),
            'p' => Action::SaveFrame,
            'v' => Action::SaveVideo,
            't' => Action::ToggleQuality,
            'l' => Action::SaveLog,
            'q' => Action::Quit,
            _ => return None,
        },
        KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// Lines shown under the preview
pub fn status_lines(pipeline: &Pipeline, reading: Option<&SensorReading>) -> Vec<String> {
    let source = if pipeline.is_simulated() { "simulated" } else { "camera" };
    let mut lines = vec![
        format!(
            "Source: {} | Quality: {} | Buffered: {}/{} | Export: {}",
            source,
            pipeline.quality().label(),
            pipeline.buffer().len(),
            pipeline.buffer().capacity(),
            pipeline.exporter_name(),
        ),
        match reading {
            Some(r) => format!("Sensors: {}", r),
            None => "Sensors: waiting".to_string(),
        },
        "WASD move  Space stop  B sound  O obstacle  P frame  V video  T quality  L log  Q quit"
            .to_string(),
    ];
    lines.extend(
        pipeline
            .events()
            .recent(STATUS_LOG_LINES)
            .iter()
            .map(|e| e.to_string()),
    );
    lines
}

/// Apply one action. Returns false when the console should exit.
pub fn handle_action(pipeline: &mut Pipeline, action: Action) -> bool {
    match action {
        Action::Move(cmd) => dispatch(cmd, pipeline.events()),
        Action::SaveFrame => {
            // Failures are already in the event log
            let _ = pipeline.on_snapshot_requested();
        }
        Action::SaveVideo => {
            let _ = pipeline.on_export_requested();
        }
        Action::ToggleQuality => {
            pipeline.toggle_quality();
        }
        Action::SaveLog => {
            let dir = pipeline.config().log_directory.clone();
            let events = pipeline.events();
            match events.save(&dir, Local::now().naive_local()) {
                Ok(path) => events.push(EventTag::Save, format!("Log saved: {}", path.display())),
                Err(e) => events.push(EventTag::Error, format!("Log save failed: {}", e)),
            }
        }
        Action::Quit => return false,
    }
    true
}

fn spawn_keyboard(tx: Sender<Action>, running: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(50)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!("Keyboard poll failed: {}", e);
                    break;
                }
            }
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(action) = action_for(key) {
                    if tx.send(action).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Interactive console: preview, sensor feed and keyboard control.
pub fn run(mut pipeline: Pipeline) -> Result<()> {
    let video = tick(pipeline.config().tick_interval());
    let telemetry = tick(pipeline.config().telemetry_interval());
    let (tx, actions) = bounded::<Action>(32);
    let running = Arc::new(AtomicBool::new(true));

    let mut preview = Preview::enter().context("Failed to set up terminal")?;
    let keyboard = spawn_keyboard(tx, running.clone());
    let mut sensors = SensorSimulator::from_entropy();
    let mut reading = None;

    info!("Console started");
    loop {
        select! {
            recv(video) -> _ => {
                pipeline.on_video_tick();
                let status = status_lines(&pipeline, reading.as_ref());
                preview.draw(pipeline.displayed(), &status)?;
            }
            recv(telemetry) -> _ => {
                let sample = sensors.sample();
                pipeline.events().push(EventTag::Data, sample.to_string());
                reading = Some(sample);
            }
            recv(actions) -> action => {
                let Ok(action) = action else { break };
                if !handle_action(&mut pipeline, action) {
                    break;
                }
            }
        }
    }

    running.store(false, Ordering::Relaxed);
    drop(preview);
    let _ = keyboard.join();
    info!("Console stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameSource;
    use crate::config::{PipelineConfig, Resolution};
    use crate::core::{EventLog, QualityMode};
    use crate::export::testing::MemoryBackend;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn pipeline(dir: &std::path::Path) -> Pipeline {
        let mut config = PipelineConfig::default();
        config.export.directory = dir.join("videos");
        config.snapshot_directory = dir.join("snapshots");
        config.log_directory = dir.join("logs");
        Pipeline::new(
            config,
            FrameSource::simulated(Resolution::new(64, 48)),
            Box::new(MemoryBackend::default()),
            EventLog::new(100),
        )
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            action_for(key(KeyCode::Char('W'), KeyEventKind::Press)),
            Some(Action::Move(MoveCommand::Forward))
        );
        assert_eq!(
            action_for(key(KeyCode::Char(' '), KeyEventKind::Press)),
            Some(Action::Move(MoveCommand::Stop))
        );
        assert_eq!(action_for(key(KeyCode::Char('v'), KeyEventKind::Press)), Some(Action::SaveVideo));
        assert_eq!(action_for(key(KeyCode::Esc, KeyEventKind::Press)), Some(Action::Quit));
        assert_eq!(action_for(key(KeyCode::Char('z'), KeyEventKind::Press)), None);
    }

    #[test]
    fn repeats_and_releases_are_ignored() {
        assert_eq!(action_for(key(KeyCode::Char('w'), KeyEventKind::Repeat)), None);
        assert_eq!(action_for(key(KeyCode::Char('w'), KeyEventKind::Release)), None);
    }

    #[test]
    fn actions_drive_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = pipeline(dir.path());
        p.on_video_tick();

        assert!(handle_action(&mut p, Action::ToggleQuality));
        assert_eq!(p.quality(), QualityMode::Low);

        assert!(handle_action(&mut p, Action::Move(MoveCommand::Forward)));
        assert_eq!(p.events().last().map(|e| e.tag), Some(EventTag::Cmd));

        assert!(handle_action(&mut p, Action::SaveVideo));
        assert!(p.buffer().is_empty());

        // Second export finds nothing and only warns
        assert!(handle_action(&mut p, Action::SaveVideo));
        assert_eq!(p.events().last().map(|e| e.tag), Some(EventTag::Warn));

        assert!(handle_action(&mut p, Action::SaveLog));
        let saved = std::fs::read_dir(dir.path().join("logs")).unwrap().count();
        assert_eq!(saved, 1);

        assert!(!handle_action(&mut p, Action::Quit));
    }

    #[test]
    fn status_shows_quality_and_reading() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let reading = SensorReading {
            distance_cm: 12.0,
            temperature_c: 20.0,
            humidity_pct: 40,
        };
        let lines = status_lines(&p, Some(&reading));
        assert!(lines[0].contains("Quality: high"));
        assert!(lines[0].contains("simulated"));
        assert!(lines[1].contains("Dist: 12.0cm"));
    }
}
