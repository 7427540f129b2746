use crate::core::{EventLog, EventTag};

/// Movement and signal commands for the remote device.
///
/// There is no device link yet, so dispatching only records the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCommand {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    Sound,
    MoveToObstacle,
}

impl MoveCommand {
    pub fn describe(&self) -> &'static str {
        match self {
            MoveCommand::Forward => "FORWARD",
            MoveCommand::Backward => "BACKWARD",
            MoveCommand::Left => "Turn LEFT",
            MoveCommand::Right => "Turn RIGHT",
            MoveCommand::Stop => "STOP",
            MoveCommand::Sound => "Sound signal",
            MoveCommand::MoveToObstacle => "Move to obstacle",
        }
    }
}

pub fn dispatch(command: MoveCommand, events: &EventLog) {
    events.push(EventTag::Cmd, command.describe());
}

/// Send a batch of free-form commands, one per line (`forward 2000`,
/// `right 90`, `stop`). Blank lines are skipped.
///
/// Returns how many commands went out; an empty batch only warns.
pub fn dispatch_packet(text: &str, events: &EventLog) -> usize {
    let commands: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if commands.is_empty() {
        events.push(EventTag::Warn, "Command packet is empty");
        return 0;
    }

    events.push(EventTag::Cmd, format!("Sending command packet ({} commands):", commands.len()));
    for command in &commands {
        events.push(EventTag::Cmd, format!("  {}", command));
    }
    commands.len()
}
