//! Console line commands
//!
//! Each stdin line maps to one [`ConsoleCommand`]. Parsing is pure so the
//! grammar can be tested without a terminal.

use opsdeck_app::state::View;
use opsdeck_app::Message;
use opsdeck_core::{DeviceField, DeviceId, TransferDirection};

pub const HELP: &str = "\
commands:
  view <monitor|connection|files|transfer|commands>
  auto on|off            periodic telemetry refresh
  refresh                poll telemetry now
  set <device> <field> <value>   field: username|password|host|directory
  test                   test both device connections
  ls                     list files on both devices
  src <path> | dst <path> | dir <device1|device2> | swap | transfer
  target <device> | exec [command...]
  preset <n>             fill the command form from preset n (0-based)
  use-cmd <n>            fill the command form from history entry n
  rerun-cmd <n> | rerun-transfer <n>   re-dispatch history entry n (0 = newest)
  select <device> <path> toggle a listed file
  status | help | quit";

/// What one console line asks for.
#[derive(Debug, Clone)]
pub enum ConsoleCommand {
    /// Messages to process in order
    Send(Vec<Message>),
    /// Print a state summary
    Status,
    Help,
}

impl ConsoleCommand {
    fn send(message: Message) -> Self {
        Self::Send(vec![message])
    }
}

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "view" => ConsoleCommand::send(Message::SwitchView(rest.parse::<View>()?)),
        "auto" => ConsoleCommand::send(Message::SetAutoRefresh(parse_toggle(rest)?)),
        "refresh" | "r" => ConsoleCommand::send(Message::RefreshTelemetry),
        "set" => {
            let (device, field, value) = parse_device_field(rest)?;
            ConsoleCommand::send(Message::EditDevice {
                device,
                field,
                value,
            })
        }
        "test" => ConsoleCommand::send(Message::TestConnections),
        "ls" => ConsoleCommand::send(Message::ListFiles),
        "src" => ConsoleCommand::send(Message::SetTransferSource(rest.to_string())),
        "dst" => ConsoleCommand::send(Message::SetTransferDest(rest.to_string())),
        "dir" => ConsoleCommand::send(Message::SetTransferDirection(
            rest.parse::<TransferDirection>()?,
        )),
        "swap" => ConsoleCommand::send(Message::SwapTransferDirection),
        "transfer" => ConsoleCommand::send(Message::StartTransfer),
        "target" => ConsoleCommand::send(Message::SetCommandTarget(rest.parse::<DeviceId>()?)),
        "exec" => {
            if rest.is_empty() {
                ConsoleCommand::send(Message::ExecuteCommand)
            } else {
                ConsoleCommand::Send(vec![
                    Message::SetCommand(rest.to_string()),
                    Message::ExecuteCommand,
                ])
            }
        }
        "preset" => ConsoleCommand::send(Message::UsePreset(parse_index(rest)?)),
        "use-cmd" => ConsoleCommand::send(Message::UseHistoryCommand(parse_index(rest)?)),
        "rerun-cmd" => ConsoleCommand::send(Message::RerunCommand {
            index: parse_index(rest)?,
        }),
        "rerun-transfer" => ConsoleCommand::send(Message::RerunTransfer {
            index: parse_index(rest)?,
        }),
        "select" => {
            let (device, path) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: select <device> <path>".to_string())?;
            ConsoleCommand::send(Message::ToggleFileSelection {
                device: device.parse()?,
                path: path.trim().to_string(),
            })
        }
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "q" | "exit" => ConsoleCommand::send(Message::Quit),
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };

    Ok(Some(command))
}

/// Parse `<device> <field> [value...]`. A missing value clears the field.
fn parse_device_field(rest: &str) -> Result<(DeviceId, DeviceField, String), String> {
    let mut parts = rest.splitn(3, char::is_whitespace);
    let usage = || "usage: set <device> <field> <value>".to_string();
    let device = parts.next().filter(|s| !s.is_empty()).ok_or_else(usage)?;
    let field = parts.next().ok_or_else(usage)?;
    let value = parts.next().unwrap_or("").trim();
    Ok((device.parse()?, field.parse()?, value.to_string()))
}

/// Parse a `device1.host=10.0.0.1` style assignment from the command line.
pub fn parse_assignment(arg: &str) -> Result<(DeviceId, DeviceField, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <device>.<field>=<value>, got '{}'", arg))?;
    let (device, field) = key
        .split_once('.')
        .ok_or_else(|| format!("expected <device>.<field>, got '{}'", key))?;
    Ok((device.parse()?, field.parse()?, value.to_string()))
}

fn parse_toggle(arg: &str) -> Result<bool, String> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected on|off, got '{}'", other)),
    }
}

fn parse_index(arg: &str) -> Result<usize, String> {
    arg.parse::<usize>()
        .map_err(|_| format!("expected an index, got '{}'", arg))
}
