// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interactive operator console.
//!
//! Reads one command per line and renders registry state. The console never
//! mutates the registry; its only side effect on the service is requesting
//! shutdown.

use chrono::Local;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::bluetooth::{NOTIFY_CHAR_UUID, SERVICE_NAME, SERVICE_UUID, WRITE_CHAR_UUID};
use crate::state::AppState;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Console commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Help,
    Status,
    Clear,
    Quit,
}

/// Input that is not a console command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleCommandError {
    #[error("Unknown command: '{0}'. Type 'help' or 'h' for the command list.")]
    Unknown(String),
}

impl Command {
    /// Parse a line. Input is trimmed and case-insensitive; blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleCommandError> {
        let token = line.trim().to_lowercase();
        let command = match token.as_str() {
            "" => return Ok(None),
            "list" | "l" => Self::List,
            "help" | "h" => Self::Help,
            "status" | "s" => Self::Status,
            "clear" | "c" => Self::Clear,
            "quit" | "q" => Self::Quit,
            _ => return Err(ConsoleCommandError::Unknown(token)),
        };
        Ok(Some(command))
    }
}

/// Print the command list.
pub fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== Available commands ===")?;
    writeln!(out, "list, l     : list connected devices")?;
    writeln!(out, "help, h     : show this help")?;
    writeln!(out, "clear, c    : clear the screen")?;
    writeln!(out, "status, s   : show service status")?;
    writeln!(out, "quit, q     : exit")?;
    writeln!(out, "{}", "=".repeat(30))
}

/// Line-oriented console over shared [`AppState`].
pub struct Console {
    state: Arc<AppState>,
}

impl Console {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run until `quit`, end of input, or shutdown requested elsewhere.
    ///
    /// End of input and read errors are handled like `quit`.
    pub fn run(&self, mut input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = match input.read_line(&mut line) {
                Ok(n) => n,
                Err(e) => {
                    warn!("Console input failed: {}", e);
                    0
                }
            };

            if read == 0 {
                debug!("Console input closed");
                return self.quit(out);
            }

            if !self.state.is_running() {
                debug!("Shutdown in progress, console stops reading");
                return Ok(());
            }

            match Command::parse(&line) {
                Ok(Some(Command::Quit)) => return self.quit(out),
                Ok(Some(command)) => self.execute(command, out)?,
                Ok(None) => {}
                Err(e) => writeln!(out, "{}", e)?,
            }
            out.flush()?;
        }
    }

    /// Execute a non-terminating command.
    pub fn execute(&self, command: Command, out: &mut impl Write) -> io::Result<()> {
        match command {
            Command::List => self.write_devices(out),
            Command::Help => write_help(out),
            Command::Status => self.write_status(out),
            Command::Clear => write!(out, "{}", CLEAR_SCREEN),
            Command::Quit => self.quit(out),
        }
    }

    fn quit(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "\nShutting down...")?;
        out.flush()?;
        self.state.lifecycle.request_stop();
        Ok(())
    }

    fn write_devices(&self, out: &mut impl Write) -> io::Result<()> {
        let devices = self.state.devices();
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");

        writeln!(out, "\n[{}] === Connected devices ===", now)?;
        if devices.is_empty() {
            writeln!(out, "No devices connected.")?;
        } else {
            writeln!(out, "{} device(s) connected:", devices.len())?;
            for (i, device) in devices.iter().enumerate() {
                writeln!(out, "  {}. {} ({})", i + 1, device.display_name, device.address)?;
                writeln!(
                    out,
                    "      └ client: {}, link: {}",
                    device.client_reported_name, device.link_level_name
                )?;
                writeln!(
                    out,
                    "      └ last seen: {}",
                    device.last_seen.format("%H:%M:%S")
                )?;
            }
        }
        writeln!(out, "{}", "=".repeat(60))
    }

    fn write_status(&self, out: &mut impl Write) -> io::Result<()> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");

        writeln!(out, "\n[{}] === Service status ===", now)?;
        writeln!(out, "Service name: {}", SERVICE_NAME)?;
        writeln!(out, "Service UUID: {}", SERVICE_UUID)?;
        writeln!(out, "Write characteristic UUID: {}", WRITE_CHAR_UUID)?;
        writeln!(out, "Notify characteristic UUID: {}", NOTIFY_CHAR_UUID)?;
        writeln!(out, "Connected devices: {}", self.state.device_count())?;
        if let Some(payload) = self.state.last_payload() {
            writeln!(out, "Last payload: {}", payload.raw_json())?;
        }
        writeln!(out, "{}", "=".repeat(40))
    }
}
