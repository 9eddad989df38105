//! Interactive line-oriented front-end.
//!
//! The shell is the terminal counterpart of a converter page: one session,
//! edited a command at a time, with encoding on the background worker so a
//! slow encode never blocks the prompt. After every command the shell
//! dispatches a new request if an input changed and applies whatever
//! completions have already arrived.
//!
//! ```text
//! webpify> load photos/dawn.png
//! webpify> width 400
//! webpify> quality 60
//! webpify> wait
//! webpify> save out/
//! ```

use crate::config::ConverterConfig;
use crate::imaging::ImageBackend;
use crate::output;
use crate::session::Session;
use crate::upload::SourceFile;
use crate::worker::{self, ConversionWorker};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const PROMPT: &str = "webpify> ";

const HELP: &[&str] = &[
    "Commands:",
    "    load <path>          Load a PNG, JPEG or GIF",
    "    width <n>            Set target width",
    "    height <n>           Set target height",
    "    lock [on|off]        Set or toggle the aspect lock",
    "    quality <n>          Set quality (1-100)",
    "    status               Show original, target and converted output",
    "    wait                 Wait for the current conversion",
    "    save [dir]           Write <name>.webp (default: current directory)",
    "    reset                Discard the image and restore defaults",
    "    help                 Show this list",
    "    quit                 Leave the shell",
];

#[derive(Error, Debug, PartialEq)]
pub enum ShellError {
    #[error("Unknown command: {0} (try 'help')")]
    UnknownCommand(String),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("Not a number: {0}")]
    InvalidNumber(String),
    #[error("Expected on, off or nothing: {0}")]
    InvalidLock(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockChange {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Load(PathBuf),
    Width(u32),
    Height(u32),
    Lock(LockChange),
    Quality(u32),
    Save(Option<PathBuf>),
    Reset,
    Status,
    Wait,
    Help,
    Quit,
}

/// Parse a numeric argument. Out-of-range values saturate into `u32`;
/// the session clamps them further.
fn parse_number(arg: &str) -> Result<u32, ShellError> {
    let value: i64 = arg
        .parse()
        .map_err(|_| ShellError::InvalidNumber(arg.to_string()))?;
    Ok(value.clamp(0, u32::MAX as i64) as u32)
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let required = |name: &'static str| {
        if rest.is_empty() {
            Err(ShellError::MissingArgument(name))
        } else {
            Ok(rest)
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "load" | "open" => ShellCommand::Load(PathBuf::from(required("path")?)),
        "width" | "w" => ShellCommand::Width(parse_number(required("width")?)?),
        "height" | "h" => ShellCommand::Height(parse_number(required("height")?)?),
        "quality" | "q" => ShellCommand::Quality(parse_number(required("quality")?)?),
        "lock" => ShellCommand::Lock(match rest.to_ascii_lowercase().as_str() {
            "" | "toggle" => LockChange::Toggle,
            "on" => LockChange::On,
            "off" => LockChange::Off,
            other => return Err(ShellError::InvalidLock(other.to_string())),
        }),
        "save" => ShellCommand::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "reset" => ShellCommand::Reset,
        "status" => ShellCommand::Status,
        "wait" => ShellCommand::Wait,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(ShellError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

pub struct Shell {
    session: Session,
    backend: Arc<dyn ImageBackend + Send>,
    worker: ConversionWorker,
    overwrite: bool,
    wait_timeout: Duration,
}

impl Shell {
    pub fn new(
        backend: Arc<dyn ImageBackend + Send>,
        config: &ConverterConfig,
    ) -> std::io::Result<Self> {
        let worker = ConversionWorker::spawn(Arc::clone(&backend))?;
        Ok(Self {
            session: Session::new(config.session_defaults()),
            backend,
            worker,
            overwrite: config.output.overwrite,
            wait_timeout: Duration::from_secs(120),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one command and return the lines to show.
    pub fn execute(&mut self, command: ShellCommand) -> Vec<String> {
        let lines = match command {
            ShellCommand::Load(path) => self.load(path),
            ShellCommand::Width(width) => self.edit(|s| s.set_width(width)),
            ShellCommand::Height(height) => self.edit(|s| s.set_height(height)),
            ShellCommand::Quality(quality) => {
                self.session.set_quality(quality);
                vec![format!("Quality: {}", self.session.quality())]
            }
            ShellCommand::Lock(change) => {
                match change {
                    LockChange::On => self.session.set_locked(true),
                    LockChange::Off => self.session.set_locked(false),
                    LockChange::Toggle => {
                        self.session.toggle_lock();
                    }
                }
                let state = if self.session.is_locked() { "on" } else { "off" };
                vec![format!("Aspect lock: {}", state)]
            }
            ShellCommand::Save(dir) => {
                let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                match self.session.save(&dir, self.overwrite) {
                    Ok(path) => vec![format!("Saved {}", path.display())],
                    Err(e) => vec![format!("error: {}", e)],
                }
            }
            ShellCommand::Reset => {
                self.session.reset();
                vec!["Reset".to_string()]
            }
            ShellCommand::Status => output::format_status(&self.session),
            ShellCommand::Wait => {
                worker::dispatch(&mut self.session, &self.worker);
                if worker::settle(&mut self.session, &self.worker, self.wait_timeout) {
                    output::format_status(&self.session)
                } else {
                    vec!["error: conversion still running".to_string()]
                }
            }
            ShellCommand::Help => HELP.iter().map(|l| l.to_string()).collect(),
            ShellCommand::Quit => Vec::new(),
        };

        worker::dispatch(&mut self.session, &self.worker);
        worker::drain(&mut self.session, &self.worker);
        lines
    }

    fn load(&mut self, path: PathBuf) -> Vec<String> {
        let uploaded = SourceFile::from_path(&path)
            .and_then(|file| self.session.upload(&*self.backend, file).cloned());
        match uploaded {
            Ok(details) => output::format_details("Original", &details),
            Err(e) => vec![format!("error: {}", e)],
        }
    }

    fn edit(
        &mut self,
        apply: impl FnOnce(&mut Session) -> Result<(), crate::session::SessionError>,
    ) -> Vec<String> {
        match apply(&mut self.session) {
            Ok(()) => {
                let target = self.session.target().map(|t| t.to_string()).unwrap_or_default();
                vec![format!("Target: {}", target)]
            }
            Err(e) => vec![format!("error: {}", e)],
        }
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> std::io::Result<()> {
        write!(out, "{}", PROMPT)?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => {
                    let lines = self.execute(command);
                    output::write_lines(out, &lines)?;
                }
                Ok(None) => {}
                Err(e) => writeln!(out, "error: {}", e)?,
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }
}
