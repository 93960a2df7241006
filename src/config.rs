use crate::canvas::Rgb;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_CRACKERS: usize = 8;

/// Runtime options for a scene session.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub background: Rgb,
    /// Segments per firecracker chain.
    pub crackers: usize,
    pub auto_launch: bool,
    /// Seconds between ambient launch rolls.
    pub auto_interval: f32,
    /// Probability that a roll actually launches.
    pub auto_chance: f32,
    pub log_path: Option<PathBuf>,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            background: (0, 0, 0),
            crackers: DEFAULT_CRACKERS,
            auto_launch: true,
            auto_interval: 1.5,
            auto_chance: 0.3,
            log_path: None,
            log_level: Level::INFO,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Command {
    Run(Config),
    Help,
}

pub fn print_usage() {
    eprintln!("termfest - Festive fireworks and firecrackers in your terminal");
    eprintln!();
    eprintln!("Usage: termfest [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --bg-color RRGGBB       Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --crackers N            Firecrackers per chain (default 8)");
    eprintln!("  --auto-interval SECS    Seconds between ambient launch rolls (default 1.5)");
    eprintln!("  --auto-chance P         Chance an ambient roll launches, 0-1 (default 0.3)");
    eprintln!("  --no-auto               Disable ambient fireworks");
    eprintln!("  --log PATH              Write logs to PATH");
    eprintln!("  --log-level LEVEL       error, warn, info, debug or trace (default info)");
    eprintln!();
    eprintln!("Controls:");
    eprintln!("  drag the match onto a fuse to light it, or click the fuse");
    eprintln!("  f / space = launch, d = double launch, b = bang, l / r = light left / right chain");
    eprintln!();
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

impl Config {
    /// Parses the arguments following the program name.
    pub fn from_args<I>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let mut config = Config::default();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            match arg {
                "help" | "--help" | "-h" => return Ok(Command::Help),
                "--no-auto" => {
                    config.auto_launch = false;
                    i += 1;
                }
                "--bg-color" | "--crackers" | "--auto-interval" | "--auto-chance" | "--log"
                | "--log-level" => {
                    let value = args
                        .get(i + 1)
                        .ok_or_else(|| Error::MissingValue(arg.to_string()))?;
                    config.apply(arg, value)?;
                    i += 2;
                }
                other => return Err(Error::UnknownOption(other.to_string())),
            }
        }

        Ok(Command::Run(config))
    }

    /// Creates the `--log` file, if one was asked for.
    pub fn open_log(&self) -> Result<Option<File>> {
        let Some(path) = &self.log_path else {
            return Ok(None);
        };
        File::create(path).map(Some).map_err(|source| Error::LogFile {
            path: path.clone(),
            source,
        })
    }

    fn apply(&mut self, option: &str, value: &str) -> Result<()> {
        let invalid = || Error::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
        };

        match option {
            "--bg-color" => {
                self.background =
                    parse_hex_color(value).ok_or_else(|| Error::InvalidColor(value.to_string()))?;
            }
            "--crackers" => {
                self.crackers = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(invalid)?;
            }
            "--auto-interval" => {
                self.auto_interval = value
                    .parse::<f32>()
                    .ok()
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .ok_or_else(invalid)?;
            }
            "--auto-chance" => {
                self.auto_chance = value
                    .parse::<f32>()
                    .ok()
                    .filter(|p| (0.0..=1.0).contains(p))
                    .ok_or_else(invalid)?;
            }
            "--log" => self.log_path = Some(PathBuf::from(value)),
            "--log-level" => {
                self.log_level = value
                    .parse::<Level>()
                    .map_err(|_| Error::InvalidLogLevel(value.to_string()))?;
            }
            _ => return Err(Error::UnknownOption(option.to_string())),
        }
        Ok(())
    }
}
