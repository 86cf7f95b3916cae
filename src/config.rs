use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::logging::LogLevel;
use crate::narration::{AnimationConfig, NarratorConfig};

/// Name of the optional config file inside the config directory
pub const CONFIG_FILE: &str = "story-face.cfg";

/// Application options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    // Commandline-only options
    pub config_dir: Option<String>,
    pub list_only: bool,

    // Commandline and user config options
    pub stories_dir: String,
    pub index: String,
    pub blink_period_ms: u64,
    pub blink_duration_ms: u64,
    pub mouth_period_ms: u64,
    pub mouth_duration_ms: u64,
    pub render_period_ms: u64,
    pub emotion_delay_ms: u64,
    pub story: Option<usize>,
    pub autoplay: bool,
    pub audio: bool,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config_dir: None,
            list_only: false,
            stories_dir: "stories".to_string(),
            index: "index.json".to_string(),
            blink_period_ms: 4000,
            blink_duration_ms: 200,
            mouth_period_ms: 250,
            mouth_duration_ms: 120,
            render_period_ms: 50,
            emotion_delay_ms: 3000,
            story: None,
            autoplay: false,
            audio: true,
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

impl Options {
    /// Check timing values for consistency
    pub fn validate(&self) -> Result<()> {
        check_cycle("blink", self.blink_period_ms, self.blink_duration_ms)?;
        check_cycle("mouth", self.mouth_period_ms, self.mouth_duration_ms)?;
        if self.render_period_ms == 0 {
            anyhow::bail!("render_period_ms must be positive");
        }
        Ok(())
    }

    pub fn narrator_config(&self) -> NarratorConfig {
        NarratorConfig {
            animation: AnimationConfig {
                blink_period: Duration::from_millis(self.blink_period_ms),
                blink_duration: Duration::from_millis(self.blink_duration_ms),
                mouth_period: Duration::from_millis(self.mouth_period_ms),
                mouth_duration: Duration::from_millis(self.mouth_duration_ms),
                render_period: Duration::from_millis(self.render_period_ms),
            },
            emotion_delay: Duration::from_millis(self.emotion_delay_ms),
        }
    }

    /// Apply one `key = value` pair. Returns false for unknown keys.
    fn apply(&mut self, key: &str, value: &str) -> Result<bool> {
        match key {
            "stories_dir" => self.stories_dir = value.to_string(),
            "index" => self.index = value.to_string(),
            "blink_period_ms" => self.blink_period_ms = parse_millis(value)?,
            "blink_duration_ms" => self.blink_duration_ms = parse_millis(value)?,
            "mouth_period_ms" => self.mouth_period_ms = parse_millis(value)?,
            "mouth_duration_ms" => self.mouth_duration_ms = parse_millis(value)?,
            "render_period_ms" => self.render_period_ms = parse_millis(value)?,
            "emotion_delay_ms" => self.emotion_delay_ms = parse_millis(value)?,
            "story" => self.story = Some(value.parse().context("Invalid story index")?),
            "autoplay" => self.autoplay = parse_bool(value)?,
            "audio" => self.audio = parse_bool(value)?,
            "log_level" => self.log_level = value.parse()?,
            "log_file" => self.log_file = Some(value.to_string()),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn check_cycle(name: &str, period_ms: u64, duration_ms: u64) -> Result<()> {
    if period_ms == 0 {
        anyhow::bail!("{}_period_ms must be positive", name);
    }
    if duration_ms > period_ms {
        anyhow::bail!(
            "{}_duration_ms ({}) exceeds {}_period_ms ({})",
            name,
            duration_ms,
            name,
            period_ms
        );
    }
    Ok(())
}

/// Load configuration from story-face.cfg in `config_dir` (or the current
/// directory). A missing file yields the defaults.
pub fn load_config(config_dir: &Option<String>) -> Result<Options> {
    let dir = config_dir.as_deref().map(PathBuf::from).unwrap_or_default();
    let path = dir.join(CONFIG_FILE);
    if !path.is_file() {
        log::debug!("No config file at {}", path.display());
        return Ok(Options::default());
    }
    load_config_file(&path)
}

/// Parse a config file on top of the defaults
pub fn load_config_file(path: &Path) -> Result<Options> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Parse `key = value` lines; `#` starts a comment
pub fn parse_config(text: &str) -> Result<Options> {
    let mut opts = Options::default();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            anyhow::bail!("line {}: expected key = value", number + 1);
        };
        let key = key.trim();
        let applied = opts
            .apply(key, value.trim())
            .with_context(|| format!("line {}: bad value for {}", number + 1, key))?;
        if !applied {
            log::warn!("Ignoring unknown config key '{}' on line {}", key, number + 1);
        }
    }
    Ok(opts)
}

/// Parse a non-negative millisecond count
pub fn parse_millis(s: &str) -> Result<u64> {
    s.trim()
        .parse()
        .with_context(|| format!("Invalid millisecond value: {}", s))
}

/// Parse a boolean flag (true/false, yes/no, on/off, 1/0)
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Invalid boolean: {}. Valid options: true, false", s),
    }
}
