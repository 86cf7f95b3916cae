use crate::config::Options;
use crate::logging::LogLevel;
use anyhow::Result;
use clap::Parser;

/// Story Face - narrates stories through an animated robot face
#[derive(Parser, Debug, Default)]
#[command(name = "story-face")]
#[command(version)]
#[command(about = "Narrate stories with a synchronized animated face", long_about = None)]
pub struct Cli {
    /// Directory holding the story index and documents
    #[arg(short, long, value_name = "DIR")]
    pub stories: Option<String>,

    /// Story index file, relative to the stories directory
    #[arg(short, long, value_name = "FILE")]
    pub index: Option<String>,

    /// Configuration directory path
    #[arg(short, long, value_name = "CONFIGDIR")]
    pub config: Option<String>,

    /// Story to select at startup (0-based)
    #[arg(long, value_name = "N")]
    pub story: Option<usize>,

    /// Start playing the selected story immediately
    #[arg(short, long)]
    pub autoplay: bool,

    /// Simulate audio instead of using the output device
    #[arg(long = "no-audio")]
    pub no_audio: bool,

    /// How long an emotion stays on screen
    #[arg(long = "emotion-delay", value_name = "MS")]
    pub emotion_delay: Option<u64>,

    /// Log level (nothing, error, warning, info, debug, all)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log file path
    #[arg(short, long, value_name = "FILE")]
    pub logfile: Option<String>,

    /// Print the story catalog and exit
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref stories) = self.stories {
            opts.stories_dir = stories.clone();
        }

        if let Some(ref index) = self.index {
            opts.index = index.clone();
        }

        if let Some(ref config_dir) = self.config {
            opts.config_dir = Some(config_dir.clone());
        }

        if let Some(story) = self.story {
            opts.story = Some(story);
        }

        if self.autoplay {
            opts.autoplay = true;
        }

        if self.no_audio {
            opts.audio = false;
        }

        if let Some(delay) = self.emotion_delay {
            opts.emotion_delay_ms = delay;
        }

        if let Some(ref level) = self.log_level {
            opts.log_level = level.parse::<LogLevel>()?;
        }

        if let Some(ref log_file) = self.logfile {
            opts.log_file = Some(log_file.clone());
        }

        if self.list {
            opts.list_only = true;
        }

        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_basic_options() {
        let cli = Cli {
            stories: Some("/srv/stories".to_string()),
            story: Some(1),
            autoplay: true,
            no_audio: true,
            ..Default::default()
        };

        let opts = cli.merge_into_options(Options::default()).unwrap();
        assert_eq!(opts.stories_dir, "/srv/stories");
        assert_eq!(opts.story, Some(1));
        assert!(opts.autoplay);
        assert!(!opts.audio);
        assert_eq!(opts.index, "index.json");
    }

    #[test]
    fn test_cli_overrides_config_values() {
        let mut file_opts = Options::default();
        file_opts.emotion_delay_ms = 1000;
        file_opts.autoplay = true;

        let cli = Cli {
            emotion_delay: Some(500),
            ..Default::default()
        };
        let opts = cli.merge_into_options(file_opts).unwrap();
        assert_eq!(opts.emotion_delay_ms, 500);
        // flags only ever switch on
        assert!(opts.autoplay);
    }

    #[test]
    fn test_invalid_log_level() {
        let cli = Cli {
            log_level: Some("shouty".to_string()),
            ..Default::default()
        };

        let result = cli.merge_into_options(Options::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "story-face",
            "--stories",
            "demo",
            "--story",
            "2",
            "--no-audio",
            "--emotion-delay",
            "1200",
            "--log-level",
            "debug",
            "--list",
        ])
        .unwrap();

        assert_eq!(cli.stories.as_deref(), Some("demo"));
        assert_eq!(cli.story, Some(2));
        assert!(cli.no_audio);
        assert_eq!(cli.emotion_delay, Some(1200));
        assert!(cli.list);

        let opts = cli.merge_into_options(Options::default()).unwrap();
        assert_eq!(opts.log_level, LogLevel::Debug);
        assert!(opts.list_only);
    }
}
