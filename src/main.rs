use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use story_face::config::{self, Options};
use story_face::narration::{
    AudioTransport, Clock, FileStorySource, LogDisplay, Narrator, PlaybackState, SimulatedAudio,
    SystemClock,
};
use story_face::sound::RodioAudio;
use story_face::{logging, Cli};

/// Length of every narration when audio is simulated, in seconds
const SIMULATED_DURATION: f64 = 120.0;

/// Upper bound on one wait so a missed deadline is noticed quickly
const MAX_WAIT: Duration = Duration::from_millis(100);

/// Console commands read from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Pause,
    Toggle,
    Restart,
    Select(usize),
    List,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_lowercase().as_str() {
        "play" | "resume" => Command::Play,
        "pause" => Command::Pause,
        "toggle" => Command::Toggle,
        "restart" => Command::Restart,
        "list" => Command::List,
        "quit" | "exit" => Command::Quit,
        "select" => {
            let index = words
                .next()
                .context("select needs a story index")?
                .parse()
                .context("Invalid story index")?;
            Command::Select(index)
        }
        other => anyhow::bail!(
            "Unknown command: {}. Valid commands: play, pause, toggle, restart, select N, list, quit",
            other
        ),
    };
    Ok(Some(command))
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Config file first, then CLI overrides
    let options = config::load_config(&cli.config)?;
    let options = cli.merge_into_options(options)?;
    options.validate().context("Invalid configuration")?;

    logging::init(options.log_level, options.log_file.as_deref())?;
    info!("story-face {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Options: {:?}", options);

    let clock = SystemClock::new();
    let source = FileStorySource::new(&options.stories_dir);

    if options.audio {
        match RodioAudio::open(&options.stories_dir) {
            Ok(audio) => return run(audio, clock, &source, &options),
            Err(e) => warn!("Audio output unavailable ({}), simulating playback", e),
        }
    }
    run(SimulatedAudio::new(clock, SIMULATED_DURATION), clock, &source, &options)
}

fn run<A: AudioTransport>(
    audio: A,
    clock: SystemClock,
    source: &FileStorySource,
    options: &Options,
) -> Result<()> {
    let mut narrator = Narrator::new(audio, LogDisplay::new(), clock, options.narrator_config());
    let count = narrator
        .load_catalog(source, &options.index)
        .with_context(|| format!("Failed to load stories from {}", source.root().display()))?;
    info!("Loaded {} stories from {}", count, source.root().display());

    if options.list_only {
        print_catalog(&narrator);
        return Ok(());
    }

    if let Some(index) = options.story {
        match narrator.select_story(index) {
            Ok(()) if options.autoplay => {
                if let Err(e) = narrator.resume() {
                    error!("Failed to start story {}: {}", index, e);
                }
            }
            Ok(()) => {}
            Err(e) => error!("Failed to select story {}: {}", index, e),
        }
    }

    let lines = spawn_stdin_reader()?;
    loop {
        narrator.update();

        let now = narrator.clock().now();
        let wait = narrator.next_deadline().saturating_sub(now).min(MAX_WAIT);
        match lines.recv_timeout(wait) {
            Ok(line) => match parse_command(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => execute(&mut narrator, command),
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Input closed, stopping");
                break;
            }
        }
    }

    narrator.pause();
    Ok(())
}

fn execute<A: AudioTransport>(narrator: &mut Narrator<A, LogDisplay, SystemClock>, command: Command) {
    let result = match command {
        Command::Play if narrator.state() == PlaybackState::Ended => narrator.restart().map(drop),
        Command::Play => narrator.resume().map(drop),
        Command::Pause => {
            narrator.pause();
            Ok(())
        }
        Command::Toggle => narrator.toggle().map(drop),
        Command::Restart => narrator.restart().map(drop),
        Command::Select(index) => narrator.select_story(index),
        Command::List => {
            print_catalog(narrator);
            Ok(())
        }
        Command::Quit => Ok(()),
    };
    if let Err(e) = result {
        error!("{:?} failed: {}", command, e);
    }
    debug!("State after {:?}: {:?}", command, narrator.state());
}

fn print_catalog<A: AudioTransport>(narrator: &Narrator<A, LogDisplay, SystemClock>) {
    for entry in narrator.stories() {
        println!("{:>3}  {:<30} {}", entry.index, entry.name, entry.preview);
    }
}

/// Forward stdin lines to the run loop. The channel disconnects on EOF.
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("story-face-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn input thread")?;
    Ok(rx)
}
