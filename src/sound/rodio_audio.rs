//! Rodio-backed narration playback
//!
//! rodio's `OutputStream` is not `Send`, so the output device lives on a
//! dedicated thread that receives commands over a channel. The thread
//! publishes the sink's own position (`Sink::get_pos`) and when it sampled
//! it, so the reported time follows what the device has actually played.
//! Between samples the caller extrapolates from the sample instant.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::narration::{AudioError, AudioEvent, AudioTransport};

/// How often the audio thread samples the position and checks for the end
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Commands sent to the audio thread
enum AudioCommand {
    /// Replace the current source; replies once the file is decoded
    Load(PathBuf, Sender<Result<(), AudioError>>),
    Play,
    Pause,
    Shutdown,
}

/// State written by the audio thread
#[derive(Debug, Default)]
struct SharedState {
    ended: bool,
    /// Sink position at the last sample
    position: Duration,
    /// When `position` was sampled; `None` while the sink is not running
    sampled_at: Option<Instant>,
}

impl SharedState {
    fn publish(&mut self, sink: Option<&Sink>) {
        match sink {
            Some(s) => {
                self.position = s.get_pos();
                self.sampled_at = (!s.is_paused()).then(Instant::now);
            }
            None => self.sampled_at = None,
        }
    }
}

/// `AudioTransport` that plays files through the default output device
pub struct RodioAudio {
    root: PathBuf,
    commands: Sender<AudioCommand>,
    shared: Arc<Mutex<SharedState>>,
    thread: Option<JoinHandle<()>>,
    loaded: bool,
    playing: bool,
}

impl RodioAudio {
    /// Open the default output device. Sources are resolved below `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let (tx, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let shared = Arc::new(Mutex::new(SharedState::default()));

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("story-face-audio".to_string())
            .spawn(move || audio_thread_main(rx, thread_shared, ready_tx))
            .map_err(|e| AudioError::Open {
                source_ref: "output".to_string(),
                reason: e.to_string(),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = thread.join();
                return Err(err);
            }
            Err(_) => return Err(AudioError::Disconnected),
        }

        Ok(Self {
            root: root.into(),
            commands: tx,
            shared,
            thread: Some(thread),
            loaded: false,
            playing: false,
        })
    }

    fn send(&self, command: AudioCommand) -> Result<(), AudioError> {
        self.commands
            .send(command)
            .map_err(|_| AudioError::Disconnected)
    }
}

impl AudioTransport for RodioAudio {
    fn load(&mut self, source: &str) -> Result<(), AudioError> {
        let path = self.root.join(source);
        let (reply_tx, reply_rx) = bounded(1);
        self.send(AudioCommand::Load(path, reply_tx))?;
        let result = reply_rx.recv().map_err(|_| AudioError::Disconnected)?;

        self.shared.lock().ended = false;
        self.playing = false;
        self.loaded = result.is_ok();
        result
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if !self.loaded {
            return Err(AudioError::Open {
                source_ref: String::new(),
                reason: "no source loaded".to_string(),
            });
        }
        if !self.playing {
            self.send(AudioCommand::Play)?;
            self.playing = true;
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing {
            if self.send(AudioCommand::Pause).is_err() {
                log::warn!("Audio thread gone while pausing");
            }
            self.playing = false;
        }
    }

    fn current_time(&self) -> f64 {
        let state = self.shared.lock();
        let running = match state.sampled_at {
            Some(at) if self.playing => at.elapsed(),
            _ => Duration::ZERO,
        };
        (state.position + running).as_secs_f64()
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        let ended = std::mem::take(&mut self.shared.lock().ended);
        if !ended {
            return None;
        }
        self.playing = false;
        self.loaded = false;
        Some(AudioEvent::Ended)
    }
}

impl Drop for RodioAudio {
    fn drop(&mut self) {
        let _ = self.commands.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn audio_thread_main(
    rx: Receiver<AudioCommand>,
    shared: Arc<Mutex<SharedState>>,
    ready: Sender<Result<(), AudioError>>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to open audio output: {}", e);
            let _ = ready.send(Err(AudioError::Open {
                source_ref: "output".to_string(),
                reason: e.to_string(),
            }));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    log::debug!("Audio thread started");

    let mut sink: Option<Sink> = None;
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(AudioCommand::Load(path, reply)) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                let result = open_sink(&handle, &path).map(|s| sink = Some(s));
                {
                    let mut state = shared.lock();
                    state.position = Duration::ZERO;
                    state.sampled_at = None;
                }
                let _ = reply.send(result);
            }
            Ok(AudioCommand::Play) => {
                if let Some(s) = &sink {
                    s.play();
                }
            }
            Ok(AudioCommand::Pause) => {
                if let Some(s) = &sink {
                    s.pause();
                }
            }
            Ok(AudioCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let finished = sink.as_ref().is_some_and(|s| !s.is_paused() && s.empty());
        let mut state = shared.lock();
        if finished {
            sink = None;
            state.ended = true;
        }
        state.publish(sink.as_ref());
    }

    if let Some(s) = sink.take() {
        s.stop();
    }
    log::debug!("Audio thread exited");
}

/// Decode a file into a paused sink
fn open_sink(handle: &OutputStreamHandle, path: &Path) -> Result<Sink, AudioError> {
    let source_ref = path.display().to_string();
    let file = File::open(path).map_err(|e| AudioError::Open {
        source_ref: source_ref.clone(),
        reason: e.to_string(),
    })?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        source_ref: source_ref.clone(),
        reason: e.to_string(),
    })?;
    let sink = Sink::try_new(handle).map_err(|e| AudioError::Open {
        source_ref,
        reason: e.to_string(),
    })?;
    sink.pause();
    sink.append(source);
    log::debug!("Loaded narration {}", path.display());
    Ok(sink)
}
