//! Display sinks for the face image

/// Anything that can show a face image by identifier
pub trait DisplaySink {
    fn show(&mut self, image: &str);
}

/// Logs image changes; used when running headless
#[derive(Debug, Default)]
pub struct LogDisplay {
    current: Option<String>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl DisplaySink for LogDisplay {
    fn show(&mut self, image: &str) {
        if self.current.as_deref() != Some(image) {
            log::info!("face: {}", image);
            self.current = Some(image.to_string());
        }
    }
}

/// Records every distinct image shown, in order
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    history: Vec<String>,
    writes: usize,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Distinct consecutive images
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Total number of `show` calls, repeats included
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn has_shown(&self, image: &str) -> bool {
        self.history.iter().any(|i| i == image)
    }
}

impl DisplaySink for MemoryDisplay {
    fn show(&mut self, image: &str) {
        self.writes += 1;
        if self.current() != Some(image) {
            self.history.push(image.to_string());
        }
    }
}
