//! Stand-in collaborators for builds without a display and for tests.

/// Display that accepts and discards every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl feeder_traits::Display for NullDisplay {
    fn write_lines(&mut self, _line1: &str, _line2: &str) -> bool {
        true
    }
}

/// Display that keeps every frame it was asked to show; clones share the log.
#[derive(Debug, Default, Clone)]
pub struct RecordingDisplay {
    frames: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<(String, String)> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl feeder_traits::Display for RecordingDisplay {
    fn write_lines(&mut self, line1: &str, line2: &str) -> bool {
        match self.frames.lock() {
            Ok(mut f) => {
                f.push((line1.to_string(), line2.to_string()));
                true
            }
            Err(_) => false,
        }
    }
}
