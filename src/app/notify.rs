/// Coloring hint for a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Ok,
    Error,
}

/// Receives operator-facing status text.
pub trait NotificationSink {
    fn notify(&mut self, message: &str, tone: Tone);
}

/// Keeps every notice; handy for scripting and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub notices: Vec<(String, Tone)>,
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, message: &str, tone: Tone) {
        self.notices.push((message.to_string(), tone));
    }
}

impl RecordingSink {
    pub fn last(&self) -> Option<(&str, Tone)> {
        self.notices
            .last()
            .map(|(message, tone)| (message.as_str(), *tone))
    }
}
