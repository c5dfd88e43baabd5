/// Per-species sample counter. Resets whenever the species name differs from
/// the previous call; relies on the caller submitting records grouped by name.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last_name: Option<String>,
    counter: u32,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, name: &str) -> u32 {
        if self.last_name.as_deref() == Some(name) {
            self.counter += 1;
        } else {
            self.last_name = Some(name.to_string());
            self.counter = 1;
        }
        self.counter
    }
}
