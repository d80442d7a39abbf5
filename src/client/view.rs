//! Rendered view bindings
//!
//! The client writes tallies into named display locations and reports vote
//! failures. [`ConsoleView`] prints them; the HTTP page uses
//! [`crate::api::SharedTallyView`].

#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::Mutex;

/// Where the client renders its results
pub trait TallyView: Send + Sync {
    /// Replace the text shown at `location`
    fn show_tally(&self, location: &str, votes: &str);

    /// A read for `location` failed; its previous content is stale
    fn show_error(&self, location: &str, message: &str);

    /// A vote could not be cast
    fn show_vote_failed(&self, candidate: &str, reason: &str);
}

/// Prints updates to stdout
#[derive(Debug, Default)]
pub struct ConsoleView;

impl TallyView for ConsoleView {
    fn show_tally(&self, location: &str, votes: &str) {
        println!("   {:<16} {}", location, votes);
    }

    fn show_error(&self, location: &str, message: &str) {
        println!("   {:<16} ⚠️  {}", location, message);
    }

    fn show_vote_failed(&self, candidate: &str, reason: &str) {
        println!("❌ Vote for {:?} failed: {}", candidate, reason);
    }
}

/// Keeps every update in memory, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingView {
    tallies: Mutex<BTreeMap<String, String>>,
    updates: Mutex<Vec<(String, String)>>,
    failures: Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text at `location`
    pub fn tally(&self, location: &str) -> Option<String> {
        self.tallies
            .lock()
            .ok()
            .and_then(|t| t.get(location).cloned())
    }

    /// Every `(location, text)` update, in arrival order
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Every `(candidate or location, reason)` failure
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl TallyView for RecordingView {
    fn show_tally(&self, location: &str, votes: &str) {
        if let Ok(mut tallies) = self.tallies.lock() {
            tallies.insert(location.to_string(), votes.to_string());
        }
        if let Ok(mut updates) = self.updates.lock() {
            updates.push((location.to_string(), votes.to_string()));
        }
    }

    fn show_error(&self, location: &str, message: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((location.to_string(), message.to_string()));
        }
    }

    fn show_vote_failed(&self, candidate: &str, reason: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((candidate.to_string(), reason.to_string()));
        }
    }
}
