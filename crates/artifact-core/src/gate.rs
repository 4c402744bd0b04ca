//! Debounced persistence gate.
//!
//! Coalesces rapid local edits into a single commit. The gate is a pure state
//! machine over an injected clock: callers pass `now` and own the actual timer
//! (the daemon sleeps until [`PersistenceGate::deadline`]).

use std::time::Duration;
use web_time::Instant;

/// Default quiet period before pending edits are committed.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct Pending {
    content: String,
    /// None while parked: awaiting an explicit flush
    deadline: Option<Instant>,
}

/// Pending-save state for one document.
#[derive(Debug, Clone)]
pub struct PersistenceGate {
    quiet_period: Duration,
    pending: Option<Pending>,
}

impl Default for PersistenceGate {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl PersistenceGate {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Record `content` as the pending save and restart the quiet period.
    ///
    /// Supersedes any earlier pending content.
    pub fn schedule(&mut self, content: String, now: Instant) {
        self.pending = Some(Pending {
            content,
            deadline: Some(now + self.quiet_period),
        });
    }

    /// Record `content` as pending without starting a timer.
    ///
    /// Parked content is only committed by an explicit flush.
    pub fn park(&mut self, content: String) {
        self.pending = Some(Pending {
            content,
            deadline: None,
        });
    }

    /// When the pending content becomes due, if a timer is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().and_then(|p| p.deadline)
    }

    /// True when the quiet period has elapsed for the pending content.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Content awaiting commit, whether or not its timer is running.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.content.as_str())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop pending content after a successful commit.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Remove and return the pending content, cancelling its timer.
    pub fn take(&mut self) -> Option<String> {
        self.pending.take().map(|p| p.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> PersistenceGate {
        PersistenceGate::new(Duration::from_millis(300))
    }

    #[test]
    fn test_schedule_sets_deadline() {
        let mut gate = gate();
        let now = Instant::now();

        gate.schedule("A".into(), now);

        assert_eq!(gate.deadline(), Some(now + Duration::from_millis(300)));
        assert!(!gate.is_due(now + Duration::from_millis(299)));
        assert!(gate.is_due(now + Duration::from_millis(300)));
    }

    #[test]
    fn test_schedule_coalesces_and_resets_timer() {
        let mut gate = gate();
        let start = Instant::now();

        gate.schedule("A".into(), start);
        let later = start + Duration::from_millis(200);
        gate.schedule("AB".into(), later);

        // The first deadline no longer applies
        assert!(!gate.is_due(start + Duration::from_millis(300)));
        assert!(gate.is_due(later + Duration::from_millis(300)));
        assert_eq!(gate.pending(), Some("AB"));
    }

    #[test]
    fn test_park_has_no_deadline() {
        let mut gate = gate();
        gate.schedule("old".into(), Instant::now());

        gate.park("new".into());

        assert_eq!(gate.deadline(), None);
        assert_eq!(gate.pending(), Some("new"));
    }

    #[test]
    fn test_take_cancels() {
        let mut gate = gate();
        gate.schedule("x".into(), Instant::now());

        assert_eq!(gate.take(), Some("x".to_string()));
        assert!(!gate.has_pending());
        assert_eq!(gate.take(), None);
    }

    #[test]
    fn test_default_quiet_period() {
        assert_eq!(PersistenceGate::default().quiet_period(), DEFAULT_QUIET_PERIOD);
    }
}
