// Trailing-edge debouncer for the formula renderer: typesetting is too
// expensive to run on every simulation tick, so bursts of requests
// collapse into a single invocation after a quiescence window.
//
// Timestamps are plain f64 seconds (egui's input clock), which also works
// on wasm where std::time::Instant is unavailable.

/// Collapses bursts of requests into one trailing invocation. Only the
/// last request within the window fires, once, after the window elapses.
/// There is no cancellation path.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(window_seconds: f64) -> Self {
        Self {
            window: window_seconds,
            deadline: None,
        }
    }

    /// Schedule (or push back) the trailing invocation.
    pub fn request(&mut self, now: f64) {
        self.deadline = Some(now + self.window);
    }

    /// Returns true exactly once per quiescent burst, when the window has
    /// elapsed since the last request.
    pub fn fire(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_requests_fires_once() {
        let mut d = Debouncer::new(0.3);
        d.request(0.0);
        d.request(0.1);
        d.request(0.2);

        assert!(!d.fire(0.25));
        assert!(!d.fire(0.45));
        assert!(d.fire(0.5));
        assert!(!d.fire(0.6));
    }

    #[test]
    fn each_request_pushes_the_deadline_back() {
        let mut d = Debouncer::new(0.3);
        d.request(0.0);
        assert!(!d.fire(0.29));
        d.request(0.29);
        assert!(!d.fire(0.3));
        assert!(d.fire(0.59));
    }

    #[test]
    fn idle_debouncer_never_fires() {
        let mut d = Debouncer::new(0.3);
        assert!(!d.fire(100.0));
        assert!(!d.pending());
    }

    #[test]
    fn firing_rearms_for_later_requests() {
        let mut d = Debouncer::new(0.3);
        d.request(0.0);
        assert!(d.fire(0.3));
        d.request(1.0);
        assert!(d.pending());
        assert!(d.fire(1.3));
    }
}
