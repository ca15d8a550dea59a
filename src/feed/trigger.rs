/// Edge-detecting observer over the feed's end-of-list sentinel.
///
/// The render layer reports whether the sentinel region (the tail of the
/// loaded list) is currently inside the viewport; `observe` answers whether
/// that sample is a hidden→visible transition, which is the signal to call
/// `FeedController::load_more`. The trigger holds no reference to the
/// controller, keeping the fetch logic testable without a real viewport,
/// and it never polls: samples only arrive on scroll and layout events.
///
/// `load_more` is itself a guarded no-op, so a redundant trigger is
/// harmless.
#[derive(Debug)]
pub struct ViewportTrigger {
    attached: bool,
    was_visible: bool,
}

impl ViewportTrigger {
    pub fn new() -> Self {
        Self {
            attached: true,
            was_visible: false,
        }
    }

    /// Register the observation (mount, or re-mount after a query change).
    /// Resets edge state so the first visible sample fires.
    pub fn attach(&mut self) {
        self.attached = true;
        self.was_visible = false;
    }

    /// Deregister the observation (teardown). Subsequent samples never
    /// fire, so a stale controller cannot be invoked.
    pub fn detach(&mut self) {
        self.attached = false;
        self.was_visible = false;
    }

    /// Feed a visibility sample. Returns `true` exactly when the sentinel
    /// transitioned from hidden to visible while attached.
    pub fn observe(&mut self, visible: bool) -> bool {
        if !self.attached {
            return false;
        }
        let fired = visible && !self.was_visible;
        self.was_visible = visible;
        fired
    }

    /// Forget the current visible state.
    ///
    /// Called after a page of results lands: if the sentinel is still inside
    /// the viewport (a short page), the next sample fires again and the
    /// scroll continues; otherwise the sentinel scrolled away and this is
    /// moot.
    pub fn rearm(&mut self) {
        self.was_visible = false;
    }
}

impl Default for ViewportTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_rising_edge_only() {
        let mut trigger = ViewportTrigger::new();
        assert!(trigger.observe(true));
        assert!(!trigger.observe(true));
        assert!(!trigger.observe(true));
    }

    #[test]
    fn test_refires_after_hidden() {
        let mut trigger = ViewportTrigger::new();
        assert!(trigger.observe(true));
        assert!(!trigger.observe(false));
        assert!(trigger.observe(true));
    }

    #[test]
    fn test_hidden_samples_never_fire() {
        let mut trigger = ViewportTrigger::new();
        assert!(!trigger.observe(false));
        assert!(!trigger.observe(false));
    }

    #[test]
    fn test_detached_never_fires() {
        let mut trigger = ViewportTrigger::new();
        trigger.detach();
        assert!(!trigger.observe(true));
        assert!(!trigger.observe(true));
    }

    #[test]
    fn test_attach_resets_edge_state() {
        let mut trigger = ViewportTrigger::new();
        assert!(trigger.observe(true));
        trigger.detach();
        trigger.attach();
        assert!(trigger.observe(true));
    }

    #[test]
    fn test_rearm_allows_still_visible_sentinel_to_fire() {
        let mut trigger = ViewportTrigger::new();
        assert!(trigger.observe(true));
        assert!(!trigger.observe(true));
        trigger.rearm();
        assert!(trigger.observe(true));
    }
}
