use tokio::sync::watch;

pub const DEFAULT_NARROW_VIEWPORT_PX: u32 = 768;

/// Narrow-viewport flag shared with overlay layouts. Subscribers hold a
/// receiver; dropping it is the teardown.
#[derive(Debug)]
pub struct ViewportSignal {
    breakpoint_px: u32,
    tx: watch::Sender<bool>,
}

impl ViewportSignal {
    pub fn new(breakpoint_px: u32, initial_width: u32) -> Self {
        let (tx, _rx) = watch::channel(initial_width < breakpoint_px);
        ViewportSignal { breakpoint_px, tx }
    }

    pub fn breakpoint_px(&self) -> u32 {
        self.breakpoint_px
    }

    pub fn is_narrow_viewport(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Recomputes the flag for a new width; subscribers are only woken when it flips.
    pub fn on_resize(&self, width: u32) -> bool {
        let narrow = width < self.breakpoint_px;
        let changed = self.tx.send_if_modified(|current| {
            if *current == narrow {
                return false;
            }
            *current = narrow;
            true
        });
        if changed {
            tracing::debug!(width, narrow, "viewport breakpoint crossed");
        }
        changed
    }
}

impl Default for ViewportSignal {
    fn default() -> Self {
        ViewportSignal::new(DEFAULT_NARROW_VIEWPORT_PX, DEFAULT_NARROW_VIEWPORT_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_width_sets_flag() {
        assert!(ViewportSignal::new(768, 500).is_narrow_viewport());
        assert!(!ViewportSignal::new(768, 768).is_narrow_viewport());
        assert!(!ViewportSignal::default().is_narrow_viewport());
    }

    #[test]
    fn test_resize_only_reports_flips() {
        let signal = ViewportSignal::new(768, 1024);
        assert!(!signal.on_resize(900));
        assert!(signal.on_resize(767));
        assert!(signal.is_narrow_viewport());
        assert!(!signal.on_resize(320));
        assert!(signal.on_resize(1280));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let signal = ViewportSignal::new(768, 1024);
        let mut rx = signal.subscribe();
        assert!(!*rx.borrow_and_update());
        signal.on_resize(400);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        signal.on_resize(500);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_dropping_receiver_deregisters() {
        let signal = ViewportSignal::default();
        let rx = signal.subscribe();
        assert_eq!(signal.subscriber_count(), 1);
        drop(rx);
        assert_eq!(signal.subscriber_count(), 0);
        // still usable with nobody listening
        assert!(signal.on_resize(10));
    }
}
