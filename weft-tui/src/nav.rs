//! The view stack: ordered screens, only the top focused.

use crate::events::{Ctx, ScreenId};

/// Lifecycle contract every stacked screen satisfies. Generic so the
/// stack's push/pop discipline is testable with probe screens.
pub trait StackScreen {
    fn id(&self) -> ScreenId;
    /// Stable identifier used for breadcrumb labelling.
    fn name(&self) -> &'static str;
    /// Runs once on push: register state, issue the first fetch.
    fn start(&mut self, ctx: &Ctx);
    /// Runs once on pop: cancel timers, clear the alive flag.
    fn stop(&mut self);
    /// Modals overlay the screen beneath them instead of replacing it.
    fn is_modal(&self) -> bool {
        false
    }
}

pub struct ViewStack<S> {
    screens: Vec<S>,
    /// Bumped on every push/pop so the shell knows to refresh hints and
    /// breadcrumbs after applying actions.
    change_seq: u64,
}

impl<S: StackScreen> ViewStack<S> {
    pub fn new() -> Self {
        Self { screens: Vec::new(), change_seq: 0 }
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    pub fn push(&mut self, mut screen: S, ctx: &Ctx) {
        screen.start(ctx);
        self.screens.push(screen);
        self.change_seq += 1;
    }

    /// Pops and stops the top screen. A no-op at the root.
    pub fn pop(&mut self) -> bool {
        if self.screens.len() <= 1 {
            return false;
        }
        if let Some(mut screen) = self.screens.pop() {
            screen.stop();
        }
        self.change_seq += 1;
        true
    }

    pub fn current(&self) -> Option<&S> {
        self.screens.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut S> {
        self.screens.last_mut()
    }

    pub fn find_mut(&mut self, id: ScreenId) -> Option<&mut S> {
        self.screens.iter_mut().find(|s| s.id() == id)
    }

    pub fn screens(&self) -> &[S] {
        &self.screens
    }

    /// Index of the screen drawn as the backdrop: the highest entry that
    /// is not a modal. Modals above it draw as overlays.
    pub fn base_index(&self) -> usize {
        self.screens
            .iter()
            .rposition(|s| !s.is_modal())
            .unwrap_or(0)
    }

    /// Monotonic counter observed by the shell to refresh chrome.
    pub fn change_seq(&self) -> u64 {
        self.change_seq
    }
}

impl<S: StackScreen> Default for ViewStack<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{next_screen_id, UiSender};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use weft_provider::MockProvider;

    struct Probe {
        id: ScreenId,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        modal: bool,
    }

    impl Probe {
        fn new(starts: &Arc<AtomicUsize>, stops: &Arc<AtomicUsize>, modal: bool) -> Self {
            Self {
                id: next_screen_id(),
                starts: Arc::clone(starts),
                stops: Arc::clone(stops),
                modal,
            }
        }
    }

    impl StackScreen for Probe {
        fn id(&self) -> ScreenId {
            self.id
        }
        fn name(&self) -> &'static str {
            "probe"
        }
        fn start(&mut self, _ctx: &Ctx) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
        fn is_modal(&self) -> bool {
            self.modal
        }
    }

    fn test_ctx() -> Ctx {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Ctx::new(
            Arc::new(MockProvider::empty()),
            UiSender::new(tx),
            Default::default(),
        )
    }

    #[test]
    fn push_pop_pairs_start_stop_and_restores_depth() {
        let ctx = test_ctx();
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let mut stack = ViewStack::new();

        stack.push(Probe::new(&starts, &stops, false), &ctx);
        let base_depth = stack.depth();

        for _ in 0..3 {
            stack.push(Probe::new(&starts, &stops, false), &ctx);
            assert!(stack.pop());
            assert_eq!(stack.depth(), base_depth);
        }

        assert_eq!(starts.load(Ordering::SeqCst), 4);
        assert_eq!(stops.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn pop_at_root_is_noop() {
        let ctx = test_ctx();
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let mut stack = ViewStack::new();
        stack.push(Probe::new(&starts, &stops, false), &ctx);

        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn base_index_skips_modal_overlays() {
        let ctx = test_ctx();
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let mut stack = ViewStack::new();

        stack.push(Probe::new(&starts, &stops, false), &ctx);
        stack.push(Probe::new(&starts, &stops, false), &ctx);
        assert_eq!(stack.base_index(), 1);

        stack.push(Probe::new(&starts, &stops, true), &ctx);
        stack.push(Probe::new(&starts, &stops, true), &ctx);
        assert_eq!(stack.base_index(), 1);
    }

    #[test]
    fn change_seq_bumps_on_push_and_pop() {
        let ctx = test_ctx();
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let mut stack = ViewStack::new();

        let seq0 = stack.change_seq();
        stack.push(Probe::new(&starts, &stops, false), &ctx);
        stack.push(Probe::new(&starts, &stops, false), &ctx);
        assert!(stack.change_seq() > seq0);

        let seq1 = stack.change_seq();
        stack.pop();
        assert!(stack.change_seq() > seq1);
    }
}
