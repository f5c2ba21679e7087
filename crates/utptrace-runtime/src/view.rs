use std::io;
use std::sync::{Arc, Mutex};
use utptrace_engine::ActionTableSnapshot;

/// Display surface for the live timeline table.
///
/// The tailer calls `prepare_for_content` before interleaving any other
/// output, and `restore` once a batch of lines has been written so the table
/// can be drawn again below it.
pub trait TimelineView: Send {
    /// Draw `snapshot`, or clear the table when there is nothing to show
    fn render(&mut self, snapshot: Option<&ActionTableSnapshot>) -> io::Result<()>;

    fn prepare_for_content(&mut self) -> io::Result<()>;

    fn restore(&mut self) -> io::Result<()>;

    /// Leave the last drawn table in place for good
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// View calls observed by a [`RecordingView`]
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Render(Option<ActionTableSnapshot>),
    PrepareForContent,
    Restore,
    Finish,
}

/// View that records calls into a shared log, for inspecting tailer behaviour
#[derive(Debug, Default, Clone)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// The most recent snapshot passed to `render`
    pub fn last_snapshot(&self) -> Option<ActionTableSnapshot> {
        self.events().into_iter().rev().find_map(|event| match event {
            ViewEvent::Render(snapshot) => Some(snapshot),
            _ => None,
        })?
    }

    fn push(&self, event: ViewEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl TimelineView for RecordingView {
    fn render(&mut self, snapshot: Option<&ActionTableSnapshot>) -> io::Result<()> {
        self.push(ViewEvent::Render(snapshot.cloned()));
        Ok(())
    }

    fn prepare_for_content(&mut self) -> io::Result<()> {
        self.push(ViewEvent::PrepareForContent);
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.push(ViewEvent::Restore);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.push(ViewEvent::Finish);
        Ok(())
    }
}
