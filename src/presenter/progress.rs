use super::surfaces::ProgressBar;
use crate::loader::LoadEvent;

/// Mirrors loader events onto a progress bar: shown on start, hidden once the
/// load ends either way.
pub struct ProgressPresenter {
    bar: Box<dyn ProgressBar>,
}

impl ProgressPresenter {
    pub fn new(bar: Box<dyn ProgressBar>) -> Self {
        Self { bar }
    }

    pub fn handle(&mut self, event: &LoadEvent) {
        match event {
            LoadEvent::Started { .. } => {
                self.bar.set_enabled(true);
                self.bar.set_progress(0.0, "");
            }
            LoadEvent::ProgressChanged(progress) => self.bar.set_progress(progress.fraction, &progress.message),
            LoadEvent::Ended { .. } | LoadEvent::Failed { .. } => self.bar.set_enabled(false),
        }
    }
}
