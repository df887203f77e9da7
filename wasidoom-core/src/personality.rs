//! Per-run host state shared by every syscall handler.

use crate::frame::{publish_if_complete, PresentOutcome, Presenter};
use crate::vfs::FileTable;

/// Everything the syscall handlers mutate: the file table, the presenter
/// fed by sink writes, and the pending quit flag.
///
/// Owned by the runtime's store for the lifetime of one guest execution and
/// passed into each handler explicitly; there is no ambient global state.
pub struct Personality {
    pub(crate) table: FileTable,
    pub(crate) presenter: Box<dyn Presenter>,
    quit: bool,
}

impl Personality {
    pub fn new(table: FileTable, presenter: Box<dyn Presenter>) -> Self {
        Self {
            table,
            presenter,
            quit: false,
        }
    }

    pub fn table(&self) -> &FileTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut FileTable {
        &mut self.table
    }

    /// Set when the presenter reported a quit signal during a publish; the
    /// runtime glue turns this into process termination.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Re-run the completeness check after a sink write. Presentation
    /// failures are logged, not surfaced to the guest: the frame channel
    /// has no errno vocabulary for them.
    pub(crate) fn publish_sinks(&mut self) {
        match publish_if_complete(&self.table, self.presenter.as_mut()) {
            Ok(PresentOutcome::Quit) => self.quit = true,
            Ok(PresentOutcome::Continue) => {}
            Err(err) => log::error!("frame publish failed: {err:?}"),
        }
    }
}
