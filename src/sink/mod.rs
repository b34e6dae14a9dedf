//! Output sinks: the terminal writers a collection run feeds.
//!
//! Two variants share one lifecycle: `init` prepares the target, `accept`
//! persists one named sample stream and reports completion through a
//! callback, `close` appends the index (and, for archives, the
//! transcript) and finalizes the target.

use crate::error::CollectionError;
use crate::stream::SharedStream;

mod archive;
mod directory;

pub use archive::ArchiveSink;
pub use directory::DirectorySink;

/// Completion callback invoked by a sink once an entry is sealed. The
/// collector finalizes digests and emits the sample's index rows here, so
/// row order tracks entry order.
pub type OnEntryDone<'a> = dyn FnMut() -> Result<(), CollectionError> + 'a;

/// A terminal writer for admitted samples.
pub trait OutputSink {
    /// Prepare the target. A failure here aborts the run.
    fn init(&mut self) -> Result<(), CollectionError>;

    /// Persist one sample stream under `sample_name`, then invoke
    /// `on_done`. `source_name` is the matched path, for diagnostics.
    fn accept(
        &mut self,
        sample_name: &str,
        source_name: &str,
        stream: &SharedStream,
        on_done: &mut OnEntryDone,
    ) -> Result<(), CollectionError>;

    /// Append the index and transcript streams and finalize the target.
    fn close(
        &mut self,
        index: &SharedStream,
        transcript: &SharedStream,
    ) -> Result<(), CollectionError>;
}
