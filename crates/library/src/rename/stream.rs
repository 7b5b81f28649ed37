use crate::Context;
use crate::plan::Planned;
use crate::rename::file::{Action, rename_file};
use async_stream::stream;
use futures::Stream;
use renamr_storage::BackendHandle;

/// Progress events emitted by [`rename_batch`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Planned`](Self::Planned): exactly once, with the number of selected
///    records that will be processed.
/// 3. [`Processed`](Self::Processed): once per selected record, in input order.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameEvent {
    Started,
    Planned(u64),
    Processed(Action),
    Complete,
}

/// Streams [`RenameEvent`]s while renaming every selected record in `planned`.
///
/// Records are processed one at a time: each rename's conflict check has to
/// see the directory as the previous rename left it. Individual failures are
/// [`Action::Failed`] events; nothing ends the stream early.
pub fn rename_batch<'a>(
    backend: &'a BackendHandle,
    ctx: &'a Context,
    planned: Vec<Planned>,
) -> impl Stream<Item = RenameEvent> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield RenameEvent::Started;

        let selected: Vec<Planned> = planned.into_iter().filter(|p| p.record().selected).collect();
        tracing::info!(backend = %backend.name(), files = selected.len(), "Starting rename batch");
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield RenameEvent::Planned(u64::try_from(selected.len()).unwrap_or(0));

        for planned in selected {
            yield RenameEvent::Processed(rename_file(backend, ctx, planned).await);
        }

        tracing::info!(backend = %backend.name(), "Rename batch complete");
        yield RenameEvent::Complete;
    })
}
