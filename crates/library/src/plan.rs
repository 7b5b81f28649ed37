use crate::error::Error;
use crate::record::FileRecord;
use crate::resolve::{ConflictResolver, resolve_duplicates};
use renamr_storage::BackendHandle;

/// A [`FileRecord`] after planning.
#[derive(Debug)]
pub enum Planned {
    /// `final_name` is set, unique within the batch and free in the directory.
    Ready(FileRecord),
    /// A placeholder name: passed through without resolution.
    Passthrough(FileRecord),
    /// Checking the directory failed; the record has no `final_name`.
    Failed(FileRecord, Error),
}

impl Planned {
    pub fn record(&self) -> &FileRecord {
        match self {
            Self::Ready(record) | Self::Passthrough(record) | Self::Failed(record, _) => record,
        }
    }

    pub fn into_record(self) -> FileRecord {
        match self {
            Self::Ready(record) | Self::Passthrough(record) | Self::Failed(record, _) => record,
        }
    }
}

/// Plans a batch: duplicate resolution over all desired names, then conflict
/// resolution for each resulting name against `backend`, in input order.
///
/// Names handed out earlier in the batch count as taken for later records,
/// so every [`Planned::Ready`] name is distinct. A record whose desired name
/// is its current name keeps it. A failed existence check only fails its own
/// record; the rest of the batch is still planned.
#[tracing::instrument(skip_all, fields(backend = %backend.name(), records = records.len()))]
pub async fn resolve_batch(backend: &BackendHandle, records: Vec<FileRecord>) -> Vec<Planned> {
    let candidates = records.into_iter().map(|record| {
        let name = record.desired_name.clone();
        (record, name)
    });
    let mut resolver = ConflictResolver::new(backend);
    let mut planned = Vec::new();

    for (mut record, name) in resolve_duplicates(candidates) {
        if record.placeholder().is_some() {
            record.final_name = Some(name);
            planned.push(Planned::Passthrough(record));
            continue;
        }
        let resolved = if name == record.original_name { Ok(name) } else { resolver.resolve_conflict(&name).await };
        match resolved {
            Ok(final_name) => {
                resolver.reserve(final_name.clone());
                record.final_name = Some(final_name);
                planned.push(Planned::Ready(record));
            },
            Err(e) => {
                tracing::warn!(file = %record.original_name, error = %*e, "Could not plan rename");
                planned.push(Planned::Failed(record, e));
            },
        }
    }

    tracing::debug!(planned = planned.len(), "Batch planned");
    planned
}
