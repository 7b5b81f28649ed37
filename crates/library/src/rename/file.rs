use crate::Context;
use crate::error::{ErrorKind, Result, from_storage};
use crate::plan::Planned;
use crate::record::FileRecord;
use crate::rename::sidecar::rename_sidecar;
use crate::resolve::{ConflictResolver, Placeholder};
use renamr_recovery::Recovery;
use renamr_storage::BackendHandle;

/// The outcome of processing a single planned record.
///
/// Every variant carries the record's original name. Failures are outcomes
/// too: a batch keeps going whatever happens to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// File was renamed from `from` to `to`.
    Renamed { from: String, to: String },
    /// File was deliberately left alone.
    Skipped { name: String, reason: String },
    /// Renaming failed; the file keeps its original name.
    Failed { name: String, reason: String },
}

impl Action {
    /// The record's original file name.
    pub fn original(&self) -> &str {
        match self {
            Self::Renamed { from, .. } => from,
            Self::Skipped { name, .. } | Self::Failed { name, .. } => name,
        }
    }
}

/// What to do with a record, decided immediately before renaming.
enum Step {
    Rename(String),
    Skip(String),
}

/// Renames the file behind a planned record.
///
/// - [`NO_METADATA`](crate::resolve::NO_METADATA) records get an underscore
///   prefix, unless they already have one.
/// - Error placeholder records are skipped with their message.
/// - Everything else goes to its `final_name`, with conflict resolution run
///   again first because the directory may have changed since planning.
///
/// The source must still exist and the target must still be free right
/// before the rename; a late collision fails the record and is never retried
/// or overwritten. Permission problems go through the executor's permission
/// fallback, other storage failures through `log_and_continue`. After a
/// successful rename an XMP sidecar, if there is one, is renamed to match;
/// its failure doesn't affect the outcome.
#[tracing::instrument(skip_all, fields(file = %planned.record().original_name))]
pub async fn rename_file(backend: &BackendHandle, ctx: &Context, planned: Planned) -> Action {
    let record = match planned {
        Planned::Ready(record) | Planned::Passthrough(record) => record,
        Planned::Failed(record, error) => {
            return fail(ctx, &record, error);
        },
    };
    if !record.selected {
        return skip(&record, "Not selected".to_string());
    }

    let target = match next_step(backend, &record).await {
        Ok(Step::Rename(target)) => target,
        Ok(Step::Skip(reason)) => return skip(&record, reason),
        Err(e) => return fail(ctx, &record, e),
    };
    match execute(backend, &record.original_name, &target).await {
        Ok(()) => {
            tracing::info!(from = %record.original_name, to = %target, "Renamed file");
            rename_sidecar(backend, &record.original_name, &target).await;
            Action::Renamed {
                from: record.original_name,
                to: target,
            }
        },
        Err(e) => fail(ctx, &record, e),
    }
}

async fn next_step(backend: &BackendHandle, record: &FileRecord) -> Result<Step> {
    let target = record.target_name();
    match Placeholder::classify(target) {
        Some(Placeholder::NoMetadata) => {
            if record.original_name.starts_with('_') {
                return Ok(Step::Skip("Already has underscore prefix".to_string()));
            }
            Ok(Step::Rename(format!("_{}", record.original_name)))
        },
        Some(Placeholder::Error) => Ok(Step::Skip(target.to_string())),
        None if target == record.original_name => Ok(Step::Skip("Already has the target name".to_string())),
        None => ConflictResolver::new(backend).resolve_conflict(target).await.map(Step::Rename),
    }
}

async fn execute(backend: &BackendHandle, from: &str, to: &str) -> Result<()> {
    if !backend.exists(from).await.map_err(from_storage)? {
        exn::bail!(ErrorKind::SourceMissing(from.to_string()));
    }
    if backend.exists(to).await.map_err(from_storage)? {
        exn::bail!(ErrorKind::Collision(to.to_string()));
    }
    backend.rename(from, to).await.map_err(from_storage)
}

fn skip(record: &FileRecord, reason: String) -> Action {
    tracing::warn!(reason = %reason, "Skipped file");
    Action::Skipped {
        name: record.original_name.clone(),
        reason,
    }
}

fn fail(ctx: &Context, record: &FileRecord, error: crate::error::Error) -> Action {
    let path = record.original_path.as_path();
    match &*error {
        ErrorKind::PermissionDenied(_) => {
            let _: Recovery<()> = ctx.executor.handle_permission_error(path, "rename");
        },
        ErrorKind::SourceMissing(_) | ErrorKind::Collision(_) | ErrorKind::Conflict(_) => {
            tracing::error!(path = %path.display(), error = %*error, "Rename failed");
        },
        kind => {
            let _: Recovery<()> = ctx.executor.log_and_continue(kind, "file rename", Some(path));
        },
    }
    Action::Failed {
        name: record.original_name.clone(),
        reason: (*error).to_string(),
    }
}
