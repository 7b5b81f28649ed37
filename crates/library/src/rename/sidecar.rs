use crate::resolve::split_extension;
use renamr_storage::BackendHandle;

/// Sidecar names that may belong to `from`, each paired with the name it
/// takes once `from` becomes `to`. Checked in this order; the first that
/// exists is the sidecar.
///
/// Both conventions are kept as found: `IMG_1.xmp` follows the image's stem,
/// `IMG_1.jpg.xmp` its full name.
fn candidates(from: &str, to: &str) -> [(String, String); 4] {
    let (from_stem, _) = split_extension(from);
    let (to_stem, _) = split_extension(to);
    [
        (format!("{from_stem}.xmp"), format!("{to_stem}.xmp")),
        (format!("{from_stem}.XMP"), format!("{to_stem}.XMP")),
        (format!("{from}.xmp"), format!("{to}.xmp")),
        (format!("{from}.XMP"), format!("{to}.XMP")),
    ]
}

/// Renames the XMP sidecar of a file that was just renamed from `from` to
/// `to`, returning the sidecar's new name.
///
/// Never fails: a file without a sidecar is the common case, and a sidecar
/// that can't follow its image is logged and left where it is. The image
/// rename stands either way.
pub(crate) async fn rename_sidecar(backend: &BackendHandle, from: &str, to: &str) -> Option<String> {
    for (old, new) in candidates(from, to) {
        match backend.exists(&old).await {
            Ok(false) => continue,
            Ok(true) => {},
            Err(e) => {
                tracing::warn!(sidecar = %old, error = %*e, "Could not check for sidecar");
                return None;
            },
        }
        return match backend.rename(&old, &new).await {
            Ok(()) => {
                tracing::info!(from = %old, to = %new, "Renamed sidecar");
                Some(new)
            },
            Err(e) => {
                tracing::warn!(sidecar = %old, target = %new, error = %*e, "Could not rename sidecar");
                None
            },
        };
    }
    tracing::trace!(file = %from, "No sidecar");
    None
}
