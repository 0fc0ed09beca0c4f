pub mod pattern;

pub use pattern::PatternError;

use tracing::{debug, instrument};

use crate::pr::ChangedFile;

/// Keep the files matching at least one include pattern and no exclude
/// pattern, in input order.
///
/// An empty include set keeps nothing. A malformed pattern aborts the whole
/// call.
#[instrument(skip_all, fields(files = files.len(), include = ?include, exclude = ?exclude))]
pub fn filter_files(
    files: Vec<ChangedFile>,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<ChangedFile>, PatternError> {
    let mut kept = Vec::with_capacity(files.len());
    for file in files {
        let included = pattern::matches_any(&file.filename, include)?;
        let excluded = pattern::matches_any(&file.filename, exclude)?;
        if included && !excluded {
            debug!(file = %file.filename, "included");
            kept.push(file);
        } else {
            debug!(file = %file.filename, included, excluded, "skipped");
        }
    }
    Ok(kept)
}
