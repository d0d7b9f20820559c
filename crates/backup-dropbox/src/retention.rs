use core::num::NonZeroUsize;

use crate::DatedFile;

/// Select the remote backups to delete for one prefix.
///
/// Nothing is selected while there are fewer than `retain` files. Once there are `retain` or
/// more, only the `retain - 1` newest are kept, leaving room for the upload that follows so the
/// remote holds `retain` files afterwards.
///
/// Files with equal dates keep their enumeration order, so the later one is deleted first.
pub fn select_deletions<Id>(
    mut files: Vec<DatedFile<Id>>,
    retain: NonZeroUsize,
) -> Vec<DatedFile<Id>> {
    if files.len() < retain.get() {
        return Vec::new();
    }

    // Newest first, stable on ties.
    files.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    files.split_off(retain.get() - 1)
}
