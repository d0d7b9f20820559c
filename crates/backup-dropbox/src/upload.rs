use crate::DatedFile;

/// Select the newest local backup for one prefix, if there is one.
///
/// When several files share the newest date the last one enumerated wins.
pub fn select_upload<Id>(files: Vec<DatedFile<Id>>) -> Option<DatedFile<Id>> {
    files.into_iter().max_by_key(|file| file.timestamp)
}
