//! Backup files grouped by prefix.
//!

use chrono::NaiveDateTime;

use crate::date_pattern::{DatePattern, InvalidDateFormat};

/// A backup file with the date parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedFile<Id> {
    /// What the caller needs to act on the file, a local path or a remote path.
    pub id: Id,

    /// The lowercased file name.
    pub name: String,

    /// The date in the file name.
    pub timestamp: NaiveDateTime,
}

/// Keep the files whose name starts with `prefix`, ignoring case, and parse their dates.
///
/// Enumeration order is preserved. The first name whose date does not match `pattern` fails the
/// whole collection.
pub fn dated_files<Id, Files>(
    files: Files,
    prefix: &str,
    pattern: &DatePattern,
) -> Result<Vec<DatedFile<Id>>, InvalidDateFormat>
where
    Files: IntoIterator<Item = (Id, String)>,
{
    let prefix = prefix.to_lowercase();

    files
        .into_iter()
        .filter_map(|(id, name)| {
            let name = name.to_lowercase();
            name.starts_with(&prefix).then_some((id, name))
        })
        .map(|(id, name)| {
            let timestamp = pattern.parse(&name, &prefix)?;
            Ok(DatedFile {
                id,
                name,
                timestamp,
            })
        })
        .collect()
}
