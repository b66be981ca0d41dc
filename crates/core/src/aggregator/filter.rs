//! Result filtering rules.

use crate::source::ResultRecord;

/// Inclusive size window check.
pub fn within_size(record: &ResultRecord, min_gb: f64, max_gb: f64) -> bool {
    record.size_gb >= min_gb && record.size_gb <= max_gb
}

/// Whether the name contains any alias, case-insensitively.
pub fn matches_quality(name: &str, aliases: &[String]) -> bool {
    let name = name.to_lowercase();
    aliases
        .iter()
        .any(|alias| name.contains(&alias.to_lowercase()))
}

/// Whether a file name contains any of the extension tokens.
///
/// Tokens are matched anywhere in the name so listings like
/// "Show.mkv (1.4 GB)" still count.
pub fn has_extension(file_name: &str, extensions: &[String]) -> bool {
    let file_name = file_name.to_lowercase();
    extensions
        .iter()
        .any(|ext| file_name.contains(&ext.to_lowercase()))
}

/// Media payload check.
///
/// With a file list, at least one file must be media. Without one, the
/// record passes: names rarely carry an extension.
pub fn has_media_payload(record: &ResultRecord, media_extensions: &[String]) -> bool {
    match &record.file_list {
        Some(files) if !files.is_empty() => files
            .iter()
            .any(|file| has_extension(file, media_extensions)),
        _ => true,
    }
}
