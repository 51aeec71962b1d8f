//! File URLs for record attachments.

/// URL of a file attached to a record.
///
/// `{api_base}/api/files/{collection}/{record_id}/{filename}`. A trailing
/// slash on `api_base` is ignored. `collection` may be the collection id or
/// its name; the backend accepts both.
#[must_use]
pub fn file_url(api_base: &str, collection: &str, record_id: &str, filename: &str) -> String {
    format!(
        "{}/api/files/{collection}/{record_id}/{filename}",
        api_base.trim_end_matches('/')
    )
}
