use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine};
use data_user::UserRecord;

use crate::error::AppError;

/// Guess a MIME type from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Read `path` into a `data:<mime>;base64,<payload>` URI. The file must
/// be of the `expected` media kind (`image`, `audio`).
pub fn read_data_uri(path: &Path, expected: &str) -> Result<String, AppError> {
    let mime = guess_mime(path);
    if !mime.starts_with(&format!("{}/", expected)) {
        return Err(AppError::UnsupportedMedia {
            expected: expected.to_owned(),
            path: path.display().to_string(),
        });
    }

    let content = fs::read(path)?;
    Ok(format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(content)
    ))
}

/// Pretty JSON of a record with attachments shortened.
pub fn format_record(record: &UserRecord) -> Result<String, AppError> {
    let mut record = record.clone();
    for attachment in [&mut record.profile_photo, &mut record.voice_message] {
        if let Some(uri) = attachment {
            *uri = summarize_data_uri(uri);
        }
    }
    Ok(serde_json::to_string_pretty(&record)?)
}

fn summarize_data_uri(uri: &str) -> String {
    match uri.split_once(',') {
        Some((header, payload)) => {
            format!("{},<{} bytes>", header, payload.len())
        }
        None => format!("<{} bytes>", uri.len()),
    }
}
