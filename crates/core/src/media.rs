//! File classification for streaming: video detection, playability
//! thresholds, and Content-Type resolution.

/// Extensions treated as video content.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "rmvb", "ts",
    "m2ts",
];

/// Minimum fraction of a video that must be present before playback is
/// offered.
const PLAYABLE_MIN_PROGRESS: f64 = 0.05;
/// Alternatively, enough leading data in absolute terms.
const PLAYABLE_MIN_BYTES: u64 = 5 * 1024 * 1024;
/// Files below this size get the relaxed threshold.
const SMALL_FILE_BYTES: u64 = 10 * 1024 * 1024;
const SMALL_FILE_MIN_PROGRESS: f64 = 0.02;

fn extension(path: &str) -> Option<String> {
    let name = path.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the path names a video file, judged by extension.
pub fn is_video(path: &str) -> bool {
    extension(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a video file has buffered enough to start playback.
///
/// The thresholds trade startup latency against buffer-underrun risk. Note
/// that "enough bytes" does not imply the bytes at the head of the file are
/// present; an MP4 with its moov atom at the end may still stall even when
/// this returns true.
pub fn is_playable(length: u64, bytes_completed: u64) -> bool {
    let progress = if length > 0 {
        bytes_completed as f64 / length as f64
    } else {
        0.0
    };

    if length < SMALL_FILE_BYTES {
        return progress >= SMALL_FILE_MIN_PROGRESS;
    }

    progress >= PLAYABLE_MIN_PROGRESS || bytes_completed >= PLAYABLE_MIN_BYTES
}

/// Content-Type for a file path, judged by extension.
pub fn content_type(path: &str) -> &'static str {
    let ext = match extension(path) {
        Some(ext) => ext,
        None => return "application/octet-stream",
    };

    match ext.as_str() {
        "mp4" | "m4v" | "mov" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        _ => "application/octet-stream",
    }
}
