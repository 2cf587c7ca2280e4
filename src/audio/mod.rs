pub mod analysis;
pub mod location;
pub mod sink;
pub mod source;

/// Extensions the scanner picks up and the writer can produce.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "wave"];

pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
