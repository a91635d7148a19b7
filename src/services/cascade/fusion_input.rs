//! Fusion input gathering: persisted history with sentinels, capped to the
//! most recent characters.

use sensing_cascade_core::HistoryReader;

pub const NO_MOTION_DATA: &str = "No motion data";
pub const NO_LOCATION_DATA: &str = "No location data";

/// Context handed to the fusion stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionInput {
    pub motion: String,
    pub location: String,
}

impl FusionInput {
    /// Read both histories, substituting sentinels for missing or blank ones,
    /// and keep the last `max_chars` characters of each.
    pub fn gather(
        motion: &dyn HistoryReader,
        location: &dyn HistoryReader,
        max_chars: usize,
    ) -> Self {
        Self {
            motion: context_or(motion.read_history(), NO_MOTION_DATA, max_chars),
            location: context_or(location.read_history(), NO_LOCATION_DATA, max_chars),
        }
    }
}

fn context_or(history: Option<String>, sentinel: &str, max_chars: usize) -> String {
    let text = history
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| sentinel.to_string());
    tail_chars(&text, max_chars).to_string()
}

/// The last `max_chars` characters of `text`, split on a char boundary
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
