//! Audio track auto-selection.

use super::types::AudioTrack;

/// What to do with an item's audio tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDecision {
    /// Leave the player's default alone.
    Keep,
    /// Switch to the track at this index.
    Select(usize),
    /// Ask the user.
    Prompt,
}

/// Decide on a track given the user's preferred language.
///
/// Exactly two tracks: switch to the other one unless the default already
/// speaks `preferred_language`. More than two: prompt. Otherwise keep.
pub fn decide(tracks: &[AudioTrack], preferred_language: &str) -> AudioDecision {
    match tracks.len() {
        2 => {
            let default_index = tracks.iter().position(|t| t.is_default).unwrap_or(0);
            let default_matches = tracks[default_index]
                .language
                .as_deref()
                .is_some_and(|language| same_language(language, preferred_language));

            if default_matches {
                AudioDecision::Keep
            } else {
                AudioDecision::Select(1 - default_index)
            }
        }
        n if n > 2 => AudioDecision::Prompt,
        _ => AudioDecision::Keep,
    }
}

/// Compare primary language subtags, ignoring case and region.
fn same_language(a: &str, b: &str) -> bool {
    let primary = |tag: &str| {
        tag.split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    let a = primary(a);
    !a.is_empty() && a == primary(b)
}
