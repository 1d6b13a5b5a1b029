//! Stream selection from a quality → URL map.
//!
//! Catalog sources label their streams differently; by the time they reach
//! this module they use the source-agnostic labels in [`QUALITY_RANK`].

use crate::error::{AppError, Result};
use crate::types::QualityLabel;
use std::collections::BTreeMap;

/// Fallback order used when the preferred quality is missing, best first.
pub const QUALITY_RANK: [&str; 6] = ["4K", "1080p-plus", "1080p", "720p", "480p", "360p"];

/// A resolved stream: the label that won and its URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamChoice {
    pub quality: QualityLabel,
    pub url: String,
}

/// Pick a quality label from `streams`.
///
/// The preferred label wins when present. Otherwise the first ranked label
/// present is used. Returns `None` when no ranked label is present.
///
/// # Examples
///
/// ```
/// use nextup::stream::resolve_quality;
/// use std::collections::BTreeMap;
///
/// let streams = BTreeMap::from([
///     ("720p".to_string(), "u1".to_string()),
///     ("480p".to_string(), "u2".to_string()),
/// ]);
/// assert_eq!(resolve_quality(&streams, Some("1080p")), Some("720p"));
/// assert_eq!(resolve_quality(&streams, Some("480p")), Some("480p"));
/// ```
pub fn resolve_quality<'a>(
    streams: &'a BTreeMap<QualityLabel, String>,
    preferred: Option<&str>,
) -> Option<&'a str> {
    if let Some(preferred) = preferred {
        if let Some((label, _)) = streams.get_key_value(preferred) {
            return Some(label.as_str());
        }
    }

    QUALITY_RANK.iter().find_map(|rank| {
        streams
            .get_key_value(*rank)
            .map(|(label, _)| label.as_str())
    })
}

/// Resolve both the label and the URL.
pub fn resolve_stream(
    streams: &BTreeMap<QualityLabel, String>,
    preferred: Option<&str>,
) -> Option<StreamChoice> {
    let quality = resolve_quality(streams, preferred)?;
    streams.get(quality).map(|url| StreamChoice {
        quality: quality.to_string(),
        url: url.clone(),
    })
}

/// Like [`resolve_stream`], but reports the labels on offer when nothing fits.
pub fn require_stream(
    streams: &BTreeMap<QualityLabel, String>,
    preferred: Option<&str>,
) -> Result<StreamChoice> {
    resolve_stream(streams, preferred).ok_or_else(|| AppError::UnresolvableStream {
        available: streams.keys().cloned().collect(),
    })
}
