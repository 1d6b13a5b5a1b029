//! Next-episode search over a translation's season/episode tree.
//!
//! Everything here is pure: the trees are already fetched and nothing in
//! this module touches the network or the stores.

use crate::types::{EpisodeFolder, Translation};

/// Where playback can continue after the current episode.
#[derive(Clone, Debug, PartialEq)]
pub enum Reachability {
    /// A next episode exists in the current translation.
    Available {
        season_index: usize,
        episode_index: usize,
        folder: EpisodeFolder,
    },
    /// The translation is exhausted but a sibling translation continues.
    EndOfTranslation,
    /// Nothing continues past this point.
    EndOfSeries,
}

/// Find the next episode after `(season_index, episode_index)`.
///
/// Looks in the same season first, then at the first later season that has
/// episodes. When `translation` is exhausted, `siblings` sharing the current
/// group label are skipped and the rest are checked at the same position: any
/// continuation there yields [`Reachability::EndOfTranslation`].
pub fn next_episode(
    translation: &Translation,
    season_index: usize,
    episode_index: usize,
    siblings: &[Translation],
) -> Reachability {
    if let Some((season_index, episode_index, folder)) =
        continuation(translation, season_index, episode_index)
    {
        return Reachability::Available {
            season_index,
            episode_index,
            folder: folder.clone(),
        };
    }

    let sibling_continues = siblings
        .iter()
        .filter(|sibling| sibling.group_label != translation.group_label)
        .any(|sibling| continuation(sibling, season_index, episode_index).is_some());

    if sibling_continues {
        Reachability::EndOfTranslation
    } else {
        Reachability::EndOfSeries
    }
}

fn continuation(
    translation: &Translation,
    season_index: usize,
    episode_index: usize,
) -> Option<(usize, usize, &EpisodeFolder)> {
    if let Some(folder) = translation.episode(season_index, episode_index + 1) {
        return Some((season_index, episode_index + 1, folder));
    }

    translation
        .seasons
        .iter()
        .enumerate()
        .skip(season_index + 1)
        .find_map(|(index, season)| season.first().map(|folder| (index, 0, folder)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(title: &str) -> EpisodeFolder {
        EpisodeFolder::new(title, [("720p", title)])
    }

    fn tree(label: &str, shape: &[usize]) -> Translation {
        Translation::new(
            label,
            shape
                .iter()
                .enumerate()
                .map(|(s, count)| (0..*count).map(|e| ep(&format!("S{}E{}", s + 1, e + 1))).collect())
                .collect(),
        )
    }

    #[test]
    fn test_next_in_same_season() {
        let translation = tree("Main", &[2]);
        let result = next_episode(&translation, 0, 0, &[]);
        assert_eq!(
            result,
            Reachability::Available {
                season_index: 0,
                episode_index: 1,
                folder: ep("S1E2"),
            }
        );
    }

    #[test]
    fn test_next_season_first_episode() {
        let translation = tree("Main", &[1, 1]);
        match next_episode(&translation, 0, 0, &[]) {
            Reachability::Available {
                season_index,
                episode_index,
                ..
            } => assert_eq!((season_index, episode_index), (1, 0)),
            other => panic!("expected available, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_empty_seasons() {
        let translation = tree("Main", &[3, 0, 0, 2]);
        match next_episode(&translation, 0, 2, &[]) {
            Reachability::Available {
                season_index,
                episode_index,
                folder,
            } => {
                assert_eq!((season_index, episode_index), (3, 0));
                assert_eq!(folder.title, "S4E1");
            }
            other => panic!("expected available, got {:?}", other),
        }
    }

    #[test]
    fn test_every_in_season_position_is_available() {
        let translation = tree("Main", &[4, 3, 5]);
        for (s, season) in translation.seasons.iter().enumerate() {
            for e in 0..season.len().saturating_sub(1) {
                match next_episode(&translation, s, e, &[]) {
                    Reachability::Available {
                        season_index,
                        episode_index,
                        ..
                    } => assert_eq!((season_index, episode_index), (s, e + 1)),
                    other => panic!("({}, {}) -> {:?}", s, e, other),
                }
            }
        }
    }

    #[test]
    fn test_last_episode_without_siblings_is_end_of_series() {
        let translation = tree("Main", &[2, 3, 0]);
        assert_eq!(next_episode(&translation, 1, 2, &[]), Reachability::EndOfSeries);
    }

    #[test]
    fn test_single_episode_is_end_of_series() {
        let translation = tree("Main", &[1]);
        assert_eq!(next_episode(&translation, 0, 0, &[]), Reachability::EndOfSeries);
    }

    #[test]
    fn test_sibling_continuation_is_end_of_translation() {
        let primary = tree("Main", &[1]);
        let sibling = tree("Other", &[2]);
        assert_eq!(
            next_episode(&primary, 0, 0, &[sibling]),
            Reachability::EndOfTranslation
        );
    }

    #[test]
    fn test_sibling_with_later_season_counts() {
        let primary = tree("Main", &[2]);
        let sibling = tree("Other", &[2, 0, 1]);
        assert_eq!(
            next_episode(&primary, 0, 1, &[sibling]),
            Reachability::EndOfTranslation
        );
    }

    #[test]
    fn test_exhausted_siblings_are_end_of_series() {
        let primary = tree("Main", &[2]);
        let short = tree("Other", &[2]);
        let shorter = tree("Third", &[1]);
        assert_eq!(
            next_episode(&primary, 0, 1, &[short, shorter]),
            Reachability::EndOfSeries
        );
    }

    #[test]
    fn test_sibling_with_same_label_is_ignored() {
        let primary = tree("Main", &[1]);
        let duplicate = tree("Main", &[5]);
        assert_eq!(
            next_episode(&primary, 0, 0, &[duplicate]),
            Reachability::EndOfSeries
        );
    }

    #[test]
    fn test_position_past_sibling_tree() {
        let primary = tree("Main", &[1, 1, 1]);
        let sibling = tree("Other", &[3]);
        assert_eq!(
            next_episode(&primary, 2, 0, &[sibling]),
            Reachability::EndOfSeries
        );
    }
}
