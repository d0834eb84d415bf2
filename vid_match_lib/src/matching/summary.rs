use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{HashedVideo, MatchConfig, MatchPolicy};

/// How much duplication a collection holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Videos that match at least one video later in the collection.
    pub videos_with_matches: usize,

    /// Sum over those videos of the smaller file size of the video and its first later
    /// match. Deleting the smaller file of each pair would free this much space.
    pub reclaimable_bytes: u64,
}

impl MatchSummary {
    pub(crate) fn add_pair(&mut self, left: &HashedVideo, right: &HashedVideo) {
        self.videos_with_matches += 1;
        self.reclaimable_bytes += left.record().size_bytes().min(right.record().size_bytes());
    }

    fn merge(self, other: Self) -> Self {
        Self {
            videos_with_matches: self.videos_with_matches + other.videos_with_matches,
            reclaimable_bytes: self.reclaimable_bytes + other.reclaimable_bytes,
        }
    }
}

/// Summarize a collection without building a match set. Each video is compared with the
/// videos after it only until its first match.
#[must_use]
pub fn summarize_matches(videos: &[HashedVideo], config: &MatchConfig) -> MatchSummary {
    let policy = MatchPolicy::new(config);

    (0..videos.len())
        .into_par_iter()
        .map(|left| {
            let mut summary = MatchSummary::default();
            let first_match = videos[left + 1..]
                .iter()
                .find(|right| policy.both_videos_match(&videos[left], right).is_match());
            if let Some(right) = first_match {
                summary.add_pair(&videos[left], right);
            }
            summary
        })
        .reduce(MatchSummary::default, MatchSummary::merge)
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;
    use crate::{
        test_util::{hash_with_distance, permissive_config, random_hash, synthetic_video},
        MatchMode, MatchSet,
    };

    #[test]
    fn test_empty_collection() {
        let cfg = permissive_config(MatchMode::FastOnly);
        assert_eq!(summarize_matches(&[], &cfg), MatchSummary::default());
    }

    #[test]
    fn test_only_first_match_of_each_video_counts() {
        let mut rng = StdRng::seed_from_u64(40);
        let a = random_hash(&mut rng);
        let hashes = [
            a,
            hash_with_distance(a, 1, &mut rng),
            hash_with_distance(a, 1, &mut rng),
            random_hash(&mut rng),
        ];
        let vids: Vec<_> = hashes
            .iter()
            .enumerate()
            .map(|(i, &h)| synthetic_video(format!("/sum/{i}.avi"), vec![h], 600_000, &mut rng))
            .collect();
        let cfg = permissive_config(MatchMode::FastOnly);

        let summary = summarize_matches(&vids, &cfg);

        //video 0 matches 1 and 2 but only counts once. Video 1 matches 2.
        assert_eq!(summary.videos_with_matches, 2);
        let smaller = |l: usize, r: usize| {
            vids[l].record().size_bytes().min(vids[r].record().size_bytes())
        };
        assert_eq!(summary.reclaimable_bytes, smaller(0, 1) + smaller(1, 2));

        //a match set over the same collection agrees.
        assert_eq!(MatchSet::build(&vids, &cfg).summary(&vids).unwrap(), summary);
    }
}
