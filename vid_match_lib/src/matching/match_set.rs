use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, info};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::{
    Error, HashedVideo, MatchCandidate, MatchConfig, MatchPolicy, MatchSummary, ScanStep,
};

/// Every matching pair of a collection, computed up front, with a cursor for stepping
/// through them.
///
/// A match set remembers the configuration and collection it was built from. Navigating
/// it with anything else fails with [`Error::StaleMatchSet`]; rebuild it instead.
#[derive(Debug, Clone)]
pub struct MatchSet {
    candidates: Vec<MatchCandidate>,
    //index of the last candidate reported, None before the first.
    cursor: Option<usize>,
    config: MatchConfig,
    collection_digest: blake3::Hash,
}

impl MatchSet {
    /// Compare every pair of `videos`. The outer loop is spread across the rayon thread pool.
    #[must_use]
    pub fn build(videos: &[HashedVideo], config: &MatchConfig) -> Self {
        let never = AtomicBool::new(false);
        let candidates = find_matches(videos, config, &never);
        Self::from_candidates(videos, config, candidates)
    }

    /// Like [`Self::build`], but workers stop as soon as `cancel` is set, in which case the
    /// partial result is discarded and `None` is returned.
    #[must_use]
    pub fn build_cancellable(
        videos: &[HashedVideo],
        config: &MatchConfig,
        cancel: &AtomicBool,
    ) -> Option<Self> {
        let candidates = find_matches(videos, config, cancel);

        if cancel.load(Ordering::Relaxed) {
            debug!(target: "pair_enumeration", "match set build cancelled");
            return None;
        }

        Some(Self::from_candidates(videos, config, candidates))
    }

    fn from_candidates(
        videos: &[HashedVideo],
        config: &MatchConfig,
        mut candidates: Vec<MatchCandidate>,
    ) -> Self {
        //workers finish in any order. Fix it so that navigation is repeatable.
        candidates.sort_by_key(MatchCandidate::indices);

        info!(
            target: "pair_enumeration",
            "Found {} matching pairs among {} videos",
            candidates.len(),
            videos.len()
        );

        Self {
            candidates,
            cursor: None,
            config: config.clone(),
            collection_digest: collection_digest(videos),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn candidates(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    /// The configuration this set was built with.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// The index of the candidate most recently stepped to.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// True if the set was not built from exactly this collection and configuration.
    #[must_use]
    pub fn is_stale(&self, videos: &[HashedVideo], config: &MatchConfig) -> bool {
        self.config != *config || self.collection_digest != collection_digest(videos)
    }

    /// Step to the next candidate whose files both exist.
    pub fn next(
        &mut self,
        videos: &[HashedVideo],
        config: &MatchConfig,
    ) -> Result<ScanStep<&MatchCandidate>, Error> {
        self.next_by(videos, config, Path::exists)
    }

    /// Step to the previous candidate whose files both exist.
    pub fn prev(
        &mut self,
        videos: &[HashedVideo],
        config: &MatchConfig,
    ) -> Result<ScanStep<&MatchCandidate>, Error> {
        self.prev_by(videos, config, Path::exists)
    }

    /// Like [`Self::next`], using `exists` to decide whether a file is still there.
    pub fn next_by(
        &mut self,
        videos: &[HashedVideo],
        config: &MatchConfig,
        exists: impl Fn(&Path) -> bool,
    ) -> Result<ScanStep<&MatchCandidate>, Error> {
        self.check_fresh(videos, config)?;

        let start = self.cursor.map_or(0, |cursor| cursor + 1);
        let found = (start..self.candidates.len()).find(|&idx| self.is_present(idx, &exists));
        Ok(self.step_to(found))
    }

    /// Like [`Self::prev`], using `exists` to decide whether a file is still there.
    pub fn prev_by(
        &mut self,
        videos: &[HashedVideo],
        config: &MatchConfig,
        exists: impl Fn(&Path) -> bool,
    ) -> Result<ScanStep<&MatchCandidate>, Error> {
        self.check_fresh(videos, config)?;

        let end = self.cursor.unwrap_or(0);
        let found = (0..end).rev().find(|&idx| self.is_present(idx, &exists));
        Ok(self.step_to(found))
    }

    /// How far through the set the cursor is, in percent.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        match (self.cursor, self.candidates.len()) {
            (_, 0) => 100.0,
            (None, _) => 0.0,
            (Some(cursor), len) => (cursor + 1) as f64 * 100.0 / len as f64,
        }
    }

    /// The videos with at least one later match, and the space that deleting the smaller
    /// file of each such first match would free.
    ///
    /// # Errors
    /// [`Error::StaleMatchSet`] if `videos` is not the collection the set was built from.
    pub fn summary(&self, videos: &[HashedVideo]) -> Result<MatchSummary, Error> {
        self.check_fresh(videos, &self.config)?;

        //candidates are sorted by left index, so the first of each run is that video's
        //first match.
        let mut summary = MatchSummary::default();
        let mut last_left = None;
        for candidate in &self.candidates {
            let (left, right) = candidate.indices();
            if last_left != Some(left) {
                last_left = Some(left);
                summary.add_pair(&videos[left], &videos[right]);
            }
        }
        Ok(summary)
    }

    fn check_fresh(&self, videos: &[HashedVideo], config: &MatchConfig) -> Result<(), Error> {
        if self.is_stale(videos, config) {
            return Err(Error::StaleMatchSet);
        }
        Ok(())
    }

    fn is_present(&self, idx: usize, exists: &impl Fn(&Path) -> bool) -> bool {
        let candidate = &self.candidates[idx];
        let present = exists(candidate.left_path()) && exists(candidate.right_path());
        if !present {
            debug!(
                target: "pair_enumeration",
                "skipping missing pair {} / {}",
                candidate.left_path().display(),
                candidate.right_path().display()
            );
        }
        present
    }

    fn step_to(&mut self, idx: Option<usize>) -> ScanStep<&MatchCandidate> {
        match idx {
            Some(idx) => {
                self.cursor = Some(idx);
                ScanStep::Found(&self.candidates[idx])
            }
            None => ScanStep::Exhausted,
        }
    }
}

fn find_matches(
    videos: &[HashedVideo],
    config: &MatchConfig,
    cancel: &AtomicBool,
) -> Vec<MatchCandidate> {
    let policy = MatchPolicy::new(config);
    let found = Mutex::new(vec![]);

    (0..videos.len()).into_par_iter().for_each(|left| {
        for right in left + 1..videos.len() {
            if cancel.load(Ordering::Relaxed) {
                return;
            }

            let verdict = policy.both_videos_match(&videos[left], &videos[right]);
            if let Some(similarity) = verdict.similarity {
                found
                    .lock()
                    .push(MatchCandidate::new(videos, left, right, similarity));
            }
        }
    });

    found.into_inner()
}

//identifies the membership and order of a collection.
fn collection_digest(videos: &[HashedVideo]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for video in videos {
        let record = video.record();
        hasher.update(record.path().as_os_str().as_encoded_bytes());
        hasher.update(&[0]);
        hasher.update(&record.size_bytes().to_le_bytes());
    }
    hasher.finalize()
}

#[cfg(test)]
mod test {
    use std::sync::atomic::AtomicBool;

    use rand::prelude::*;

    use super::*;
    use crate::{
        test_util::{hash_with_distance, permissive_config, random_hash, synthetic_video},
        MatchMode, ThresholdConfig,
    };

    /// Videos 0, 2 and 5 are near-identical, as are 1 and 4. Video 3 is unrelated.
    fn collection(rng: &mut StdRng) -> Vec<HashedVideo> {
        let a = random_hash(rng);
        let b = random_hash(rng);
        let hashes = [
            a,
            b,
            hash_with_distance(a, 1, rng),
            random_hash(rng),
            hash_with_distance(b, 2, rng),
            hash_with_distance(a, 2, rng),
        ];

        hashes
            .iter()
            .enumerate()
            .map(|(i, &hash)| synthetic_video(format!("/set/{i}.mkv"), vec![hash], 600_000, rng))
            .collect()
    }

    fn config() -> MatchConfig {
        MatchConfig {
            thresholds: ThresholdConfig::new(56, 64, 0.5, 2.0),
            ..permissive_config(MatchMode::FastOnly)
        }
    }

    #[test]
    fn test_build_finds_every_matching_pair_in_order() {
        let mut rng = StdRng::seed_from_u64(30);
        let vids = collection(&mut rng);
        let set = MatchSet::build(&vids, &config());

        let pairs: Vec<_> = set.candidates().iter().map(MatchCandidate::indices).collect();
        assert_eq!(pairs, vec![(0, 2), (0, 5), (1, 4), (2, 5)]);
    }

    #[test]
    fn test_navigation_skips_missing_and_stops_at_ends() {
        let mut rng = StdRng::seed_from_u64(31);
        let vids = collection(&mut rng);
        let cfg = config();
        let mut set = MatchSet::build(&vids, &cfg);

        //video 5 has been deleted.
        let exists = |p: &Path| !p.ends_with("5.mkv");

        let mut forward = vec![];
        while let ScanStep::Found(c) = set.next_by(&vids, &cfg, exists).unwrap() {
            forward.push(c.indices());
        }
        assert_eq!(forward, vec![(0, 2), (1, 4)]);
        assert_eq!(set.cursor(), Some(2));
        assert_eq!(set.progress_percent(), 75.0);

        let back = set.prev_by(&vids, &cfg, exists).unwrap().found().unwrap();
        assert_eq!(back.indices(), (0, 2));
        assert_eq!(set.prev_by(&vids, &cfg, exists).unwrap(), ScanStep::Exhausted);
        assert_eq!(set.cursor(), Some(0));
    }

    #[test]
    fn test_config_change_makes_set_stale() {
        let mut rng = StdRng::seed_from_u64(32);
        let vids = collection(&mut rng);
        let fast = config();
        let mut set = MatchSet::build(&vids, &fast);
        assert!(!set.is_stale(&vids, &fast));

        let hybrid = MatchConfig {
            mode: MatchMode::Hybrid,
            ..fast.clone()
        };
        assert!(set.is_stale(&vids, &hybrid));
        assert_eq!(set.next(&vids, &hybrid).unwrap_err(), Error::StaleMatchSet);

        let mut nudged = fast.clone();
        nudged.thresholds.set_fast_lower(40);
        assert_eq!(set.prev(&vids, &nudged).unwrap_err(), Error::StaleMatchSet);

        //dropping a video from the collection also invalidates it.
        assert!(set.is_stale(&vids[1..], &fast));
    }

    #[test]
    fn test_cancelled_build_returns_nothing() {
        let mut rng = StdRng::seed_from_u64(33);
        let vids = collection(&mut rng);
        let cancel = AtomicBool::new(true);
        assert!(MatchSet::build_cancellable(&vids, &config(), &cancel).is_none());
    }

    #[test]
    fn test_summary_counts_first_match_of_each_video() {
        let mut rng = StdRng::seed_from_u64(34);
        let vids = collection(&mut rng);
        let set = MatchSet::build(&vids, &config());

        //0 (first match 2), 1 (first match 4) and 2 (first match 5).
        let summary = set.summary(&vids).unwrap();
        assert_eq!(summary.videos_with_matches, 3);
        let expected: u64 = [(0, 2), (1, 4), (2, 5)]
            .iter()
            .map(|&(l, r): &(usize, usize)| {
                vids[l].record().size_bytes().min(vids[r].record().size_bytes())
            })
            .sum();
        assert_eq!(summary.reclaimable_bytes, expected);
    }

    #[test]
    fn test_summary_of_another_collection_is_stale() {
        let mut rng = StdRng::seed_from_u64(35);
        let vids = collection(&mut rng);
        let set = MatchSet::build(&vids, &config());

        assert_eq!(set.summary(&vids[..1]).unwrap_err(), Error::StaleMatchSet);
        assert_eq!(set.summary(&[]).unwrap_err(), Error::StaleMatchSet);
    }
}
