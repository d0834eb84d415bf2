use log::trace;

use crate::{HashedVideo, MatchCandidate, MatchConfig, MatchPolicy, ScanStep, Similarity};

/// Walks the pairs `(left, right)`, `left < right`, of a collection in row-major order,
/// comparing lazily and stopping at each match.
///
/// The cursor is the last pair reported. It starts at `(0, 0)`, before the first pair, and
/// is left where it was when a walk runs off either end of the matrix.
pub struct LiveScan<'a> {
    videos: &'a [HashedVideo],
    policy: MatchPolicy<'a>,
    left: usize,
    right: usize,
    best_fast_score: u32,
}

impl<'a> LiveScan<'a> {
    #[must_use]
    pub fn new(videos: &'a [HashedVideo], config: &'a MatchConfig) -> Self {
        Self::starting_at(videos, config, 0, 0)
    }

    /// Resume a scan from a previously reported cursor.
    #[must_use]
    pub fn starting_at(
        videos: &'a [HashedVideo],
        config: &'a MatchConfig,
        left: usize,
        right: usize,
    ) -> Self {
        Self {
            videos,
            policy: MatchPolicy::new(config),
            left,
            right,
            best_fast_score: 0,
        }
    }

    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.left, self.right)
    }

    /// The best fast score of the most recently compared pair.
    #[must_use]
    pub const fn best_fast_score(&self) -> u32 {
        self.best_fast_score
    }

    /// Step forward to the next matching pair whose files both still exist.
    pub fn next_match(&mut self) -> ScanStep<MatchCandidate> {
        let policy = self.policy;
        let mut best_fast_score = self.best_fast_score;
        let ret = self.next_match_by(|l, r| compare(policy, l, r, &mut best_fast_score));
        self.best_fast_score = best_fast_score;
        ret
    }

    /// Step backward to the previous matching pair whose files both still exist.
    pub fn prev_match(&mut self) -> ScanStep<MatchCandidate> {
        let policy = self.policy;
        let mut best_fast_score = self.best_fast_score;
        let ret = self.prev_match_by(|l, r| compare(policy, l, r, &mut best_fast_score));
        self.best_fast_score = best_fast_score;
        ret
    }

    /// Step forward using `is_match` instead of the configured policy.
    pub fn next_match_by<F>(&mut self, mut is_match: F) -> ScanStep<MatchCandidate>
    where
        F: FnMut(&HashedVideo, &HashedVideo) -> Option<Similarity>,
    {
        let n = self.videos.len();
        //a cursor at the far end of its row must not overflow.
        let mut row_start = self.right.saturating_add(1);

        for left in self.left..n {
            for right in row_start.max(left + 1)..n {
                if let Some(similarity) = is_match(&self.videos[left], &self.videos[right]) {
                    return self.found(left, right, similarity);
                }
            }
            row_start = 0;
        }

        trace!(target: "pair_enumeration", "live scan exhausted going forward");
        ScanStep::Exhausted
    }

    /// Step backward using `is_match` instead of the configured policy.
    pub fn prev_match_by<F>(&mut self, mut is_match: F) -> ScanStep<MatchCandidate>
    where
        F: FnMut(&HashedVideo, &HashedVideo) -> Option<Similarity>,
    {
        let Some(last) = self.videos.len().checked_sub(1) else {
            return ScanStep::Exhausted;
        };

        let mut row_end = self.right.checked_sub(1);

        for left in (0..=self.left.min(last)).rev() {
            if let Some(end) = row_end {
                for right in (left + 1..=end.min(last)).rev() {
                    if let Some(similarity) = is_match(&self.videos[left], &self.videos[right]) {
                        return self.found(left, right, similarity);
                    }
                }
            }
            row_end = Some(last);
        }

        trace!(target: "pair_enumeration", "live scan exhausted going backward");
        ScanStep::Exhausted
    }

    /// How far through the pair matrix the cursor is, in percent.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let n = self.videos.len();
        let total_pairs = n * n.saturating_sub(1) / 2;
        if total_pairs == 0 {
            return 100.0;
        }

        let left = self.left.min(n - 1);
        //complete rows before the cursor, plus the part of the cursor's row already walked.
        let rows_done: usize = (0..left).map(|row| n - 1 - row).sum();
        let walked = rows_done + self.right.saturating_sub(left).min(n - 1 - left);

        walked as f64 * 100.0 / total_pairs as f64
    }

    fn found(&mut self, left: usize, right: usize, similarity: Similarity) -> ScanStep<MatchCandidate> {
        self.left = left;
        self.right = right;
        ScanStep::Found(MatchCandidate::new(self.videos, left, right, similarity))
    }
}

fn compare(
    policy: MatchPolicy<'_>,
    left: &HashedVideo,
    right: &HashedVideo,
    best_fast_score: &mut u32,
) -> Option<Similarity> {
    let verdict = policy.both_videos_match(left, right);
    *best_fast_score = verdict.best_fast_score;

    verdict
        .similarity
        .filter(|_| left.record().path().exists() && right.record().path().exists())
}
