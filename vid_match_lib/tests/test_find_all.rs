use std::path::Path;

use itertools::Itertools;
use ndarray::Array2;
use rand::prelude::*;
use vid_match_lib::test_util::*;
use vid_match_lib::*;

const DURATION_MS: u64 = 600_000;

/// A "start hash", and a set of hashes that each differ from it in exactly
/// `distance_from_start` bits. Any two members differ in at most twice that.
#[derive(Clone, Debug)]
struct HashesWithDistance {
    pub members: Vec<u64>,
}

impl HashesWithDistance {
    pub fn new(distance_from_start: u32, num_hashes: u32, rng: &mut StdRng) -> Self {
        let start_hash = random_hash(rng);
        let members = (0..num_hashes)
            .map(|_i| hash_with_distance(start_hash, distance_from_start, rng))
            .collect::<Vec<_>>();

        //sanity check: members are never further apart than distance_from_start*2.
        for pair in members.iter().permutations(2) {
            assert!((pair[0] ^ pair[1]).count_ones() <= distance_from_start * 2);
        }

        Self { members }
    }
}

/// A shuffled collection made of several groups of near-duplicates. Returns the videos and
/// the group of each.
fn grouped_collection(
    num_groups: u32,
    per_group: u32,
    distance: u32,
    rng: &mut StdRng,
) -> (Vec<HashedVideo>, Vec<u32>) {
    let mut labelled = (0..num_groups)
        .flat_map(|group| {
            HashesWithDistance::new(distance, per_group, rng)
                .members
                .into_iter()
                .map(move |hash| (group, hash))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    labelled.shuffle(rng);

    let videos = labelled
        .iter()
        .enumerate()
        .map(|(i, &(_group, hash))| {
            synthetic_video(format!("/collection/{i}.mp4"), vec![hash], DURATION_MS, rng)
        })
        .collect();
    let groups = labelled.iter().map(|&(group, _hash)| group).collect();

    (videos, groups)
}

fn expected_pairs(groups: &[u32]) -> Vec<(usize, usize)> {
    (0..groups.len())
        .tuple_combinations()
        .filter(|&(l, r)| groups[l] == groups[r])
        .collect()
}

#[test]
fn test_match_set_finds_every_group() {
    let mut rng = StdRng::seed_from_u64(100);
    let (videos, groups) = grouped_collection(5, 4, 2, &mut rng);
    let config = permissive_config(MatchMode::FastOnly);

    let set = MatchSet::build(&videos, &config);
    let found = set.candidates().iter().map(MatchCandidate::indices).collect_vec();

    assert_eq!(found, expected_pairs(&groups));
    for candidate in set.candidates() {
        //at most 4 bits apart, plus the same-duration bonus.
        assert!(candidate.similarity().value() >= 61.0);
    }
}

#[test]
fn test_live_scan_agrees_with_match_set() {
    let mut rng = StdRng::seed_from_u64(101);
    let (videos, _groups) = grouped_collection(4, 3, 3, &mut rng);
    let config = permissive_config(MatchMode::FastOnly);
    let policy = MatchPolicy::new(&config);

    let mut set = MatchSet::build(&videos, &config);
    let mut from_set = vec![];
    while let ScanStep::Found(c) = set.next_by(&videos, &config, |_: &Path| true).unwrap() {
        from_set.push(c.clone());
    }

    let mut scan = LiveScan::new(&videos, &config);
    let from_scan = std::iter::from_fn(|| {
        scan.next_match_by(|l, r| policy.both_videos_match(l, r).similarity)
            .found()
    })
    .collect_vec();

    assert_eq!(from_scan, from_set);
    assert_eq!(from_set.len(), 4 * 3);
    assert_eq!(set.progress_percent(), 100.0);

    //and backwards from the end, the same pairs in reverse.
    let mut back = vec![set.candidates()[set.len() - 1].clone()];
    while let ScanStep::Found(c) = set.prev_by(&videos, &config, |_: &Path| true).unwrap() {
        back.push(c.clone());
    }
    back.dedup();
    back.reverse();
    assert_eq!(back, from_set);
}

#[test]
fn test_hybrid_mode_needs_structural_similarity() {
    let mut rng = StdRng::seed_from_u64(102);
    let hash = random_hash(&mut rng);
    let matrix = Array2::from_shape_fn((16, 16), |(y, x)| ((x * 13 + y * 7) % 256) as f64);

    //same hash everywhere. a and b also share their similarity matrix, c does not.
    let with_matrix = |path: &str, matrix: Array2<f64>, rng: &mut StdRng| {
        let video = synthetic_video(path, vec![hash], DURATION_MS, rng);
        let fingerprint = Fingerprint::new(vec![hash], vec![matrix]).unwrap();
        HashedVideo::new(video.record().clone(), fingerprint, vec![])
    };
    let videos = vec![
        with_matrix("/h/a.mp4", matrix.clone(), &mut rng),
        with_matrix("/h/b.mp4", matrix, &mut rng),
        with_matrix("/h/c.mp4", random_ssim_matrix(&mut rng), &mut rng),
    ];

    let fast = permissive_config(MatchMode::FastOnly);
    assert_eq!(MatchSet::build(&videos, &fast).len(), 3);

    let hybrid = permissive_config(MatchMode::Hybrid);
    let set = MatchSet::build(&videos, &hybrid);
    let found = set.candidates().iter().map(MatchCandidate::indices).collect_vec();
    assert_eq!(found, vec![(0, 1)]);
    assert!(matches!(set.candidates()[0].similarity(), Similarity::Slow(s) if s > 1.0));
}

#[test]
fn test_switching_mode_requires_rebuild() {
    let mut rng = StdRng::seed_from_u64(103);
    let (videos, groups) = grouped_collection(3, 2, 1, &mut rng);
    let fast = permissive_config(MatchMode::FastOnly);
    let hybrid = MatchConfig {
        mode: MatchMode::Hybrid,
        ..fast.clone()
    };

    let mut set = MatchSet::build(&videos, &fast);
    assert_eq!(set.next(&videos, &hybrid), Err(Error::StaleMatchSet));

    let mut rebuilt = MatchSet::build(&videos, &hybrid);
    assert!(!rebuilt.is_stale(&videos, &hybrid));
    //synthetic videos have unrelated similarity matrices, so nothing survives hybrid mode.
    assert!(rebuilt.is_empty());
    assert_eq!(
        rebuilt.next_by(&videos, &hybrid, |_: &Path| true),
        Ok(ScanStep::Exhausted)
    );

    //the fast summary still sees one match per group.
    let summary = summarize_matches(&videos, &fast);
    assert_eq!(summary.videos_with_matches, groups.len() / 2);
}

#[test]
fn test_only_the_close_pair_of_three_matches() {
    let mut rng = StdRng::seed_from_u64(106);
    let a = random_hash(&mut rng);
    let b = hash_with_distance(a, 4, &mut rng);
    let c = !a;
    assert_ne!(c, 0);

    let videos = [("/three/a.mp4", a), ("/three/b.mp4", b), ("/three/c.mp4", c)]
        .into_iter()
        .map(|(path, hash)| synthetic_video(path, vec![hash], DURATION_MS, &mut rng))
        .collect_vec();
    let config = MatchConfig {
        thresholds: ThresholdConfig::new(40, 64, 0.0, 1.0),
        ..permissive_config(MatchMode::FastOnly)
    };

    let set = MatchSet::build(&videos, &config);
    assert_eq!(set.len(), 1);

    let candidate = &set.candidates()[0];
    assert_eq!(candidate.indices(), (0, 1));
    match candidate.similarity() {
        Similarity::Fast(score) => assert!(40 < score && score <= 64, "score {score}"),
        other => panic!("expected a fast score, got {other:?}"),
    }
}
