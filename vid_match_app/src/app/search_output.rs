use std::{
    io::{self, prelude::*},
    path::Path,
};

use serde::Serialize;
use vid_match_lib::{MatchCandidate, MatchSummary, Similarity};

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone)]
pub struct SearchOutput {
    candidates: Vec<MatchCandidate>,
    summary: MatchSummary,
}

impl SearchOutput {
    pub fn new(candidates: Vec<MatchCandidate>, summary: MatchSummary) -> Self {
        Self {
            candidates,
            summary,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn summary(&self) -> MatchSummary {
        self.summary
    }

    /// Every pair, then the summary line.
    pub fn write_text(&self, mut w: impl Write) -> io::Result<()> {
        for candidate in &self.candidates {
            Self::write_candidate(&mut w, candidate)?;
        }
        Self::write_summary(&mut w, self.summary)
    }

    pub fn write_candidate(mut w: impl Write, candidate: &MatchCandidate) -> io::Result<()> {
        writeln!(w, "{}", candidate.similarity())?;
        writeln!(w, "    {}", candidate.left_path().display())?;
        writeln!(w, "    {}", candidate.right_path().display())?;
        writeln!(w)
    }

    pub fn write_summary(mut w: impl Write, summary: MatchSummary) -> io::Result<()> {
        writeln!(
            w,
            "{} videos have a match. Removing the smaller file of each would free {:.1} MiB",
            summary.videos_with_matches,
            summary.reclaimable_bytes as f64 / MIB
        )
    }

    pub fn write_json(&self, w: impl Write) -> serde_json::Result<()> {
        //Structs only exist to be serialized.
        #[derive(Serialize)]
        struct JsonMatch<'a> {
            left: &'a Path,
            right: &'a Path,
            similarity: Similarity,
        }

        #[derive(Serialize)]
        struct JsonStruct<'a> {
            matches: Vec<JsonMatch<'a>>,
            summary: MatchSummary,
        }

        let output = JsonStruct {
            matches: self
                .candidates
                .iter()
                .map(|c| JsonMatch {
                    left: c.left_path(),
                    right: c.right_path(),
                    similarity: c.similarity(),
                })
                .collect(),
            summary: self.summary,
        };

        serde_json::to_writer_pretty(w, &output)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn candidate(left: &str, right: &str, similarity: serde_json::Value) -> MatchCandidate {
        serde_json::from_value(json!({
            "left_idx": 0,
            "right_idx": 1,
            "left_path": left,
            "right_path": right,
            "similarity": similarity,
        }))
        .unwrap()
    }

    fn output() -> SearchOutput {
        SearchOutput::new(
            vec![
                candidate("/v/a.mp4", "/v/b.mp4", json!({ "Fast": 60 })),
                candidate("/v/c.mp4", "/v/d.mp4", json!({ "Slow": 0.9 })),
            ],
            MatchSummary {
                videos_with_matches: 2,
                reclaimable_bytes: 3 * 1024 * 1024,
            },
        )
    }

    #[test]
    fn test_text_output() {
        let mut buf = vec![];
        output().write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let expected = "\
60/64 bits
    /v/a.mp4
    /v/b.mp4

0.900 SSIM
    /v/c.mp4
    /v/d.mp4

2 videos have a match. Removing the smaller file of each would free 3.0 MiB
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_json_output() {
        let mut buf = vec![];
        output().write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["matches"][0]["left"], "/v/a.mp4");
        assert_eq!(value["matches"][1]["similarity"]["Slow"], 0.9);
        assert_eq!(value["summary"]["videos_with_matches"], 2);
        assert_eq!(value["summary"]["reclaimable_bytes"], 3 * 1024 * 1024);
    }
}
