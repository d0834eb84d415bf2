use std::{
    error::Error,
    io::{prelude::*, BufWriter},
    path::PathBuf,
};

use capture_filesystem_cache::CaptureFilesystemCache;
use ffmpeg_frame_capture::ffmpeg_and_ffprobe_are_callable;
use itertools::Itertools;
#[cfg(feature = "parallel_loading")]
use rayon::prelude::*;
use vid_match_lib::*;

use crate::app::*;

// * read cfg
// * load paths
// * fingerprint, reusing the capture cache
// * enumerate matching pairs
// * output results

const CACHE_SAVE_THRESHOLD: u32 = 2000;

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.output_cfg.verbosity);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.output_cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    // Check that all cand and excl dirs exist
    let non_exist_cands = cfg.dir_cfg.cand_dirs.iter().filter(|d| !d.exists());
    match non_exist_cands.collect::<Vec<_>>().as_slice() {
        [] => (),
        missing_dirs => {
            return Err(eyre::Report::msg(format!(
                "cand_dirs not found: {}",
                missing_dirs.iter().map(|p| p.to_string_lossy()).join(", ")
            )));
        }
    }

    let non_exist_excls = cfg.dir_cfg.excl_dirs.iter().filter(|d| !d.exists());
    match non_exist_excls.collect::<Vec<_>>().as_slice() {
        [] => (),
        missing_dirs => {
            return Err(eyre::Report::msg(format!(
                "excl_dirs not found: {}",
                missing_dirs.iter().map(|p| p.to_string_lossy()).join(", ")
            )));
        }
    }

    if !ffmpeg_and_ffprobe_are_callable() {
        return Err(AppError::FfmpegNotFound.into());
    }

    let file_filter = FilenamePattern::new(
        cfg.dir_cfg.cand_dirs.clone(),
        cfg.dir_cfg.excl_dirs.clone(),
        cfg.dir_cfg.excl_exts.clone(),
    )?;
    let paths = file_filter.iterate_from_fs()?;

    //sanity check: Warn the user if no files were selected for the search
    if paths.is_empty() {
        warn!("No files were found at the paths given by --files. No results will be returned.");
    }

    let videos = match &cfg.cache_cfg.cache_path {
        Some(cache_path) => {
            let cache = CaptureFilesystemCache::new(CACHE_SAVE_THRESHOLD, cache_path.clone())?;
            let videos = fingerprint_all(&paths, &cache, cfg.layout);
            cache.save()?;
            videos
        }
        None => fingerprint_all(&paths, NoStore, cfg.layout),
    };

    info!(
        target: "fingerprinting",
        "Fingerprinted {} of {} files",
        videos.len(),
        paths.len()
    );

    let search_output = match cfg.scan {
        ScanKind::Preprocess => search_preprocessed(cfg, &videos)?,
        ScanKind::Live => search_live(cfg, &videos)?,
    };

    do_app_outputs(cfg, &search_output)?;

    Ok(())
}

fn fingerprint_all<S: CaptureStore>(
    paths: &[PathBuf],
    store: S,
    layout: ThumbnailLayout,
) -> Vec<HashedVideo> {
    let processor = VideoProcessor::new(FfmpegDecoder::default(), store, layout);

    let process = |path: &PathBuf| match processor.process(path) {
        Ok(video) => Some(video),
        Err(e) => {
            warn!(target: "fingerprinting", "{}: {e}", path.display());
            None
        }
    };

    #[cfg(feature = "parallel_loading")]
    let videos = paths.par_iter().filter_map(process).collect();

    #[cfg(not(feature = "parallel_loading"))]
    let videos = paths.iter().filter_map(process).collect();

    videos
}

fn search_preprocessed(cfg: &AppCfg, videos: &[HashedVideo]) -> eyre::Result<SearchOutput> {
    let mut match_set = MatchSet::build(videos, &cfg.match_cfg);

    let mut candidates = vec![];
    while let ScanStep::Found(candidate) = match_set.next(videos, &cfg.match_cfg)? {
        candidates.push(candidate.clone());
    }

    let summary = match_set.summary(videos)?;
    Ok(SearchOutput::new(candidates, summary))
}

// In text mode each pair is written as soon as it is found.
fn search_live(cfg: &AppCfg, videos: &[HashedVideo]) -> eyre::Result<SearchOutput> {
    let stream = cfg.output_cfg.format == OutputFormat::Normal;
    let mut stdout = BufWriter::new(std::io::stdout());

    let mut scan = LiveScan::new(videos, &cfg.match_cfg);
    let mut candidates = vec![];
    while let ScanStep::Found(candidate) = scan.next_match() {
        debug!(
            target: "pair_enumeration",
            "{:.1}% of pairs compared",
            scan.progress_percent()
        );

        if stream {
            SearchOutput::write_candidate(&mut stdout, &candidate)?;
            stdout.flush()?;
        }
        candidates.push(candidate);
    }

    let summary = summarize_matches(videos, &cfg.match_cfg);
    Ok(SearchOutput::new(candidates, summary))
}

fn do_app_outputs(cfg: &AppCfg, search_output: &SearchOutput) -> eyre::Result<()> {
    info!(
        target: "pair_enumeration",
        "{} matching pairs, {} videos with a match",
        search_output.len(),
        search_output.summary().videos_with_matches
    );

    let mut stdout = BufWriter::new(std::io::stdout());

    match (cfg.output_cfg.format, cfg.scan) {
        //pairs were already written while scanning.
        (OutputFormat::Normal, ScanKind::Live) => {
            SearchOutput::write_summary(&mut stdout, search_output.summary())?;
        }
        (OutputFormat::Normal, ScanKind::Preprocess) => search_output.write_text(&mut stdout)?,
        (OutputFormat::Json, _) => {
            search_output.write_json(&mut stdout)?;
            writeln!(stdout)?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    //per-frame decode chatter is only useful when debugging the library itself.
    cfg.add_filter_ignore("frame_capture".to_string());

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    //a logger can only be set once per process. Nothing else sets one, so ignore failure.
    let _ = TermLogger::init(
        min_loglevel,
        cfg.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
