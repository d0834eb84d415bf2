use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::{value_parser, ArgAction::*};
use vid_match_lib::*;

use crate::app::*;

// file selection
const FILE_PATHS: &str = "Directories/files to search";
const EXCL_FILE_PATHS: &str = "Exclude file paths";
const EXCL_EXTS: &str = "Exclude file extensions";

// cache settings
const CACHE_FILE: &str = "Cache file path";
const NO_CACHE: &str = "Do not use a cache";

// fingerprinting
const THUMBS: &str = "Frames per thumbnail";
const SEGMENTED: &str = "Segmented hashing";

// matching configuration
const CONFIG_FILE: &str = "Matching configuration file";
const MODE: &str = "Match mode";
const FAST_LOWER: &str = "Fast lower bound";
const FAST_UPPER: &str = "Fast upper bound";
const SLOW_LOWER: &str = "Slow lower bound";
const SLOW_UPPER: &str = "Slow upper bound";
const MIN_SIZE: &str = "Minimum file size";
const MIN_DURATION: &str = "Minimum duration";
const SAME_DURATION_BONUS: &str = "Same duration bonus";
const DIFFERENT_DURATION_PENALTY: &str = "Different duration penalty";
const SSIM_BLOCK_SIZE: &str = "SSIM block size";
const BAD_NAMES: &str = "Bad filename patterns";

// type of search
const LIVE: &str = "Live scan";

// output settings
const OUTPUT_FORMAT: &str = "Format";

// Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 23] = [
    //
    // file selection
    FILE_PATHS,
    EXCL_FILE_PATHS,
    EXCL_EXTS,
    //
    //caching
    CACHE_FILE,
    NO_CACHE,
    //
    //fingerprinting
    THUMBS,
    SEGMENTED,
    //
    //matching
    CONFIG_FILE,
    MODE,
    FAST_LOWER,
    FAST_UPPER,
    SLOW_LOWER,
    SLOW_UPPER,
    MIN_SIZE,
    MIN_DURATION,
    SAME_DURATION_BONUS,
    DIFFERENT_DURATION_PENALTY,
    SSIM_BLOCK_SIZE,
    BAD_NAMES,
    //
    //type of search
    LIVE,
    //
    //outputs
    OUTPUT_FORMAT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

fn get_ordering(arg_name: &str) -> usize {
    match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
        Some(idx) => idx,
        None => {
            panic!("argument not assigned a display order: {arg_name:?}");
        }
    }
}

pub(super) fn build_app() -> clap::Command {
    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut clap_app = clap::Command::new("Video match finder")
        .version(clap::crate_version!())
        .about("Find pairs of near-duplicate video files");

    clap_app = clap_app.arg(
        clap::Arg::new(FILE_PATHS)
            .long("files")
            .required(true)
            .num_args(1..)
            .value_parser(value_parser!(PathBuf))
            .action(Append)
            .help("Paths containing video files. Every video is compared against every other.")
            .display_order(get_ordering(FILE_PATHS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(EXCL_FILE_PATHS)
            .long("exclude")
            .num_args(0..)
            .value_parser(value_parser!(PathBuf))
            .action(Append)
            .help("Paths to be excluded from searches")
            .display_order(get_ordering(EXCL_FILE_PATHS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(EXCL_EXTS)
            .long("exclude-exts")
            .num_args(0..)
            .value_parser(value_parser!(OsString))
            .help("File extensions to be excluded from searches. When specified the default file exclusion extensions will be replaced with the given values. Extensions must be comma separated with no spaces, e.g '--exclude-exts ext1,ext2,ext3'")
            .value_delimiter(',')
            .action(Append)
            .default_value("png,jpg,bmp,jpeg,txt,text,db,gif,rb,py,mp3,wma,wav,ogg,flac,zip,rar,7z,pdf,htm,html,xls,doc,ppt,odt,ods,docx,xlsx,rtf,log,trashinfo,js,css,rs,aac,txt~,sh,DS_Store,part,webp,srt,nfo,json,bin,tmp")
            .display_order(get_ordering(EXCL_EXTS)),
    );

    //obtain the path to the default cache file at runtime.
    let default_cache_file = directories_next::ProjectDirs::from("", "vid_match", "vid_match")
        .map(|dirs| dirs.cache_dir().join("vid_match_captures.bin"))
        .unwrap_or_else(|| PathBuf::from("vid_match_captures.bin"))
        .to_string_lossy()
        .to_string();

    clap_app = clap_app.arg(
        clap::Arg::new(CACHE_FILE)
            .long("cache-file")
            .value_parser(value_parser!(PathBuf))
            .num_args(1)
            .default_value(default_cache_file)
            .help("Where to keep video metadata and captured frames between runs")
            .display_order(get_ordering(CACHE_FILE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(NO_CACHE)
            .long("no-cache")
            .help("Do not read or write the cache. Every video is inspected and decoded again.")
            .action(SetTrue)
            .num_args(0)
            .display_order(get_ordering(NO_CACHE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(THUMBS)
            .long("thumbs")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .conflicts_with(SEGMENTED)
            .help("Number of frames sampled from each video: 1, 2, 3, 4, 6, 9, 12 or 16")
            .display_order(get_ordering(THUMBS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(SEGMENTED)
            .long("segmented")
            .action(SetTrue)
            .num_args(0)
            .help("Sample 16 frames and hash each of them separately. Finds videos that share only part of their content, at the cost of speed")
            .display_order(get_ordering(SEGMENTED)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(CONFIG_FILE)
            .long("config")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("A JSON file holding matching configuration. Arguments given on the command line override it")
            .display_order(get_ordering(CONFIG_FILE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(MODE)
            .long("mode")
            .num_args(1)
            .value_parser(value_parser!(MatchModeArg))
            .help("fast: compare perceptual hashes only. hybrid: use hashes to find candidates, then confirm with structural similarity")
            .display_order(get_ordering(MODE)),
    );

    let bound_args = [
        (FAST_LOWER, "fast-lower", "Matching bits (0-64) a pair must exceed"),
        (FAST_UPPER, "fast-upper", "Matching bits (0-64) a pair must not exceed"),
    ];
    for (name, long, help) in bound_args {
        clap_app = clap_app.arg(
            clap::Arg::new(name)
                .long(long)
                .num_args(1)
                .value_parser(value_parser!(u32))
                .help(help)
                .display_order(get_ordering(name)),
        );
    }

    let bound_args = [
        (SLOW_LOWER, "slow-lower", "Structural similarity a pair must exceed in hybrid mode"),
        (SLOW_UPPER, "slow-upper", "Structural similarity a pair must not exceed in hybrid mode"),
    ];
    for (name, long, help) in bound_args {
        clap_app = clap_app.arg(
            clap::Arg::new(name)
                .long(long)
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help(help)
                .display_order(get_ordering(name)),
        );
    }

    let u64_args = [
        (MIN_SIZE, "min-size", "Ignore files smaller than this many bytes"),
        (MIN_DURATION, "min-duration", "Ignore videos shorter than this many milliseconds"),
    ];
    for (name, long, help) in u64_args {
        clap_app = clap_app.arg(
            clap::Arg::new(name)
                .long(long)
                .num_args(1)
                .value_parser(value_parser!(u64))
                .help(help)
                .display_order(get_ordering(name)),
        );
    }

    let u32_args = [
        (SAME_DURATION_BONUS, "same-duration-bonus", "Score added when two videos are the same length"),
        (DIFFERENT_DURATION_PENALTY, "different-duration-penalty", "Score removed when two videos are different lengths"),
        (SSIM_BLOCK_SIZE, "ssim-block-size", "Side of the square windows structural similarity is averaged over"),
    ];
    for (name, long, help) in u32_args {
        clap_app = clap_app.arg(
            clap::Arg::new(name)
                .long(long)
                .num_args(1)
                .value_parser(value_parser!(u32))
                .help(help)
                .display_order(get_ordering(name)),
        );
    }

    clap_app = clap_app.arg(
        clap::Arg::new(BAD_NAMES)
            .long("bad-names")
            .num_args(0..)
            .value_delimiter(',')
            .action(Append)
            .value_parser(value_parser!(String))
            .help("Files whose names contain any of these never match. Replaces the default list")
            .display_order(get_ordering(BAD_NAMES)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(LIVE)
            .long("live")
            .action(SetTrue)
            .num_args(0)
            .help("Compare pairs lazily and report each match as soon as it is found, instead of comparing everything first")
            .display_order(get_ordering(LIVE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("format")
            .num_args(1)
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .help("Output format")
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .help("Reduced verbosity")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    //capture the cwd once, to minimize the risk of working with two values if it is changed by the OS at runtime.
    let cwd = std::env::current_dir().unwrap_or_else(|e| print_error_and_quit(e.into()));

    let args = build_app().get_matches();
    cfg_from_args(&args, &cwd).unwrap_or_else(|e| print_error_and_quit(e))
}

pub(super) fn cfg_from_args(args: &clap::ArgMatches, cwd: &Path) -> eyre::Result<AppCfg> {
    let absolutify_all = |name: &str| -> Vec<PathBuf> {
        args.get_many::<PathBuf>(name)
            .map(|paths| paths.map(|p| absolutify_path(cwd, p)).collect())
            .unwrap_or_default()
    };

    let dir_cfg = DirCfg {
        cand_dirs: absolutify_all(FILE_PATHS),
        excl_dirs: absolutify_all(EXCL_FILE_PATHS),
        excl_exts: args
            .get_many::<OsString>(EXCL_EXTS)
            .map(|exts| exts.cloned().collect())
            .unwrap_or_default(),
    };

    let cache_cfg = CacheCfg {
        cache_path: if args.get_flag(NO_CACHE) {
            None
        } else {
            args.get_one::<PathBuf>(CACHE_FILE)
                .map(|p| absolutify_path(cwd, p))
        },
    };

    let layout = if args.get_flag(SEGMENTED) {
        ThumbnailLayout::Segmented
    } else {
        match args.get_one::<u32>(THUMBS) {
            None => ThumbnailLayout::default(),
            Some(&n) => ThumbnailLayout::from_num_frames(n).ok_or_else(|| {
                eyre::Report::msg(format!("no thumbnail layout has {n} frames"))
            })?,
        }
    };

    let base_cfg = match args.get_one::<PathBuf>(CONFIG_FILE) {
        Some(path) => load_match_config(&absolutify_path(cwd, path))?,
        None => MatchConfig::default(),
    };
    let mut match_cfg = apply_overrides(base_cfg, args);
    //Only segmented fingerprints have more than one slot to compare.
    match_cfg.hash_slots = layout.hash_slots();

    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let output_cfg = OutputCfg {
        format: args
            .get_one::<OutputFormat>(OUTPUT_FORMAT)
            .copied()
            .unwrap_or(OutputFormat::Normal),
        verbosity,
    };

    let ret = AppCfg {
        cache_cfg,
        dir_cfg,
        output_cfg,

        layout,
        match_cfg,
        scan: if args.get_flag(LIVE) {
            ScanKind::Live
        } else {
            ScanKind::Preprocess
        },
    };

    Ok(ret)
}

fn load_match_config(path: &Path) -> Result<MatchConfig, AppError> {
    let text = std::fs::read_to_string(path).map_err(|src| AppError::ConfigRead {
        src,
        path: path.to_path_buf(),
    })?;

    serde_json::from_str(&text).map_err(|src| AppError::ConfigParse {
        src,
        path: path.to_path_buf(),
    })
}

// Values given on the command line replace those from the config file.
fn apply_overrides(mut cfg: MatchConfig, args: &clap::ArgMatches) -> MatchConfig {
    if let Some(mode) = args.get_one::<MatchModeArg>(MODE) {
        cfg.mode = match mode {
            MatchModeArg::Fast => MatchMode::FastOnly,
            MatchModeArg::Hybrid => MatchMode::Hybrid,
        };
    }

    //lower bounds first, so an explicit upper bound always wins a conflict.
    if let Some(&v) = args.get_one::<u32>(FAST_LOWER) {
        cfg.thresholds.set_fast_lower(v);
    }
    if let Some(&v) = args.get_one::<u32>(FAST_UPPER) {
        cfg.thresholds.set_fast_upper(v);
    }
    if let Some(&v) = args.get_one::<f64>(SLOW_LOWER) {
        cfg.thresholds.set_slow_lower(v);
    }
    if let Some(&v) = args.get_one::<f64>(SLOW_UPPER) {
        cfg.thresholds.set_slow_upper(v);
    }

    if let Some(&v) = args.get_one::<u64>(MIN_SIZE) {
        cfg.min_size_bytes = v;
    }
    if let Some(&v) = args.get_one::<u64>(MIN_DURATION) {
        cfg.min_duration_ms = v;
    }
    if let Some(&v) = args.get_one::<u32>(SAME_DURATION_BONUS) {
        cfg.duration_bias.same_duration_bonus = v;
    }
    if let Some(&v) = args.get_one::<u32>(DIFFERENT_DURATION_PENALTY) {
        cfg.duration_bias.different_duration_penalty = v;
    }
    if let Some(&v) = args.get_one::<u32>(SSIM_BLOCK_SIZE) {
        cfg.ssim_block_size = v;
    }
    if let Some(names) = args.get_many::<String>(BAD_NAMES) {
        cfg.bad_name_patterns = names.cloned().collect();
    }

    cfg
}

fn absolutify_path(cwd: &Path, path: &Path) -> PathBuf {
    //get the absolute path if it is not absolute, by prepending the cwd.
    let path = if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    };

    //now try canonicalizing the path. If that fails then carry on with the joined path.
    let p = path.canonicalize().unwrap_or(path);

    p
}
