use std::ffi::OsString;
use std::path::PathBuf;

use vid_match_lib::{MatchConfig, ThumbnailLayout};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(super) enum MatchModeArg {
    Fast,
    Hybrid,
}

/// How pairs are enumerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanKind {
    /// Compare everything up front, then report.
    Preprocess,
    /// Compare lazily, reporting each match as it is found.
    Live,
}

#[derive(Debug, Clone)]
pub struct OutputCfg {
    pub format: OutputFormat,
    pub verbosity: ReportVerbosity,
}

#[derive(Debug, Clone)]
pub struct DirCfg {
    pub cand_dirs: Vec<PathBuf>,
    pub excl_dirs: Vec<PathBuf>,
    pub excl_exts: Vec<OsString>,
}

#[derive(Debug, Clone)]
pub struct CacheCfg {
    /// None if caching is disabled.
    pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub cache_cfg: CacheCfg,
    pub dir_cfg: DirCfg,
    pub output_cfg: OutputCfg,

    pub layout: ThumbnailLayout,
    pub match_cfg: MatchConfig,
    pub scan: ScanKind,
}
