use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FilenamePattern {
    incl_paths: Vec<PathBuf>,
    excl_paths: Vec<PathBuf>,
    excl_exts: Vec<OsString>,
}

impl FilenamePattern {
    pub fn new(
        incl_paths: Vec<PathBuf>,
        excl_paths: Vec<PathBuf>,
        excl_exts: Vec<OsString>,
    ) -> eyre::Result<Self> {
        let ret = Self {
            incl_paths,
            excl_paths,
            excl_exts,
        };

        //check that the same path does not appear in srcs and excls
        if let Some(excluded_start_path) = ret
            .incl_paths
            .iter()
            .find(|incl_path| ret.raw_excludes(incl_path))
        {
            return Err(eyre::Report::msg(format!(
                "incl_path \"{}\" is excluded",
                excluded_start_path.to_string_lossy(),
            )));
        }

        Ok(ret)
    }

    fn raw_includes(&self, p: impl AsRef<Path>) -> bool {
        self.incl_paths
            .iter()
            .any(|src_path| p.as_ref().starts_with(src_path))
    }

    fn raw_excludes(&self, p: impl AsRef<Path>) -> bool {
        self.excl_paths
            .iter()
            .any(|excl_path| p.as_ref().starts_with(excl_path))
    }

    fn has_ignore_ext(&self, src_path: impl AsRef<Path>) -> bool {
        self.excl_exts.iter().any(|ext| {
            src_path
                .as_ref()
                .extension()
                .unwrap_or_default()
                .eq_ignore_ascii_case(ext)
        })
    }

    /// Returns true if the given path is a child of any incl_path,
    /// is not a child of any excl_path and has no excluded extension.
    pub fn includes(&self, src_path: impl AsRef<Path>) -> bool {
        self.raw_includes(&src_path)
            && !self.raw_excludes(&src_path)
            && !self.has_ignore_ext(&src_path)
    }

    /// Every included file under the include paths, sorted and deduplicated.
    /// Unreadable directory entries are logged and skipped.
    pub fn iterate_from_fs(&self) -> eyre::Result<Vec<PathBuf>> {
        //test that all start paths and excl paths actually exist.
        for incl_path in &self.incl_paths {
            if !incl_path.exists() {
                return Err(eyre::Report::msg(format!(
                    "incl_path \"{}\" does not exist",
                    incl_path.to_string_lossy(),
                )));
            }
        }

        for excl_path in &self.excl_paths {
            if !excl_path.exists() {
                return Err(eyre::Report::msg(format!(
                    "excl_path \"{}\" does not exist",
                    excl_path.to_string_lossy(),
                )));
            }
        }

        let mut ret = vec![];
        for incl_path in &self.incl_paths {
            let walker = WalkDir::new(incl_path)
                .follow_links(true)
                .into_iter()
                .filter_entry(|entry| !self.raw_excludes(entry.path()));

            for entry in walker {
                match entry {
                    Err(e) => warn!(target: "file_enumeration", "File enumeration failed: {e}"),
                    Ok(entry) => {
                        if entry.file_type().is_file() && self.includes(entry.path()) {
                            ret.push(entry.into_path());
                        }
                    }
                }
            }
        }

        ret.sort();
        ret.dedup();
        Ok(ret)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_enumeration_applies_exclusions() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for name in ["a.mp4", "b.MKV", "notes.txt", "skip/c.mp4", "sub/d.webm"] {
            touch(&root.join(name));
        }

        let pattern = FilenamePattern::new(
            vec![root.to_path_buf()],
            vec![root.join("skip")],
            vec!["txt".into(), "mkv".into()],
        )
        .unwrap();

        let found = pattern.iterate_from_fs().unwrap();
        assert_eq!(found, vec![root.join("a.mp4"), root.join("sub/d.webm")]);
    }

    #[test]
    fn test_excluded_start_path_is_an_error() {
        let res = FilenamePattern::new(
            vec![PathBuf::from("/videos/new")],
            vec![PathBuf::from("/videos")],
            vec![],
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_missing_start_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pattern =
            FilenamePattern::new(vec![dir.path().join("nope")], vec![], vec![]).unwrap();
        assert!(pattern.iterate_from_fs().is_err());
    }
}
