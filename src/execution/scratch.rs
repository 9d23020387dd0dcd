//! Per-invocation scratch artifacts.

use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::debug;

use super::templates::DriverSpec;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// `<millis>_<pid>_<counter>`: unique across concurrent invocations in this
/// process and, through the pid, across processes sharing a directory.
pub fn next_scratch_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", millis, std::process::id(), n)
}

/// Files and directories owned by one execution. Everything tracked is
/// removed by [`ScratchSet::cleanup`], or on drop if cleanup never ran.
#[derive(Debug, Default)]
pub struct ScratchSet {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl ScratchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every artifact of `spec`, then create its directories and write
    /// its files. Paths are tracked before anything is written so a partial
    /// failure is still cleaned up.
    pub async fn materialize(&mut self, spec: &DriverSpec) -> io::Result<()> {
        debug!(artifacts = spec.artifacts().count(), "materializing driver");
        self.files.extend(spec.files.iter().map(|f| f.path.clone()));
        self.files.extend(spec.outputs.iter().cloned());
        self.dirs.extend(spec.dirs.iter().cloned());

        for dir in &spec.dirs {
            tokio::fs::create_dir_all(dir).await?;
        }
        for file in &spec.files {
            tokio::fs::write(&file.path, &file.contents).await?;
            debug!(path = %file.path.display(), "wrote driver");
        }
        Ok(())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().chain(self.dirs.iter()).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    /// Remove everything tracked. Errors (including already-missing paths)
    /// are ignored.
    pub async fn cleanup(&mut self) {
        for file in self.files.drain(..) {
            if let Err(e) = tokio::fs::remove_file(&file).await {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %file.display(), error = %e, "could not remove scratch file");
                }
            }
        }
        for dir in self.dirs.drain(..) {
            let _ = tokio::fs::remove_dir_all(&dir).await;
        }
    }
}

impl Drop for ScratchSet {
    fn drop(&mut self) {
        for file in &self.files {
            let _ = std::fs::remove_file(file);
        }
        for dir in &self.dirs {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        execution::templates::ScratchFile,
        process::Invocation,
    };

    fn spec_in(dir: &Path) -> DriverSpec {
        DriverSpec {
            files: vec![ScratchFile { path: dir.join("driver.txt"), contents: "x".into() }],
            dirs: vec![dir.join("classes")],
            outputs: vec![dir.join("driver.bin")],
            compile: None,
            run: Invocation::new("true", dir),
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = next_scratch_id();
        let b = next_scratch_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c == '_'));
    }

    #[tokio::test]
    async fn cleanup_removes_files_outputs_and_dirs() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let spec = spec_in(tmp.path());
        let mut scratch = ScratchSet::new();
        scratch.materialize(&spec).await.expect("materialize");
        std::fs::write(tmp.path().join("driver.bin"), b"\x7fELF").expect("fake output");
        std::fs::write(tmp.path().join("classes").join("A.class"), b"").expect("fake class");
        assert!(tmp.path().join("driver.txt").exists());

        scratch.cleanup().await;
        assert!(scratch.is_empty());
        assert!(!tmp.path().join("driver.txt").exists());
        assert!(!tmp.path().join("driver.bin").exists());
        assert!(!tmp.path().join("classes").exists());
    }

    #[tokio::test]
    async fn drop_removes_what_cleanup_never_reached() {
        let tmp = tempfile::tempdir().expect("tempdir");
        {
            let mut scratch = ScratchSet::new();
            scratch.materialize(&spec_in(tmp.path())).await.expect("materialize");
        }
        assert!(!tmp.path().join("driver.txt").exists());
        assert!(!tmp.path().join("classes").exists());
    }

    #[tokio::test]
    async fn failed_write_is_still_tracked() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut spec = spec_in(tmp.path());
        spec.files.push(ScratchFile {
            path: tmp.path().join("missing-dir").join("x.txt"),
            contents: String::new(),
        });
        let mut scratch = ScratchSet::new();
        assert!(scratch.materialize(&spec).await.is_err());
        assert_eq!(scratch.paths().count(), 4);
        scratch.cleanup().await;
        assert!(!tmp.path().join("driver.txt").exists());
    }
}
