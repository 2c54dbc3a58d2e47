//! `.env` bootstrap.
//!
//! Copies `<dir>/.env.example` to `<dir>/.env` for every directory given.
//! An existing `.env` is never touched, and one directory failing never stops
//! the others.

use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// Example file looked up in each directory.
pub const EXAMPLE_FILE: &str = ".env.example";

/// File created next to it.
pub const TARGET_FILE: &str = ".env";

/// What happened to one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOutcome {
    /// The example was copied.
    Created,
    /// The target already existed and was left alone.
    Skipped,
    /// There is no example to copy.
    Missing,
    /// Copying failed.
    Failed(String),
}

/// Result for one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvReport {
    /// Example file that was looked up.
    pub example: PathBuf,
    /// Target file.
    pub target: PathBuf,
    /// Outcome.
    pub outcome: EnvOutcome,
}

impl EnvReport {
    /// Whether this directory failed.
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, EnvOutcome::Failed(_))
    }
}

impl fmt::Display for EnvReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target.display();
        match &self.outcome {
            EnvOutcome::Created => write!(f, "Created {target} from {EXAMPLE_FILE}"),
            EnvOutcome::Skipped => write!(f, "Skipping existing file: {target}"),
            EnvOutcome::Missing => write!(f, "Example file not found: {}", self.example.display()),
            EnvOutcome::Failed(reason) => write!(f, "Failed to create {target}: {reason}"),
        }
    }
}

/// Bootstrap every directory in order.
pub fn init_env<P: AsRef<Path>>(dirs: &[P]) -> Vec<EnvReport> {
    dirs.iter().map(|dir| init_dir(dir.as_ref())).collect()
}

/// Bootstrap one directory.
pub fn init_dir(dir: &Path) -> EnvReport {
    let example = dir.join(EXAMPLE_FILE);
    let target = dir.join(TARGET_FILE);
    let outcome = copy_example(&example, &target);

    match &outcome {
        EnvOutcome::Failed(reason) => {
            tracing::warn!(target = %target.display(), %reason, "env bootstrap failed");
        },
        outcome => tracing::debug!(target = %target.display(), ?outcome, "env bootstrap"),
    }

    EnvReport { example, target, outcome }
}

fn copy_example(example: &Path, target: &Path) -> EnvOutcome {
    let mut source = match File::open(example) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return EnvOutcome::Missing,
        Err(e) => return EnvOutcome::Failed(e.to_string()),
    };

    // create_new refuses to clobber a file that appeared after any check.
    let mut dest = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return EnvOutcome::Skipped,
        Err(e) => return EnvOutcome::Failed(e.to_string()),
    };

    match io::copy(&mut source, &mut dest) {
        Ok(_) => EnvOutcome::Created,
        Err(e) => {
            // Leave no half-written target behind.
            drop(dest);
            let _ = fs::remove_file(target);
            EnvOutcome::Failed(e.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_example_when_target_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(EXAMPLE_FILE), "PARLEY_LOG=debug\n").unwrap();

        let report = init_dir(dir.path());

        assert_eq!(report.outcome, EnvOutcome::Created);
        assert_eq!(fs::read_to_string(dir.path().join(TARGET_FILE)).unwrap(), "PARLEY_LOG=debug\n");
    }

    #[test]
    fn never_overwrites_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(EXAMPLE_FILE), "NEW=1\n").unwrap();
        fs::write(dir.path().join(TARGET_FILE), "KEEP=1\n").unwrap();

        let report = init_dir(dir.path());

        assert_eq!(report.outcome, EnvOutcome::Skipped);
        assert_eq!(fs::read_to_string(dir.path().join(TARGET_FILE)).unwrap(), "KEEP=1\n");
    }

    #[test]
    fn missing_example_reported() {
        let dir = tempfile::tempdir().unwrap();

        let report = init_dir(dir.path());

        assert_eq!(report.outcome, EnvOutcome::Missing);
        assert!(!dir.path().join(TARGET_FILE).exists());
        assert!(report.to_string().starts_with("Example file not found: "));
    }

    #[test]
    fn failure_does_not_abort_the_batch() {
        let existing = tempfile::tempdir().unwrap();
        // A directory at the target path counts as an existing target.
        fs::write(existing.path().join(EXAMPLE_FILE), "B=1\n").unwrap();
        fs::create_dir(existing.path().join(TARGET_FILE)).unwrap();
        let broken = tempfile::tempdir().unwrap();
        fs::create_dir(broken.path().join(EXAMPLE_FILE)).unwrap();
        let missing = tempfile::tempdir().unwrap();
        let good = tempfile::tempdir().unwrap();
        fs::write(good.path().join(EXAMPLE_FILE), "A=1\n").unwrap();

        let reports = init_env(&[existing.path(), broken.path(), missing.path(), good.path()]);

        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].outcome, EnvOutcome::Skipped);
        assert!(reports[1].is_failure());
        assert_eq!(reports[2].outcome, EnvOutcome::Missing);
        assert_eq!(reports[3].outcome, EnvOutcome::Created);
    }

    #[test]
    fn unreadable_example_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(EXAMPLE_FILE)).unwrap();

        let report = init_dir(dir.path());

        assert!(report.is_failure());
        assert!(!dir.path().join(TARGET_FILE).exists());
        assert!(report.to_string().starts_with("Failed to create "));
    }
}
