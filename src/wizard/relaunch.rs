use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info};

use super::state::ResumeToken;

/// Replace the running process with `binary_path argument`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaunchRequest {
    pub binary_path: PathBuf,
    /// Flags forwarded from the current command line, placed before the token
    pub forwarded: Vec<String>,
    pub argument: String,
}

/// What to do after an update attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relaunch {
    /// The binary on disk was replaced; start it
    Exec(RelaunchRequest),
    /// Same binary; continue in this process
    Resume(ResumeToken),
}

/// The running executable and its modification time at startup
#[derive(Debug, Clone)]
pub struct ExecutableStamp {
    path: PathBuf,
    modified: Option<SystemTime>,
    forwarded: Vec<String>,
}

impl ExecutableStamp {
    pub fn capture(path: impl Into<PathBuf>, forwarded: Vec<String>) -> Self {
        let path = path.into();
        let modified = modified_time(&path);
        Self {
            path,
            modified,
            forwarded,
        }
    }

    /// Stamp the executable of the current process
    pub fn current(forwarded: Vec<String>) -> std::io::Result<Self> {
        Ok(Self::capture(std::env::current_exe()?, forwarded))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file's mtime differs from the one seen at startup.
    ///
    /// An mtime that cannot be read on either side counts as unchanged.
    pub fn has_changed(&self) -> bool {
        match (self.modified, modified_time(&self.path)) {
            (Some(then), Some(now)) => then != now,
            _ => false,
        }
    }

    pub fn relaunch(&self, token: ResumeToken) -> Relaunch {
        if self.has_changed() {
            info!("{:?} was replaced, relaunching with {}", self.path, token);
            Relaunch::Exec(RelaunchRequest {
                binary_path: self.path.clone(),
                forwarded: self.forwarded.clone(),
                argument: token.as_str().to_string(),
            })
        } else {
            info!("Executable unchanged, resuming with {}", token);
            Relaunch::Resume(token)
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Replace the current process image. Does not return; if the exec fails
/// the process exits with status 1.
pub fn exec(request: &RelaunchRequest) -> ! {
    info!("Executing {:?} {}", request.binary_path, request.argument);

    let argv: Result<Vec<CString>, _> = std::iter::once(request.binary_path.as_os_str().as_bytes())
        .chain(request.forwarded.iter().map(|a| a.as_bytes()))
        .chain(std::iter::once(request.argument.as_bytes()))
        .map(CString::new)
        .collect();

    match argv {
        Ok(argv) => match nix::unistd::execv(&argv[0], &argv) {
            Ok(never) => match never {},
            Err(e) => error!("Failed to relaunch {:?}: {}", request.binary_path, e),
        },
        Err(e) => error!("Invalid relaunch argument: {}", e),
    }

    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    #[test]
    fn unchanged_binary_resumes_in_process() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("blackbox");
        std::fs::write(&exe, "v1").unwrap();

        let stamp = ExecutableStamp::capture(&exe, Vec::new());
        assert_eq!(
            stamp.relaunch(ResumeToken::PostUpdate),
            Relaunch::Resume(ResumeToken::PostUpdate)
        );
    }

    #[test]
    fn replaced_binary_is_relaunched_with_token() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("blackbox");
        std::fs::write(&exe, "v1").unwrap();

        let stamp = ExecutableStamp::capture(&exe, vec!["--dryrun".to_string()]);
        let later = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&exe)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert_eq!(
            stamp.relaunch(ResumeToken::PostUpdate),
            Relaunch::Exec(RelaunchRequest {
                binary_path: exe.clone(),
                forwarded: vec!["--dryrun".to_string()],
                argument: "POST_UPDATE".to_string(),
            })
        );
        match stamp.relaunch(ResumeToken::UpdateRetry) {
            Relaunch::Exec(request) => assert_eq!(request.argument, "UPDATE_RETRY"),
            other => panic!("expected exec, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_binary_counts_as_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = ExecutableStamp::capture(dir.path().join("gone"), Vec::new());
        assert!(!stamp.has_changed());
    }
}
