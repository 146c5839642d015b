//! Temporary repositories with real check scripts.
//!
//! Writing an executable while another test thread forks can make the exec
//! fail with ETXTBSY, so every test that writes scripts or spawns processes
//! holds `process_lock()` for its whole duration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Serialize script writing and process spawning across test threads.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A throwaway gate root directory
pub struct GateRepo {
    dir: TempDir,
}

impl GateRepo {
    pub fn new() -> Self {
        GateRepo {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Repo with the two default pipeline scripts exiting with the given codes.
    /// Each script also prints to stdout, which must never reach the gate's stdout.
    pub fn with_pipeline_scripts(workspace_code: i32, examples_code: i32) -> Self {
        let repo = Self::new();
        repo.write_script(
            "scripts/check-workspace.sh",
            &format!("echo workspace check output\nexit {}", workspace_code),
        );
        repo.write_script(
            "scripts/check-examples.sh",
            &format!("echo examples check output\nexit {}", examples_code),
        );
        repo
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write an executable `/bin/sh` script
    pub fn write_script(&self, relative: &str, body: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create script dir");
        }
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        }

        path
    }

    /// Write `ci-gate.toml` in the root
    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.path("ci-gate.toml");
        fs::write(&path, toml).expect("write config");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap_or_default()
    }
}

impl Default for GateRepo {
    fn default() -> Self {
        Self::new()
    }
}
