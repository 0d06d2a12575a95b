use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug)]
pub struct RosterRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

pub struct RosterWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl RosterWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    /// Write an input file into the workspace root and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write input");
        path
    }
}

pub fn run_roster<I, S>(workspace: &RosterWorkspace, args: I) -> RosterRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("roster"));
    cmd.current_dir(&workspace.root);
    cmd.args(args);
    cmd.env_remove("ROSTER_DIR");
    cmd.env_remove("ROSTER_DB");
    cmd.env_remove("ROSTER_ACTOR");
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "roster_import=debug");
    cmd.env("HOME", &workspace.root);

    let output = cmd.output().expect("run roster");
    RosterRun {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status,
    }
}

pub fn init_workspace() -> RosterWorkspace {
    let workspace = RosterWorkspace::new();
    let run = run_roster(&workspace, ["init"]);
    assert!(run.status.success(), "init failed: {}", run.stderr);
    workspace
}
