use crate::command::{CommandLine, ExitCode};
use crate::error::BootstrapError;
use crate::io_adapters::Payload;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tracing::debug;

/// Runs one external command to completion.
///
/// Without a payload the child shares the orchestrator's standard streams.
/// With a payload only stderr is shared: the payload and its terminator are
/// written to the child's stdin, which is then closed, and stdout is not shown.
/// Non-zero exit codes are returned as-is; interpreting them is up to the caller.
pub trait ProcessRunner {
    fn run(
        &mut self,
        command: &CommandLine,
        dir: &Path,
        payload: Option<&Payload>,
    ) -> Result<ExitCode>;
}

/// Spawns real child processes.
pub struct SystemRunner {
    search_paths: OsString,
    extensions: Vec<String>,
}

const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

impl SystemRunner {
    /// Create a runner that looks up programs in `search_paths` (PATH syntax).
    pub fn new(search_paths: impl Into<OsString>) -> Self {
        Self {
            search_paths: search_paths.into(),
            extensions: Vec::new(),
        }
    }

    /// Also accept `name` + each of `extensions` when `name` itself is not a file.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Capture PATH, and on Windows PATHEXT, from the current process.
    ///
    /// PATHEXT lets wrapper scripts such as `gradle.bat` resolve from a bare `gradle`.
    pub fn from_env() -> Self {
        let runner = Self::new(std::env::var_os("PATH").unwrap_or_default());
        if cfg!(windows) {
            let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| DEFAULT_PATHEXT.to_owned());
            runner.with_extensions(split_extensions(&pathext))
        } else {
            runner
        }
    }
}

fn split_extensions(pathext: &str) -> Vec<String> {
    pathext
        .split(';')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
        .collect()
}

impl ProcessRunner for SystemRunner {
    fn run(
        &mut self,
        command: &CommandLine,
        dir: &Path,
        payload: Option<&Payload>,
    ) -> Result<ExitCode> {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("cannot resolve working directory {}", dir.display()))?;
        let program = find_command_path(
            &self.search_paths,
            &self.extensions,
            Path::new(command.program()),
            &dir,
        )
            .ok_or_else(|| BootstrapError::CommandNotFound {
                program: command.program().to_owned(),
            })?
            .into_owned();
        debug!(command = %command, dir = %dir.display(), scripted = payload.is_some(), "spawning");

        let mut cmd = std::process::Command::new(&program);
        cmd.args(command.args()).current_dir(&dir);

        let status = match payload {
            None => cmd
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .with_context(|| format!("failed to spawn `{command}`"))?,
            Some(payload) => {
                let mut child = cmd
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()
                    .with_context(|| format!("failed to spawn `{command}`"))?;
                if let Some(mut stdin) = child.stdin.take() {
                    payload
                        .write_to(&mut stdin)
                        .with_context(|| format!("failed to write input of `{command}`"))?;
                    // Dropping stdin closes the pipe so the child sees end of input.
                }
                let output = child
                    .wait_with_output()
                    .with_context(|| format!("failed to wait for `{command}`"))?;
                for line in String::from_utf8_lossy(&output.stdout).lines() {
                    debug!(target: "mc_bootstrap::child", "{line}");
                }
                output.status
            }
        };

        Ok(match status.code() {
            Some(code) => code,
            None => terminated_by_signal(status),
        })
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a program the way a typical shell would, relative to `dir`.
///
/// - Absolute path: returned if it exists.
/// - Several components (`bin/tool`, `./tool`): looked up under `dir`.
/// - Single component: first match in `search_paths`.
/// - Empty path: `None`.
///
/// A candidate without an extension is also tried with the platform
/// executable suffix and then with each of `extensions`, in order.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    extensions: &[String],
    path: &'a Path,
    dir: &Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path, extensions);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, extensions, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(&dir.join(path), extensions).map(|p| Cow::Owned(p.into_owned())),
    }
}

fn find_in_path(search_paths: &OsStr, extensions: &[String], cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .find_map(|dir| find_by_path(&dir.join(cmd), extensions).map(Cow::into_owned))
}

fn find_by_path<'a>(path: &'a Path, extensions: &[String]) -> Option<Cow<'a, Path>> {
    if path.is_file() {
        return Some(Cow::Borrowed(path));
    }
    if path.extension().is_some() {
        return None;
    }
    let suffix = std::env::consts::EXE_SUFFIX;
    std::iter::once(suffix)
        .filter(|s| !s.is_empty())
        .chain(extensions.iter().map(String::as_str))
        .map(|ext| path.with_extension(ext.trim_start_matches('.')))
        .find(|candidate| candidate.is_file())
        .map(Cow::Owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::File;

    #[cfg(unix)]
    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[cfg(unix)]
    fn runner() -> SystemRunner {
        SystemRunner::new("/usr/local/bin:/usr/bin:/bin")
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), &[], path, Path::new("/")).unwrap();
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        assert!(find_command_path(osstr("/bin"), &[], path, Path::new("/")).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nope:/bin"), &[], Path::new("sh"), Path::new("/"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert!(found.as_ref().starts_with("/bin"), "got {:?}", found);
        assert!(found.as_ref().ends_with("sh"));
    }

    #[test]
    #[cfg(unix)]
    fn single_component_not_found_in_path() {
        assert!(find_command_path(osstr("/bin"), &[], Path::new("nonexisting"), Path::new("/")).is_none());
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(OsStr::new("/bin"), &[], Path::new(""), Path::new("/")).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn relative_paths_resolve_against_working_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("bin")).unwrap();
        File::create(tmp.path().join("bin").join("tool")).unwrap();
        File::create(tmp.path().join("here")).unwrap();

        let found = find_command_path(osstr("/bin"), &[], Path::new("bin/tool"), tmp.path()).unwrap();
        assert_eq!(found.as_ref(), tmp.path().join("bin").join("tool"));

        let found = find_command_path(osstr("/bin"), &[], Path::new("./here"), tmp.path()).unwrap();
        assert_eq!(found.as_ref(), tmp.path().join("here"));
    }

    #[test]
    fn wrapper_scripts_found_by_extension() {
        let tmp = tempfile::tempdir().unwrap();
        File::create(tmp.path().join("gradle.bat")).unwrap();
        let search_paths = std::env::join_paths([tmp.path()]).unwrap();
        let extensions = split_extensions(".COM;.EXE; .BAT;;.CMD");
        assert_eq!(extensions, [".com", ".exe", ".bat", ".cmd"]);

        let found =
            find_command_path(&search_paths, &extensions, Path::new("gradle"), Path::new("/")).unwrap();
        assert_eq!(found.as_ref(), tmp.path().join("gradle.bat"));
        assert!(find_command_path(&search_paths, &[], Path::new("gradle"), Path::new("/")).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn exit_codes_are_returned() {
        let tmp = tempfile::tempdir().unwrap();
        let mut runner = runner();
        let ok = runner
            .run(&CommandLine::parse("true"), tmp.path(), None)
            .unwrap();
        assert_eq!(ok, 0);
        let failed = runner
            .run(&CommandLine::parse("false"), tmp.path(), None)
            .unwrap();
        assert_ne!(failed, 0);
    }

    #[test]
    #[cfg(unix)]
    fn payload_reaches_child_with_terminator() {
        let tmp = tempfile::tempdir().unwrap();
        let code = runner()
            .run(
                &CommandLine::parse("tee received.txt"),
                tmp.path(),
                Some(&Payload::new("!mc-test")),
            )
            .unwrap();
        assert_eq!(code, 0);
        // tee ran in the working directory and saw the whole payload before EOF.
        let received = fs::read(tmp.path().join("received.txt")).unwrap();
        assert_eq!(received, b"!mc-test\n\n");
    }

    #[test]
    #[cfg(unix)]
    fn missing_program_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = runner()
            .run(&CommandLine::parse("no-such-tool-xyz"), tmp.path(), None)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<BootstrapError>(),
            Some(&BootstrapError::CommandNotFound {
                program: "no-such-tool-xyz".to_owned()
            })
        );
    }
}
