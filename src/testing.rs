//! Test doubles for the process runner and the confirmation gate.

use crate::command::{CommandLine, Confirmation, ExitCode};
use crate::config::Config;
use crate::dispatch::{clean_host_stage, repl_stage, test_stage};
use crate::external::ProcessRunner;
use crate::io_adapters::Payload;
use crate::pipeline::{build_stages, clone_stage};
use crate::prompt::Confirm;
use crate::stage::Stage;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Throwaway layout: `<tmp>/mc` as root, `<tmp>/m-jvm` as host checkout
/// (created only when `host_present`) and `<tmp>/mpm-root` as package cache.
pub(crate) fn fixture(host_present: bool) -> (TempDir, Config) {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::with_root(tmp.path().join("mc"));
    config.package_cache = tmp.path().join("mpm-root");
    fs::create_dir_all(&config.root).unwrap();
    if host_present {
        fs::create_dir_all(&config.host_dir).unwrap();
    }
    (tmp, config)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub command: String,
    pub dir: PathBuf,
    pub payload: Option<Vec<u8>>,
    pub stage: String,
}

/// Records every invocation instead of spawning anything.
///
/// Invocations are labelled with the name of the known stage they match; a
/// repeated command gets the name of its next occurrence in the known list.
pub(crate) struct RecordingRunner {
    known: Vec<Stage>,
    fail_at: Option<(usize, ExitCode)>,
    pub invocations: Vec<Invocation>,
}

impl RecordingRunner {
    pub fn new(config: &Config) -> Self {
        let mut known = vec![clone_stage(config), clean_host_stage(config)];
        known.extend(build_stages(config));
        known.push(repl_stage(config));
        known.push(test_stage(config));
        Self {
            known,
            fail_at: None,
            invocations: Vec::new(),
        }
    }

    /// Make the `index`-th invocation (zero-based) exit with `code`.
    pub fn fail_at(mut self, index: usize, code: ExitCode) -> Self {
        self.fail_at = Some((index, code));
        self
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.invocations.iter().map(|i| i.stage.clone()).collect()
    }

    fn label(&self, command: &CommandLine, dir: &Path, payload: Option<&Payload>) -> String {
        let matches = |s: &Stage| {
            &s.command == command && s.working_dir == dir && s.payload.as_ref() == payload
        };
        let seen = self
            .invocations
            .iter()
            .filter(|i| {
                i.command == command.to_string()
                    && i.dir == dir
                    && i.payload == payload.map(Payload::to_bytes)
            })
            .count();
        self.known
            .iter()
            .filter(|&s| matches(s))
            .nth(seen)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "unknown".to_owned())
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(
        &mut self,
        command: &CommandLine,
        dir: &Path,
        payload: Option<&Payload>,
    ) -> Result<ExitCode> {
        let stage = self.label(command, dir, payload);
        let index = self.invocations.len();
        self.invocations.push(Invocation {
            command: command.to_string(),
            dir: dir.to_owned(),
            payload: payload.map(Payload::to_bytes),
            stage,
        });
        Ok(match self.fail_at {
            Some((at, code)) if at == index => code,
            _ => 0,
        })
    }
}

/// Answers "no" and counts how often it was asked.
#[derive(Default)]
pub(crate) struct Decline {
    pub asked: usize,
}

impl Confirm for Decline {
    fn confirm(&mut self, _message: &str) -> Result<Confirmation> {
        self.asked += 1;
        Ok(Confirmation::Abort)
    }
}

/// Answers "yes" and counts how often it was asked.
#[derive(Default)]
pub(crate) struct Accept {
    pub asked: usize,
}

impl Confirm for Accept {
    fn confirm(&mut self, _message: &str) -> Result<Confirmation> {
        self.asked += 1;
        Ok(Confirmation::Proceed)
    }
}
