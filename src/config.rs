use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Everything the bootstrap needs to know about the working tree and the tools.
///
/// Built once at startup from the process environment and then passed by
/// reference into the pipeline and the dispatcher, which never consult
/// `std::env` themselves. All paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Checkout of the self-hosted compiler; working directory of every compiler stage.
    pub root: PathBuf,
    /// Build-output directory of the self-hosted compiler.
    pub output_dir: PathBuf,
    /// Sibling checkout of the host-hosted compiler.
    pub host_dir: PathBuf,
    /// Packaged archive produced by the host build tool.
    pub host_artifact: PathBuf,
    /// Root-scoped package cache; only its children are removed on clean.
    pub package_cache: PathBuf,
    /// Remote the host-hosted compiler is cloned from when `host_dir` is missing.
    pub host_remote: String,
    pub java: String,
    pub gradle: String,
    pub git: String,
    pub host_main_class: String,
    pub host_stack: String,
    pub self_main_class: String,
    pub self_stack: String,
    /// Desugared entry source checked into the repository.
    pub entry_source: String,
    /// Higher-level source that is desugared into `entry_source`.
    pub source: String,
    /// Standard library package published into the package cache.
    pub stdlib: String,
    /// Separator between classpath entries.
    pub path_separator: char,
    /// How many times each self-compilation step is repeated.
    pub self_compile_rounds: usize,
    /// Exit with a failing status when the build aborts.
    pub strict_exit: bool,
}

pub const DEFAULT_SELF_COMPILE_ROUNDS: usize = 2;

const HOST_REMOTE: &str = "https://github.com/m-language/m-jvm.git";

impl Config {
    /// Capture the current process state into a new `Config`.
    pub fn new() -> Result<Self> {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().context("cannot determine current directory")?;
        Self::from_vars(&vars, &current_dir)
    }

    /// Default layout rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let host_dir = root.parent().unwrap_or(&root).join("m-jvm");
        let package_cache = root.ancestors().last().unwrap_or(&root).join("mpm-root");
        Self {
            output_dir: root.join("bin"),
            host_artifact: host_dir.join("build").join("libs").join("m-jvm-0.1.0.jar"),
            host_dir,
            package_cache,
            root,
            host_remote: HOST_REMOTE.to_owned(),
            java: "java".to_owned(),
            gradle: "gradle".to_owned(),
            git: "git".to_owned(),
            host_main_class: "io.github.m.Compiler".to_owned(),
            host_stack: "-Xss4m".to_owned(),
            self_main_class: "mc".to_owned(),
            self_stack: "-Xss16m".to_owned(),
            entry_source: "mc.m".to_owned(),
            source: "mc".to_owned(),
            stdlib: "std".to_owned(),
            path_separator: if cfg!(windows) { ';' } else { ':' },
            self_compile_rounds: DEFAULT_SELF_COMPILE_ROUNDS,
            strict_exit: false,
        }
    }

    /// Build a config from an explicit variable map, resolving relative paths
    /// against `current_dir`.
    ///
    /// Recognized overrides: `MC_ROOT`, `MC_OUTPUT_DIR`, `MC_HOST_DIR`,
    /// `MC_HOST_ARTIFACT`, `MC_PACKAGE_CACHE`, `MC_HOST_REMOTE`,
    /// `MC_SELF_COMPILE_ROUNDS` and `MC_STRICT_EXIT`.
    pub fn from_vars(vars: &HashMap<String, String>, current_dir: &Path) -> Result<Self> {
        let path = |key: &str| vars.get(key).map(|v| current_dir.join(v));

        let mut config = Self::with_root(path("MC_ROOT").unwrap_or_else(|| current_dir.to_owned()));

        if let Some(host_dir) = path("MC_HOST_DIR") {
            config.host_artifact = host_dir.join("build").join("libs").join("m-jvm-0.1.0.jar");
            config.host_dir = host_dir;
        }
        if let Some(dir) = path("MC_OUTPUT_DIR") {
            config.output_dir = dir;
        }
        if let Some(artifact) = path("MC_HOST_ARTIFACT") {
            config.host_artifact = artifact;
        }
        if let Some(cache) = path("MC_PACKAGE_CACHE") {
            config.package_cache = cache;
        }
        if let Some(remote) = vars.get("MC_HOST_REMOTE") {
            config.host_remote = remote.clone();
        }
        if let Some(rounds) = vars.get("MC_SELF_COMPILE_ROUNDS") {
            config.self_compile_rounds = parse_rounds(rounds)?;
        }
        if let Some(strict) = vars.get("MC_STRICT_EXIT") {
            config.strict_exit = parse_flag("MC_STRICT_EXIT", strict)?;
        }
        Ok(config)
    }

    /// Classpath of the host-hosted compiler: the packaged artifact alone.
    pub fn host_classpath(&self) -> String {
        self.host_artifact.display().to_string()
    }

    /// Classpath of the self-hosted compiler: its output directory, then the artifact.
    pub fn self_classpath(&self) -> String {
        format!(
            "{}{}{}",
            self.output_dir.display(),
            self.path_separator,
            self.host_artifact.display()
        )
    }
}

/// Whether `MC_STRICT_EXIT` asks for a failing status.
///
/// Unlike [`Config::from_vars`] this never fails: it is consulted before the
/// rest of the configuration is validated, and an unreadable value counts as off.
pub fn strict_exit_requested(vars: &HashMap<String, String>) -> bool {
    vars.get("MC_STRICT_EXIT")
        .and_then(|v| parse_flag("MC_STRICT_EXIT", v).ok())
        .unwrap_or(false)
}

fn parse_rounds(value: &str) -> Result<usize> {
    let rounds: usize = value
        .trim()
        .parse()
        .with_context(|| format!("MC_SELF_COMPILE_ROUNDS: `{value}` is not a number"))?;
    if rounds == 0 {
        bail!("MC_SELF_COMPILE_ROUNDS must be at least 1");
    }
    Ok(rounds)
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => bail!("{key}: expected a boolean, got `{other}`"),
    }
}
