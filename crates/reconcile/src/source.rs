//! Resource sources
//!
//! A [`Source`] produces raw byte streams for the normalizer. Two kinds
//! exist: local manifest files found by scanning a tree, and external
//! commands whose standard output is the stream.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;
use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

/// Raw content of one stream, with a label for error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    /// File path or command line the content came from
    pub origin: String,
    pub content: Vec<u8>,
}

impl Stream {
    pub fn new(origin: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            origin: origin.into(),
            content,
        }
    }
}

/// Something that can produce zero or more raw streams
pub trait Source: Send + Sync + fmt::Debug {
    /// Human-readable label, used in logs and errors
    fn origin(&self) -> String;

    /// Fetch the streams. Any failure aborts the whole source.
    fn streams(&self) -> Result<Vec<Stream>>;
}

/// A boxed source for type-erased storage
pub type BoxedSource = Box<dyn Source>;

// ============================================================================
// Local manifests
// ============================================================================

/// A single manifest file on disk
#[derive(Debug, Clone)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for ManifestFile {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn streams(&self) -> Result<Vec<Stream>> {
        let content = fs::read(&self.path).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(vec![Stream::new(self.origin(), content)])
    }
}

/// Check whether a file name looks like a YAML manifest
fn is_manifest_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|name| name.ends_with(".yml") || name.ends_with(".yaml"))
}

/// Find the manifest files under `root`
///
/// A file root is returned as is, whatever its name. A directory root is
/// walked recursively for regular `*.yml` / `*.yaml` files, in lexical order.
pub fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(root).map_err(|source| Error::Io {
        path: root.to_path_buf(),
        source,
    })?;

    if !metadata.is_dir() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut paths = Vec::new();
    // Symlinked manifests count, like any other file
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_manifest_name(entry.file_name()) {
            debug!("found manifest {}", entry.path().display());
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

/// One [`ManifestFile`] source per manifest found under `root`
pub fn local_sources(root: &Path) -> Result<Vec<BoxedSource>> {
    Ok(discover_manifests(root)?
        .into_iter()
        .map(|path| Box::new(ManifestFile::new(path)) as BoxedSource)
        .collect())
}

// ============================================================================
// External commands
// ============================================================================

/// Command line whose standard output is a manifest stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub cmd: String,
    /// Arguments; glob patterns are expanded before execution
    pub args: Vec<String>,
    /// Working directory for the command and for glob expansion
    pub workdir: Option<PathBuf>,
    /// Kill the command if it runs longer than this
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn base_dir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cmd)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Source backed by an external command
#[derive(Debug, Clone)]
pub struct CommandSource {
    spec: CommandSpec,
}

impl CommandSource {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    /// Arguments after glob expansion
    pub fn expanded_args(&self) -> Result<Vec<String>> {
        let base = self.spec.base_dir();
        let mut args = Vec::with_capacity(self.spec.args.len());
        for arg in &self.spec.args {
            args.extend(expand_arg(arg, &base)?);
        }
        Ok(args)
    }

    /// Run the command and return its standard output
    fn run(&self) -> Result<Vec<u8>> {
        let command_line = self.spec.to_string();
        let io_error = |source: io::Error| Error::CommandIo {
            command: command_line.clone(),
            source,
        };

        let args = self.expanded_args()?;
        debug!("running {} {}", self.spec.cmd, args.join(" "));

        let mut command = Command::new(&self.spec.cmd);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.spec.workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(io_error)?;

        // Drain both pipes while waiting so a chatty command cannot fill
        // the pipe buffer and block forever.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.spec.timeout {
            Some(timeout) => match child.wait_timeout(timeout).map_err(io_error)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::CommandTimeout {
                        command: command_line,
                        timeout,
                    });
                }
            },
            None => child.wait().map_err(io_error)?,
        };

        let stdout = collect(stdout).map_err(io_error)?;
        let stderr = collect(stderr).map_err(io_error)?;

        if !status.success() {
            return Err(Error::CommandFailed {
                command: command_line,
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

impl Source for CommandSource {
    fn origin(&self) -> String {
        self.spec.to_string()
    }

    fn streams(&self) -> Result<Vec<Stream>> {
        let content = self.run()?;
        Ok(vec![Stream::new(self.origin(), content)])
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe reader panicked")))
}

fn is_glob(arg: &str) -> bool {
    arg.contains(['*', '?', '[', '{'])
}

/// Expand one argument against the filesystem
///
/// Plain arguments pass through. A pattern that matches nothing is kept
/// literally, the way an interactive shell would.
fn expand_arg(arg: &str, base: &Path) -> Result<Vec<String>> {
    if !is_glob(arg) {
        return Ok(vec![arg.to_string()]);
    }

    // `./` leads are kept in the results but not matched on
    let mut pattern_text = arg;
    while let Some(rest) = pattern_text.strip_prefix("./") {
        pattern_text = rest.trim_start_matches('/');
    }
    let lead = &arg[..arg.len() - pattern_text.len()];

    // Arguments like `jsonpath={.items}` are not patterns at all
    let glob = match Glob::new(pattern_text) {
        Ok(glob) => glob,
        Err(e) => {
            debug!("not expanding '{arg}': {e}");
            return Ok(vec![arg.to_string()]);
        }
    };

    // Only walk below the literal part of the pattern
    let pattern = Path::new(pattern_text);
    let prefix: PathBuf = pattern
        .components()
        .take_while(|c| !is_glob(&c.as_os_str().to_string_lossy()))
        .collect();
    let root = base.join(&prefix);

    let mut walker = WalkDir::new(&root).min_depth(1).sort_by_file_name();
    if !pattern_text.contains("**") {
        let depth = pattern.components().count() - prefix.components().count();
        walker = walker.max_depth(depth);
    }

    let mut matches = Vec::new();
    if root.is_dir() {
        for entry in walker {
            let entry = entry?;
            let path = entry.path().strip_prefix(base).unwrap_or(entry.path());
            let path = path.to_string_lossy().replace('\\', "/");
            if glob.matched(&CandidatePath::from(path.as_str())).is_some() {
                matches.push(format!("{lead}{path}"));
            }
        }
    }

    if matches.is_empty() {
        warn!("pattern '{arg}' matched no files, passing it unchanged");
        return Ok(vec![arg.to_string()]);
    }

    matches.sort();
    Ok(matches)
}
