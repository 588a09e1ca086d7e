//! Filesystem scanning into a directory -> files index

use std::io;
use std::path::Path;

use glob::Pattern;
use ignore::WalkBuilder;
use indexmap::IndexMap;
use log::{debug, trace, warn};
use regex::Regex;

use crate::error::{Result, TreeError};

/// Directory path -> file paths directly inside it, in walk order.
pub type FileIndex = IndexMap<String, Vec<String>>;

/// Configuration for scanning a directory tree.
#[derive(Debug, Clone, Default)]
pub struct FinderConfig {
    /// Include hidden and gitignored entries.
    pub show_all: bool,
    /// Descend only N levels below the root.
    pub max_depth: Option<usize>,
    /// Keep at most N files per directory.
    pub max_items: Option<usize>,
    /// Record directories only.
    pub dirs_only: bool,
    /// File name globs a file must match (any of them), when non-empty.
    pub include_patterns: Vec<String>,
    /// File or directory name globs to skip.
    pub exclude_patterns: Vec<String>,
    /// Regexes on the full path a file must match (any of them), when non-empty.
    pub include_paths: Vec<String>,
    /// Regexes on the full path of files or directories to skip.
    pub exclude_paths: Vec<String>,
}

/// Compiled name and path filters.
#[derive(Debug, Clone, Default)]
struct Filters {
    include_names: Vec<Pattern>,
    exclude_names: Vec<Pattern>,
    include_paths: Vec<Regex>,
    exclude_paths: Vec<Regex>,
}

impl Filters {
    fn compile(config: &FinderConfig) -> Result<Self> {
        Ok(Self {
            include_names: compile_globs(&config.include_patterns)?,
            exclude_names: compile_globs(&config.exclude_patterns)?,
            include_paths: compile_regexes(&config.include_paths)?,
            exclude_paths: compile_regexes(&config.exclude_paths)?,
        })
    }

    /// Entries pruned from the walk, directories included.
    fn is_excluded(&self, path: &Path) -> bool {
        let name = file_name(path);
        // Always skip .git
        if name == ".git" {
            return true;
        }
        if self
            .exclude_names
            .iter()
            .any(|p| name == p.as_str() || p.matches(&name))
        {
            return true;
        }
        let full = path.to_string_lossy();
        self.exclude_paths.iter().any(|re| re.is_match(&full))
    }

    /// Whether a file passes the include filters.
    fn is_included(&self, path: &Path) -> bool {
        let name = file_name(path);
        let name_ok = self.include_names.is_empty()
            || self.include_names.iter().any(|p| p.matches(&name));
        let full = path.to_string_lossy();
        let path_ok =
            self.include_paths.is_empty() || self.include_paths.iter().any(|re| re.is_match(&full));
        name_ok && path_ok
    }
}

/// Walks a root directory and groups the files it finds by directory.
pub struct FileFinder {
    config: FinderConfig,
    filters: Filters,
}

impl FileFinder {
    /// Fails with `InvalidPattern` when a glob or regex does not compile.
    pub fn new(config: FinderConfig) -> Result<Self> {
        let filters = Filters::compile(&config)?;
        Ok(Self { config, filters })
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Scan `root`. Every visited directory is present in the index, even when
    /// it holds no files. Unreadable entries are logged and skipped.
    pub fn find(&self, root: &Path) -> Result<FileIndex> {
        if !root.is_dir() {
            return Err(TreeError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: not a directory", root.display()),
            )));
        }

        let respect_ignores = !self.config.show_all;
        let prune = self.filters.clone();
        let walker = WalkBuilder::new(root)
            .hidden(respect_ignores)
            .ignore(respect_ignores)
            .git_ignore(respect_ignores)
            .git_global(respect_ignores)
            .git_exclude(respect_ignores)
            .require_git(false)
            .follow_links(false)
            .max_depth(self.config.max_depth)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| entry.depth() == 0 || !prune.is_excluded(entry.path()))
            .build();

        let mut index = FileIndex::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();

            if file_type.is_dir() {
                index.entry(path_string(path)).or_default();
                continue;
            }
            if !file_type.is_file() || self.config.dirs_only {
                continue;
            }
            if !self.filters.is_included(path) {
                trace!("not included: {}", path.display());
                continue;
            }
            let Some(parent) = path.parent() else {
                continue;
            };
            let files = index.entry(path_string(parent)).or_default();
            if self.config.max_items.is_some_and(|max| files.len() >= max) {
                trace!("item limit reached, skipping {}", path.display());
                continue;
            }
            files.push(path_string(path));
        }

        debug!(
            "scanned {}: {} directories, {} files",
            root.display(),
            index.len(),
            index.values().map(Vec::len).sum::<usize>()
        );
        Ok(index)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| TreeError::InvalidPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

fn compile_regexes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| TreeError::InvalidPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
