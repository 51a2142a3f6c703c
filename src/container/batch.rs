use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::{
    container::opts::BatchOpts,
    export::unpack::{self, UnpackSummary},
    foundation::error::{ResError, ResResult},
};

/// Default source file pattern.
pub const DEFAULT_PATTERN: &str = "Clock*_res";

/// Suffix appended to a source file name to form its output directory.
pub const UNPACKED_SUFFIX: &str = "_unpacked";

/// Result for one source file. Failures are per file and do not stop the batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Source container.
    pub source: PathBuf,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Summary or the error that stopped this file.
    pub result: ResResult<UnpackSummary>,
}

/// Files directly inside `folder` whose names match `pattern` (`*` and `?`
/// wildcards), sorted by name.
pub fn find_sources(folder: &Path, pattern: &str) -> ResResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            ResError::Other(anyhow::Error::new(e).context(format!("list '{}'", folder.display())))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if wildcard_match(pattern, &name) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Output directory for `source`: `<out_root>/<name>_unpacked`, or next to the
/// source when no root is given.
pub fn out_dir_for(source: &Path, out_root: Option<&Path>) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir_name = format!("{name}{UNPACKED_SUFFIX}");
    match (out_root, source.parent()) {
        (Some(root), _) => root.join(dir_name),
        (None, Some(parent)) => parent.join(dir_name),
        (None, None) => PathBuf::from(dir_name),
    }
}

/// Unpack every source on a rayon pool. Each file is an independent session.
#[tracing::instrument(skip_all, fields(files = sources.len(), threads = ?opts.threads))]
pub fn unpack_all(
    sources: &[PathBuf],
    out_root: Option<&Path>,
    opts: &BatchOpts,
) -> ResResult<Vec<BatchOutcome>> {
    let pool = build_thread_pool(opts.threads)?;
    let outcomes = pool.install(|| {
        sources
            .par_iter()
            .map(|source| {
                let out_dir = out_dir_for(source, out_root);
                let result = unpack::unpack_file(source, &out_dir, &opts.decode);
                if let Err(err) = &result {
                    tracing::warn!(source = %source.display(), %err, "unpack failed");
                }
                BatchOutcome {
                    source: source.clone(),
                    out_dir,
                    result,
                }
            })
            .collect::<Vec<_>>()
    });
    Ok(outcomes)
}

fn build_thread_pool(threads: Option<usize>) -> ResResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ResError::structural(
            "batch 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        ResError::Other(anyhow::Error::new(e).context("failed to build rayon thread pool"))
    })
}

/// Glob-style match supporting `*` (any run) and `?` (one character).
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(c) if *c == '?' || *c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
#[path = "../../tests/unit/container/batch.rs"]
mod tests;
