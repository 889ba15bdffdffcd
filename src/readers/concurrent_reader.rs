use crate::error::{ProcessingError, Result};
use crate::processors::normalizer::{NormalizedFile, ParseStats};
use crate::readers::station_reader::{StationFileFormat, StationReader};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// A station file that could not be read at all.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Everything read from the input directories.
///
/// `files` keeps discovery order, which is also the precedence order used
/// when the unifier resolves duplicate observations.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub files: Vec<NormalizedFile>,
    pub failed_files: Vec<FailedFile>,
    pub stats: ParseStats,
}

impl ReadOutcome {
    pub fn files_read(&self) -> usize {
        self.files.len()
    }

    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows.len()).sum()
    }
}

pub struct ConcurrentReader {
    max_workers: usize,
    use_mmap: bool,
}

impl ConcurrentReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Find every `.dly`/`.csv` file in the given directories.
    ///
    /// Directories are visited in the order given and files within one
    /// directory are sorted by name. A missing directory is fatal, as is
    /// finding no station files at all.
    pub fn discover_station_files(input_dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for dir in input_dirs {
            if !dir.is_dir() {
                return Err(ProcessingError::MissingInput(dir.clone()));
            }

            let mut dir_files: Vec<PathBuf> = std::fs::read_dir(dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && StationFileFormat::from_path(path).is_some())
                .collect();

            dir_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            debug!("Found {} station files in {}", dir_files.len(), dir.display());

            files.extend(dir_files);
        }

        if files.is_empty() {
            let dirs: Vec<String> = input_dirs.iter().map(|d| d.display().to_string()).collect();
            return Err(ProcessingError::NoStationFiles(dirs.join(", ")));
        }

        Ok(files)
    }

    /// Discover and read all station files in parallel.
    pub fn read_dirs(
        &self,
        input_dirs: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<ReadOutcome> {
        let files = Self::discover_station_files(input_dirs)?;
        info!(
            "Reading {} station files from {} directories",
            files.len(),
            input_dirs.len()
        );
        self.read_all(&files, progress)
    }

    /// Read the given files on a rayon pool. Output keeps input order.
    /// Files that fail to open or have unusable headers are recorded in
    /// `failed_files` and do not abort the run.
    pub fn read_all(
        &self,
        paths: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<ReadOutcome> {
        let processed_count = AtomicUsize::new(0);

        if let Some(p) = progress {
            p.set_message(&format!("Reading {} station files...", paths.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let reader = StationReader::with_mmap(self.use_mmap);

        let results: Vec<(&PathBuf, Result<NormalizedFile>)> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let result = reader.read_station_file(path);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    (path, result)
                })
                .collect()
        });

        let mut outcome = ReadOutcome::default();

        for (path, result) in results {
            match result {
                Ok(file) => {
                    outcome.stats.merge(&file.stats);
                    outcome.files.push(file);
                }
                Err(e) => {
                    debug!("Failed to read {}: {}", path.display(), e);
                    if let Some(p) = progress {
                        p.println(&format!("⚠️  Skipping {}: {}", path.display(), e));
                    }
                    outcome.failed_files.push(FailedFile {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !outcome.failed_files.is_empty() {
            warn!(
                "{} of {} station files could not be read",
                outcome.failed_files.len(),
                paths.len()
            );
        }

        if let Some(p) = progress {
            p.finish_with_message(&format!("Read {} station files", outcome.files_read()));
        }

        Ok(outcome)
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
