//! Append-only bloom date evolution log, one JSON record per line.

use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{BloomDateLogEntry, MemberPrediction};
use crate::{ResultsError, ResultsResult};

const LEGACY_HEADER: &str = "  data date       median            early bound        late bound         earliest           latest";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone)]
pub struct BloomDateLog {
    path: PathBuf,
    entries: Vec<BloomDateLogEntry>,
}

impl BloomDateLog {
    /// Open the log, reading any existing records. A missing file is an
    /// empty log.
    pub fn open(path: impl Into<PathBuf>) -> ResultsResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            read_all(&path)?
        } else {
            Vec::new()
        };
        debug!("Opened {} with {} records", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[BloomDateLogEntry] {
        &self.entries
    }

    pub fn last_entry(&self) -> Option<&BloomDateLogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write one record to the end of the file. Earlier lines are never
    /// rewritten.
    ///
    /// JSON has no NaN or infinity, so an entry with a non-finite biomass
    /// is refused rather than written as an unreadable line.
    pub fn append(&mut self, entry: BloomDateLogEntry) -> ResultsResult<()> {
        if let Some(p) = entry.predictions().find(|p| !p.biomass.is_finite()) {
            return Err(ResultsError::NonFiniteBiomass {
                cutoff: entry.cutoff,
                member: p.member,
                biomass: p.biomass,
            });
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(&entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        self.entries.push(entry);
        Ok(())
    }
}

/// Every record in the file at `path`; blank lines are skipped.
pub fn read_all(path: &Path) -> ResultsResult<Vec<BloomDateLogEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|source| ResultsError::CorruptRecord {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Fixed-width text table, one line per record, oldest first.
pub fn render_legacy(entries: &[BloomDateLogEntry]) -> String {
    let mut out = String::from(LEGACY_HEADER);
    out.push('\n');
    for entry in entries {
        let _ = write!(out, "  {}", entry.cutoff);
        for prediction in [Some(entry.median), Some(entry.early), Some(entry.late), entry.earliest, entry.latest] {
            legacy_column(&mut out, prediction.as_ref());
        }
        out.push('\n');
    }
    out
}

fn legacy_column(out: &mut String, prediction: Option<&MemberPrediction>) {
    let _ = match prediction {
        Some(p) => write!(out, "      {}  {}", p.bloom_date, p.member.year()),
        None => write!(out, "      {NOT_AVAILABLE:<10}  {NOT_AVAILABLE:<4}"),
    };
}
