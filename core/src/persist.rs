use crate::index::{IndexEntry, SearchIndex};
use crate::DocId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    fn index_set(&self) -> PathBuf {
        self.root.join("index_set.json")
    }
    fn magnitudes(&self) -> PathBuf {
        self.root.join("document_magnitudes.json")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

/// Persist a sealed index as its three JSON artifacts: the entry list, the
/// document magnitude table, and the meta file carrying the corpus size.
pub fn save(paths: &IndexPaths, index: &SearchIndex, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;

    // Stable artifact: entries ordered by token, postings already ordered by
    // document ordinal.
    let mut entries: Vec<&IndexEntry> = index.entries().collect();
    entries.sort_by(|a, b| a.token.cmp(&b.token));
    let f = File::create(paths.index_set())?;
    serde_json::to_writer_pretty(BufWriter::new(f), &entries)?;

    if let Some(magnitudes) = index.magnitudes() {
        let ordered: BTreeMap<DocId, f64> = magnitudes.iter().map(|(&d, &m)| (d, m)).collect();
        let f = File::create(paths.magnitudes())?;
        serde_json::to_writer_pretty(BufWriter::new(f), &ordered)?;
    }

    let f = File::create(paths.meta())?;
    serde_json::to_writer_pretty(BufWriter::new(f), meta)?;
    Ok(())
}

/// Load a sealed index. `Ok(None)` when no index artifact exists at `root`.
/// A missing magnitude artifact alone is not fatal: the index loads without
/// magnitudes and cosine scoring reports unavailable.
pub fn load(paths: &IndexPaths) -> Result<Option<SearchIndex>> {
    let entries: Vec<IndexEntry> = match File::open(paths.index_set()) {
        Ok(f) => serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parsing {}", paths.index_set().display()))?,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let magnitudes: Option<HashMap<DocId, f64>> = match File::open(paths.magnitudes()) {
        Ok(f) => Some(
            serde_json::from_reader(BufReader::new(f))
                .with_context(|| format!("parsing {}", paths.magnitudes().display()))?,
        ),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("document magnitudes missing; cosine scoring unavailable");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let meta = load_meta(paths)?;
    Ok(Some(SearchIndex::from_parts(
        entries,
        magnitudes,
        meta.num_docs,
    )))
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let f = File::open(paths.meta())
        .with_context(|| format!("opening {}", paths.meta().display()))?;
    let meta = serde_json::from_reader(BufReader::new(f))?;
    Ok(meta)
}
