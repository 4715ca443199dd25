use crate::error::{AnalyzerError, Result};
use crate::model::{PageId, PageWordCounts};
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(test)]
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

pub const PAGE_INDEX_VERSION: u32 = 1;

lazy_static! {
    static ref STEMMED_FILE: Regex = Regex::new(r"^WS(\d+)\.json$").expect("valid regex");
    static ref PAGE_WORDS_FILE: Regex = Regex::new(r"^W(\d+)\.json$").expect("valid regex");
    static ref STEM_PARTIAL_FILE: Regex = Regex::new(r"^S(\d+)\.json$").expect("valid regex");
}

/// Explicit handles to every artifact a run reads or writes inside the working directory.
#[derive(Debug, Clone)]
pub struct WorkDir {
    pub root: PathBuf,
}

impl WorkDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn stemmed_page(&self, id: PageId) -> PathBuf { self.root.join(format!("WS{id}.json")) }
    pub fn page_words(&self, id: PageId) -> PathBuf { self.root.join(format!("W{id}.json")) }
    pub fn stem_dir(&self) -> PathBuf { self.root.join("Stem") }
    pub fn stem_partial(&self, id: PageId) -> PathBuf { self.stem_dir().join(format!("S{id}.json")) }
    pub fn global_words(&self) -> PathBuf { self.root.join("GlobalWords.json") }
    pub fn global_words_top(&self, top_n: usize) -> PathBuf { self.root.join(format!("GlobalWords_top{top_n}.json")) }
    pub fn global_stem(&self) -> PathBuf { self.root.join("GlobalStem.json") }
    pub fn global_pages(&self) -> PathBuf { self.root.join("GlobalPages.jsonl") }
    pub fn global_pages_index(&self) -> PathBuf { self.root.join("GlobalPages.idx") }
    pub fn pages_tfidf(&self, top_n: usize) -> PathBuf { self.root.join(format!("GlobalPagesTFIDF_top{top_n}.json")) }
    pub fn topics(&self, top_n: usize) -> PathBuf { self.root.join(format!("GlobalTopicsWords_top{top_n}.json")) }
    pub fn bad_words_report(&self) -> PathBuf { self.root.join("BadWordsReport.json") }
    pub fn run_meta(&self) -> PathBuf { self.root.join("RunMeta.json") }

    /// Inputs marked "stemmed and ready", sorted by page id.
    pub fn stemmed_pages(&self) -> Result<Vec<(PageId, PathBuf)>> {
        list_numbered(&self.root, &STEMMED_FILE)
    }

    pub fn page_word_files(&self) -> Result<Vec<(PageId, PathBuf)>> {
        list_numbered(&self.root, &PAGE_WORDS_FILE)
    }

    pub fn stem_partials(&self) -> Result<Vec<(PageId, PathBuf)>> {
        let dir = self.stem_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        list_numbered(&dir, &STEM_PARTIAL_FILE)
    }
}

fn list_numbered(dir: &Path, pattern: &Regex) -> Result<Vec<(PageId, PathBuf)>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed"));
            AnalyzerError::io(path, source)
        })?;
        if !entry.file_type().is_file() { continue; }
        let Some(name) = entry.file_name().to_str() else { continue };
        let Some(caps) = pattern.captures(name) else { continue };
        let digits = &caps[1];
        // one file per id: leading zeros or ids past u32 would alias or lose a page
        match digits.parse::<PageId>() {
            Ok(id) if id.to_string() == digits => out.push((id, entry.into_path())),
            _ => warn!(path = %entry.path().display(), "ignoring file with non-canonical page id"),
        }
    }
    out.sort();
    Ok(out)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| AnalyzerError::io(path, e))?;
    serde_json::from_reader(BufReader::new(f)).map_err(|e| AnalyzerError::decode(path, e))
}

/// Write through a sibling temp file and rename, so readers never see half a file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| AnalyzerError::io(path, e.into()))?;
    write_bytes_atomic(path, &bytes)
}

pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    let mut f = File::create(&tmp).map_err(|e| AnalyzerError::io(&tmp, e))?;
    f.write_all(bytes).map_err(|e| AnalyzerError::io(&tmp, e))?;
    f.sync_data().map_err(|e| AnalyzerError::io(&tmp, e))?;
    drop(f);
    fs::rename(&tmp, path).map_err(|e| AnalyzerError::io(path, e))
}

pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| AnalyzerError::io(path, e))
}

/// Newline-delimited JSON artifact, one record per line, committed with a rename.
pub struct NdjsonWriter {
    path: PathBuf,
    tmp: PathBuf,
    out: Option<BufWriter<File>>,
    offset: u64,
    records: u64,
    committed: bool,
}

impl NdjsonWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let tmp = tmp_path(path);
        let f = File::create(&tmp).map_err(|e| AnalyzerError::io(&tmp, e))?;
        Ok(Self { path: path.to_path_buf(), tmp, out: Some(BufWriter::new(f)), offset: 0, records: 0, committed: false })
    }

    /// Append one record and return the byte offset it starts at.
    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<u64> {
        let line = serde_json::to_vec(record).map_err(|e| AnalyzerError::io(&self.path, e.into()))?;
        self.append_raw(&line)
    }

    /// Append a record that is already encoded as a single JSON line (no trailing newline).
    pub fn append_raw(&mut self, line: &[u8]) -> Result<u64> {
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| AnalyzerError::io(&self.tmp, std::io::Error::new(std::io::ErrorKind::Other, "writer closed")))?;
        out.write_all(line).map_err(|e| AnalyzerError::io(&self.tmp, e))?;
        out.write_all(b"\n").map_err(|e| AnalyzerError::io(&self.tmp, e))?;
        let start = self.offset;
        self.offset += line.len() as u64 + 1;
        self.records += 1;
        Ok(start)
    }

    pub fn records(&self) -> u64 { self.records }

    pub fn commit(mut self) -> Result<u64> {
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|e| AnalyzerError::io(&self.tmp, e))?;
            out.get_ref().sync_data().map_err(|e| AnalyzerError::io(&self.tmp, e))?;
        }
        fs::rename(&self.tmp, &self.path).map_err(|e| AnalyzerError::io(&self.path, e))?;
        self.committed = true;
        Ok(self.records)
    }
}

impl Drop for NdjsonWriter {
    fn drop(&mut self) {
        if !self.committed {
            drop(self.out.take());
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Lazily decodes one record per line.
pub struct NdjsonReader<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> NdjsonReader<T> {
    pub fn open(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|e| AnalyzerError::io(path, e))?;
        Ok(Self { path: path.to_path_buf(), lines: BufReader::new(f).lines(), _marker: PhantomData })
    }
}

impl<T: DeserializeOwned> Iterator for NdjsonReader<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(AnalyzerError::io(&self.path, e))),
            };
            if line.trim().is_empty() { continue; }
            return Some(serde_json::from_str(&line).map_err(|e| AnalyzerError::decode(&self.path, e)));
        }
    }
}

/// Stream an NDJSON file in batches of `batch` records, decoding each batch on the rayon pool.
/// Batches arrive in file order.
pub fn stream_batches<T, F>(path: &Path, batch: usize, mut f: F) -> Result<()>
where
    T: DeserializeOwned + Send,
    F: FnMut(Vec<T>) -> Result<()>,
{
    let file = File::open(path).map_err(|e| AnalyzerError::io(path, e))?;
    let mut lines = BufReader::new(file).lines();
    let batch = batch.max(1);
    loop {
        let mut raw: Vec<String> = Vec::with_capacity(batch);
        for line in lines.by_ref() {
            let line = line.map_err(|e| AnalyzerError::io(path, e))?;
            if line.trim().is_empty() { continue; }
            raw.push(line);
            if raw.len() == batch { break; }
        }
        if raw.is_empty() {
            return Ok(());
        }
        let decoded = raw
            .par_iter()
            .map(|l| serde_json::from_str::<T>(l).map_err(|e| AnalyzerError::decode(path, e)))
            .collect::<Result<Vec<T>>>()?;
        f(decoded)?;
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageIndex {
    pub version: u32,
    pub offsets: HashMap<PageId, u64>,
}

pub fn save_page_index(path: &Path, index: &PageIndex) -> Result<()> {
    let bytes = bincode::serialize(index).map_err(|e| AnalyzerError::index(path, e.to_string()))?;
    write_bytes_atomic(path, &bytes)
}

pub fn load_page_index(path: &Path) -> Result<PageIndex> {
    let bytes = fs::read(path).map_err(|e| AnalyzerError::io(path, e))?;
    let index: PageIndex = bincode::deserialize(&bytes).map_err(|e| AnalyzerError::index(path, e.to_string()))?;
    if index.version != PAGE_INDEX_VERSION {
        return Err(AnalyzerError::index(path, format!("unsupported version {}", index.version)));
    }
    Ok(index)
}

/// Random access to the consolidated page map.
pub struct PageStore {
    data: PathBuf,
    index_path: PathBuf,
    index: PageIndex,
}

impl PageStore {
    pub fn open(work: &WorkDir) -> Result<Self> {
        let index_path = work.global_pages_index();
        let index = load_page_index(&index_path)?;
        Ok(Self { data: work.global_pages(), index_path, index })
    }

    pub fn len(&self) -> usize { self.index.offsets.len() }

    pub fn is_empty(&self) -> bool { self.index.offsets.is_empty() }

    pub fn contains(&self, page_id: PageId) -> bool { self.index.offsets.contains_key(&page_id) }

    pub fn get(&self, page_id: PageId) -> Result<Option<PageWordCounts>> {
        let Some(&offset) = self.index.offsets.get(&page_id) else { return Ok(None) };
        let mut f = File::open(&self.data).map_err(|e| AnalyzerError::io(&self.data, e))?;
        f.seek(SeekFrom::Start(offset)).map_err(|e| AnalyzerError::io(&self.data, e))?;
        let mut line = String::new();
        BufReader::new(f).read_line(&mut line).map_err(|e| AnalyzerError::io(&self.data, e))?;
        let page: PageWordCounts = serde_json::from_str(line.trim_end()).map_err(|e| AnalyzerError::decode(&self.data, e))?;
        if page.page_id != page_id {
            return Err(AnalyzerError::index(
                &self.index_path,
                format!("offset {offset} holds page {} instead of {page_id}", page.page_id),
            ));
        }
        Ok(Some(page))
    }
}
