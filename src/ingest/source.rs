//! Where partitions come from and how their bytes are retrieved.

use async_trait::async_trait;
use bytes::Bytes;
use flate2::read::GzDecoder;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{AnalysisError, Result};

/// One period's worth of trips: a local CSV file or an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionSource {
    File(PathBuf),
    Url(String),
}

impl PartitionSource {
    /// Interprets a CLI argument: anything starting with `http` is a URL.
    pub fn parse(arg: &str) -> Self {
        if is_url(arg) {
            PartitionSource::Url(arg.to_string())
        } else {
            PartitionSource::File(PathBuf::from(arg))
        }
    }

    /// Short label used in logs and error messages (the file name).
    pub fn name(&self) -> String {
        match self {
            PartitionSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            PartitionSource::Url(url) => url
                .rsplit('/')
                .find(|seg| !seg.is_empty())
                .unwrap_or(url.as_str())
                .to_string(),
        }
    }

    /// Packing inferred from the file extension.
    pub fn packing(&self) -> Packing {
        let raw = match self {
            PartitionSource::File(path) => path.to_string_lossy().to_ascii_lowercase(),
            PartitionSource::Url(url) => url
                .split('?')
                .next()
                .unwrap_or(url.as_str())
                .to_ascii_lowercase(),
        };
        if raw.ends_with(".gz") {
            Packing::Gzip
        } else if raw.ends_with(".zip") {
            Packing::Zip
        } else {
            Packing::Plain
        }
    }
}

/// How a partition's CSV text is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    Plain,
    Gzip,
    /// A zip archive holding the month's CSV, as published by the operator.
    Zip,
}

fn is_url(arg: &str) -> bool {
    arg.starts_with("http://") || arg.starts_with("https://")
}

impl fmt::Display for PartitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionSource::File(path) => write!(f, "{}", path.display()),
            PartitionSource::Url(url) => f.write_str(url),
        }
    }
}

/// Expands CLI inputs into partition sources.
///
/// Directories contribute their `*.csv`, `*.csv.gz` and `*.zip` files sorted by name,
/// so monthly dumps named `YYYYMM-...` come out in calendar order.
pub fn expand_sources(args: &[String]) -> Result<Vec<PartitionSource>> {
    let mut sources = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        if !is_url(arg) && path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_partition_file(p))
                .collect();
            files.sort();
            debug!(dir = %path.display(), files = files.len(), "Expanded partition directory");
            sources.extend(files.into_iter().map(PartitionSource::File));
        } else {
            sources.push(PartitionSource::parse(arg));
        }
    }
    Ok(sources)
}

fn is_partition_file(path: &Path) -> bool {
    let name = path.to_string_lossy().to_ascii_lowercase();
    name.ends_with(".csv") || name.ends_with(".csv.gz") || name.ends_with(".zip")
}

/// Retrieves the raw bytes of a partition.
#[async_trait]
pub trait PartitionFetcher: Send + Sync {
    async fn fetch(&self, source: &PartitionSource) -> Result<Bytes>;
}

/// Reads local files from disk and downloads URLs with `reqwest`.
pub struct DefaultFetcher(reqwest::Client);

impl DefaultFetcher {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    async fn download(&self, url: &str) -> reqwest::Result<Bytes> {
        self.0.get(url).send().await?.error_for_status()?.bytes().await
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartitionFetcher for DefaultFetcher {
    async fn fetch(&self, source: &PartitionSource) -> Result<Bytes> {
        match source {
            PartitionSource::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            PartitionSource::Url(url) => {
                self.download(url)
                    .await
                    .map_err(|e| AnalysisError::Fetch {
                        source_name: source.name(),
                        message: e.to_string(),
                    })
            }
        }
    }
}

/// Returns the CSV text of a partition, unpacking gzip and zip sources.
pub fn decode(source: &PartitionSource, raw: Bytes) -> Result<Bytes> {
    match source.packing() {
        Packing::Plain => Ok(raw),
        Packing::Gzip => {
            let mut out = Vec::with_capacity(raw.len() * 4);
            GzDecoder::new(raw.as_ref()).read_to_end(&mut out)?;
            Ok(Bytes::from(out))
        }
        Packing::Zip => unzip_csv(source, &raw).map(Bytes::from),
    }
}

/// Reads the first `.csv` entry of a zip archive, skipping directories and
/// macOS resource forks.
fn unzip_csv(source: &PartitionSource, raw: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(raw))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_ascii_lowercase();
        if entry.is_dir() || name.starts_with("__macosx/") || !name.ends_with(".csv") {
            continue;
        }
        debug!(entry = entry.name(), size = entry.size(), "Unpacking zip entry");
        let mut out = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut out)?;
        return Ok(out);
    }
    Err(AnalysisError::EmptyArchive {
        partition: source.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn zipped(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_distinguishes_urls() {
        assert_eq!(
            PartitionSource::parse("https://example.org/201501-citibike-tripdata.csv"),
            PartitionSource::Url("https://example.org/201501-citibike-tripdata.csv".into())
        );
        assert_eq!(
            PartitionSource::parse("data/201501.csv"),
            PartitionSource::File(PathBuf::from("data/201501.csv"))
        );
    }

    #[test]
    fn test_name_is_last_path_segment() {
        let src = PartitionSource::parse("https://example.org/trips/201502.csv.gz");
        assert_eq!(src.name(), "201502.csv.gz");
        assert_eq!(src.packing(), Packing::Gzip);

        let src = PartitionSource::parse("/tmp/x/201503.csv");
        assert_eq!(src.name(), "201503.csv");
        assert_eq!(src.packing(), Packing::Plain);

        let src = PartitionSource::parse("https://s3.amazonaws.com/tripdata/201504-citibike-tripdata.zip");
        assert_eq!(src.name(), "201504-citibike-tripdata.zip");
        assert_eq!(src.packing(), Packing::Zip);
    }

    #[test]
    fn test_decode_reads_csv_entry_from_zip() {
        let archive = zipped(&[
            ("__MACOSX/._201501-citibike-tripdata.csv", &b"junk"[..]),
            ("201501-citibike-tripdata.csv", &b"tripduration\n42\n"[..]),
        ]);
        let src = PartitionSource::parse("201501-citibike-tripdata.zip");
        let text = decode(&src, Bytes::from(archive)).unwrap();
        assert_eq!(text.as_ref(), b"tripduration\n42\n");
    }

    #[test]
    fn test_decode_zip_without_csv_fails() {
        let archive = zipped(&[("README.txt", &b"nothing here"[..])]);
        let src = PartitionSource::parse("201501-citibike-tripdata.zip");
        let err = decode(&src, Bytes::from(archive)).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyArchive { partition } if partition == "201501-citibike-tripdata.zip"));
    }

    #[test]
    fn test_decode_inflates_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"tripduration\n42\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let src = PartitionSource::parse("201501.csv.gz");
        let text = decode(&src, Bytes::from(compressed)).unwrap();
        assert_eq!(text.as_ref(), b"tripduration\n42\n");
    }

    #[test]
    fn test_decode_passes_plain_csv_through() {
        let src = PartitionSource::parse("201501.csv");
        let text = decode(&src, Bytes::from_static(b"a,b\n")).unwrap();
        assert_eq!(text.as_ref(), b"a,b\n");
    }

    #[test]
    fn test_expand_sources_sorts_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["201502.csv", "201501.csv.gz", "notes.txt", "201503.csv", "201504.zip"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let args = vec![dir.path().display().to_string()];
        let names: Vec<String> = expand_sources(&args)
            .unwrap()
            .iter()
            .map(PartitionSource::name)
            .collect();
        assert_eq!(
            names,
            vec!["201501.csv.gz", "201502.csv", "201503.csv", "201504.zip"]
        );
    }

    #[test]
    fn test_expand_sources_treats_http_prefixed_dir_as_local() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("http_dumps");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("201501.csv"), b"").unwrap();

        let args = vec![dir.display().to_string()];
        let sources = expand_sources(&args).unwrap();
        assert_eq!(sources, vec![PartitionSource::File(dir.join("201501.csv"))]);
    }
}
