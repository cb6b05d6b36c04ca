pub mod gzip;

use crate::backup::file_ext::FileExtProvider;
use crate::backup::finish::Finish;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithDebugObjectAndFnName;
use crate::backup::size::walk_error;
use derive_more::From;
use flate2::write::GzEncoder;
use io_enum::Write;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IntoInnerError, Write};
use std::path::{Path, PathBuf};
use std::result;
use validator::{Validate, ValidationErrors};
use walkdir::WalkDir;

#[derive(Write, From)]
pub enum Compressor<W: Write> {
    Gzip(GzEncoder<W>),
}

#[derive(Clone, From, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "compressor_type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum CompressorConfig {
    Gzip(gzip::GzipConfig),
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig::Gzip(gzip::GzipConfig::default())
    }
}

impl Validate for CompressorConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            CompressorConfig::Gzip(gz) => gz.validate(),
        }
    }
}

pub trait CompressorBuilder<W: Write> {
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>>;
}

impl<W: Write> Finish<W> for Compressor<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Compressor::Gzip(w) => w.finish(),
        }
    }
}

impl<W: Write> CompressorBuilder<W> for CompressorConfig {
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>> {
        match self {
            CompressorConfig::Gzip(gz) => gz.build_compressor(writer),
        }
        .with_debug_object_and_fn_name(self.clone(), "build_compressor")
    }
}

impl FileExtProvider for CompressorConfig {
    fn file_ext(&self) -> Option<impl AsRef<str>> {
        match self {
            CompressorConfig::Gzip(_) => Some("gz"),
        }
    }
}

/// Files written by [`compress_tree`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompressReport {
    /// Uncompressed files, each now with a compressed sibling.
    pub originals: Vec<PathBuf>,
    /// Compressed siblings, in the same order as `originals`.
    pub compressed: Vec<PathBuf>,
}

/// Path of the compressed sibling of `path`: the file name with `.<ext>` appended.
pub fn compressed_path<P: AsRef<Path>>(path: P, config: &CompressorConfig) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    if let Some(ext) = config.file_ext() {
        name.push(".");
        name.push(ext.as_ref());
    }
    PathBuf::from(name)
}

/// Writes a compressed sibling of `path`, leaving `path` untouched.
///
/// An existing sibling is overwritten.
pub fn compress_file<P: AsRef<Path>>(path: P, config: &CompressorConfig) -> Result<PathBuf> {
    let path = path.as_ref();
    let out_path = compressed_path(path, config);
    let failure = |source: io::Error| Error::CompressionFailure {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = File::open(path).map(BufReader::new).map_err(failure)?;
    let mut writer = File::create(&out_path)
        .map(BufWriter::new)
        .map_err(failure)
        .and_then(|f| config.build_compressor(f))
        .map(BufWriter::new)?;

    io::copy(&mut reader, &mut writer).map_err(failure)?;

    writer
        .into_inner()
        .map_err(IntoInnerError::into_error)
        .and_then(Finish::finish)
        .and_then(|w| w.into_inner().map_err(IntoInnerError::into_error))
        .map_err(failure)?;

    tracing::trace!("Compressed {:?} -> {:?}", path, out_path);
    Ok(out_path)
}

/// Compresses every regular file under `root` next to the original.
///
/// The file list is taken before anything is written, so the new siblings are never
/// compressed themselves. A tree where the sibling name of one file is another file
/// (`x` next to `x.gz`) is refused before any sibling is written. Otherwise the first
/// failure aborts the walk as [`Error::CompressionFailure`], siblings written so far stay
/// on disk.
pub fn compress_tree<P: AsRef<Path>>(root: P, config: &CompressorConfig) -> Result<CompressReport> {
    let root = root.as_ref();
    let originals = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|res| match res {
            Ok(de) if de.file_type().is_file() => Some(Ok(de.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<result::Result<Vec<_>, _>>()
        .map_err(|e| match walk_error(root, e) {
            Error::FilesystemAccess { path, source } => Error::CompressionFailure { path, source },
            other => other,
        })?;

    check_sibling_clashes(&originals, config)?;

    tracing::info!("Compressing {} files under {:?}", originals.len(), root);
    let compressed = originals
        .iter()
        .map(|p| compress_file(p, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(CompressReport {
        originals,
        compressed,
    })
}

fn check_sibling_clashes(originals: &[PathBuf], config: &CompressorConfig) -> Result<()> {
    let existing: HashSet<&Path> = originals.iter().map(PathBuf::as_path).collect();
    for path in originals {
        let sibling = compressed_path(path, config);
        if existing.contains(sibling.as_path()) {
            return Err(Error::CompressionFailure {
                path: path.clone(),
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("compressed sibling {:?} is a file of the tree", sibling),
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::result_error::error::BackupErrorKind;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn decompress(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    fn count_with_ext(root: &Path, ext: &str) -> usize {
        WalkDir::new(root)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|x| x == ext))
            .count()
    }

    #[test]
    fn test_compressor_config_default_is_gzip() {
        let config = CompressorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.file_ext().unwrap().as_ref(), "gz");
    }

    #[test]
    fn test_compressor_config_serialization() {
        let config = CompressorConfig::default();
        let serialized = serde_json::to_string(&config).unwrap();
        assert_eq!(serialized, "{\"compressor_type\":\"gzip\"}");

        let deserialized: CompressorConfig =
            serde_json::from_str("{\"compressor_type\":\"gzip\",\"level\":1}").unwrap();
        assert_eq!(
            deserialized,
            CompressorConfig::Gzip(gzip::GzipConfig { level: Some(1) })
        );
    }

    #[test]
    fn test_compressor_config_rejects_unknown_type() {
        assert!(serde_json::from_str::<CompressorConfig>("{\"compressor_type\":\"xz\"}").is_err());
    }

    #[test]
    fn test_compressed_path_appends_suffix() {
        let config = CompressorConfig::default();
        assert_eq!(
            compressed_path("/a/b/file.txt", &config),
            PathBuf::from("/a/b/file.txt.gz")
        );
        assert_eq!(
            compressed_path("/a/b/archive.gz", &config),
            PathBuf::from("/a/b/archive.gz.gz")
        );
    }

    #[test]
    fn test_compress_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("data.bin");
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&file, &content).unwrap();

        let out = compress_file(&file, &CompressorConfig::default()).unwrap();

        assert_eq!(out, temp_dir.path().join("data.bin.gz"));
        assert_eq!(fs::read(&file).unwrap(), content);
        assert_eq!(decompress(&out), content);
    }

    #[test]
    fn test_compress_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("empty");
        fs::write(&file, "").unwrap();

        let out = compress_file(&file, &CompressorConfig::default()).unwrap();
        assert!(decompress(&out).is_empty());
    }

    #[test]
    fn test_compress_tree_one_sibling_per_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub/deep")).unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("sub/b.txt"), "beta").unwrap();
        fs::write(root.join("sub/deep/c.txt"), "gamma").unwrap();

        let report = compress_tree(root, &CompressorConfig::default()).unwrap();

        assert_eq!(report.originals.len(), 3);
        assert_eq!(report.compressed.len(), 3);
        assert_eq!(count_with_ext(root, "gz"), 3);
        assert_eq!(count_with_ext(root, "txt"), 3);
        for (original, compressed) in report.originals.iter().zip(&report.compressed) {
            assert_eq!(decompress(compressed), fs::read(original).unwrap());
        }
    }

    #[test]
    fn test_compress_tree_refuses_sibling_clash() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("x"), "plain x").unwrap();
        fs::write(root.join("x.gz"), "precious second file").unwrap();

        let err = compress_tree(root, &CompressorConfig::default()).unwrap_err();

        assert_eq!(err.kind(), BackupErrorKind::CompressionFailure);
        assert_eq!(
            fs::read_to_string(root.join("x.gz")).unwrap(),
            "precious second file"
        );
        assert!(!root.join("x.gz.gz").exists());
    }

    #[test]
    fn test_compress_tree_accepts_gz_without_plain_twin() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("y.gz"), "already named gz").unwrap();

        let report = compress_tree(root, &CompressorConfig::default()).unwrap();

        assert_eq!(report.compressed, vec![root.join("y.gz.gz")]);
        assert_eq!(decompress(&root.join("y.gz.gz")), b"already named gz");
    }

    #[test]
    fn test_compress_tree_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = compress_tree(temp_dir.path().join("missing"), &CompressorConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), BackupErrorKind::CompressionFailure);
    }

    #[test]
    fn test_compress_file_unwritable_sibling_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("x");
        fs::write(&file, "data").unwrap();
        // A directory in the way of the sibling.
        fs::create_dir(temp_dir.path().join("x.gz")).unwrap();

        let err = compress_file(&file, &CompressorConfig::default()).unwrap_err();
        assert_eq!(err.kind(), BackupErrorKind::CompressionFailure);
    }
}
