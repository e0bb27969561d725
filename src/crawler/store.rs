// src/crawler/store.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{FrameRecord, FrameSink, PersistedFrame};
use crate::core::{PersistError, timestamp};
use crate::sources::SourceDescriptor;

/// Sidecar record written next to every saved frame.
///
/// The enrichment fields stay `null` here; a downstream stage fills them in, so
/// `null` means "not enriched yet" rather than "enrichment failed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub camera_id: String,
    pub camera_name: String,
    pub timestamp: String,
    pub timestamp_iso: String,
    pub hash: String,
    pub file_size: usize,
    pub filename: String,
    pub segment_id: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub bearing: Option<f64>,
    pub lane_schema: Option<String>,
}

/// Writes frames under `<output_root>/<source_id>/`.
pub struct FsFrameStore {
    dir: PathBuf,
    default_extension: String,
}

impl FsFrameStore {
    /// Creates the source directory once; writes never create directories.
    pub fn new(output_root: &Path, source_id: &str, default_extension: &str) -> io::Result<Self> {
        let key = storage_key(source_id);
        if key.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty source id has no storage directory",
            ));
        }
        let dir = output_root.join(key);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            default_extension: default_extension.to_string(),
        })
    }

    fn write_metadata(&self, path: &Path, meta: &FrameMetadata) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(meta).map_err(|source| PersistError::Encode {
            filename: meta.filename.clone(),
            source,
        })?;
        write_atomic(path, &json).map_err(|source| PersistError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FrameSink for FsFrameStore {
    fn persist(
        &mut self,
        source: &SourceDescriptor,
        frame: &FrameRecord,
    ) -> Result<PersistedFrame, PersistError> {
        let ext = sniff_extension(&frame.payload).unwrap_or(self.default_extension.as_str());
        let compact = timestamp::compact(&frame.captured_at);
        let stem = format!(
            "{}_{}_{}",
            storage_key(&source.id),
            compact,
            frame.fingerprint.short()
        );
        let filename = format!("{}.{}", stem, ext);
        let image_path = self.dir.join(&filename);
        let metadata_path = self.dir.join(format!("{}.json", stem));

        // Image first: metadata must never point at a missing frame.
        write_atomic(&image_path, &frame.payload).map_err(|source| PersistError::Image {
            path: image_path.clone(),
            source,
        })?;

        let meta = FrameMetadata {
            camera_id: source.id.clone(),
            camera_name: source.name.clone(),
            timestamp: compact,
            timestamp_iso: timestamp::iso_utc(&frame.captured_at),
            hash: frame.fingerprint.to_string(),
            file_size: frame.payload.len(),
            filename: filename.clone(),
            segment_id: None,
            gps_lat: None,
            gps_lon: None,
            bearing: None,
            lane_schema: None,
        };
        self.write_metadata(&metadata_path, &meta)?;

        Ok(PersistedFrame {
            filename,
            image_path,
            metadata_path,
            bytes: frame.payload.len(),
        })
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}

/// Directory/filename-safe form of an opaque source id.
///
/// Percent-encoding keeps distinct ids distinct (`a/b` and `a_b` never share a
/// directory). Leading dots are escaped as well so `.` and `..` stay inside the
/// output root.
pub fn storage_key(source_id: &str) -> String {
    let encoded = urlencoding::encode(source_id);
    let dots = encoded.len() - encoded.trim_start_matches('.').len();
    format!("{}{}", "%2E".repeat(dots), &encoded[dots..])
}

pub fn sniff_extension(payload: &[u8]) -> Option<&'static str> {
    match payload {
        [0xFF, 0xD8, 0xFF, ..] => Some("jpg"),
        [0x89, b'P', b'N', b'G', ..] => Some("png"),
        [b'G', b'I', b'F', b'8', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        _ => None,
    }
}

// Readers only ever see complete files; the `.part` sibling is renamed into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
