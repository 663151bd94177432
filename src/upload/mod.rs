//! Upload resolver
//!
//! Reads multipart submissions, writes each attached file under the public
//! directory and reports where it landed. Fields named like `...filePath...`
//! are documents for the download centre; everything else is an image upload.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Multipart, MultipartError};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::content::schema::is_download_field;

/// Upload field name -> public path of the stored file
pub type UploadMap = IndexMap<String, String>;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid name pattern");
}

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to store upload at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file written to disk from a submission
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Form field the file was posted under
    pub field: String,
    pub original_name: String,
    /// Location on disk
    pub disk_path: PathBuf,
    /// Path the file is served under, e.g. `/uploads/cv-1700000000000-42.pdf`
    pub public_path: String,
    pub size: usize,
}

/// Text fields and stored files of one multipart submission
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: Vec<(String, String)>,
    pub files: Vec<StoredFile>,
}

impl Submission {
    /// First text value posted under `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First file posted under `name`
    pub fn file(&self, name: &str) -> Option<&StoredFile> {
        self.files.iter().find(|file| file.field == name)
    }

    pub fn upload_map(&self) -> UploadMap {
        self.files
            .iter()
            .map(|file| (file.field.clone(), file.public_path.clone()))
            .collect()
    }

    pub fn public_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.public_path.clone()).collect()
    }
}

/// Where uploads are written
#[derive(Debug, Clone)]
pub struct UploadStore {
    public_dir: PathBuf,
    upload_dir: String,
    download_dir: String,
}

impl UploadStore {
    pub fn new<P: Into<PathBuf>>(public_dir: P, upload_dir: &str, download_dir: &str) -> Self {
        Self {
            public_dir: public_dir.into(),
            upload_dir: upload_dir.trim_matches('/').to_string(),
            download_dir: download_dir.trim_matches('/').to_string(),
        }
    }

    pub fn from_config(base_dir: &Path, config: &SiteConfig) -> Self {
        Self::new(
            base_dir.join(&config.public_dir),
            &config.upload_dir,
            &config.download_dir,
        )
    }

    /// Directories that hold stored files
    pub fn directories(&self) -> [PathBuf; 2] {
        [
            self.public_dir.join(&self.upload_dir),
            self.public_dir.join(&self.download_dir),
        ]
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Write one file and return its stored description
    pub async fn store(
        &self,
        field: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, UploadError> {
        let dir = if is_download_field(field) {
            &self.download_dir
        } else {
            &self.upload_dir
        };
        let suffix = unique_suffix();
        let name = stored_file_name(field, original_name, &suffix);

        let target_dir = self.public_dir.join(dir);
        let disk_path = target_dir.join(&name);
        let io_err = |source| UploadError::Io {
            path: disk_path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&target_dir).await.map_err(io_err)?;
        tokio::fs::write(&disk_path, data).await.map_err(io_err)?;

        tracing::debug!("Stored upload {} -> {:?}", field, disk_path);

        Ok(StoredFile {
            field: field.to_string(),
            original_name: base_name(original_name).to_string(),
            public_path: format!("/{}/{}", dir, name),
            disk_path,
            size: data.len(),
        })
    }

    /// Drain a multipart body, storing every attached file
    ///
    /// File inputs left empty by the browser arrive without a file name and
    /// are skipped.
    pub async fn read_multipart(
        &self,
        mut multipart: Multipart,
    ) -> Result<Submission, UploadError> {
        let mut submission = Submission::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await?;
                    if file_name.is_empty() {
                        continue;
                    }
                    let stored = self.store(&name, &file_name, &data).await?;
                    submission.files.push(stored);
                }
                None => {
                    let value = field.text().await?;
                    submission.fields.push((name, value));
                }
            }
        }

        Ok(submission)
    }
}

/// Name a stored file
///
/// Documents keep their original name (whitespace runs become `_`) behind the
/// unique suffix; images are renamed after their field, keeping the extension.
pub fn stored_file_name(field: &str, original_name: &str, suffix: &str) -> String {
    let original = base_name(original_name);
    if is_download_field(field) {
        let cleaned = WHITESPACE.replace_all(original, "_");
        format!("{}-{}", suffix, UNSAFE_CHARS.replace_all(&cleaned, "_"))
    } else {
        let ext = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", UNSAFE_CHARS.replace_all(e, "_")))
            .unwrap_or_default();
        format!("{}-{}{}", UNSAFE_CHARS.replace_all(field, "_"), suffix, ext)
    }
}

/// `<millis>-<random up to 1e9>`
fn unique_suffix() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random: u32 = rand::thread_rng().gen_range(0..=1_000_000_000);
    format!("{}-{}", millis, random)
}

/// Strip any client-supplied directories from a file name
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
