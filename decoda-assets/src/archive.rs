//! Archive detection and extraction.
//!
//! Test vector assets ship as `.zip`, `.tar`, `.tar.gz` or `.tgz`. By
//! default only the vector's bitstream member is unpacked; `extract_all`
//! unpacks everything.

use crate::error::AssetError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

enum ArchiveKind {
    Zip,
    Tar { gzipped: bool },
}

fn archive_kind(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::Tar { gzipped: true })
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar { gzipped: false })
    } else {
        None
    }
}

/// Whether `path` names a supported archive format.
pub fn is_extractable(path: &Path) -> bool {
    archive_kind(path).is_some()
}

/// Unpack `path` into `dest_dir`.
///
/// With `only_member`, exactly that member (matched on its trailing
/// path components) is unpacked; a missing member is an error. Without
/// it, the whole archive is unpacked.
pub fn extract(path: &Path, dest_dir: &Path, only_member: Option<&str>) -> Result<(), AssetError> {
    match archive_kind(path) {
        Some(ArchiveKind::Zip) => extract_zip(path, dest_dir, only_member),
        Some(ArchiveKind::Tar { gzipped }) => extract_tar(path, dest_dir, gzipped, only_member),
        None => Err(AssetError::Archive {
            path: path.to_path_buf(),
            reason: "unsupported archive format".to_string(),
        }),
    }
}

fn member_matches(entry_path: &Path, member: &str) -> bool {
    entry_path.ends_with(member)
}

fn extract_tar(
    path: &Path,
    dest_dir: &Path,
    gzipped: bool,
    only_member: Option<&str>,
) -> Result<(), AssetError> {
    let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut archive = tar::Archive::new(reader);

    let archive_err = |e: io::Error| AssetError::Archive {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    match only_member {
        None => archive.unpack(dest_dir).map_err(archive_err),
        Some(member) => {
            for entry in archive.entries().map_err(archive_err)? {
                let mut entry = entry.map_err(archive_err)?;
                let entry_path = entry.path().map_err(archive_err)?.into_owned();
                if member_matches(&entry_path, member) {
                    // Flatten: the member lands directly in dest_dir.
                    let dest = dest_dir.join(member);
                    if let Some(parent) = dest.parent() {
                        fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
                    }
                    entry.unpack(&dest).map_err(archive_err)?;
                    return Ok(());
                }
            }
            Err(AssetError::MissingMember {
                archive: path.to_path_buf(),
                member: member.to_string(),
            })
        }
    }
}

fn extract_zip(path: &Path, dest_dir: &Path, only_member: Option<&str>) -> Result<(), AssetError> {
    let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| AssetError::Archive {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match only_member {
        None => archive.extract(dest_dir).map_err(|e| AssetError::Archive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Some(member) => {
            for index in 0..archive.len() {
                let mut entry = archive.by_index(index).map_err(|e| AssetError::Archive {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                let Some(entry_path) = entry.enclosed_name() else {
                    continue;
                };
                if entry.is_dir() || !member_matches(&entry_path, member) {
                    continue;
                }
                let dest = dest_dir.join(member);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
                }
                let mut out = File::create(&dest).map_err(|e| AssetError::io(&dest, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| AssetError::io(&dest, e))?;
                return Ok(());
            }
            Err(AssetError::MissingMember {
                archive: path.to_path_buf(),
                member: member.to_string(),
            })
        }
    }
}
