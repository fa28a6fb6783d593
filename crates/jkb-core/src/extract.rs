//! Archive extraction.
//!
//! The public sources archive nests one archive per source set under
//! `Linux_for_Tegra/source/`. Only those members are pulled out (prefix
//! stripped); each is then unpacked into the installation target.

use crate::error::{JkbError, Result};
use crate::privilege::Privileged;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;

/// Directory inside the public sources archive holding the nested archives.
pub const NESTED_PREFIX: &str = "Linux_for_Tegra/source";

/// Kernel tree, out-of-tree modules, and display driver sources.
pub const NESTED_ARCHIVES: [&str; 3] = [
    "kernel_src.tbz2",
    "kernel_oot_modules_src.tbz2",
    "nvidia_kernel_display_driver_source.tbz2",
];

/// Compression wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Bzip2,
    Gzip,
}

impl Compression {
    /// Magic bytes: bzip2 `BZh`, gzip `1f 8b`.
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(b"BZh") {
            Self::Bzip2
        } else if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else {
            Self::None
        }
    }
}

fn extraction_error(archive: &Path) -> impl Fn(std::io::Error) -> JkbError + '_ {
    move |e| JkbError::Extraction {
        archive: archive.to_path_buf(),
        reason: e.to_string(),
    }
}

fn open_archive(path: &Path) -> Result<Archive<Box<dyn Read>>> {
    let err = extraction_error(path);
    let file = File::open(path).map_err(&err)?;
    let mut reader = BufReader::new(file);
    let format = Compression::from_magic_bytes(reader.fill_buf().map_err(&err)?);
    tracing::debug!(?format, "opening {}", path.display());
    let reader: Box<dyn Read> = match format {
        Compression::None => Box::new(reader),
        Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
        Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
    };
    Ok(Archive::new(reader))
}

/// Drop `.` components so `./a/b` and `a/b` compare equal.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Extract the members `prefix/<name>` for each of `names` into `dest`, as
/// `dest/<name>`. All other members are skipped. Every name must be present.
pub fn extract_members(
    archive: &Path,
    prefix: &str,
    names: &[&str],
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let err = extraction_error(archive);
    let prefix = Path::new(prefix);
    let mut ar = open_archive(archive)?;
    let mut found: Vec<&str> = Vec::new();

    for entry in ar.entries().map_err(&err)? {
        let mut entry = entry.map_err(&err)?;
        let path = normalized(&entry.path().map_err(&err)?);
        let Ok(rel) = path.strip_prefix(prefix) else {
            continue;
        };
        let Some(name) = names.iter().copied().find(|n| Path::new(n) == rel) else {
            continue;
        };
        let out = dest.join(name);
        tracing::info!("extracting {} to {}", path.display(), out.display());
        entry.unpack(&out).map_err(&err)?;
        found.push(name);
    }

    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| !found.contains(n))
        .collect();
    if !missing.is_empty() {
        return Err(JkbError::Extraction {
            archive: archive.to_path_buf(),
            reason: format!("missing members under {}: {}", prefix.display(), missing.join(", ")),
        });
    }

    Ok(names.iter().map(|n| dest.join(n)).collect())
}

/// Unpack the whole of `archive` into `dest`, preserving permissions.
pub fn unpack_into(caps: &Privileged, archive: &Path, dest: &Path) -> Result<()> {
    caps.create_dir_all(dest)?;
    tracing::info!("unpacking {} into {}", archive.display(), dest.display());
    let mut ar = open_archive(archive)?;
    ar.set_preserve_permissions(true);
    ar.set_overwrite(true);
    ar.unpack(dest).map_err(extraction_error(archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn bz2(data: &[u8]) -> Vec<u8> {
        let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::fast());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn gz(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn magic_bytes() {
        assert_eq!(Compression::from_magic_bytes(b"BZh91AY"), Compression::Bzip2);
        assert_eq!(Compression::from_magic_bytes(&[0x1f, 0x8b, 8]), Compression::Gzip);
        assert_eq!(Compression::from_magic_bytes(b"ustar"), Compression::None);
        assert_eq!(Compression::from_magic_bytes(b""), Compression::None);
    }

    #[test]
    fn extract_only_named_members_with_prefix_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("public_sources.tbz2");
        fs::write(
            &archive,
            bz2(&tar_bytes(&[
                ("Linux_for_Tegra/source/kernel_src.tbz2", "k"),
                ("Linux_for_Tegra/source/u-boot_src.tbz2", "u"),
                ("./Linux_for_Tegra/source/kernel_oot_modules_src.tbz2", "o"),
                ("Linux_for_Tegra/source/nvidia_kernel_display_driver_source.tbz2", "d"),
                ("Linux_for_Tegra/README.txt", "r"),
            ])),
        )
        .unwrap();

        let out = extract_members(&archive, NESTED_PREFIX, &NESTED_ARCHIVES, dir.path()).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(fs::read_to_string(dir.path().join("kernel_src.tbz2")).unwrap(), "k");
        assert_eq!(
            fs::read_to_string(dir.path().join("kernel_oot_modules_src.tbz2")).unwrap(),
            "o"
        );
        assert!(!dir.path().join("u-boot_src.tbz2").exists());
        assert!(!dir.path().join("README.txt").exists());
        assert!(!dir.path().join("Linux_for_Tegra").exists());
    }

    #[test]
    fn missing_member_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("public_sources.tbz2");
        fs::write(
            &archive,
            bz2(&tar_bytes(&[("Linux_for_Tegra/source/kernel_src.tbz2", "k")])),
        )
        .unwrap();
        match extract_members(&archive, NESTED_PREFIX, &NESTED_ARCHIVES, dir.path()) {
            Err(JkbError::Extraction { reason, .. }) => {
                assert!(reason.contains("kernel_oot_modules_src.tbz2"));
                assert!(reason.contains("nvidia_kernel_display_driver_source.tbz2"));
            }
            other => panic!("expected Extraction error, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_archive_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("public_sources.tbz2");
        fs::write(&archive, b"BZh9 this is not bzip2 data").unwrap();
        assert!(matches!(
            extract_members(&archive, NESTED_PREFIX, &NESTED_ARCHIVES, dir.path()),
            Err(JkbError::Extraction { .. })
        ));
    }

    #[test]
    fn unpack_gzip_and_plain() {
        let dir = tempfile::tempdir().unwrap();
        let caps = Privileged::assume_granted();
        let gz_path = dir.path().join("a.tgz");
        fs::write(&gz_path, gz(&tar_bytes(&[("nvdisplay/Makefile", "all:\n")]))).unwrap();
        let tar_path = dir.path().join("b.tar");
        fs::write(&tar_path, tar_bytes(&[("nvidia-oot/Makefile", "obj-m\n")])).unwrap();

        let dest = dir.path().join("target");
        unpack_into(&caps, &gz_path, &dest).unwrap();
        unpack_into(&caps, &tar_path, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("nvdisplay/Makefile")).unwrap(), "all:\n");
        assert_eq!(fs::read_to_string(dest.join("nvidia-oot/Makefile")).unwrap(), "obj-m\n");
    }
}
