//! Archive extraction and manifest discovery.
//!
//! The upstream tarball unpacks to a single root directory named after
//! the repository plus a commit hash; manifests live exactly three
//! levels below it: `manifests/<kind>/<name>/<version>.toml`.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{CatalogError, Result};

/// Substring identifying the repository root directory inside the tarball.
const ROOT_DIR_MARKER: &str = "packages-index";

/// Subdirectory of the repository root holding all manifests.
const MANIFESTS_DIR: &str = "manifests";

/// Extension of manifest files; anything else is ignored.
const MANIFEST_EXT: &str = "toml";

/// One manifest file pulled out of the archive, not yet parsed.
#[derive(Debug, Clone)]
pub struct RawManifest {
    /// Top-level category directory, e.g. `toolchain`.
    pub kind: String,
    /// Package directory name.
    pub name: String,
    /// File stem of the manifest, not necessarily SemVer.
    pub version: String,
    /// Repo-relative source path, e.g. `manifests/analyzer/foo/1.0.toml`.
    pub path: String,
    /// Verbatim file contents.
    pub text: String,
}

/// Unpacks a gzipped repository tarball and collects every manifest file.
///
/// The archive is staged to a temp file and unpacked into a temp
/// directory; both are removed on every exit path. Blocking: call from
/// `spawn_blocking` on an async runtime.
pub fn extract_manifests(archive: &[u8]) -> Result<Vec<RawManifest>> {
    let mut staged = tempfile::NamedTempFile::new()?;
    staged.write_all(archive)?;

    let unpack_dir = tempfile::tempdir()?;
    let gz = flate2::read::GzDecoder::new(staged.reopen()?);
    tar::Archive::new(gz).unpack(unpack_dir.path())?;

    let root = find_repo_root(unpack_dir.path())?;
    let manifests_dir = root.join(MANIFESTS_DIR);
    if !manifests_dir.is_dir() {
        return Err(CatalogError::Structure(format!(
            "no `{MANIFESTS_DIR}` directory under {}",
            root.display()
        )));
    }

    let mut manifests = Vec::new();
    for kind_dir in subdirectories(&manifests_dir)? {
        let kind = dir_name(&kind_dir);
        for pkg_dir in subdirectories(&kind_dir)? {
            let name = dir_name(&pkg_dir);
            collect_package_manifests(&pkg_dir, &kind, &name, &mut manifests)?;
        }
    }

    debug!(count = manifests.len(), "collected manifest files");
    Ok(manifests)
}

/// Locates the single top-level directory the tarball unpacked to.
fn find_repo_root(unpack_dir: &Path) -> Result<PathBuf> {
    for entry in fs::read_dir(unpack_dir)? {
        let path = entry?.path();
        let is_root = path.is_dir()
            && path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|n| n.contains(ROOT_DIR_MARKER));
        if is_root {
            return Ok(path);
        }
    }

    Err(CatalogError::Structure(format!(
        "no `{ROOT_DIR_MARKER}` root directory in archive"
    )))
}

/// Reads the version files of one package directory.
fn collect_package_manifests(
    pkg_dir: &Path,
    kind: &str,
    name: &str,
    manifests: &mut Vec<RawManifest>,
) -> Result<()> {
    let mut files: Vec<PathBuf> = fs::read_dir(pkg_dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(OsStr::to_str) == Some(MANIFEST_EXT)
        })
        .collect();
    // Filesystem order is unspecified; sort for a stable snapshot order.
    files.sort();

    for file in files {
        let version = match file.file_stem().and_then(OsStr::to_str) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let file_name = match file.file_name().and_then(OsStr::to_str) {
            Some(file_name) => file_name.to_string(),
            None => continue,
        };
        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %file.display(), %err, "skipping unreadable manifest");
                continue;
            }
        };

        manifests.push(RawManifest {
            kind: kind.to_string(),
            name: name.to_string(),
            version,
            path: format!("{MANIFESTS_DIR}/{kind}/{name}/{file_name}"),
            text,
        });
    }

    Ok(())
}

/// Immediate subdirectories of `dir`, sorted by name; plain files are skipped.
fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod extractor_tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;

    /// Builds a gzipped tarball from (path, contents) pairs.
    fn build_tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let encoder = GzEncoder::new(&mut bytes, Compression::default());
            let mut builder = Builder::new(encoder);
            for (path, contents) in files {
                let mut header = tar::Header::new_gnu();
                header.set_size(contents.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, contents.as_bytes())
                    .unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }
        bytes
    }

    #[test]
    fn test_extract_walks_kind_name_version() {
        let tarball = build_tarball(&[
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gnu-plct/0.20231118.0.toml",
                "[metadata]\ndesc = \"GNU toolchain\"\n",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gnu-plct/0.20240127.0.toml",
                "[metadata]\ndesc = \"GNU toolchain\"\n",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/manifests/emulator/qemu/8.2.0.toml",
                "[metadata]\ndesc = \"QEMU\"\n",
            ),
        ]);

        let manifests = extract_manifests(&tarball).unwrap();
        assert_eq!(manifests.len(), 3);

        let qemu = manifests
            .iter()
            .find(|m| m.name == "qemu")
            .expect("qemu manifest");
        assert_eq!(qemu.kind, "emulator");
        assert_eq!(qemu.version, "8.2.0");
        assert_eq!(qemu.path, "manifests/emulator/qemu/8.2.0.toml");
        assert!(qemu.text.contains("QEMU"));
    }

    #[test]
    fn test_extract_ignores_non_toml_and_stray_files() {
        let tarball = build_tarball(&[
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gcc/1.0.toml",
                "[metadata]\n",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gcc/notes.txt",
                "not a manifest",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/manifests/README.md",
                "stray file at kind level",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/README.md",
                "repo readme",
            ),
        ]);

        let manifests = extract_manifests(&tarball).unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].version, "1.0");
    }

    #[test]
    fn test_extract_sorts_versions_within_package() {
        let tarball = build_tarball(&[
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gcc/1.2.toml",
                "[metadata]\n",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gcc/0.9.toml",
                "[metadata]\n",
            ),
            (
                "ruyisdk-packages-index-0a1b2c/manifests/toolchain/gcc/1.0.toml",
                "[metadata]\n",
            ),
        ]);

        let manifests = extract_manifests(&tarball).unwrap();
        let versions: Vec<&str> = manifests.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(versions, vec!["0.9", "1.0", "1.2"]);
    }

    #[test]
    fn test_missing_root_directory_is_structural_error() {
        let tarball = build_tarball(&[("unrelated-repo/manifests/toolchain/gcc/1.0.toml", "x")]);

        let err = extract_manifests(&tarball).unwrap_err();
        assert!(matches!(err, CatalogError::Structure(_)));
        assert!(err.to_string().contains(ROOT_DIR_MARKER));
    }

    #[test]
    fn test_missing_manifests_directory_is_structural_error() {
        let tarball = build_tarball(&[("ruyisdk-packages-index-0a1b2c/README.md", "readme")]);

        let err = extract_manifests(&tarball).unwrap_err();
        assert!(matches!(err, CatalogError::Structure(_)));
        assert!(err.to_string().contains(MANIFESTS_DIR));
    }

    #[test]
    fn test_garbage_bytes_fail_without_leaking_tempfiles() {
        let err = extract_manifests(b"definitely not a tarball").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
