//! Pure query functions over a catalog snapshot.
//!
//! Nothing here touches the cache or does I/O; every function is a
//! plain projection of the manifest slice it is handed.

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde_json::{json, Value};
use toml::Table;

use crate::catalog::PackageManifest;

/// Distinct manifest kinds, sorted.
pub fn list_kinds(manifests: &[PackageManifest]) -> Vec<String> {
    manifests
        .iter()
        .map(|m| m.kind.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct package names within a kind, sorted. An empty result means
/// the kind is unknown (NotFound at the API boundary).
pub fn list_names(manifests: &[PackageManifest], kind: &str) -> Vec<String> {
    manifests
        .iter()
        .filter(|m| m.kind == kind)
        .map(|m| m.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Filters manifests by an optional case-insensitive substring (matched
/// against name or `metadata.desc`) and an optional exact kind. Both
/// filters AND-combine; snapshot order is preserved.
pub fn search<'a>(
    manifests: &'a [PackageManifest],
    query: Option<&str>,
    kind: Option<&str>,
) -> Vec<&'a PackageManifest> {
    let needle = query.map(str::to_lowercase);

    manifests
        .iter()
        .filter(|m| {
            if let Some(kind) = kind {
                if m.kind != kind {
                    return false;
                }
            }
            if let Some(needle) = &needle {
                let in_name = m.name.to_lowercase().contains(needle);
                let in_desc = m.desc().to_lowercase().contains(needle);
                if !in_name && !in_desc {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// All manifests for a kind/name pair, sorted by plain lexicographic
/// comparison of the version string. Not SemVer: `"1.10"` sorts before
/// `"1.2"`. An empty result means NotFound at the API boundary.
pub fn list_versions<'a>(
    manifests: &'a [PackageManifest],
    kind: &str,
    name: &str,
) -> Vec<&'a PackageManifest> {
    let mut versions: Vec<&PackageManifest> = manifests
        .iter()
        .filter(|m| m.kind == kind && m.name == name)
        .collect();
    versions.sort_by(|a, b| a.version.cmp(&b.version));
    versions
}

/// The first manifest matching an exact (kind, name, version) triple.
/// Duplicates may exist in a snapshot; the first occurrence wins.
pub fn find_manifest<'a>(
    manifests: &'a [PackageManifest],
    kind: &str,
    name: &str,
    version: &str,
) -> Option<&'a PackageManifest> {
    manifests
        .iter()
        .find(|m| m.kind == kind && m.name == name && m.version == version)
}

/// Summary projection of one manifest.
///
/// Distfiles are enriched from the checksum side-table: an entry that
/// lacks a `checksums` field gets the `sha*`-prefixed fields of the
/// same-named side-table entry. An already-present `checksums` field is
/// never overwritten.
pub fn summarize(manifest: &PackageManifest) -> Value {
    let checksums_by_name: HashMap<&str, &Table> = manifest
        .distfiles_checksums
        .iter()
        .map(|chk| (table_name(chk), chk))
        .collect();

    let distfiles: Vec<Value> = manifest
        .distfiles
        .iter()
        .map(|df| attach_checksums(df, &checksums_by_name))
        .collect();

    json!({
        "id": manifest.id(),
        "kind": manifest.kind,
        "name": manifest.name,
        "version": manifest.version,
        "desc": manifest.desc(),
        "vendor": manifest.vendor(),
        "distfiles": distfiles,
        "binary": manifest.binary,
        "toolchain": manifest.toolchain,
        "emulator": manifest.emulator,
    })
}

fn table_name(table: &Table) -> &str {
    table
        .get("name")
        .and_then(toml::Value::as_str)
        .unwrap_or("")
}

fn attach_checksums(distfile: &Table, by_name: &HashMap<&str, &Table>) -> Value {
    let mut merged = distfile.clone();

    if !merged.contains_key("checksums") {
        if let Some(extra) = by_name.get(table_name(distfile)) {
            let sha_only: Table = extra
                .iter()
                .filter(|(key, _)| key.starts_with("sha"))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            merged.insert("checksums".to_string(), toml::Value::Table(sha_only));
        }
    }

    json!(merged)
}
