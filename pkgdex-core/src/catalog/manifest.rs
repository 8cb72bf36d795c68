//! Package manifest parsing (one TOML file per package version).
//!
//! A manifest carries up to six top-level sections. Absent sections
//! default to empty so downstream code never probes for missing keys.

use serde::Serialize;
use toml::{Table, Value};

/// TOML key of the checksum side-table. This is a literal quoted key at
/// the top level, not a nested `checksums` table under `distfiles`.
const CHECKSUMS_KEY: &str = "distfiles.checksums";

/// One parsed package-version description.
#[derive(Debug, Clone, Serialize)]
pub struct PackageManifest {
    /// Top-level category, e.g. `toolchain`.
    pub kind: String,

    /// Package name.
    pub name: String,

    /// Version string taken from the file stem; not necessarily SemVer.
    pub version: String,

    /// Repo-relative source path, informational only.
    pub path: String,

    /// `[metadata]` section; may contain `desc` and `vendor`.
    pub metadata: Table,

    /// `[[distfiles]]` entries, in file order.
    pub distfiles: Vec<Table>,

    /// `[["distfiles.checksums"]]` entries, each correlated to a
    /// distfile by its `name` field.
    pub distfiles_checksums: Vec<Table>,

    /// `[[binary]]` entries, in file order.
    pub binary: Vec<Table>,

    /// `[toolchain]` section.
    pub toolchain: Table,

    /// `[emulator]` section.
    pub emulator: Table,

    /// Verbatim source text.
    pub raw_toml: String,
}

impl PackageManifest {
    /// Parses a raw manifest file into its structured sections.
    pub fn parse(
        kind: &str,
        name: &str,
        version: &str,
        path: &str,
        raw: &str,
    ) -> Result<Self, toml::de::Error> {
        let doc: Table = toml::from_str(raw)?;

        Ok(Self {
            kind: kind.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            path: path.to_string(),
            metadata: table_section(&doc, "metadata"),
            distfiles: tables_section(&doc, "distfiles"),
            distfiles_checksums: tables_section(&doc, CHECKSUMS_KEY),
            binary: tables_section(&doc, "binary"),
            toolchain: table_section(&doc, "toolchain"),
            emulator: table_section(&doc, "emulator"),
            raw_toml: raw.to_string(),
        })
    }

    /// Derived identity: `kind/name/version`. Never stored, so it cannot
    /// desync from its parts.
    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.kind, self.name, self.version)
    }

    /// The `metadata.desc` field, or `""` when absent.
    pub fn desc(&self) -> &str {
        self.metadata
            .get("desc")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The `metadata.vendor` table, or an empty table when absent.
    pub fn vendor(&self) -> Table {
        table_section(&self.metadata, "vendor")
    }
}

/// A top-level table section, defaulting to empty when absent or not a table.
fn table_section(doc: &Table, key: &str) -> Table {
    match doc.get(key) {
        Some(Value::Table(table)) => table.clone(),
        _ => Table::new(),
    }
}

/// A top-level array-of-tables section, defaulting to empty. Non-table
/// array elements are dropped.
fn tables_section(doc: &Table, key: &str) -> Vec<Table> {
    match doc.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_table().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod manifest_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
format = "v1"

[metadata]
desc = "GNU toolchain for RISC-V"
slug = "gnu-plct"

[metadata.vendor]
name = "PLCT"
eula = ""

[[distfiles]]
name = "toolchain.tar.xz"
size = 178859388

[["distfiles.checksums"]]
name = "toolchain.tar.xz"
sha256 = "abc123"
sha512 = "def456"
md5 = "ignored-elsewhere"

[[binary]]
host = "x86_64-linux-gnu"

[toolchain]
target = "riscv64-plct-linux-gnu"
flavors = ["plct"]
"#;

    #[test]
    fn test_parse_all_sections() {
        let manifest =
            PackageManifest::parse("toolchain", "gnu-plct", "0.20240127.0", "manifests/toolchain/gnu-plct/0.20240127.0.toml", SAMPLE)
                .unwrap();

        assert_eq!(manifest.id(), "toolchain/gnu-plct/0.20240127.0");
        assert_eq!(manifest.desc(), "GNU toolchain for RISC-V");
        assert_eq!(
            manifest.vendor().get("name").and_then(Value::as_str),
            Some("PLCT")
        );
        assert_eq!(manifest.distfiles.len(), 1);
        assert_eq!(manifest.distfiles_checksums.len(), 1);
        assert_eq!(manifest.binary.len(), 1);
        assert_eq!(
            manifest.toolchain.get("target").and_then(Value::as_str),
            Some("riscv64-plct-linux-gnu")
        );
        assert!(manifest.emulator.is_empty());
        assert_eq!(manifest.raw_toml, SAMPLE);
    }

    #[test]
    fn test_absent_sections_default_to_empty() {
        let manifest = PackageManifest::parse("analyzer", "x", "1.0", "p", "format = \"v1\"\n").unwrap();

        assert!(manifest.metadata.is_empty());
        assert!(manifest.distfiles.is_empty());
        assert!(manifest.distfiles_checksums.is_empty());
        assert!(manifest.binary.is_empty());
        assert!(manifest.toolchain.is_empty());
        assert!(manifest.emulator.is_empty());
        assert_eq!(manifest.desc(), "");
        assert!(manifest.vendor().is_empty());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(PackageManifest::parse("k", "n", "v", "p", "not [[ valid").is_err());
    }

    #[test]
    fn test_raw_toml_reparses_to_identical_fields() {
        let first =
            PackageManifest::parse("toolchain", "gnu-plct", "0.20240127.0", "p", SAMPLE).unwrap();
        let second = PackageManifest::parse(
            "toolchain",
            "gnu-plct",
            "0.20240127.0",
            "p",
            &first.raw_toml,
        )
        .unwrap();

        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.distfiles, second.distfiles);
        assert_eq!(first.distfiles_checksums, second.distfiles_checksums);
        assert_eq!(first.binary, second.binary);
        assert_eq!(first.toolchain, second.toolchain);
        assert_eq!(first.emulator, second.emulator);
    }

    #[test]
    fn test_checksums_require_the_quoted_dotted_key() {
        // `[distfiles.checksums]` nests into the last distfile entry; it
        // must not populate the top-level side-table.
        let nested = r#"
[[distfiles]]
name = "a.tar.gz"

[distfiles.checksums]
sha256 = "abc"
"#;
        let manifest = PackageManifest::parse("k", "n", "v", "p", nested).unwrap();
        assert!(manifest.distfiles_checksums.is_empty());
        assert!(manifest.distfiles[0].contains_key("checksums"));

        let quoted = r#"
[["distfiles.checksums"]]
name = "a.tar.gz"
sha256 = "abc"
"#;
        let manifest = PackageManifest::parse("k", "n", "v", "p", quoted).unwrap();
        assert_eq!(manifest.distfiles_checksums.len(), 1);
    }
}
