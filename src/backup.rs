use crate::store::{Collection, CollectionStore};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT: &str = "gradebook-collections-v1";

fn collection_entry(key: &str) -> String {
    format!("collections/{key}.json")
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub sha256: String,
    pub records: usize,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format: String,
    pub version: u32,
    pub app_version: String,
    pub exported_at: String,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub bundle_format: String,
    pub collections: Vec<String>,
}

/// Writes every collection the store has into a zip bundle at `out_path`.
/// Collections that were never written are left out.
pub fn export_bundle<S: CollectionStore>(
    store: &S,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::new();
    for c in Collection::ALL {
        let Some(records) = store.read(c)? else {
            continue;
        };
        let body = serde_json::to_vec_pretty(&records)
            .with_context(|| format!("failed to serialize {}", c.key()))?;
        zip.start_file(collection_entry(c.key()), opts)
            .with_context(|| format!("failed to start entry for {}", c.key()))?;
        zip.write_all(&body)
            .with_context(|| format!("failed to write entry for {}", c.key()))?;
        entries.push(ManifestEntry {
            name: c.key().to_string(),
            sha256: sha256_hex(&body),
            records: records.len(),
            updated_at: store.updated_at(c)?,
        });
    }

    let manifest = Manifest {
        format: BUNDLE_FORMAT.to_string(),
        version: 1,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        entries,
    };
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;
    zip.finish().context("failed to finalize zip bundle")?;

    log::info!(
        "exported {} collections to {}",
        manifest.entries.len(),
        out_path.to_string_lossy()
    );
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT.to_string(),
        entry_count: manifest.entries.len() + 1,
    })
}

/// Replaces each bundled collection in `store`. Every entry is read and
/// checked against the manifest before the first write.
pub fn import_bundle<S: CollectionStore>(
    store: &S,
    in_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: Manifest =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid")?;
    if manifest.format != BUNDLE_FORMAT {
        return Err(anyhow!("unsupported bundle format: {}", manifest.format));
    }

    let mut staged: Vec<(Collection, Vec<Value>)> = Vec::with_capacity(manifest.entries.len());
    for entry in &manifest.entries {
        let collection = Collection::from_key(&entry.name)
            .ok_or_else(|| anyhow!("unknown collection in bundle: {}", entry.name))?;
        let mut body = Vec::new();
        archive
            .by_name(&collection_entry(&entry.name))
            .with_context(|| format!("bundle missing entry for {}", entry.name))?
            .read_to_end(&mut body)
            .with_context(|| format!("failed to read entry for {}", entry.name))?;
        let actual = sha256_hex(&body);
        if !actual.eq_ignore_ascii_case(&entry.sha256) {
            return Err(anyhow!(
                "checksum mismatch for {}: expected {}, got {}",
                entry.name,
                entry.sha256,
                actual
            ));
        }
        let records: Vec<Value> = serde_json::from_slice(&body)
            .with_context(|| format!("entry for {} is not a JSON array", entry.name))?;
        staged.push((collection, records));
    }

    let mut collections = Vec::with_capacity(staged.len());
    for (c, records) in staged {
        store.write(c, &records)?;
        collections.push(c.key().to_string());
    }
    log::info!(
        "imported {} collections from {}",
        collections.len(),
        in_path.to_string_lossy()
    );
    Ok(ImportSummary {
        bundle_format: manifest.format,
        collections,
    })
}
