use std::fs;
use std::path::PathBuf;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use tracing::{info, warn};

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::identity::IdentityKey;
use crate::record::ContentRecord;

/// Accepts padded or unpadded input and non-canonical trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Named image storage shared by every run.
pub trait AssetStore {
    fn exists(&self, name: &str) -> bool;
    fn path(&self, name: &str) -> PathBuf;
    fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

pub struct FsAssetStore {
    dir: PathBuf,
}

impl FsAssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsAssetStore { dir: dir.into() }
    }
}

impl AssetStore for FsAssetStore {
    fn exists(&self, name: &str) -> bool {
        self.dir.join(name).is_file()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Where the two per-gate images ended up, if anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAssets {
    pub glyph: Option<PathBuf>,
    pub mandala: Option<PathBuf>,
}

/// Decode an embedded mandala payload as the page emits it: possibly
/// entity-escaped, line-wrapped, and missing its padding.
pub fn decode_mandala(payload: &str) -> Result<Vec<u8>> {
    let unescaped = html_escape::decode_html_entities(payload);
    let mut cleaned: String = unescaped.chars().filter(|c| !c.is_whitespace()).collect();

    let rem = cleaned.len() % 4;
    if rem != 0 {
        cleaned.push_str(&"=".repeat(4 - rem));
    }

    Ok(LENIENT.decode(cleaned.as_bytes())?)
}

/// Persist the glyph (fetched once per gate) and the mandala (rewritten every
/// run). Failures are logged and leave that image unresolved.
pub async fn resolve_assets<F, S>(
    record: &ContentRecord,
    key: &IdentityKey,
    fetcher: &F,
    store: &S,
) -> ResolvedAssets
where
    F: PageFetcher,
    S: AssetStore,
{
    let mut resolved = ResolvedAssets::default();
    let (Some(glyph_name), Some(mandala_name)) = (key.glyph_filename(), key.mandala_filename())
    else {
        info!("No gate number; skipping image assets");
        return resolved;
    };

    if store.exists(&glyph_name) {
        info!("Glyph {} already collected", glyph_name);
        resolved.glyph = Some(store.path(&glyph_name));
    } else if let Some(url) = record.glyph_url.as_deref() {
        info!(
            "Downloading {} as {}",
            record.glyph_filename.as_deref().unwrap_or(url),
            glyph_name
        );
        match fetcher.fetch_bytes(url).await {
            Ok(bytes) => match store.write(&glyph_name, &bytes) {
                Ok(path) => {
                    println!("   Glyph saved: {}", path.display());
                    resolved.glyph = Some(path);
                }
                Err(e) => warn!("Could not store glyph {}: {}", glyph_name, e),
            },
            Err(e) => warn!("Glyph download failed for {}: {}", url, e),
        }
    }

    if let Some(payload) = record.mandala_payload.as_deref() {
        match decode_mandala(payload).and_then(|bytes| {
            let len = bytes.len();
            store.write(&mandala_name, &bytes).map(|p| (p, len))
        }) {
            Ok((path, len)) => {
                println!("   Rave Mandala saved ({} bytes)", len);
                resolved.mandala = Some(path);
            }
            Err(e) => warn!("Rave Mandala not saved: {}", e),
        }
    }

    resolved
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn sample_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 37 % 256) as u8).collect()
    }

    fn wrap(s: &str, width: usize) -> String {
        s.as_bytes()
            .chunks(width)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n ")
    }

    #[test]
    fn mandala_survives_wrapping_and_entities() {
        let bytes = sample_bytes(301);
        let wrapped = wrap(&STANDARD.encode(&bytes), 60);
        let escaped = wrapped.replace('+', "&#43;").replace('/', "&#x2F;");
        assert!(escaped.contains('\n'));
        assert_eq!(decode_mandala(&escaped).unwrap(), bytes);
    }

    #[test]
    fn stripped_padding_is_repaired() {
        let bytes = sample_bytes(31);
        let encoded = STANDARD.encode(&bytes);
        assert!(encoded.ends_with("=="));
        for k in 0..=2 {
            let cut = &encoded[..encoded.len() - k];
            assert_eq!(decode_mandala(cut).unwrap(), bytes, "stripped {}", k);
        }
    }

    #[test]
    fn stripped_data_chars_decode_or_report() {
        let encoded = STANDARD.encode(sample_bytes(30));
        assert_eq!(encoded.len() % 4, 0);
        for k in 1..=2 {
            assert!(decode_mandala(&encoded[..encoded.len() - k]).is_ok());
        }
        // one dangling char cannot form a byte
        assert!(decode_mandala(&encoded[..encoded.len() - 3]).is_err());
    }

    #[test]
    fn garbage_payload_is_an_error() {
        assert!(decode_mandala("not*base64!").is_err());
    }

    fn gate_record() -> ContentRecord {
        ContentRecord {
            title: Some("Gate 58 - The Joyous".into()),
            line_title: Some("Line 3 - Electricity".into()),
            glyph_url: Some("https://example.com/gate-58.jpg".into()),
            glyph_filename: Some("gate-58.jpg".into()),
            mandala_payload: Some("iVBORw0KGgo".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn glyph_is_fetched_once_and_mandala_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(tmp.path().join("images"));
        let fetcher = FakeFetcher::new("<html></html>").with_bytes(b"jpeg".to_vec());
        let record = gate_record();
        let key = IdentityKey::derive(&record);

        let first = resolve_assets(&record, &key, &fetcher, &store).await;
        assert_eq!(first.glyph, Some(tmp.path().join("images/Gate-58.jpg")));
        assert_eq!(
            first.mandala,
            Some(tmp.path().join("images/Gate-58-Rave-Mandala.png"))
        );
        assert_eq!(fetcher.byte_calls(), 1);

        fs::write(store.path("Gate-58-Rave-Mandala.png"), b"stale").unwrap();
        let second = resolve_assets(&record, &key, &fetcher, &store).await;
        assert_eq!(second, first);
        assert_eq!(fetcher.byte_calls(), 1);
        let mandala = fs::read(store.path("Gate-58-Rave-Mandala.png")).unwrap();
        assert_eq!(mandala, b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn no_gate_means_no_assets() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(tmp.path());
        let fetcher = FakeFetcher::new("").with_bytes(b"jpeg".to_vec());
        let mut record = gate_record();
        record.title = Some("The Joyous".into());
        let key = IdentityKey::derive(&record);

        let resolved = resolve_assets(&record, &key, &fetcher, &store).await;
        assert_eq!(resolved, ResolvedAssets::default());
        assert_eq!(fetcher.byte_calls(), 0);
    }

    #[tokio::test]
    async fn failed_downloads_and_decodes_are_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(tmp.path());
        let fetcher = FakeFetcher::new("");
        let mut record = gate_record();
        record.mandala_payload = Some("A".into());
        let key = IdentityKey::derive(&record);

        let resolved = resolve_assets(&record, &key, &fetcher, &store).await;
        assert_eq!(resolved, ResolvedAssets::default());
        assert_eq!(fetcher.byte_calls(), 1);
    }
}
