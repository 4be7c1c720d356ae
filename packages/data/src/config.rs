//! Data source configuration.
//!
//! The dataset is read from a local file. `CLEAN_DATA_URL` names a remote
//! copy that is downloaded into that file when it is missing.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Local dataset path used when nothing else is configured.
pub const DEFAULT_LOCAL_PATH: &str = "data/cleaned_data.csv";

/// Environment variable naming the remote dataset URL.
pub const CLEAN_DATA_URL_VAR: &str = "CLEAN_DATA_URL";

/// Environment variable overriding the local dataset path.
pub const DATA_PATH_VAR: &str = "DATA_PATH";

/// Environment variable selecting the text encoding.
pub const DATA_ENCODING_VAR: &str = "DATA_ENCODING";

/// Text encoding of the CSV file.
///
/// Wraps an `encoding_rs` encoding resolved from a WHATWG label, so
/// `latin1` and `iso-8859-1` both mean windows-1252.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding(&'static encoding_rs::Encoding);

impl Default for Encoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Encoding {
    /// UTF-8, the default.
    #[must_use]
    pub fn utf8() -> Self {
        Self(encoding_rs::UTF_8)
    }

    /// windows-1252, what the `latin1` label resolves to.
    #[must_use]
    pub fn windows_1252() -> Self {
        Self(encoding_rs::WINDOWS_1252)
    }

    /// Resolves a WHATWG encoding label (e.g. `utf-8`, `latin1`, `cp1252`).
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        encoding_rs::Encoding::for_label(label.trim().as_bytes()).map(Self)
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.0.name()
    }

    /// Decodes raw bytes into text. Returns `None` when the bytes are not
    /// valid in this encoding.
    ///
    /// A leading byte-order mark takes precedence over the configured
    /// encoding and is stripped.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        let (encoding, body) = match encoding_rs::Encoding::for_bom(bytes) {
            Some((sniffed, bom_len)) => (sniffed, &bytes[bom_len..]),
            None => (self.0, bytes),
        };
        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(std::borrow::Cow::into_owned)
    }
}

/// Where and how to load the collision dataset.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Local file (also the cache target for remote downloads).
    pub local_path: PathBuf,
    /// Remote copy fetched when the local file is absent.
    pub remote_url: Option<String>,
    /// Text encoding of the file.
    pub encoding: Encoding,
    /// Timeout for the remote fetch.
    pub timeout: Duration,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from(DEFAULT_LOCAL_PATH),
            remote_url: None,
            encoding: Encoding::default(),
            timeout: wildlife_risk_fetch::DEFAULT_TIMEOUT,
        }
    }
}

impl DataConfig {
    /// Creates a config for a local file with default settings.
    #[must_use]
    pub fn local(path: impl AsRef<Path>) -> Self {
        Self {
            local_path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Sets the remote URL.
    #[must_use]
    pub fn with_remote_url(mut self, url: &str) -> Self {
        self.remote_url = Some(url.to_owned());
        self
    }

    /// Sets the text encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Reads the config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads the config through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset. An unrecognized encoding falls back
    /// to UTF-8 with a warning.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(path) = get(DATA_PATH_VAR) {
            config.local_path = PathBuf::from(path);
        }
        config.remote_url = get(CLEAN_DATA_URL_VAR);
        if let Some(raw) = get(DATA_ENCODING_VAR) {
            config.encoding = Encoding::for_label(&raw).unwrap_or_else(|| {
                log::warn!("Unknown {DATA_ENCODING_VAR} '{raw}', falling back to UTF-8");
                Encoding::utf8()
            });
        }
        config
    }

    /// Human-readable description of the source used in errors and logs.
    #[must_use]
    pub fn location(&self) -> String {
        self.remote_url.as_ref().map_or_else(
            || self.local_path.display().to_string(),
            |url| format!("{url} (cached at {})", self.local_path.display()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_file() {
        let config = DataConfig::from_vars(vars(&[]));
        assert_eq!(config.local_path, PathBuf::from(DEFAULT_LOCAL_PATH));
        assert!(config.remote_url.is_none());
        assert_eq!(config.encoding, Encoding::utf8());
    }

    #[test]
    fn reads_overrides() {
        let config = DataConfig::from_vars(vars(&[
            (CLEAN_DATA_URL_VAR, "https://example.com/clean.csv"),
            (DATA_PATH_VAR, "/tmp/clean.csv"),
            (DATA_ENCODING_VAR, "Latin1"),
        ]));
        assert_eq!(config.remote_url.as_deref(), Some("https://example.com/clean.csv"));
        assert_eq!(config.local_path, PathBuf::from("/tmp/clean.csv"));
        assert_eq!(config.encoding, Encoding::windows_1252());
    }

    #[test]
    fn blank_url_is_unset() {
        let config = DataConfig::from_vars(vars(&[(CLEAN_DATA_URL_VAR, "  ")]));
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn resolves_whatwg_labels() {
        assert_eq!(Encoding::for_label("cp1252"), Some(Encoding::windows_1252()));
        assert_eq!(Encoding::for_label(" ISO-8859-1 "), Some(Encoding::windows_1252()));
        assert_eq!(Encoding::for_label("utf8"), Some(Encoding::utf8()));
        assert_eq!(
            Encoding::for_label("shift_jis").map(Encoding::name),
            Some("Shift_JIS")
        );
        assert!(Encoding::for_label("klingon").is_none());
    }

    #[test]
    fn unknown_label_falls_back_to_utf8() {
        let config = DataConfig::from_vars(vars(&[(DATA_ENCODING_VAR, "klingon")]));
        assert_eq!(config.encoding, Encoding::utf8());
    }

    #[test]
    fn decodes_cp1252_bytes() {
        let text = Encoding::for_label("cp1252")
            .unwrap()
            .decode(b"Sk\xe5ne l\xe4n,Lund,Moose\x96Elk")
            .unwrap();
        assert_eq!(text, "Skåne län,Lund,Moose\u{2013}Elk");
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(Encoding::utf8().decode(&[b'V', 0xE4, b'r']).is_none());
    }

    #[test]
    fn strips_utf8_bom() {
        let text = Encoding::utf8().decode("\u{feff}County".as_bytes()).unwrap();
        assert_eq!(text, "County");
    }

    #[test]
    fn bom_overrides_configured_encoding() {
        let text = Encoding::windows_1252()
            .decode("\u{feff}Värmland".as_bytes())
            .unwrap();
        assert_eq!(text, "Värmland");
    }
}
