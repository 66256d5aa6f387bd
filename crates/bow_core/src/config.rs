//! Database options.

use crate::error::{CoreError, CoreResult};
use bow_codec::{CborCodec, Codec, Format, FormatCodec};
use bow_storage::{FileOptions, DEFAULT_FILE_MODE};
use std::time::Duration;

/// Options for opening a database.
///
/// The codec is part of the type, so a `Database<JsonCodec>` can never be
/// handed CBOR bytes by accident within one process. Use [`FormatCodec`]
/// (via [`Options::from_pairs`]) when the codec is picked at runtime.
#[derive(Debug, Clone)]
pub struct Options<C: Codec = CborCodec> {
    /// Codec for every record in every bucket.
    pub codec: C,

    /// Unix permission bits for a newly created file.
    pub mode: u32,

    /// How long to wait for another owner to release the file lock.
    pub lock_timeout: Duration,

    /// Whether to create the file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the file on every commit (safer but slower).
    pub sync_on_commit: bool,
}

impl Default for Options<CborCodec> {
    fn default() -> Self {
        Self {
            codec: CborCodec,
            mode: DEFAULT_FILE_MODE,
            lock_timeout: Duration::ZERO,
            create_if_missing: true,
            sync_on_commit: true,
        }
    }
}

impl Options<CborCodec> {
    /// Creates options with default values and the CBOR codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Codec> Options<C> {
    /// Replaces the codec.
    #[must_use]
    pub fn with_codec<D: Codec>(self, codec: D) -> Options<D> {
        Options {
            codec,
            mode: self.mode,
            lock_timeout: self.lock_timeout,
            create_if_missing: self.create_if_missing,
            sync_on_commit: self.sync_on_commit,
        }
    }

    /// Sets the permission bits for a newly created file.
    #[must_use]
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets how long to wait for the file lock.
    #[must_use]
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets whether to create the file if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync on every commit.
    #[must_use]
    pub fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    pub(crate) fn file_options(&self) -> FileOptions {
        FileOptions {
            create_if_missing: self.create_if_missing,
            mode: self.mode,
            lock_timeout: self.lock_timeout,
        }
    }
}

impl Options<FormatCodec> {
    /// Builds options from textual `key=value` settings.
    ///
    /// | Key | Value |
    /// |-----|-------|
    /// | `codec` | `cbor` or `json` |
    /// | `mode` | octal permission bits, e.g. `0644` |
    /// | `lock_timeout_ms` | milliseconds to wait for the file lock |
    /// | `create_if_missing` | `true` or `false` |
    /// | `sync_on_commit` | `true` or `false` |
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for an unknown key or a value that
    /// does not parse.
    pub fn from_pairs<I, K, V>(pairs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Options::default().with_codec(FormatCodec::default());

        for (key, value) in pairs {
            let (key, value) = (key.as_ref().trim(), value.as_ref().trim());
            match key {
                "codec" => {
                    let format: Format = value
                        .parse()
                        .map_err(|_| CoreError::config(format!("unknown codec `{value}`")))?;
                    options.codec = FormatCodec::new(format);
                }
                "mode" => options.mode = parse_mode(value)?,
                "lock_timeout_ms" => {
                    let millis: u64 = parse_value(key, value)?;
                    options.lock_timeout = Duration::from_millis(millis);
                }
                "create_if_missing" => options.create_if_missing = parse_value(key, value)?,
                "sync_on_commit" => options.sync_on_commit = parse_value(key, value)?,
                _ => return Err(CoreError::config(format!("unrecognized option `{key}`"))),
            }
        }

        Ok(options)
    }

    /// Parses a single `key=value` setting into a pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if there is no `=`.
    pub fn split_pair(setting: &str) -> CoreResult<(&str, &str)> {
        setting
            .split_once('=')
            .ok_or_else(|| CoreError::config(format!("expected key=value, got `{setting}`")))
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .parse()
        .map_err(|_| CoreError::config(format!("invalid value `{value}` for `{key}`")))
}

fn parse_mode(value: &str) -> CoreResult<u32> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| CoreError::config(format!("invalid file mode `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bow_codec::JsonCodec;

    #[test]
    fn default_options() {
        let options = Options::default();
        assert_eq!(options.mode, 0o600);
        assert_eq!(options.lock_timeout, Duration::ZERO);
        assert!(options.create_if_missing);
        assert!(options.sync_on_commit);
        assert_eq!(options.codec.format(), Format::Cbor);
    }

    #[test]
    fn builder_pattern() {
        let options = Options::new()
            .mode(0o644)
            .lock_timeout(Duration::from_millis(250))
            .create_if_missing(false)
            .with_codec(JsonCodec);

        assert_eq!(options.codec.format(), Format::Json);
        assert_eq!(options.mode, 0o644);
        assert!(!options.create_if_missing);
        assert_eq!(
            options.file_options(),
            FileOptions {
                create_if_missing: false,
                mode: 0o644,
                lock_timeout: Duration::from_millis(250),
            }
        );
    }

    #[test]
    fn from_pairs_parses_every_key() {
        let options = Options::<FormatCodec>::from_pairs([
            ("codec", "json"),
            ("mode", "0644"),
            ("lock_timeout_ms", "250"),
            ("create_if_missing", "false"),
            ("sync_on_commit", "false"),
        ])
        .unwrap();

        assert_eq!(options.codec.format(), Format::Json);
        assert_eq!(options.mode, 0o644);
        assert_eq!(options.lock_timeout, Duration::from_millis(250));
        assert!(!options.create_if_missing);
        assert!(!options.sync_on_commit);
    }

    #[test]
    fn from_pairs_defaults_to_cbor() {
        let options = Options::<FormatCodec>::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(options.codec.format(), Format::Cbor);
    }

    #[test]
    fn from_pairs_rejects_bad_input() {
        for pair in [
            ("colour", "blue"),
            ("codec", "msgpack"),
            ("mode", "999"),
            ("lock_timeout_ms", "soon"),
            ("sync_on_commit", "maybe"),
        ] {
            assert!(matches!(
                Options::<FormatCodec>::from_pairs([pair]),
                Err(CoreError::Config { .. })
            ));
        }
    }

    #[test]
    fn split_pair() {
        assert_eq!(
            Options::<FormatCodec>::split_pair("codec=json").unwrap(),
            ("codec", "json")
        );
        assert!(Options::<FormatCodec>::split_pair("codec").is_err());
    }
}
