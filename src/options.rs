//! セッション設定
//!
//! 既定値 < 環境変数 < コマンドライン引数 の順で上書きする

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::{LogLevel, Logger};

/// ログレベルを指定する環境変数
pub const ENV_LOG_LEVEL: &str = "LINEBUF_LOG";
/// ログファイルを指定する環境変数
pub const ENV_LOG_FILE: &str = "LINEBUF_LOG_FILE";

const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Warning;

/// セッション制御のオプション
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// ログレベル（未指定時は WARNING）
    pub log_level: Option<LogLevel>,
    /// デバッグログ出力先
    pub log_file: Option<PathBuf>,
    /// 未知のオペコードをエラーとして扱うか（未指定時は読み飛ばす）
    pub strict: Option<bool>,
}

impl SessionOptions {
    /// 環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = lookup(ENV_LOG_LEVEL)
            .map(|value| value.parse::<LogLevel>())
            .transpose()?;
        let log_file = lookup(ENV_LOG_FILE).map(|value| expand_path(&value));

        Ok(Self {
            log_level,
            log_file,
            strict: None,
        })
    }

    /// コマンドライン引数（プログラム名を除く）から読み込む
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut options = Self::default();
        let mut iter = args.iter().peekable();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug-log" => {
                    let path = iter.next_if(|next| !next.starts_with('-'));
                    options.log_file = match path {
                        Some(path) => Some(expand_path(path)),
                        None => default_log_path(),
                    };
                    options.log_level.get_or_insert(LogLevel::Debug);
                }
                "--log-level" => {
                    let value = iter.next().ok_or_else(|| ConfigError::MissingValue {
                        key: "--log-level".to_string(),
                    })?;
                    options.log_level = Some(value.parse()?);
                }
                "--strict" => options.strict = Some(true),
                other => {
                    return Err(ConfigError::UnknownOption {
                        arg: other.to_string(),
                    })
                }
            }
        }

        Ok(options)
    }

    /// `overrides` 側の指定を優先して合成する
    pub fn merged_with(&self, overrides: &SessionOptions) -> SessionOptions {
        SessionOptions {
            log_level: overrides.log_level.or(self.log_level),
            log_file: overrides
                .log_file
                .clone()
                .or_else(|| self.log_file.clone()),
            strict: overrides.strict.or(self.strict),
        }
    }

    pub fn effective_log_level(&self) -> LogLevel {
        self.log_level.unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    /// 設定に従ったロガーを作る
    ///
    /// ログファイルがある場合、その親ディレクトリを作成する。
    pub fn build_logger(&self) -> std::io::Result<Logger> {
        let mut logger = Logger::new(self.effective_log_level());
        if let Some(path) = &self.log_file {
            ensure_parent_dir(path)?;
            logger = logger.with_file_output(path);
        }
        Ok(logger)
    }
}

/// `~` や環境変数を展開したパス
fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(raw),
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".linebuf-log").join("debug.log"))
}

/// ヘルパー：親ディレクトリを作成
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.effective_log_level(), LogLevel::Warning);
        assert!(!options.is_strict());
    }

    #[test]
    fn test_from_lookup_reads_environment() {
        let env: HashMap<&str, &str> = [(ENV_LOG_LEVEL, "info"), (ENV_LOG_FILE, "/tmp/lb.log")]
            .into_iter()
            .collect();
        let options =
            SessionOptions::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(options.log_level, Some(LogLevel::Info));
        assert_eq!(options.log_file, Some(PathBuf::from("/tmp/lb.log")));
    }

    #[test]
    fn test_from_lookup_rejects_bad_level() {
        let result = SessionOptions::from_lookup(|key| {
            (key == ENV_LOG_LEVEL).then(|| "chatty".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_args() {
        let options =
            SessionOptions::from_args(["--log-level", "error", "--strict", "--debug-log", "x.log"])
                .unwrap();

        assert_eq!(options.log_level, Some(LogLevel::Error));
        assert_eq!(options.log_file, Some(PathBuf::from("x.log")));
        assert!(options.is_strict());
    }

    #[test]
    fn test_debug_log_implies_debug_level() {
        let options = SessionOptions::from_args(["--debug-log", "trace.log"]).unwrap();
        assert_eq!(options.effective_log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_from_args_errors() {
        assert_eq!(
            SessionOptions::from_args(["--log-level"]),
            Err(ConfigError::MissingValue {
                key: "--log-level".to_string()
            })
        );
        assert_eq!(
            SessionOptions::from_args(["--verbose"]),
            Err(ConfigError::UnknownOption {
                arg: "--verbose".to_string()
            })
        );
    }

    #[test]
    fn test_merged_with_prefers_overrides() {
        let base = SessionOptions {
            log_level: Some(LogLevel::Info),
            log_file: Some(PathBuf::from("base.log")),
            strict: Some(false),
        };
        let overrides = SessionOptions {
            log_level: None,
            log_file: Some(PathBuf::from("cli.log")),
            strict: Some(true),
        };
        let merged = base.merged_with(&overrides);

        assert_eq!(merged.log_level, Some(LogLevel::Info));
        assert_eq!(merged.log_file, Some(PathBuf::from("cli.log")));
        assert_eq!(merged.strict, Some(true));
    }

    #[test]
    fn test_build_logger_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("debug.log");
        let options = SessionOptions {
            log_file: Some(path.clone()),
            ..SessionOptions::default()
        };

        let logger = options.build_logger().unwrap();
        assert_eq!(logger.file_output(), Some(path.as_path()));
        assert!(path.parent().unwrap().is_dir());
    }
}
