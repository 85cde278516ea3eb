//! エンジンオプション（UCI setoption 相当）
//!
//! オプション名は大文字小文字を区別しない。表示順は登録順。

use std::fmt;

use thiserror::Error;

use crate::eval::DEFAULT_EVAL_FILE;

/// オプション名
pub mod names {
    pub const THREADS: &str = "Threads";
    pub const HASH: &str = "Hash";
    pub const CLEAR_HASH: &str = "Clear Hash";
    pub const PONDER: &str = "Ponder";
    pub const MULTI_PV: &str = "MultiPV";
    pub const MOVE_OVERHEAD: &str = "Move Overhead";
    pub const EVAL_FILE: &str = "EvalFile";
}

/// 置換表サイズの上限（MB）
pub const MAX_HASH_MB: i64 = 33_554_432;
/// スレッド数の上限
pub const MAX_THREADS: i64 = 1024;

/// Engine option types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOption {
    /// Checkbox option
    Check { name: String, default: bool },

    /// Spin (numeric) option
    Spin {
        name: String,
        default: i64,
        min: i64,
        max: i64,
    },

    /// Combo (dropdown) option
    Combo {
        name: String,
        default: String,
        options: Vec<String>,
    },

    /// Free-form string option
    String { name: String, default: String },

    /// Button option (action trigger)
    Button { name: String },
}

impl EngineOption {
    /// Create a check option
    pub fn check(name: impl Into<String>, default: bool) -> Self {
        EngineOption::Check {
            name: name.into(),
            default,
        }
    }

    /// Create a spin option
    pub fn spin(name: impl Into<String>, default: i64, min: i64, max: i64) -> Self {
        EngineOption::Spin {
            name: name.into(),
            default,
            min,
            max,
        }
    }

    /// Create a combo option
    pub fn combo(name: impl Into<String>, default: String, options: Vec<String>) -> Self {
        EngineOption::Combo {
            name: name.into(),
            default,
            options,
        }
    }

    /// Create a string option
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        EngineOption::String {
            name: name.into(),
            default: default.into(),
        }
    }

    /// Create a button option
    pub fn button(name: impl Into<String>) -> Self {
        EngineOption::Button { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            EngineOption::Check { name, .. }
            | EngineOption::Spin { name, .. }
            | EngineOption::Combo { name, .. }
            | EngineOption::String { name, .. }
            | EngineOption::Button { name } => name,
        }
    }

    /// 既定値の文字列表現
    pub fn default_value(&self) -> String {
        match self {
            EngineOption::Check { default, .. } => default.to_string(),
            EngineOption::Spin { default, .. } => default.to_string(),
            EngineOption::Combo { default, .. } | EngineOption::String { default, .. } => {
                default.clone()
            }
            EngineOption::Button { .. } => String::new(),
        }
    }

    /// 値を検証し、格納する正規形を返す
    fn validate(&self, value: &str) -> Result<String, OptionError> {
        let value = value.trim();
        let invalid = |reason: &str| OptionError::InvalidValue {
            name: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        match self {
            EngineOption::Check { .. } => match value.to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_string()),
                "false" => Ok("false".to_string()),
                _ => Err(invalid("expected true or false")),
            },
            EngineOption::Spin { min, max, .. } => {
                let v: i64 = value.parse().map_err(|_| invalid("expected an integer"))?;
                if v < *min || v > *max {
                    return Err(OptionError::OutOfRange {
                        name: self.name().to_string(),
                        value: v,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(v.to_string())
            }
            EngineOption::Combo { options, .. } => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(value))
                .cloned()
                .ok_or_else(|| invalid("not one of the combo values")),
            EngineOption::String { .. } => {
                if value.is_empty() {
                    Err(invalid("empty value"))
                } else {
                    Ok(value.to_string())
                }
            }
            EngineOption::Button { .. } => Ok(String::new()),
        }
    }
}

impl fmt::Display for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOption::Check { name, default } => {
                write!(f, "option name {name} type check default {default}")
            }
            EngineOption::Spin {
                name,
                default,
                min,
                max,
            } => {
                write!(f, "option name {name} type spin default {default} min {min} max {max}")
            }
            EngineOption::Combo {
                name,
                default,
                options,
            } => {
                write!(f, "option name {name} type combo default {default}")?;
                for opt in options {
                    write!(f, " var {opt}")?;
                }
                Ok(())
            }
            EngineOption::String { name, default } => {
                write!(f, "option name {name} type string default {default}")
            }
            EngineOption::Button { name } => {
                write!(f, "option name {name} type button")
            }
        }
    }
}

/// オプション設定のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("no such option: {0}")]
    Unknown(String),
    #[error("invalid value '{value}' for option {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
    #[error("value {value} for option {name} is out of range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

#[derive(Debug, Clone)]
struct OptionEntry {
    option: EngineOption,
    value: String,
}

/// オプション一覧と現在値
#[derive(Debug, Clone)]
pub struct OptionsMap {
    entries: Vec<OptionEntry>,
}

impl Default for OptionsMap {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsMap {
    /// エンジンが公開する既定のオプション一覧
    pub fn new() -> Self {
        let mut map = Self {
            entries: Vec::new(),
        };
        map.add(EngineOption::spin(names::THREADS, 1, 1, MAX_THREADS));
        map.add(EngineOption::spin(names::HASH, 16, 1, MAX_HASH_MB));
        map.add(EngineOption::button(names::CLEAR_HASH));
        map.add(EngineOption::check(names::PONDER, false));
        map.add(EngineOption::spin(names::MULTI_PV, 1, 1, 128));
        map.add(EngineOption::spin(names::MOVE_OVERHEAD, 10, 0, 5000));
        map.add(EngineOption::string(names::EVAL_FILE, DEFAULT_EVAL_FILE));
        map
    }

    /// オプションを追加（同名があれば置き換える）
    pub fn add(&mut self, option: EngineOption) {
        let value = option.default_value();
        match self.position(option.name()) {
            Some(i) => self.entries[i] = OptionEntry { option, value },
            None => self.entries.push(OptionEntry { option, value }),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.option.name().eq_ignore_ascii_case(name))
    }

    /// オプションが存在するか
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// 値を設定（検証に失敗した場合は現在値を保つ）
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let i = self
            .position(name)
            .ok_or_else(|| OptionError::Unknown(name.to_string()))?;
        let entry = &mut self.entries[i];
        entry.value = entry.option.validate(value)?;
        Ok(())
    }

    /// 現在値（文字列）
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].value.as_str())
    }

    /// 数値オプションの現在値
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// check オプションの現在値
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| v == "true")
    }

    /// オプション定義を登録順に列挙
    pub fn iter(&self) -> impl Iterator<Item = &EngineOption> {
        self.entries.iter().map(|e| &e.option)
    }
}

impl fmt::Display for OptionsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.option)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = OptionsMap::new();
        assert_eq!(opts.get_i64(names::THREADS), Some(1));
        assert_eq!(opts.get_i64(names::HASH), Some(16));
        assert_eq!(opts.get_bool(names::PONDER), Some(false));
        assert_eq!(opts.get(names::EVAL_FILE), Some(DEFAULT_EVAL_FILE));
        assert_eq!(opts.get(names::CLEAR_HASH), Some(""));
    }

    #[test]
    fn test_case_insensitive_names() {
        let mut opts = OptionsMap::new();
        assert!(opts.contains("hash"));
        assert!(opts.contains("MOVE OVERHEAD"));
        opts.set("threads", "4").unwrap();
        assert_eq!(opts.get_i64("Threads"), Some(4));
    }

    #[test]
    fn test_validation() {
        let mut opts = OptionsMap::new();
        assert_eq!(
            opts.set("NoSuchOption", "1"),
            Err(OptionError::Unknown("NoSuchOption".to_string()))
        );
        assert!(matches!(opts.set("Hash", "0"), Err(OptionError::OutOfRange { .. })));
        assert!(matches!(opts.set("Hash", "abc"), Err(OptionError::InvalidValue { .. })));
        assert_eq!(opts.get_i64("Hash"), Some(16));
        assert!(opts.set("Ponder", "maybe").is_err());
        opts.set("Ponder", "TRUE").unwrap();
        assert_eq!(opts.get_bool("Ponder"), Some(true));
        assert!(opts.set("Clear Hash", "").is_ok());
        assert!(opts.set("EvalFile", "  ").is_err());
    }

    #[test]
    fn test_combo() {
        let mut opts = OptionsMap::new();
        opts.add(EngineOption::combo(
            "Style",
            "Normal".to_string(),
            vec!["Solid".to_string(), "Normal".to_string()],
        ));
        opts.set("style", "solid").unwrap();
        assert_eq!(opts.get("Style"), Some("Solid"));
        assert!(opts.set("Style", "Wild").is_err());
    }

    #[test]
    fn test_display() {
        let text = OptionsMap::new().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "option name Threads type spin default 1 min 1 max 1024");
        assert_eq!(lines[1], "option name Hash type spin default 16 min 1 max 33554432");
        assert_eq!(lines[2], "option name Clear Hash type button");
        assert!(lines.contains(&"option name EvalFile type string default rxiangqi-eval.bin"));
    }
}
