use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LangKey {
    About,
    Animation,
    AutoMode,
    Exit,
    ShowBarOnExit,
}

pub trait Localizer {
    fn string_for(&self, key: LangKey) -> String;
}

type Table = [(LangKey, &'static str); 5];

static TABLES: Lazy<HashMap<&'static str, Table>> = Lazy::new(|| {
    HashMap::from([
        (
            "en",
            [
                (LangKey::About, "About"),
                (LangKey::Animation, "Animation"),
                (LangKey::AutoMode, "Auto mode"),
                (LangKey::Exit, "Exit"),
                (LangKey::ShowBarOnExit, "Show taskbar on exit"),
            ],
        ),
        (
            "zh-CN",
            [
                (LangKey::About, "关于"),
                (LangKey::Animation, "动画"),
                (LangKey::AutoMode, "自动模式"),
                (LangKey::Exit, "退出"),
                (LangKey::ShowBarOnExit, "退出时显示任务栏"),
            ],
        ),
        (
            "ja",
            [
                (LangKey::About, "バージョン情報"),
                (LangKey::Animation, "アニメーション"),
                (LangKey::AutoMode, "自動モード"),
                (LangKey::Exit, "終了"),
                (LangKey::ShowBarOnExit, "終了時にタスクバーを表示"),
            ],
        ),
    ])
});

/// String tables compiled into the binary.
#[derive(Debug, Clone)]
pub struct BuiltinLocalizer {
    language: &'static str,
}

impl BuiltinLocalizer {
    pub fn english() -> Self {
        Self { language: "en" }
    }

    /// Picks the closest table for a BCP 47 or POSIX locale tag
    /// (`zh-CN`, `zh_CN.UTF-8`, `ja-JP`, ...). Falls back to English.
    pub fn for_locale(tag: &str) -> Self {
        let normalized = tag.split('.').next().unwrap_or("").replace('_', "-");
        let primary = normalized.split('-').next().unwrap_or("").to_ascii_lowercase();

        let language = match primary.as_str() {
            "zh" => "zh-CN",
            "ja" => "ja",
            _ => "en",
        };
        Self { language }
    }

    pub fn language(&self) -> &'static str {
        self.language
    }
}

impl Localizer for BuiltinLocalizer {
    fn string_for(&self, key: LangKey) -> String {
        let lookup = |language: &str| {
            TABLES
                .get(language)
                .and_then(|table| table.iter().find(|(k, _)| *k == key))
                .map(|(_, text)| text.to_string())
        };

        lookup(self.language)
            .or_else(|| lookup("en"))
            .unwrap_or_else(|| format!("{:?}", key))
    }
}

/// `SMART_TASKBAR_LANG`, then the OS user locale, then `LANG`.
pub fn detect_locale() -> String {
    if let Ok(lang) = std::env::var("SMART_TASKBAR_LANG") {
        if !lang.is_empty() {
            return lang;
        }
    }

    #[cfg(windows)]
    {
        if let Some(lang) = crate::platform::user_locale_name() {
            return lang;
        }
    }

    std::env::var("LANG").unwrap_or_else(|_| "en".to_string())
}
