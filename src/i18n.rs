// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库，支持中文（默认）和英文
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use ote_config::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use ote_config::i18n::t_with_args;
/// let msg = t_with_args("cli.set.ok", &[("path", "dataset.num_workers"), ("value", "4")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 为全局状态，测试并行执行时需要串行化
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale("zh-CN");
        assert_eq!(current_locale(), "zh-CN");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        assert_eq!(t("common.success"), "操作成功");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("zh-CN");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        let msg = t_with_args("cli.validate.failed", &[("count", "3")]);
        assert!(msg.contains("3"));
        assert!(msg.contains("校验失败"));

        set_locale("en");
        let msg = t_with_args("cli.set.ok", &[("path", "dataset.num_workers"), ("value", "4")]);
        assert_eq!(msg, "Set dataset.num_workers = 4");

        set_locale("zh-CN");
    }
}
