//! 上传文件名清洗
//!
//! 输出只包含 `[A-Za-z0-9_.-]`，不含路径分隔符，首尾不含 `.`/`_`，
//! 因此拼入压缩包条目名后不会产生目录穿越。

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// 清洗后为空时使用的占位名
const FALLBACK_STEM: &str = "image";

/// 将任意客户端文件名清洗为安全文件名；可能返回空串。
pub fn secure_filename(raw: &str) -> String {
    // 路径分隔符视作空白，随后连续空白折叠为 `_`
    let spaced: String = raw
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_ascii_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    let head = trimmed.split('.').next().unwrap_or_default();
    if !trimmed.is_empty() && WINDOWS_DEVICE_NAMES.contains(&head.to_ascii_uppercase().as_str()) {
        return format!("_{trimmed}");
    }
    trimmed.to_string()
}

/// 清洗后去掉最后一个扩展名；结果为空时回退为 `image`。
pub fn sanitized_stem(raw: &str) -> String {
    let safe = secure_filename(raw);
    let stem = match safe.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => safe.as_str(),
    };
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitized_stem, secure_filename};

    #[test]
    fn strips_traversal_components() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\..\\windows\\win.ini"), "windows_win.ini");
        assert_eq!(secure_filename("/abs/path/photo.png"), "abs_path_photo.png");
    }

    #[test]
    fn collapses_whitespace_and_drops_unsafe_chars() {
        assert_eq!(secure_filename("My  cool\tphoto!.jpg"), "My_cool_photo.jpg");
        assert_eq!(secure_filename("i\u{e7}e caf\u{e9}.png"), "ie_caf.png");
        assert_eq!(secure_filename("$(rm -rf).png"), "rm_-rf.png");
    }

    #[test]
    fn prefixes_windows_device_names() {
        assert_eq!(secure_filename("con.png"), "_con.png");
        assert_eq!(secure_filename("NUL"), "_NUL");
    }

    #[test]
    fn stem_drops_last_extension_only() {
        assert_eq!(sanitized_stem("beach.jpeg"), "beach");
        assert_eq!(sanitized_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(sanitized_stem("noext"), "noext");
    }

    #[test]
    fn stem_falls_back_when_nothing_survives() {
        assert_eq!(sanitized_stem(""), "image");
        assert_eq!(sanitized_stem("../.."), "image");
        assert_eq!(sanitized_stem("\u{1F600}.png"), "png");
    }

    #[test]
    fn stem_never_contains_separators() {
        for raw in ["../../etc/passwd", "a/../../b", "..\\x", "./.hidden/..", "C:\\evil\\..\\x.png"] {
            let stem = sanitized_stem(raw);
            assert!(!stem.contains('/') && !stem.contains('\\'), "{raw} -> {stem}");
            assert!(!stem.starts_with('.'), "{raw} -> {stem}");
        }
    }
}
