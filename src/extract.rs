//! 结构化输出提取器
//!
//! 模型回复不可信：可能是干净 JSON、裹在闲聊或 ```json 围栏里的 JSON、
//! 或完全不含结构。按固定顺序降级，三层兜底，绝不向调用方抛错：
//!
//! 1. 整段文本直接解析为目标结构
//! 2. 截取第一个配平的 `{...}`（数组为 `[...]`）子串解析，围栏块同样算这一层
//! 3. 返回调用方提供的骨架默认值
//!
//! 纯函数，无 I/O；所在层级随结果一起返回，供调用方记录降级日志。

use serde::de::DeserializeOwned;

/// 提取结果落在的层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    /// 整段即合法结构
    Clean,
    /// 从文本中抢救出的内嵌结构
    Salvaged,
    /// 两层都失败，使用骨架
    Fallback,
}

/// 从原始文本提取单个结构化对象；失败时返回 skeleton()
pub fn extract_object<T, F>(raw: &str, skeleton: F) -> (T, ExtractionTier)
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    extract_with(raw, '{', '}', skeleton)
}

/// 从原始文本提取结构化数组；失败时返回 skeleton()
pub fn extract_array<T, F>(raw: &str, skeleton: F) -> (Vec<T>, ExtractionTier)
where
    T: DeserializeOwned,
    F: FnOnce() -> Vec<T>,
{
    extract_with(raw, '[', ']', skeleton)
}

fn extract_with<T, F>(raw: &str, open: char, close: char, skeleton: F) -> (T, ExtractionTier)
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return (value, ExtractionTier::Clean);
    }

    for candidate in [fenced_block(trimmed), balanced_span(trimmed, open, close)]
        .into_iter()
        .flatten()
    {
        if let Ok(value) = serde_json::from_str::<T>(candidate.trim()) {
            return (value, ExtractionTier::Salvaged);
        }
    }

    tracing::debug!("Structured extraction fell back to skeleton");
    (skeleton(), ExtractionTier::Fallback)
}

/// 提取 ```json ... ``` 围栏内的文本
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```json")?;
    let rest = &text[start + 7..];
    match rest.find("```") {
        Some(end) => Some(rest[..end].trim()),
        None => Some(rest.trim()),
    }
}

/// 从第一个 open 起扫描到配平的 close，跳过字符串字面量内的括号
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(&text[start..start + i + c.len_utf8()]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Probe {
        #[serde(default)]
        name: String,
        #[serde(default)]
        count: u32,
    }

    fn skeleton() -> Probe {
        Probe {
            name: "skeleton".to_string(),
            count: 0,
        }
    }

    #[test]
    fn test_tier1_clean_object() {
        let (probe, tier) = extract_object(r#"{"name": "a", "count": 2}"#, skeleton);
        assert_eq!(tier, ExtractionTier::Clean);
        assert_eq!(probe.name, "a");
        assert_eq!(probe.count, 2);
    }

    #[test]
    fn test_tier2_object_wrapped_in_prose() {
        let raw = r#"Sure, here you go: {"name": "b", "count": 7} — hope that helps!"#;
        let (probe, tier) = extract_object(raw, skeleton);
        assert_eq!(tier, ExtractionTier::Salvaged);
        assert_eq!(probe.name, "b");
    }

    #[test]
    fn test_tier2_fenced_block() {
        let raw = "Here is the result:\n```json\n{\"name\": \"c\", \"count\": 1}\n```\nDone.";
        let (probe, tier) = extract_object(raw, skeleton);
        assert_eq!(tier, ExtractionTier::Salvaged);
        assert_eq!(probe.name, "c");
    }

    #[test]
    fn test_tier2_braces_inside_strings_do_not_confuse_scan() {
        let raw = r#"prefix {"name": "has } brace", "count": 3} suffix"#;
        let (probe, tier) = extract_object(raw, skeleton);
        assert_eq!(tier, ExtractionTier::Salvaged);
        assert_eq!(probe.name, "has } brace");
    }

    #[test]
    fn test_tier2_nested_objects() {
        #[derive(Debug, Default, Deserialize)]
        struct Outer {
            #[serde(default)]
            inner: Probe,
        }
        let raw = r#"text {"inner": {"name": "deep", "count": 9}} more text"#;
        let (outer, tier) = extract_object(raw, Outer::default);
        assert_eq!(tier, ExtractionTier::Salvaged);
        assert_eq!(outer.inner.name, "deep");
    }

    #[test]
    fn test_tier3_plain_prose_falls_back() {
        let (probe, tier) = extract_object("I cannot produce JSON today.", skeleton);
        assert_eq!(tier, ExtractionTier::Fallback);
        assert_eq!(probe.name, "skeleton");
    }

    #[test]
    fn test_tier3_truncated_json_falls_back() {
        let (probe, tier) = extract_object(r#"{"name": "oops", "count":"#, skeleton);
        assert_eq!(tier, ExtractionTier::Fallback);
        assert_eq!(probe.name, "skeleton");
    }

    #[test]
    fn test_tier3_empty_input_falls_back() {
        let (_, tier) = extract_object("", skeleton);
        assert_eq!(tier, ExtractionTier::Fallback);
    }

    #[test]
    fn test_array_clean_and_salvaged() {
        let (items, tier) = extract_array::<Probe, _>(r#"[{"name": "x"}]"#, Vec::new);
        assert_eq!(tier, ExtractionTier::Clean);
        assert_eq!(items.len(), 1);

        let raw = r#"The slides: [{"name": "y"}, {"name": "z"}] as requested."#;
        let (items, tier) = extract_array::<Probe, _>(raw, Vec::new);
        assert_eq!(tier, ExtractionTier::Salvaged);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_array_fallback_uses_skeleton() {
        let (items, tier) = extract_array::<Probe, _>("no list here", || vec![skeleton()]);
        assert_eq!(tier, ExtractionTier::Fallback);
        assert_eq!(items[0].name, "skeleton");
    }
}
