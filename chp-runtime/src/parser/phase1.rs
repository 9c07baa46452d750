//! # 阶段 1：行识别
//!
//! 将原始文本切分为指令行：去掉空行、`/` 开头的注释行和行尾 `//` 注释，
//! 并按空白拆分 token。

/// 一条待解析的指令行（阶段 1 输出）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 行号（从 1 开始）
    pub line_number: usize,
    /// 按空白拆分后的 token
    pub tokens: Vec<&'a str>,
    /// 行尾 `//` 之后的注释（已去除首尾空白，空注释为 `None`）
    pub comment: Option<&'a str>,
}

impl SourceLine<'_> {
    /// 小写化的指令名（第一个 token）
    pub fn keyword(&self) -> String {
        self.tokens
            .first()
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// 拆分行尾注释
fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(pos) => {
            let comment = line[pos + 2..].trim();
            (&line[..pos], (!comment.is_empty()).then_some(comment))
        }
        None => (line, None),
    }
}

/// 识别文本中的指令行
pub fn recognize_lines(text: &str) -> Vec<SourceLine<'_>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('/') {
                return None;
            }

            let (body, comment) = split_comment(trimmed);
            let tokens: Vec<&str> = body.split_whitespace().collect();
            if tokens.is_empty() {
                return None;
            }

            Some(SourceLine {
                line_number: idx + 1,
                tokens,
                comment,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let lines = recognize_lines("\n// header\n/ also ignored\n   \n#Anime 80\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 5);
        assert_eq!(lines[0].tokens, vec!["#Anime", "80"]);
        assert_eq!(lines[0].keyword(), "#anime");
    }

    #[test]
    fn test_trailing_comment() {
        let lines = recognize_lines("#00 0 0 10 10 // name logo\n#01 1 1 1 1 //   \n");
        assert_eq!(lines[0].tokens, vec!["#00", "0", "0", "10", "10"]);
        assert_eq!(lines[0].comment, Some("name logo"));
        assert_eq!(lines[1].comment, None);
    }

    #[test]
    fn test_bom_is_stripped() {
        let lines = recognize_lines("\u{feff}#Data 16");
        assert_eq!(lines[0].keyword(), "#data");
    }
}
