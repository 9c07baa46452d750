//! # 辅助解析函数
//!
//! 数值参数读取与错误构造。

use crate::error::ParseError;

use super::phase1::SourceLine;

/// 读取必需参数
pub fn required<'a>(
    line: &SourceLine<'a>,
    index: usize,
    param: &str,
) -> Result<&'a str, ParseError> {
    line.tokens
        .get(index)
        .copied()
        .ok_or_else(|| ParseError::MissingParameter {
            line: line.line_number,
            command: line.tokens.first().copied().unwrap_or_default().to_string(),
            param: param.to_string(),
        })
}

/// 解析整数参数
///
/// 目标类型放不下（如负数写入无符号字段）同样视为无效整数。
pub fn parse_int<T: TryFrom<i64>>(
    line: &SourceLine<'_>,
    token: &str,
    param: &str,
) -> Result<T, ParseError> {
    token
        .parse::<i64>()
        .ok()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| ParseError::InvalidNumber {
            line: line.line_number,
            param: param.to_string(),
            value: token.to_string(),
        })
}

/// 读取并解析必需的整数参数
pub fn required_int<T: TryFrom<i64>>(
    line: &SourceLine<'_>,
    index: usize,
    param: &str,
) -> Result<T, ParseError> {
    let token = required(line, index, param)?;
    parse_int(line, token, param)
}

/// 将 `from` 之后的 token 用单个空格重新拼接
///
/// 没有剩余 token 时返回 `MissingParameter`。
pub fn rest_text(line: &SourceLine<'_>, from: usize, param: &str) -> Result<String, ParseError> {
    required(line, from, param)?;
    Ok(line.tokens[from..].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(tokens: Vec<&str>) -> SourceLine<'_> {
        SourceLine {
            line_number: 3,
            tokens,
            comment: None,
        }
    }

    #[test]
    fn test_required_int() {
        let l = line(vec!["#Size", "120", "abc"]);
        assert_eq!(required_int::<i32>(&l, 1, "w"), Ok(120));
        assert_eq!(
            required_int::<i32>(&l, 2, "h"),
            Err(ParseError::InvalidNumber {
                line: 3,
                param: "h".to_string(),
                value: "abc".to_string(),
            })
        );
        assert!(matches!(
            required_int::<i32>(&l, 3, "x"),
            Err(ParseError::MissingParameter { line: 3, .. })
        ));
    }

    #[test]
    fn test_negative_into_unsigned_is_invalid() {
        let l = line(vec!["#Anime", "-5"]);
        assert!(required_int::<u32>(&l, 1, "ms").is_err());
    }

    #[test]
    fn test_rest_text_rejoins_with_single_spaces() {
        let l = line(vec!["#CharName", "Pomyu", "Chara", "2"]);
        assert_eq!(rest_text(&l, 1, "name").unwrap(), "Pomyu Chara 2");
        assert!(rest_text(&line(vec!["#Artist"]), 1, "artist").is_err());
    }
}
