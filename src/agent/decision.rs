//! 路由决策解析
//!
//! 结构化角色（主角、升级模式下的主管）输出 `{"recipient": ..., "message": ...}`。
//! 从文本中提取 JSON（```json 代码块、裸 JSON 或首尾花括号之间），recipient 小写化。

use serde::Deserialize;

use crate::core::AgentError;

/// 解析后的路由决策；recipient 为原始（已小写）文本，是否可识别由编排器判断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub recipient: String,
    pub message: String,
}

#[derive(Deserialize)]
struct RawDecision {
    recipient: String,
    #[serde(default)]
    message: String,
}

/// 解析 LLM 输出为路由决策；无 JSON 或缺少 recipient 时返回 JsonParseError
pub fn parse_decision(output: &str) -> Result<RoutingDecision, AgentError> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or(rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            &trimmed[start..=end]
        } else {
            trimmed
        }
    } else {
        return Err(AgentError::JsonParseError(format!(
            "no JSON object in output: {}",
            trimmed
        )));
    };

    let raw: RawDecision = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;

    Ok(RoutingDecision {
        recipient: raw.recipient.trim().to_lowercase(),
        message: raw.message.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_json() {
        let d = parse_decision(r#"{"recipient": "Coworker", "message": "  can you help?  "}"#)
            .unwrap();
        assert_eq!(d.recipient, "coworker");
        assert_eq!(d.message, "can you help?");
    }

    #[test]
    fn test_parse_fenced_json() {
        let d = parse_decision(
            "Sure.\n```json\n{\"recipient\": \"supervisor\", \"message\": \"hi\"}\n```",
        )
        .unwrap();
        assert_eq!(d.recipient, "supervisor");
    }

    #[test]
    fn test_parse_embedded_json() {
        let d = parse_decision("I'll ask: {\"recipient\": \"coworker\", \"message\": \"x\"} ok")
            .unwrap();
        assert_eq!(d.message, "x");
    }

    #[test]
    fn test_message_defaults_to_empty() {
        let d = parse_decision(r#"{"recipient": "coworker"}"#).unwrap();
        assert_eq!(d.message, "");
    }

    #[test]
    fn test_unknown_recipient_still_parses() {
        let d = parse_decision(r#"{"recipient": "invalid", "message": "oops"}"#).unwrap();
        assert_eq!(d.recipient, "invalid");
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_decision("Hello coworker, please send the config."),
            Err(AgentError::JsonParseError(_))
        ));
        assert!(parse_decision(r#"{"message": "no recipient"}"#).is_err());
        assert!(parse_decision("{not json}").is_err());
        assert!(parse_decision("} {").is_err());
    }
}
