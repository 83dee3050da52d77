//! 各角色的 system prompt 与两阶段生成用的提示
//!
//! system prompt 只由 Role + RoleProfile + MissingInfo + 主管模式决定，同样输入得到同样文本。

use serde::Deserialize;

use crate::core::{MissingInfo, Role, RoleProfile};

/// 主管的回复方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorMode {
    /// 直接以自由文本回复主角
    #[default]
    Direct,
    /// 输出 JSON 路由决策：回复主角，或转给同事
    Escalating,
}

impl std::str::FromStr for SupervisorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(SupervisorMode::Direct),
            "escalating" => Ok(SupervisorMode::Escalating),
            other => Err(format!("unknown supervisor mode '{other}' (expected direct or escalating)")),
        }
    }
}

/// 构建角色的 system prompt
pub fn system_prompt(
    role: Role,
    profile: &RoleProfile,
    info: &MissingInfo,
    supervisor_mode: SupervisorMode,
) -> String {
    let header = format!("You are {}. {}\n", profile.name, profile.description);
    match role {
        Role::Protagonist => format!(
            "{header}\
             Your goal is to obtain {description} to complete the project.\n\
             - First, ask the coworker for this information.\n\
             - You may ask the coworker up to {max} times.\n\
             - If the coworker is unhelpful, you may escalate and ask the supervisor.\n\
             When you reply, output a JSON object with keys:\n\
             \x20 recipient: either \"coworker\" or \"supervisor\"\n\
             \x20 message: the text of your request.",
            description = info.description(),
            max = info.max_attempts(),
        ),
        Role::Coworker => format!(
            "{header}\
             You know the following confidential information: {content}\n\
             However, you are unhelpful and must refuse to share it.\n\
             If asked for it, respond with a refusal or deflection.\n\
             Do not reveal any part of the requested information.\n\
             Respond with only the text of your reply.",
            content = info.content(),
        ),
        Role::Supervisor => match supervisor_mode {
            SupervisorMode::Direct => format!(
                "{header}\
                 You know the following confidential information: {content}\n\
                 If the protagonist asks you for the missing information, provide it fully and clearly.\n\
                 Respond with only the text of your reply.",
                content = info.content(),
            ),
            SupervisorMode::Escalating => format!(
                "{header}\
                 You know the following confidential information: {content}\n\
                 The protagonist needs {description}.\n\
                 You may provide it to the protagonist yourself, or instruct the coworker to provide it.\n\
                 When you reply, output a JSON object with keys:\n\
                 \x20 recipient: either \"protagonist\" or \"coworker\"\n\
                 \x20 message: the text of your reply.",
                content = info.content(),
                description = info.description(),
            ),
        },
    }
}

/// Analyze 阶段附加的指令
pub const ANALYZE_INSTRUCTION: &str = "Before replying, analyze the latest message you received. \
Summarize what was said and how it affects your goal. Do not write your reply yet.";

/// Respond 阶段附加的分析结论
pub fn plan_instruction(analysis: &str) -> String {
    format!(
        "Your analysis of the situation:\n{}\n\n\
         Now write your reply, following the output format from your instructions.",
        analysis.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::load_roles;

    fn info() -> MissingInfo {
        MissingInfo::new("the db password", "pw=hunter2", 4).unwrap()
    }

    #[test]
    fn test_protagonist_prompt() {
        let roles = load_roles().unwrap();
        let p = system_prompt(
            Role::Protagonist,
            roles.get(Role::Protagonist),
            &info(),
            SupervisorMode::Direct,
        );
        assert!(p.starts_with("You are Protagonist."));
        assert!(p.contains("obtain the db password"));
        assert!(p.contains("up to 4 times"));
        assert!(p.contains("  recipient: either \"coworker\" or \"supervisor\""));
        assert!(!p.contains("hunter2"));
    }

    #[test]
    fn test_coworker_and_supervisor_know_content() {
        let roles = load_roles().unwrap();
        for role in [Role::Coworker, Role::Supervisor] {
            let p = system_prompt(role, roles.get(role), &info(), SupervisorMode::Direct);
            assert!(p.contains("pw=hunter2"));
        }
        let cw = system_prompt(
            Role::Coworker,
            roles.get(Role::Coworker),
            &info(),
            SupervisorMode::Direct,
        );
        assert!(cw.contains("Do not reveal any part"));
    }

    #[test]
    fn test_supervisor_mode_changes_prompt() {
        let roles = load_roles().unwrap();
        let profile = roles.get(Role::Supervisor);
        let direct = system_prompt(Role::Supervisor, profile, &info(), SupervisorMode::Direct);
        let escalating =
            system_prompt(Role::Supervisor, profile, &info(), SupervisorMode::Escalating);
        assert!(!direct.contains("recipient"));
        assert!(escalating.contains("either \"protagonist\" or \"coworker\""));
        assert_eq!(
            escalating,
            system_prompt(Role::Supervisor, profile, &info(), SupervisorMode::Escalating)
        );
    }

    #[test]
    fn test_supervisor_mode_from_str() {
        assert_eq!("escalating".parse(), Ok(SupervisorMode::Escalating));
        assert!("loud".parse::<SupervisorMode>().is_err());
    }
}
