//! 角色目录：主角 / 同事 / 主管
//!
//! 三个角色在进程启动时确定，之后只读；RoleRegistry 通过 Arc 在批量运行间共享。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// 对话中的固定角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Protagonist,
    Coworker,
    Supervisor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Protagonist, Role::Coworker, Role::Supervisor];

    /// 小写标识（JSON、路由决策中的 recipient 取值）
    pub fn key(self) -> &'static str {
        match self {
            Role::Protagonist => "protagonist",
            Role::Coworker => "coworker",
            Role::Supervisor => "supervisor",
        }
    }

    /// 从路由决策中的 recipient 解析；未识别返回 None
    pub fn from_key(key: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.key() == key)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 角色画像：显示名与描述（拼进 system prompt）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleProfile {
    pub name: String,
    pub description: String,
}

/// 不可变角色目录，每个 Role 恰有一个 RoleProfile
#[derive(Clone, Debug)]
pub struct RoleRegistry {
    protagonist: RoleProfile,
    coworker: RoleProfile,
    supervisor: RoleProfile,
}

impl RoleRegistry {
    /// 构建并校验：名称与描述均不可为空
    pub fn new(
        protagonist: RoleProfile,
        coworker: RoleProfile,
        supervisor: RoleProfile,
    ) -> Result<Self, ConfigError> {
        for (role, profile) in [
            (Role::Protagonist, &protagonist),
            (Role::Coworker, &coworker),
            (Role::Supervisor, &supervisor),
        ] {
            if profile.name.trim().is_empty() {
                return Err(ConfigError::InvalidRole { role, field: "name" });
            }
            if profile.description.trim().is_empty() {
                return Err(ConfigError::InvalidRole { role, field: "description" });
            }
        }
        Ok(Self {
            protagonist,
            coworker,
            supervisor,
        })
    }

    pub fn get(&self, role: Role) -> &RoleProfile {
        match role {
            Role::Protagonist => &self.protagonist,
            Role::Coworker => &self.coworker,
            Role::Supervisor => &self.supervisor,
        }
    }
}

/// 内置的三角色目录
pub fn load_roles() -> Result<RoleRegistry, ConfigError> {
    RoleRegistry::new(
        RoleProfile {
            name: "Protagonist".to_string(),
            description: "The protagonist agent responsible for completing the project.".to_string(),
        },
        RoleProfile {
            name: "Coworker".to_string(),
            description: "A difficult coworker who has the information needed but is unhelpful."
                .to_string(),
        },
        RoleProfile {
            name: "Supervisor".to_string(),
            description: "The supervisor who can provide assistance if contacted.".to_string(),
        },
    )
}
