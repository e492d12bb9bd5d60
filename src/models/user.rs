use serde::{Deserialize, Serialize};

use crate::models::Grade;

/// 管理员伪用户的用户名
pub const ADMIN_USERNAME: &str = "admin";

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Teacher,
}

/// 注册用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    pub role: Role,
}

/// 当前登录身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// 管理员（不在用户集合中）
    Admin,
    /// 普通注册用户
    User(User),
}

impl Principal {
    /// 教师和管理员有特权：绕过考试时间窗口和单次作答限制，可查看全部成绩
    pub fn is_privileged(&self) -> bool {
        match self {
            Principal::Admin => true,
            Principal::User(user) => user.role == Role::Teacher,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Principal::Admin => ADMIN_USERNAME,
            Principal::User(user) => &user.id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Principal::Admin => "Quản trị viên",
            Principal::User(user) => &user.name,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Principal::Admin => "",
            Principal::User(user) => user.class_name.as_deref().unwrap_or(""),
        }
    }
}

/// 成绩记录上冗余保存的答题人信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Examinee {
    pub user_id: String,
    pub student_name: String,
    pub class_name: String,
}

impl From<&Principal> for Examinee {
    fn from(principal: &Principal) -> Self {
        Self {
            user_id: principal.user_id().to_string(),
            student_name: principal.display_name().to_string(),
            class_name: principal.class_name().to_string(),
        }
    }
}

/// 注册表单
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub class_name: Option<String>,
    pub grade: Option<Grade>,
    pub role: Option<Role>,
}
