//! 数据仓库 - 业务能力层
//!
//! 持有 用户/成绩/自建题库/考试配置/管理员密码 的内存镜像；
//! 只有 `load` 和 `commit` 接触存储。修改先在副本上进行，
//! 写入成功后才替换内存镜像，写入失败时内存保持原样

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppResult, ValidationError};
use crate::infrastructure::KvStore;
use crate::models::{
    Grade, GradeConfig, Principal, Question, QuizResult, Registration, Role, User, ADMIN_USERNAME,
};
use crate::services::exam_gate::{self, ExamConfigs};
use crate::utils::new_id;

pub const USERS_KEY: &str = "pe_users";
pub const RESULTS_KEY: &str = "pe_results";
pub const QUESTIONS_KEY: &str = "pe_custom_questions";
pub const EXAM_CONFIGS_KEY: &str = "pe_exam_configs";
pub const ADMIN_PASSWORD_KEY: &str = "pe_admin_password";

/// 数据仓库
///
/// 每次修改写回对应的键（读-改-写，单写者）
pub struct Repository<S: KvStore> {
    store: S,
    users: Vec<User>,
    results: Vec<QuizResult>,
    questions: Vec<Question>,
    exam_configs: ExamConfigs,
    admin_password: String,
}

impl<S: KvStore> Repository<S> {
    /// 从存储加载全部数据，缺失的键使用默认值
    pub fn load(store: S, default_admin_password: &str) -> AppResult<Self> {
        let users: Vec<User> = store.get_json_or_default(USERS_KEY)?;
        let results: Vec<QuizResult> = store.get_json_or_default(RESULTS_KEY)?;
        let questions: Vec<Question> = store.get_json_or_default(QUESTIONS_KEY)?;
        let exam_configs: ExamConfigs = store.get_json_or_default(EXAM_CONFIGS_KEY)?;
        let admin_password: Option<String> = store.get_json_or_default(ADMIN_PASSWORD_KEY)?;

        info!(
            "✓ 数据加载完成: 用户 {} 个, 成绩 {} 条, 自建题目 {} 道",
            users.len(),
            results.len(),
            questions.len()
        );

        Ok(Self {
            store,
            users,
            results,
            questions,
            exam_configs,
            admin_password: admin_password.unwrap_or_else(|| default_admin_password.to_string()),
        })
    }

    /// 写入暂存的新值，成功后替换内存镜像
    fn commit<T: Serialize>(store: &mut S, key: &str, slot: &mut T, staged: T) -> AppResult<()> {
        store.set_json(key, &staged)?;
        *slot = staged;
        debug!("键 {} 已写回存储", key);
        Ok(())
    }

    /// 取回底层存储
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// 成绩集合，最新的在前
    pub fn results(&self) -> &[QuizResult] {
        &self.results
    }

    pub fn authored_questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn exam_configs(&self) -> &ExamConfigs {
        &self.exam_configs
    }

    // ========== 用户 ==========

    /// 注册新用户
    pub fn register(&mut self, form: Registration, now: DateTime<Utc>) -> AppResult<User> {
        let name = form.name.trim();
        let username = form.username.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        if username.is_empty() {
            return Err(ValidationError::EmptyField { field: "username" }.into());
        }
        if form.password.is_empty() {
            return Err(ValidationError::EmptyField { field: "password" }.into());
        }
        if form.password != form.confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if username == ADMIN_USERNAME || self.users.iter().any(|u| u.username == username) {
            return Err(ValidationError::DuplicateUsername {
                username: username.to_string(),
            }
            .into());
        }

        let user = User {
            id: new_id("u", now),
            name: name.to_string(),
            username: username.to_string(),
            password: form.password,
            class_name: form.class_name.filter(|c| !c.trim().is_empty()),
            grade: form.grade,
            role: form.role.unwrap_or(Role::Student),
        };
        let mut users = self.users.clone();
        users.push(user.clone());
        Self::commit(&mut self.store, USERS_KEY, &mut self.users, users)?;

        info!("✓ 新用户注册: {} ({:?})", user.username, user.role);
        Ok(user)
    }

    /// 登录，明文比较密码
    pub fn login(&self, username: &str, password: &str) -> AppResult<Principal> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::EmptyField { field: "username" }.into());
        }

        if username == ADMIN_USERNAME {
            return if password == self.admin_password {
                Ok(Principal::Admin)
            } else {
                Err(ValidationError::InvalidCredentials.into())
            };
        }

        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(|u| Principal::User(u.clone()))
            .ok_or_else(|| ValidationError::InvalidCredentials.into())
    }

    /// 修改密码，需要验证旧密码
    pub fn change_password(
        &mut self,
        principal: &Principal,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        if new_password.is_empty() {
            return Err(ValidationError::EmptyField { field: "password" }.into());
        }
        if new_password != confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }

        match principal {
            Principal::Admin => {
                if old_password != self.admin_password {
                    return Err(ValidationError::InvalidCredentials.into());
                }
                Self::commit(
                    &mut self.store,
                    ADMIN_PASSWORD_KEY,
                    &mut self.admin_password,
                    new_password.to_string(),
                )?;
            }
            Principal::User(user) => {
                let mut users = self.users.clone();
                let stored = users
                    .iter_mut()
                    .find(|u| u.id == user.id)
                    .ok_or_else(|| ValidationError::UnknownUser {
                        user_id: user.id.clone(),
                    })?;
                if stored.password != old_password {
                    return Err(ValidationError::InvalidCredentials.into());
                }
                stored.password = new_password.to_string();
                Self::commit(&mut self.store, USERS_KEY, &mut self.users, users)?;
            }
        }

        info!("✓ 用户 {} 已修改密码", principal.user_id());
        Ok(())
    }

    // ========== 成绩 ==========

    /// 新成绩插入到最前面
    pub fn record_result(&mut self, result: QuizResult) -> AppResult<()> {
        let summary = format!(
            "{} | {} | {:.1} 分",
            result.student_name, result.label, result.score
        );
        let mut results = Vec::with_capacity(self.results.len() + 1);
        results.push(result);
        results.extend(self.results.iter().cloned());
        Self::commit(&mut self.store, RESULTS_KEY, &mut self.results, results)?;
        info!("✓ 保存成绩: {}", summary);
        Ok(())
    }

    // ========== 自建题库 ==========

    /// 录入新题目，ID 为空时自动生成
    pub fn add_question(&mut self, mut question: Question, now: DateTime<Utc>) -> AppResult<Question> {
        question.validate()?;
        if question.id.trim().is_empty() || self.questions.iter().any(|q| q.id == question.id) {
            question.id = new_id("q", now);
        }
        let mut staged = self.questions.clone();
        staged.push(question.clone());
        Self::commit(&mut self.store, QUESTIONS_KEY, &mut self.questions, staged)?;
        info!("✓ 新增题目 {}", question.id);
        Ok(question)
    }

    /// 批量录入（如 AI 生成的题目），全部合法才写入
    pub fn add_questions(&mut self, questions: Vec<Question>, now: DateTime<Utc>) -> AppResult<usize> {
        for q in &questions {
            q.validate()?;
        }
        let count = questions.len();
        let mut staged = self.questions.clone();
        for (i, mut q) in questions.into_iter().enumerate() {
            if q.id.trim().is_empty() || staged.iter().any(|p| p.id == q.id) {
                q.id = format!("{}-{}", new_id("q", now), i);
            }
            staged.push(q);
        }
        Self::commit(&mut self.store, QUESTIONS_KEY, &mut self.questions, staged)?;
        info!("✓ 批量新增 {} 道题目", count);
        Ok(count)
    }

    /// 修改已有题目
    pub fn update_question(&mut self, question: Question) -> AppResult<()> {
        question.validate()?;
        let mut staged = self.questions.clone();
        let slot = staged
            .iter_mut()
            .find(|q| q.id == question.id)
            .ok_or_else(|| ValidationError::UnknownQuestion {
                question_id: question.id.clone(),
            })?;
        *slot = question;
        Self::commit(&mut self.store, QUESTIONS_KEY, &mut self.questions, staged)
    }

    /// 删除题目
    pub fn delete_question(&mut self, question_id: &str) -> AppResult<()> {
        let mut staged = self.questions.clone();
        staged.retain(|q| q.id != question_id);
        if staged.len() == self.questions.len() {
            return Err(ValidationError::UnknownQuestion {
                question_id: question_id.to_string(),
            }
            .into());
        }
        Self::commit(&mut self.store, QUESTIONS_KEY, &mut self.questions, staged)
    }

    // ========== 考试配置 ==========

    pub fn exam_config(&self, grade: Grade) -> Option<&GradeConfig> {
        self.exam_configs.get(&grade)
    }

    pub fn set_exam_window(
        &mut self,
        grade: Grade,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_minutes: u32,
    ) -> AppResult<()> {
        let mut staged = self.exam_configs.clone();
        exam_gate::set_exam_window(&mut staged, grade, start, end, duration_minutes)?;
        Self::commit(&mut self.store, EXAM_CONFIGS_KEY, &mut self.exam_configs, staged)
    }

    pub fn toggle_exam_active(&mut self, grade: Grade) -> AppResult<bool> {
        let mut staged = self.exam_configs.clone();
        let active = exam_gate::toggle_exam_active(&mut staged, grade);
        Self::commit(&mut self.store, EXAM_CONFIGS_KEY, &mut self.exam_configs, staged)?;
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, StoreError};
    use crate::infrastructure::MemoryStore;
    use chrono::Duration;

    /// 读正常、写总是失败的存储
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    impl KvStore for ReadOnlyStore {
        fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, _value: String) -> AppResult<()> {
            Err(StoreError::WriteFailed {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            }
            .into())
        }
    }

    fn repo() -> Repository<MemoryStore> {
        Repository::load(MemoryStore::new(), "admin123").unwrap()
    }

    fn form(username: &str) -> Registration {
        Registration {
            name: "Phạm Hoa".into(),
            username: username.into(),
            password: "abc".into(),
            confirm_password: "abc".into(),
            class_name: Some("5A".into()),
            grade: Grade::new(5),
            role: None,
        }
    }

    fn question(id: &str) -> Question {
        Question::new(id, "Câu?", vec!["a".into(), "b".into(), "c".into(), "d".into()], 3)
    }

    #[test]
    fn test_register_and_login() {
        let mut repo = repo();
        let user = repo.register(form("hoa"), Utc::now()).unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(repo.login("hoa", "abc").unwrap(), Principal::User(user));
        assert!(matches!(
            repo.login("hoa", "wrong"),
            Err(AppError::Validation(ValidationError::InvalidCredentials))
        ));
        assert_eq!(repo.login("admin", "admin123").unwrap(), Principal::Admin);
    }

    #[test]
    fn test_register_validation_leaves_state_unchanged() {
        let mut repo = repo();
        repo.register(form("hoa"), Utc::now()).unwrap();

        let dup = repo.register(form("hoa"), Utc::now());
        assert!(matches!(
            dup,
            Err(AppError::Validation(ValidationError::DuplicateUsername { .. }))
        ));

        let mut mismatch = form("lan");
        mismatch.confirm_password = "xyz".into();
        assert!(matches!(
            repo.register(mismatch, Utc::now()),
            Err(AppError::Validation(ValidationError::PasswordMismatch))
        ));

        let mut empty = form("mai");
        empty.name = " ".into();
        assert!(repo.register(empty, Utc::now()).is_err());
        assert!(repo.register(form("admin"), Utc::now()).is_err());

        assert_eq!(repo.users().len(), 1);
    }

    #[test]
    fn test_change_password() {
        let mut repo = repo();
        let user = repo.register(form("hoa"), Utc::now()).unwrap();
        let principal = Principal::User(user);

        assert!(repo.change_password(&principal, "bad", "new", "new").is_err());
        repo.change_password(&principal, "abc", "new", "new").unwrap();
        assert!(repo.login("hoa", "new").is_ok());

        repo.change_password(&Principal::Admin, "admin123", "root", "root").unwrap();
        assert!(repo.login("admin", "root").is_ok());
    }

    #[test]
    fn test_user_round_trips_through_store() {
        let mut repo = repo();
        let user = repo.register(form("hoa"), Utc::now()).unwrap();

        let store = repo.into_store();
        let reloaded = Repository::load(store, "ignored").unwrap();
        assert_eq!(reloaded.users(), &[user]);
        assert_eq!(reloaded.login("admin", "admin123").unwrap(), Principal::Admin);
    }

    #[test]
    fn test_results_are_prepended() {
        let mut repo = repo();
        for i in 0..3 {
            let mut r = crate::services::scoring::build_result(
                &crate::models::Examinee {
                    user_id: "u".into(),
                    student_name: "A".into(),
                    class_name: String::new(),
                },
                &[],
                &[],
                format!("practice {}", i),
                Utc::now(),
            );
            r.id = format!("r{}", i);
            repo.record_result(r).unwrap();
        }
        let ids: Vec<&str> = repo.results().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1", "r0"]);
    }

    #[test]
    fn test_question_authoring() {
        let mut repo = repo();
        let added = repo.add_question(question(""), Utc::now()).unwrap();
        assert!(!added.id.is_empty());

        let mut edited = added.clone();
        edited.text = "Câu đã sửa?".into();
        repo.update_question(edited).unwrap();
        assert_eq!(repo.authored_questions()[0].text, "Câu đã sửa?");

        let mut bad = question("x");
        bad.correct_index = 7;
        assert!(repo.add_question(bad, Utc::now()).is_err());

        repo.delete_question(&added.id).unwrap();
        assert!(repo.authored_questions().is_empty());
        assert!(repo.delete_question(&added.id).is_err());
    }

    #[test]
    fn test_bulk_add_is_all_or_nothing() {
        let mut repo = repo();
        let mut bad = question("b");
        bad.options.truncate(2);
        assert!(repo.add_questions(vec![question("a"), bad], Utc::now()).is_err());
        assert!(repo.authored_questions().is_empty());
        assert_eq!(repo.add_questions(vec![question("a"), question("a")], Utc::now()).unwrap(), 2);
        assert_ne!(repo.authored_questions()[0].id, repo.authored_questions()[1].id);
    }

    #[test]
    fn test_exam_config_persisted() {
        let mut repo = repo();
        let grade = Grade::new(1).unwrap();
        let start = Utc::now();
        repo.set_exam_window(grade, start, start + Duration::hours(1), 20).unwrap();
        assert!(repo.toggle_exam_active(grade).unwrap());

        let reloaded = Repository::load(repo.into_store(), "admin123").unwrap();
        let cfg = reloaded.exam_config(grade).unwrap();
        assert!(cfg.active);
        assert_eq!(cfg.duration_minutes, 20);
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut seeded = repo();
        let user = seeded.register(form("hoa"), Utc::now()).unwrap();
        seeded.add_question(question("q1"), Utc::now()).unwrap();
        let mut repo = Repository::load(
            ReadOnlyStore {
                inner: seeded.into_store(),
            },
            "admin123",
        )
        .unwrap();

        assert!(matches!(
            repo.register(form("lan"), Utc::now()),
            Err(AppError::Store(StoreError::WriteFailed { .. }))
        ));
        assert_eq!(repo.users().len(), 1);

        let result = crate::services::scoring::build_result(
            &crate::models::Examinee::from(&Principal::User(user.clone())),
            &[],
            &[],
            "practice grade 5".to_string(),
            Utc::now(),
        );
        assert!(repo.record_result(result).is_err());
        assert!(repo.results().is_empty());

        assert!(repo.add_question(question("q2"), Utc::now()).is_err());
        assert!(repo.add_questions(vec![question("q3")], Utc::now()).is_err());
        assert!(repo.delete_question("q1").is_err());
        assert_eq!(repo.authored_questions().len(), 1);

        let grade = Grade::new(5).unwrap();
        let start = Utc::now();
        assert!(repo.set_exam_window(grade, start, start + Duration::hours(1), 15).is_err());
        assert!(repo.toggle_exam_active(grade).is_err());
        assert!(repo.exam_config(grade).is_none());

        let principal = Principal::User(user);
        assert!(repo.change_password(&principal, "abc", "new", "new").is_err());
        assert!(repo.login("hoa", "abc").is_ok());
        assert!(repo.change_password(&Principal::Admin, "admin123", "root", "root").is_err());
        assert!(repo.login("admin", "admin123").is_ok());
    }
}
