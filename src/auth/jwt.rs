//! JWT 令牌服务
//!
//! 处理 JWT 令牌的生成、验证和解析。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::models::{Member, Role};

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (应至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: load_jwt_secret(),
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440), // 默认 24 小时
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "approval-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "approval-clients".to_string()),
        }
    }
}

/// 从环境变量加载 JWT 密钥
///
/// 生产构建必须设置 `JWT_SECRET`，开发构建缺省时使用固定开发密钥
fn load_jwt_secret() -> String {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if secret.len() >= 32 => secret,
        Ok(_) => panic!("JWT_SECRET must be at least 32 characters long"),
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!("⚠️  JWT_SECRET not set! Using fixed development key.");
                "approval-server-development-key-do-not-use-in-prod".to_string()
            }
            #[cfg(not(debug_assertions))]
            {
                panic!("JWT_SECRET environment variable must be set in production!");
            }
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 成员 ID (Subject)
    pub sub: String,
    /// 登录名
    pub username: String,
    /// 显示名
    pub display_name: String,
    /// 角色 (employee | team_leader | center_director)
    pub role: Role,
    /// 所属部门 (中心主任为空)
    pub department_id: Option<String>,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// JWT 令牌服务
#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// 使用默认配置创建新的 JWT 服务
    pub fn new() -> Self {
        Self::with_config(JwtConfig::default())
    }

    /// 使用指定配置创建新的 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为成员生成新令牌
    pub fn generate_token(&self, member: &Member) -> Result<String, JwtError> {
        let now = Utc::now();
        let expires = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: member.id.clone(),
            username: member.username.clone(),
            display_name: member.display_name.clone(),
            role: member.role,
            department_id: member.department_id.clone(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证令牌并返回 Claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// 从 `Authorization: Bearer <token>` 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

/// 当前登录成员
///
/// 由认证中间件注入请求扩展，处理器通过提取器获取：
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> AppResult<Json<()>> {
///     if user.role == Role::TeamLeader { /* ... */ }
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// 成员 ID
    pub id: String,
    /// 登录名
    pub username: String,
    /// 显示名
    pub display_name: String,
    /// 角色
    pub role: Role,
    /// 所属部门 (中心主任为空)
    pub department_id: Option<String>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            display_name: claims.display_name,
            role: claims.role,
            department_id: claims.department_id,
        }
    }
}

impl CurrentUser {
    /// 团队领导所属部门；非团队领导或缺部门时报错
    pub fn supervised_department(&self) -> Result<&str, crate::AppError> {
        match (&self.role, self.department_id.as_deref()) {
            (Role::TeamLeader, Some(dept)) => Ok(dept),
            (Role::TeamLeader, None) => Err(crate::AppError::internal(
                "Team leader account has no department",
            )),
            _ => Err(crate::AppError::forbidden(
                "Team leader role required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(role: Role, department_id: Option<&str>) -> Member {
        Member {
            id: "member-1".to_string(),
            username: "kim".to_string(),
            display_name: "Kim".to_string(),
            hash_pass: String::new(),
            role,
            department_id: department_id.map(String::from),
            is_active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = JwtService::new();
        let token = service
            .generate_token(&member(Role::TeamLeader, Some("dept-1")))
            .expect("Failed to generate test token");

        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");

        assert_eq!(claims.sub, "member-1");
        assert_eq!(claims.username, "kim");
        assert_eq!(claims.role, Role::TeamLeader);
        assert_eq!(claims.department_id.as_deref(), Some("dept-1"));
    }

    #[test]
    fn test_current_user_from_claims() {
        let service = JwtService::new();
        let token = service
            .generate_token(&member(Role::CenterDirector, None))
            .expect("Failed to generate test token");
        let claims = service.validate_token(&token).expect("valid token");

        let user = CurrentUser::from(claims);
        assert_eq!(user.role, Role::CenterDirector);
        assert_eq!(user.department_id, None);
        assert!(user.supervised_department().is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = JwtService::new();
        assert!(matches!(
            service.validate_token("not-a-token"),
            Err(JwtError::InvalidToken(_))
        ));
    }
}
