use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{AcademyError, Result};
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_ADMIN_EMAIL: &str = "admin@academy.local";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 创建缓存实例，配置的后端不可用时回退到 moka
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();
    let cache_type = config.cache.cache_type.as_str();

    warn!("Attempting to create {} cache backend", cache_type);

    let mut candidates = vec![cache_type];
    if cache_type != "moka" {
        candidates.push("moka");
    }

    for name in candidates {
        let Some(constructor) = get_object_cache_plugin(name) else {
            warn!("Cache backend '{}' not found in registry", name);
            continue;
        };
        match constructor().await {
            Ok(cache) => {
                warn!("Successfully created {} cache backend", name);
                return Ok(Arc::from(cache));
            }
            Err(e) => warn!("Failed to create {} cache: {}", name, e),
        }
    }

    Err(AcademyError::cache_plugin_not_found(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 用户表为空时创建管理员账号，已有用户时返回 `None`
pub async fn seed_admin_with(
    storage: &Arc<dyn Storage>,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    let count = storage.count_users().await?;
    if count > 0 {
        debug!("Database already has {} user(s), skipping admin seed", count);
        return Ok(None);
    }

    info!("No users found in database, creating default admin account...");

    let admin_request = CreateUserRequest {
        name: "Administrator".to_string(),
        email: email.to_lowercase(),
        password: hash_password(password)?,
        role: UserRole::Admin,
        phone: None,
        subject: None,
        profile_image: None,
        batch_id: None,
    };

    storage.create_user(admin_request).await.map(Some)
}

/// 初始化默认管理员账号
///
/// 密码优先取 `ADMIN_PASSWORD`，未设置时生成随机密码并输出到日志。
async fn seed_admin(storage: &Arc<dyn Storage>) {
    let email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let password = std::env::var("ADMIN_PASSWORD").ok();
    let generated = password.is_none();
    let password = password.unwrap_or_else(|| generate_random_password(16));

    match seed_admin_with(storage, &email, &password).await {
        Ok(Some(user)) => {
            info!(
                "Default admin account created (ID: {}, email: {})",
                user.id, user.email
            );
            if generated {
                warn!("==========================================================");
                warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
                warn!("  Generated admin password: {}", password);
                warn!("  Please save this password or set ADMIN_PASSWORD env var");
                warn!("==========================================================");
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to seed admin account: {}", e),
    }
}

/// 准备服务器启动的上下文：存储（含迁移）、管理员账号、缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}
