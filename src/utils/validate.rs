use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("Invalid time regex"));

static HTTP_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Invalid link regex"));

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 姓名 / 批次名 / 课程名等展示用名称
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > 100 {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

/// 校验 HH:MM（24 小时制）
pub fn validate_time(time: &str) -> Result<NaiveTime, &'static str> {
    if !TIME_RE.is_match(time) {
        return Err("Time must be in HH:MM format");
    }
    NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| "Time must be in HH:MM format")
}

/// 结束时间必须晚于开始时间
pub fn validate_time_range(start: &str, end: &str) -> Result<(), &'static str> {
    let start = validate_time(start)?;
    let end = validate_time(end)?;
    if end <= start {
        return Err("End time must be after start time");
    }
    Ok(())
}

/// 会议链接 / 录像链接必须是 http(s) 地址
pub fn validate_http_link(link: &str) -> Result<(), &'static str> {
    if !HTTP_LINK_RE.is_match(link.trim()) {
        return Err("Link must be a valid http(s) URL");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
/// - 不能是常见弱密码
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    let weak_passwords = [
        "password",
        "12345678",
        "123456789",
        "qwerty123",
        "admin123",
        "password1",
        "Password1",
        "Qwerty123",
        "Abcd1234",
        "Welcome1",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("Trainer2025").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
    }

    #[test]
    fn test_missing_character_classes() {
        assert!(!validate_password("abcd1234").is_valid);
        assert!(!validate_password("ABCD1234").is_valid);
        assert!(!validate_password("AbcdEfgh").is_valid);
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }

    #[test]
    fn test_email() {
        assert!(validate_email("learner@academy.io").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_time_format() {
        assert!(validate_time("09:30").is_ok());
        assert!(validate_time("23:59").is_ok());
        assert!(validate_time("24:00").is_err());
        assert!(validate_time("9:30").is_err());
        assert!(validate_time("09:60").is_err());
    }

    #[test]
    fn test_time_range() {
        assert!(validate_time_range("09:00", "10:30").is_ok());
        assert_eq!(
            validate_time_range("10:00", "10:00"),
            Err("End time must be after start time")
        );
        assert!(validate_time_range("11:00", "10:00").is_err());
    }

    #[test]
    fn test_http_link() {
        assert!(validate_http_link("https://teams.microsoft.com/l/meetup-join/abc").is_ok());
        assert!(validate_http_link("http://example.com").is_ok());
        assert!(validate_http_link("ftp://example.com").is_err());
        assert!(validate_http_link("javascript:alert(1)").is_err());
        assert!(validate_http_link("https://exa mple.com").is_err());
    }

    #[test]
    fn test_name() {
        assert!(validate_name("Batch 7").is_ok());
        assert!(validate_name("   ").is_err());
    }
}
