use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

/// 活动编号的合法形态: 字母/数字/下划线/连字符, 1-64 位。
/// 平台生成的编号形如 RIFA-8F3K2; 这里只做边界校验, 不做存在性判断。
fn code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid raffle code regex"))
}

/// 校验活动编号, 返回去除首尾空白后的编号。
/// 空值与非法字符统一报 "Código de rifa requerido" (静态西语文案, 见错误设计)。
pub fn validate_raffle_code(raw: &str) -> AppResult<&str> {
    let code = raw.trim();
    if code.is_empty() || !code_regex().is_match(code) {
        return Err(AppError::ValidationError(
            "Código de rifa requerido".to_string(),
        ));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_raffle_code() {
        assert_eq!(validate_raffle_code("RIFA-001").unwrap(), "RIFA-001");
        assert_eq!(validate_raffle_code("  RIFA-001 ").unwrap(), "RIFA-001");
        assert!(validate_raffle_code("").is_err());
        assert!(validate_raffle_code("   ").is_err());
        assert!(validate_raffle_code("rifa con espacios").is_err());
        assert!(validate_raffle_code(&"X".repeat(65)).is_err());
    }
}
