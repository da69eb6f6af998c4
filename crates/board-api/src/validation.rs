//! Signin/signup input rules
//!
//! Shared by the proxy (server-side check before contacting the backend) and
//! the client forms. The `Display` text of each error is the message shown
//! to the user.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{SigninRequest, SignupRequest};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}$").expect("email pattern")
});

/// Every password character must come from this set
static PASSWORD_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9!%*#?&]{8,}$").expect("password pattern"));

const PASSWORD_SPECIALS: &[char] = &['!', '%', '*', '#', '?', '&'];

/// Rejected signin/signup input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("이메일과 비밀번호를 모두 입력해주세요.")]
    MissingCredentials,

    #[error("모든 필드를 입력해주세요.")]
    MissingFields,

    #[error("이메일 형식이 올바르지 않습니다.")]
    InvalidEmail,

    #[error("비밀번호가 일치하지 않습니다.")]
    PasswordMismatch,

    #[error(
        "비밀번호는 8자 이상이어야 하며, 영문자, 숫자, 특수문자(!%*#?&)를 각각 하나 이상 포함해야 합니다."
    )]
    WeakPassword,
}

pub fn is_valid_email(username: &str) -> bool {
    EMAIL.is_match(username)
}

/// At least 8 characters from `[A-Za-z0-9!%*#?&]`, with one letter, one digit
/// and one special character.
pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_CHARSET.is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(&c))
}

pub fn validate_signin(req: &SigninRequest) -> Result<(), ValidationError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

/// Checks run in the order the user sees them: presence, email, match, strength.
pub fn validate_signup(req: &SignupRequest) -> Result<(), ValidationError> {
    if req.username.is_empty()
        || req.name.is_empty()
        || req.password.is_empty()
        || req.confirm_password.is_empty()
    {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_email(&req.username) {
        return Err(ValidationError::InvalidEmail);
    }
    if req.password != req.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if !is_valid_password(&req.password) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.into(),
            name: "Kim".into(),
            password: password.into(),
            confirm_password: password.into(),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("kim.chulsoo@example.co.kr"));
        assert!(is_valid_email("a_b-c@sub.domain.io"));
        assert!(!is_valid_email("kim"));
        assert!(!is_valid_email("kim@example"));
        assert!(!is_valid_email("kim@example.c"));
        assert!(!is_valid_email("kim+tag@example.com"));
        assert!(!is_valid_email("kim@example.toolongtld"));
    }

    #[test]
    fn password_pattern() {
        assert!(is_valid_password("abcd123!"));
        assert!(is_valid_password("Passw0rd#Long"));
        assert!(!is_valid_password("abc12!"), "too short");
        assert!(!is_valid_password("abcdefg!"), "no digit");
        assert!(!is_valid_password("1234567!"), "no letter");
        assert!(!is_valid_password("abcd1234"), "no special");
        assert!(!is_valid_password("abcd123!@"), "@ is outside the allowed set");
        assert!(!is_valid_password("비밀번호123!"), "non-ascii letters");
    }

    #[test]
    fn signin_requires_both_fields() {
        let req = SigninRequest {
            username: "kim@example.com".into(),
            password: String::new(),
        };
        assert_eq!(
            validate_signin(&req),
            Err(ValidationError::MissingCredentials)
        );
    }

    #[test]
    fn signup_checks_in_order() {
        let mut req = signup("kim@example.com", "abcd123!");
        assert_eq!(validate_signup(&req), Ok(()));

        req.name.clear();
        assert_eq!(validate_signup(&req), Err(ValidationError::MissingFields));

        let req = signup("not-an-email", "weak");
        assert_eq!(validate_signup(&req), Err(ValidationError::InvalidEmail));

        let mut req = signup("kim@example.com", "abcd123!");
        req.confirm_password = "abcd123?".into();
        assert_eq!(validate_signup(&req), Err(ValidationError::PasswordMismatch));

        let req = signup("kim@example.com", "abcdefgh");
        assert_eq!(validate_signup(&req), Err(ValidationError::WeakPassword));
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ValidationError::InvalidEmail.to_string(),
            "이메일 형식이 올바르지 않습니다."
        );
        assert!(ValidationError::WeakPassword.to_string().contains("8자 이상"));
    }
}
