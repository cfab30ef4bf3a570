//! Form validation, run before anything is sent to the backend.

use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  Required(&'static str),
  #[error("Enter a valid email address")]
  InvalidEmail,
  #[error("Password must be at least 8 characters and contain a letter and a digit")]
  WeakPassword,
  #[error("Passwords do not match")]
  PasswordMismatch,
  #[error("Username must be 3-32 characters")]
  InvalidUsername,
}

pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    Err(ValidationError::Required(field))
  } else {
    Ok(trimmed)
  }
}

/// One `@`, a non-empty local part, and a dotted domain
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
  let email = require("Email", email)?;
  let Some((local, domain)) = email.split_once('@') else {
    return Err(ValidationError::InvalidEmail);
  };
  let domain_ok = !domain.contains('@')
    && domain.split('.').count() >= 2
    && domain.split('.').all(|part| !part.is_empty());
  if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
    return Err(ValidationError::InvalidEmail);
  }
  Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
  if password.is_empty() {
    return Err(ValidationError::Required("Password"));
  }
  let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
  let has_letter = password.chars().any(char::is_alphabetic);
  let has_digit = password.chars().any(|c| c.is_ascii_digit());
  if long_enough && has_letter && has_digit {
    Ok(())
  } else {
    Err(ValidationError::WeakPassword)
  }
}

pub fn validate_password_match(password: &str, confirm: &str) -> Result<(), ValidationError> {
  if password == confirm {
    Ok(())
  } else {
    Err(ValidationError::PasswordMismatch)
  }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
  let username = require("Username", username)?;
  let len = username.chars().count();
  if (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
    Ok(())
  } else {
    Err(ValidationError::InvalidUsername)
  }
}

/// Everything a new account needs
pub fn validate_new_account(
  username: &str,
  email: &str,
  password: &str,
  confirm: &str,
) -> Result<(), ValidationError> {
  validate_username(username)?;
  validate_email(email)?;
  validate_password(password)?;
  validate_password_match(password, confirm)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_email() {
    assert!(validate_email("learner@example.com").is_ok());
    assert!(validate_email("  learner@example.com ").is_ok());
    assert_eq!(validate_email(""), Err(ValidationError::Required("Email")));
    assert_eq!(validate_email("learner"), Err(ValidationError::InvalidEmail));
    assert_eq!(validate_email("@example.com"), Err(ValidationError::InvalidEmail));
    assert_eq!(validate_email("a@example"), Err(ValidationError::InvalidEmail));
    assert_eq!(validate_email("a@b@c.com"), Err(ValidationError::InvalidEmail));
    assert_eq!(validate_email("a b@c.com"), Err(ValidationError::InvalidEmail));
  }

  #[test]
  fn test_password_strength() {
    assert!(validate_password("secret123").is_ok());
    assert_eq!(validate_password(""), Err(ValidationError::Required("Password")));
    assert_eq!(validate_password("short1"), Err(ValidationError::WeakPassword));
    assert_eq!(validate_password("lettersonly"), Err(ValidationError::WeakPassword));
    assert_eq!(validate_password("1234567890"), Err(ValidationError::WeakPassword));
  }

  #[test]
  fn test_new_account_reports_first_problem() {
    assert!(validate_new_account("newbie", "newbie@example.com", "secret123", "secret123").is_ok());
    assert_eq!(
      validate_new_account("ab", "bad", "x", "y"),
      Err(ValidationError::InvalidUsername)
    );
    assert_eq!(
      validate_new_account("newbie", "newbie@example.com", "secret123", "secret124"),
      Err(ValidationError::PasswordMismatch)
    );
  }

  #[test]
  fn test_messages() {
    assert_eq!(ValidationError::Required("Email").to_string(), "Email is required");
    assert_eq!(
      ValidationError::WeakPassword.to_string(),
      "Password must be at least 8 characters and contain a letter and a digit"
    );
  }
}
