//! Local checks on a replacement password, run before anything is sent.

use std::fmt;

/// Minimum length for a new panel password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRequirement {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    SpecialChar,
}

impl fmt::Display for PasswordRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength => write!(f, "at least {} characters", MIN_PASSWORD_LENGTH),
            Self::Uppercase => write!(f, "an uppercase letter"),
            Self::Lowercase => write!(f, "a lowercase letter"),
            Self::Digit => write!(f, "a digit"),
            Self::SpecialChar => write!(f, "a special character"),
        }
    }
}

pub fn unmet_requirements(password: &str) -> Vec<PasswordRequirement> {
    let checks = [
        (PasswordRequirement::MinLength, password.chars().count() >= MIN_PASSWORD_LENGTH),
        (PasswordRequirement::Uppercase, password.chars().any(char::is_uppercase)),
        (PasswordRequirement::Lowercase, password.chars().any(char::is_lowercase)),
        (PasswordRequirement::Digit, password.chars().any(|c| c.is_ascii_digit())),
        (
            PasswordRequirement::SpecialChar,
            password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        ),
    ];
    checks
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(req, _)| req)
        .collect()
}

/// Validate a rotation request. Returns a message suitable for display.
pub fn check_rotation(current: &str, new: &str, confirm: &str) -> Result<(), String> {
    if current.is_empty() {
        return Err("Current password is required".to_string());
    }
    if new != confirm {
        return Err("New passwords do not match".to_string());
    }
    if new == current {
        return Err("New password must differ from the current one".to_string());
    }
    let unmet = unmet_requirements(new);
    if !unmet.is_empty() {
        let list: Vec<String> = unmet.iter().map(ToString::to_string).collect();
        return Err(format!("New password needs {}", list.join(", ")));
    }
    Ok(())
}
