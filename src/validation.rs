use colored::Colorize;
use inquire::Text;
use validator::ValidateEmail;

use crate::account::Account;
use crate::error::AppError;
use crate::menu::BACK_OPTION;

/// Maximum length for an account name
const MAX_NAME_LENGTH: usize = 30;
/// Maximum length for a Git username
const MAX_USERNAME_LENGTH: usize = 30;
/// Maximum length for a Git email address
const MAX_EMAIL_LENGTH: usize = 100;

/// Prompts user for input until valid input is provided
pub fn prompt_until_valid<F>(prompt_message: &str, input_validation: F) -> Result<String, AppError>
where
    F: Fn(&str) -> Result<(), AppError>,
{
    loop {
        let input: String = Text::new(prompt_message).prompt()?;
        match input_validation(&input) {
            Ok(_) => break Ok(input),
            Err(AppError::Validation(msg)) => println!("{}", msg.red()),
            Err(e) => return Err(e),
        }
    }
}

// Validate input helper functions
//
// These pre-validate interactive input; the registry remains the authority
// on the name uniqueness rule.

/// Validates an account name input
pub fn validate_input_name(name: &str, existing_accounts: &[Account]) -> Result<(), AppError> {
    if name.trim().is_empty() {
        Err(AppError::Validation("Account name cannot be empty".to_string()))
    } else if name.len() > MAX_NAME_LENGTH {
        Err(AppError::Validation(format!(
            "Account name too long (max {} characters)",
            MAX_NAME_LENGTH
        )))
    } else if name == BACK_OPTION {
        Err(AppError::Validation("Account name cannot be 'back'".to_string()))
    } else if existing_accounts
        .iter()
        .any(|account| account.name.to_lowercase() == name.to_lowercase())
    {
        Err(AppError::Validation("Account name already exists".to_string()))
    } else {
        Ok(())
    }
}

/// Validates username input
pub fn validate_input_username(name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        Err(AppError::Validation("Username cannot be empty".to_string()))
    } else if name.len() > MAX_USERNAME_LENGTH {
        Err(AppError::Validation(format!(
            "Username too long (max {} characters)",
            MAX_USERNAME_LENGTH
        )))
    } else {
        Ok(())
    }
}

/// Validates email input
pub fn validate_input_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        Err(AppError::Validation("Email cannot be empty".to_string()))
    } else if email.len() > MAX_EMAIL_LENGTH {
        Err(AppError::Validation(format!(
            "Email too long (max {} characters)",
            MAX_EMAIL_LENGTH
        )))
    } else if !email.validate_email() {
        Err(AppError::Validation("Invalid email format".to_string()))
    } else {
        Ok(())
    }
}

/// Validates a required free-form input such as a key path or host alias
pub fn validate_input_required(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{what} cannot be empty")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::token_account;

    #[test]
    fn name_duplicates_are_rejected_case_insensitively() {
        let existing = vec![token_account("Work", "alice", "alice@co.com")];
        assert!(validate_input_name("wOrK", &existing).is_err());
        assert!(validate_input_name("Personal", &existing).is_ok());
    }

    #[test]
    fn email_format_is_checked() {
        assert!(validate_input_email("alice@co.com").is_ok());
        assert!(validate_input_email("not-an-email").is_err());
    }
}
