//! User administration form checks

use emisi_types::ValidationErrors;

/// Password and confirmation must match.
///
/// When editing an existing user an empty password means "unchanged" and is
/// accepted without a confirmation.
pub fn validate_password_pair(
    password: &str,
    confirmation: &str,
    editing: bool,
) -> Result<(), ValidationErrors> {
    if editing && password.is_empty() {
        return Ok(());
    }
    if password.is_empty() {
        return Err(ValidationErrors::single("password", "Password wajib diisi"));
    }
    if password != confirmation {
        return Err(ValidationErrors::single(
            "confirm_password",
            "Password dan konfirmasi tidak cocok",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_passwords() {
        assert!(validate_password_pair("rahasia", "rahasia", false).is_ok());
    }

    #[test]
    fn test_mismatch_is_reported_on_confirmation() {
        let errors = validate_password_pair("rahasia", "rahasia1", false).unwrap_err();
        assert_eq!(errors.fields(), vec!["confirm_password"]);
    }

    #[test]
    fn test_edit_allows_blank_password() {
        assert!(validate_password_pair("", "", true).is_ok());
        assert!(validate_password_pair("", "", false).is_err());
        assert!(validate_password_pair("baru", "", true).is_err());
    }
}
