use hatchr_shared::errors::{AppError, ErrorCode};

pub const MIN_LEN: usize = 3;
pub const MAX_LEN: usize = 30;

/// Checks the username rule and returns the stored (lowercase) form.
pub fn normalize(raw: Option<&str>) -> Result<String, AppError> {
    let name = raw
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::InvalidUsername, "username is required"))?;

    if !(MIN_LEN..=MAX_LEN).contains(&name.len()) {
        return Err(AppError::new(
            ErrorCode::InvalidUsername,
            format!("username must be {MIN_LEN}-{MAX_LEN} characters long"),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::new(
            ErrorCode::InvalidUsername,
            "username can only contain letters, numbers, and underscores",
        ));
    }

    Ok(name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_valid_names() {
        assert_eq!(normalize(Some("Ada_Lovelace1")).unwrap(), "ada_lovelace1");
        assert_eq!(normalize(Some("abc")).unwrap(), "abc");
        assert_eq!(normalize(Some(&"a".repeat(30))).unwrap().len(), 30);
    }

    #[test]
    fn rejects_length_and_charset_violations() {
        for bad in [None, Some(""), Some("ab"), Some("has space"), Some("dash-ed"), Some("émile")] {
            assert_eq!(normalize(bad).unwrap_err().code(), Some(ErrorCode::InvalidUsername), "{bad:?}");
        }
        assert!(normalize(Some(&"a".repeat(31))).is_err());
    }
}
