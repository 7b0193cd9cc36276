//! Mapping of HTTP failures onto `ApiError`

use emisi_types::ApiError;

/// Build the error for a non-success response.
///
/// The backend reports failures as `{"error": "..."}`; some endpoints use
/// `message` instead. Falls back to the status reason phrase.
pub fn status_error(status: u16, reason: Option<&str>, body: &str) -> ApiError {
    let message = body_message(body)
        .unwrap_or_else(|| reason.unwrap_or("Permintaan gagal").to_string());
    match status {
        404 => ApiError::NotFound(message),
        409 => ApiError::Duplicate(message),
        _ => ApiError::Status { status, message },
    }
}

/// Extract `error` or `message` from a JSON body
pub fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

pub(crate) fn transport(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_duplicate() {
        let err = status_error(409, Some("Conflict"), r#"{"error": "Plat nomor sudah terdaftar"}"#);
        assert_eq!(err, ApiError::Duplicate("Plat nomor sudah terdaftar".to_string()));
    }

    #[test]
    fn test_message_key_fallback() {
        let err = status_error(400, Some("Bad Request"), r#"{"message": "Missing required fields"}"#);
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: "Missing required fields".to_string()
            }
        );
    }

    #[test]
    fn test_non_json_body_uses_reason() {
        let err = status_error(500, Some("Internal Server Error"), "<html>oops</html>");
        assert_eq!(err.message(), "Internal Server Error");
        let err = status_error(404, None, "");
        assert_eq!(err, ApiError::NotFound("Permintaan gagal".to_string()));
    }
}
