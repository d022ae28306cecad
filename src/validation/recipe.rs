use crate::error::{AppError, Result};

/// Upper bound on prompt length, independent of upstream limits.
pub const MAX_PROMPT_CHARS: usize = 10_000;

/// Upper bound on the base64-encoded image payload (~7 MB, ~5 MB decoded).
pub const MAX_IMAGE_B64_BYTES: usize = 7 * 1024 * 1024;

/// Validates a generation prompt.
///
/// # Arguments
///
/// * `prompt` - The prompt to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the prompt is acceptable.
pub fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("Prompt is required".to_string()));
    }

    if prompt.len() > MAX_PROMPT_CHARS {
        return Err(AppError::Validation("Prompt too long".to_string()));
    }

    Ok(())
}

/// Validates a base64-encoded image payload.
///
/// # Arguments
///
/// * `image_base64` - The encoded image data.
///
/// # Returns
///
/// A `Result<()>` indicating whether the payload is acceptable.
pub fn validate_image(image_base64: &str) -> Result<()> {
    if image_base64.is_empty() {
        return Err(AppError::Validation("Image data is required".to_string()));
    }

    if image_base64.len() > MAX_IMAGE_B64_BYTES {
        return Err(AppError::Validation(
            "Image too large. Please use a smaller image.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_rejected() {
        assert!(validate_prompt("").is_err());
        assert!(validate_prompt("   ").is_err());
    }

    #[test]
    fn long_prompt_rejected() {
        let prompt = "x".repeat(MAX_PROMPT_CHARS + 1);
        assert!(validate_prompt(&prompt).is_err());
        assert!(validate_prompt(&"x".repeat(MAX_PROMPT_CHARS)).is_ok());
    }

    #[test]
    fn image_bounds_enforced() {
        assert!(validate_image("").is_err());
        assert!(validate_image("aGVsbG8=").is_ok());
        assert!(validate_image(&"a".repeat(MAX_IMAGE_B64_BYTES + 1)).is_err());
    }
}
