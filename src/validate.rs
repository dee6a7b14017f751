use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("Please enter the text to analyze")]
    EmptyText,
    #[error("Image data is empty")]
    EmptyImage,
    #[error("Invalid image data: {0}")]
    InvalidBase64(String),
}

/// Returns the trimmed text, rejecting blank input.
pub fn validate_text(text: &str) -> Result<&str, InvalidInput> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::EmptyText);
    }
    Ok(trimmed)
}

/// Normalizes an uploaded image and checks that it decodes.
///
/// Browsers hand over `FileReader` data URLs, so a `data:<mime>;base64,`
/// prefix is dropped, as is any line wrapping. The returned string is what
/// gets forwarded to OCR.
pub fn validate_image(image: &str) -> Result<String, InvalidInput> {
    let payload = strip_data_url_prefix(image.trim());
    let normalized: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if normalized.is_empty() {
        return Err(InvalidInput::EmptyImage);
    }

    let decoded = STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| InvalidInput::InvalidBase64(e.to_string()))?;
    if decoded.is_empty() {
        return Err(InvalidInput::EmptyImage);
    }

    Ok(normalized)
}

fn strip_data_url_prefix(image: &str) -> &str {
    if !image.starts_with("data:") {
        return image;
    }
    match image.find(";base64,") {
        Some(idx) => &image[idx + ";base64,".len()..],
        None => image,
    }
}
