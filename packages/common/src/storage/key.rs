use super::error::StorageError;

/// Validate an object key before it reaches a backend.
///
/// Keys are `/`-separated relative paths. The filesystem backend maps them
/// onto real directories, so traversal and absolute segments are rejected
/// for every backend to keep key semantics identical across them.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".into()));
    }
    if key.len() > 512 {
        return Err(StorageError::InvalidKey(
            "key exceeds 512 characters".into(),
        ));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::InvalidKey(
            "key must not start or end with '/'".into(),
        ));
    }
    if key.contains('\0') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "key must not contain null bytes or backslashes".into(),
        ));
    }
    for segment in key.split('/') {
        if segment.is_empty() {
            return Err(StorageError::InvalidKey(
                "key must not contain empty segments".into(),
            ));
        }
        if segment == "." || segment == ".." {
            return Err(StorageError::InvalidKey(
                "key must not contain '.' or '..' segments".into(),
            ));
        }
    }
    Ok(key)
}
