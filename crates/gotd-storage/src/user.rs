//! Per-browser user identifier

use crate::{KeyValueStore, StorageError};
use uuid::Uuid;

/// Return the stored user id, generating and persisting a v4 UUID on first use
pub fn get_or_create_user_id(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<String, StorageError> {
    if let Some(existing) = store.get(key)?
        && !existing.trim().is_empty()
    {
        return Ok(existing);
    }

    let user_id = Uuid::new_v4().to_string();
    store.set(key, &user_id)?;
    tracing::info!("Generated new user id {}", user_id);
    Ok(user_id)
}
