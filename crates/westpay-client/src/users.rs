//! User profiles.

use serde_json::{json, Map, Value};
use westpay_core::{UserId, UserProfile};
use westpay_store::{server_timestamp, DbPath, Store, StoreExt};

use crate::context::ClientContext;
use crate::error::Result;
use crate::storage::{write_json, PROFILE_PHOTO_KEY, USER_DATA_KEY};

/// Profile fields a user can change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New photo URL.
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = &self.name {
            fields.insert("name".into(), Value::from(name.clone()));
        }
        if let Some(phone) = &self.phone {
            fields.insert("phone".into(), Value::from(phone.clone()));
        }
        if let Some(url) = &self.photo_url {
            fields.insert("photoUrl".into(), Value::from(url.clone()));
        }
        fields
    }
}

impl ClientContext {
    /// Create the record for a new sign-up: the profile plus an empty wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn create_user_profile(&self, uid: &UserId, profile: &UserProfile) -> Result<()> {
        let mut profile = serde_json::to_value(profile)?;
        if let Value::Object(fields) = &mut profile {
            fields.insert("createdAt".into(), server_timestamp());
        }

        self.store()
            .set(
                &DbPath::user(uid),
                json!({
                    "profile": profile,
                    "wallet": { "balance": 0 },
                }),
            )
            .await?;

        tracing::info!(user_id = %uid, "Created user profile");
        Ok(())
    }

    /// Read a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn profile(&self, uid: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.store().get_as(&DbPath::profile(uid)).await?)
    }

    /// Change profile fields. When `uid` is the signed-in user, the local
    /// `userData` record follows.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn update_profile(&self, uid: &UserId, update: &ProfileUpdate) -> Result<()> {
        let fields = update.to_fields();
        if fields.is_empty() {
            return Ok(());
        }
        self.store().update(&DbPath::profile(uid), fields).await?;
        tracing::info!(user_id = %uid, "Updated user profile");

        if let Some(mut data) = self.current_user().filter(|u| &u.uid == uid) {
            if let Some(name) = &update.name {
                data.name.clone_from(name);
            }
            if let Some(phone) = &update.phone {
                data.phone = Some(phone.clone());
            }
            if let Some(url) = &update.photo_url {
                data.photo_url = Some(url.clone());
                self.local_storage().remove(PROFILE_PHOTO_KEY);
            }
            write_json(self.local_storage(), USER_DATA_KEY, &data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_has_no_fields() {
        assert!(ProfileUpdate::default().to_fields().is_empty());
    }

    #[test]
    fn update_uses_stored_names() {
        let update = ProfileUpdate {
            photo_url: Some("https://img/1.png".into()),
            ..ProfileUpdate::default()
        };
        let fields = update.to_fields();
        assert_eq!(fields["photoUrl"], "https://img/1.png");
        assert_eq!(fields.len(), 1);
    }
}
