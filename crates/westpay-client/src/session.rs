//! Signed-in user state.
//!
//! The hosted auth service reports sign-in and sign-out; the client mirrors
//! the signed-in user into local storage as `userData`, which every page
//! reads to decide who is signed in.

use serde::{Deserialize, Serialize};
use westpay_core::{display_name, UserId, UserProfile};
use westpay_store::{DbPath, StoreExt};

use crate::context::ClientContext;
use crate::error::Result;
use crate::storage::{read_json, write_json, PROFILE_PHOTO_KEY, USER_DATA_KEY};

/// A user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id.
    pub uid: UserId,
    /// Sign-in e-mail.
    pub email: Option<String>,
    /// Display name from the identity provider.
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Create an auth user with an e-mail address.
    #[must_use]
    pub fn new(uid: UserId, email: impl Into<String>) -> Self {
        Self {
            uid,
            email: Some(email.into()),
            display_name: None,
        }
    }
}

/// The signed-in user record kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// User id.
    pub uid: UserId,
    /// Sign-in e-mail.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Always true while stored.
    #[serde(default)]
    pub is_logged_in: bool,
    /// Phone from the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Photo from the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl UserData {
    fn from_profile(user: &AuthUser, profile: &UserProfile) -> Self {
        let email = user.email.clone().unwrap_or_else(|| profile.email.clone());
        Self {
            uid: user.uid.clone(),
            name: display_name(&profile.name, &email).unwrap_or_else(|| "User".to_string()),
            email,
            is_logged_in: true,
            phone: profile.phone.clone(),
            photo_url: profile.photo_url.clone(),
        }
    }
}

impl ClientContext {
    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserData> {
        read_json::<UserData>(self.local_storage(), USER_DATA_KEY).filter(|u| u.is_logged_in)
    }

    /// React to the auth service reporting a sign-in (`Some`) or sign-out (`None`).
    ///
    /// On sign-in the profile is loaded and mirrored into `userData`, then any
    /// review staged before sign-in is submitted. Returns the stored record,
    /// or `None` if signed out or the user has no profile yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub async fn on_auth_state_changed(&self, user: Option<&AuthUser>) -> Result<Option<UserData>> {
        let Some(user) = user else {
            tracing::info!("User is signed out");
            self.sign_out();
            return Ok(None);
        };

        tracing::info!(user_id = %user.uid, "User is signed in");
        let profile: Option<UserProfile> = self.store().get_as(&DbPath::profile(&user.uid)).await?;

        let data = profile.map(|profile| {
            let data = UserData::from_profile(user, &profile);
            write_json(self.local_storage(), USER_DATA_KEY, &data);
            data
        });

        let name = data.as_ref().map_or_else(
            || review_name(user.display_name.as_deref(), user.email.as_deref()),
            |d| d.name.clone(),
        );
        if let Err(e) = self.flush_pending_review(&user.uid, &name).await {
            tracing::warn!(user_id = %user.uid, error = %e, "Could not submit staged review");
        }

        Ok(data)
    }

    /// Forget the signed-in user.
    pub fn sign_out(&self) {
        self.local_storage().remove(USER_DATA_KEY);
        self.local_storage().remove(PROFILE_PHOTO_KEY);
    }

    /// Sign out the current user if an admin has blocked them.
    ///
    /// Returns whether the user was blocked.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub async fn check_blocked_status(&self) -> Result<bool> {
        let Some(user) = self.current_user() else {
            return Ok(false);
        };

        let path = DbPath::profile(&user.uid).child("isBlocked")?;
        let blocked = self.store().get_as::<bool>(&path).await?.unwrap_or(false);
        if blocked {
            tracing::warn!(user_id = %user.uid, "Blocked user signed out");
            self.sign_out();
        }
        Ok(blocked)
    }

    /// The signed-in user's profile photo URL, from the local cache or the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub async fn profile_photo(&self) -> Result<Option<String>> {
        if let Some(url) = self.local_storage().get(PROFILE_PHOTO_KEY) {
            return Ok(Some(url));
        }
        let Some(user) = self.current_user() else {
            return Ok(None);
        };

        let path = DbPath::profile(&user.uid).child("photoUrl")?;
        let url: Option<String> = self.store().get_as(&path).await?;
        if let Some(url) = &url {
            self.local_storage().set(PROFILE_PHOTO_KEY, url.clone());
        }
        Ok(url)
    }
}

/// Name to put on a customer review: profile name, identity-provider name,
/// e-mail local part, then "Guest User".
#[must_use]
pub fn review_name(name: Option<&str>, email: Option<&str>) -> String {
    display_name(name.unwrap_or_default(), email.unwrap_or_default())
        .unwrap_or_else(|| "Guest User".to_string())
}
