use chrono::{Duration, Local};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::permissions::ActionType;
use crate::{
    error::Error,
    schema::{User, UserRole, Uuid},
};

/// Signing key and token lifetime shared by the login handler and the auth filters.
#[derive(Clone)]
pub struct JwtKeys {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], lifetime_hours: i64) -> Result<Self, Error> {
        let key = Hmac::new_from_slice(secret)
            .map_err(|_| Error::Config(String::from("Invalid JWT secret")))?;

        Ok(Self {
            key,
            lifetime: Duration::hours(lifetime_hours),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.is_allowed_for(&self.role) {
            return Err(Error::forbidden(
                "You don't have permission to perform this action",
            ));
        }
        Ok(())
    }

    /// Owners may change their own resources; `any` lets privileged roles through regardless.
    pub fn authenticate_owner(
        &self,
        owner_id: Uuid,
        own: ActionType,
        any: ActionType,
    ) -> Result<(), Error> {
        self.authenticate(own)?;

        if owner_id == self.user_id || any.is_allowed_for(&self.role) {
            Ok(())
        } else {
            Err(Error::forbidden("Only the author may change this resource"))
        }
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            username: value.username,
            user_id: value.user_id,
            role: value.role,
        }
    }
}

pub fn generate_jwt_session(user: &User, keys: &JwtKeys) -> Result<String, Error> {
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        keys.lifetime,
    );

    Ok(claims.sign_with_key(&keys.key)?)
}

pub fn verify_jwt_session(token: &str, keys: &JwtKeys) -> Result<JwtSessionData, Error> {
    let session: JwtSessionData = token
        .verify_with_key(&keys.key)
        .map_err(|_| Error::unauthorized("Invalid session; Invalid token"))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(Error::unauthorized("Invalid session; Token expired"));
    }

    Ok(session)
}
