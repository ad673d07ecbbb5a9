//! Session authentication
//!
//! The session provider issues HS256 bearer tokens. `SessionAuth` verifies
//! them and attaches a [`CurrentUser`] to the request; it never rejects a
//! request itself. Handlers that need an identity take `CurrentUser` as an
//! extractor, which answers 401 when none was attached.

use crate::error::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: u64,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or(AppError::Unauthorized),
        )
    }
}

struct SessionKeys {
    decoding: DecodingKey,
    validation: Validation,
}

#[derive(Clone)]
pub struct SessionAuth {
    keys: Arc<SessionKeys>,
}

impl SessionAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            keys: Arc::new(SessionKeys {
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation: Validation::new(Algorithm::HS256),
            }),
        }
    }

    pub fn verify(&self, token: &str) -> Result<CurrentUser, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.keys.decoding, &self.keys.validation)?;
        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| jsonwebtoken::errors::ErrorKind::InvalidSubject)?;

        Ok(CurrentUser {
            id,
            email: data.claims.email.filter(|e| !e.is_empty()),
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthService {
            service,
            auth: self.clone(),
        }))
    }
}

pub struct SessionAuthService<S> {
    service: S,
    auth: SessionAuth,
}

impl<S, B> Service<ServiceRequest> for SessionAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user = bearer_token(&req).and_then(|token| match self.auth.verify(token) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "session token rejected");
                None
            }
        });

        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}
