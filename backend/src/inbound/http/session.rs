//! The signed-in user, as carried by the session cookie.
//!
//! Handlers take a [`Visitor`] and never touch the Actix session directly.
//! Only the user id is stored; everything else is looked up per request.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

const USER_ID_KEY: &str = "user_id";

/// Whoever is making the request, signed in or not.
#[derive(Clone)]
pub struct Visitor {
    session: Session,
}

impl Visitor {
    /// Bind `user_id` to the session, rotating the session id first.
    pub fn sign_in(&self, user_id: &UserId) -> Result<(), Error> {
        self.session.renew();
        self.session
            .insert(USER_ID_KEY, user_id.as_ref())
            .map_err(|err| Error::internal(format!("session write failed: {err}")))
    }

    /// Forget the user and expire the cookie.
    pub fn sign_out(&self) {
        self.session.purge();
    }

    /// The signed-in user, if any.
    ///
    /// A stored id that no longer parses counts as anonymous.
    pub fn signed_in(&self) -> Result<Option<UserId>, Error> {
        let stored = self
            .session
            .get::<String>(USER_ID_KEY)
            .map_err(|err| Error::internal(format!("session read failed: {err}")))?;
        Ok(stored.and_then(|raw| {
            UserId::new(raw)
                .inspect_err(|err| warn!(error = %err, "discarding malformed session user id"))
                .ok()
        }))
    }

    pub fn require_signed_in(&self) -> Result<UserId, Error> {
        self.signed_in()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for Visitor {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { Ok(Self { session: session.await? }) })
    }
}
