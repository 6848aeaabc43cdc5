/// Request extractors that reject with the portal's JSON error body
use crate::error::PortalError;
use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::Json;

/// JSON body; malformed or mistyped bodies become a 400 `PortalError`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(PortalError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(PortalError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(PortalError))]
pub struct ApiPath<T>(pub T);
