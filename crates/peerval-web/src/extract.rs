//! Drop-in replacements for axum's `Path` and `Form` whose rejections render
//! as [`ApiError`], so a malformed id or form body still gets the JSON error
//! body with a `redirect`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct Form<T>(pub T);
