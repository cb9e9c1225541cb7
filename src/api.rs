use rocket::{serde::json::Json, Catcher, Request, Route};
use serde::Serialize;

mod admin;
mod public;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(voter::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, not_found, unprocessable, internal_error]
}

/// Body for failures that never reached a handler.
#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    error: &'static str,
}

impl Failure {
    fn new(error: &'static str) -> Json<Self> {
        Json(Self {
            success: false,
            error,
        })
    }
}

#[catch(400)]
fn bad_request(_req: &Request) -> Json<Failure> {
    Failure::new("Malformed request")
}

#[catch(404)]
fn not_found(_req: &Request) -> Json<Failure> {
    Failure::new("Endpoint not found")
}

#[catch(422)]
fn unprocessable(_req: &Request) -> Json<Failure> {
    Failure::new("Malformed request body")
}

#[catch(500)]
fn internal_error(_req: &Request) -> Json<Failure> {
    Failure::new("Internal server error")
}
