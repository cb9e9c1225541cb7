use rocket::{serde::json::Json, Route, State};

use crate::{
    engine::VotingEngine,
    error::Result,
    model::api::election::{ElectionDescription, ElectionSpec},
};

pub fn routes() -> Vec<Route> {
    routes![create_election]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    spec: Json<ElectionSpec>,
    engine: &State<VotingEngine>,
) -> Result<Json<ElectionDescription>> {
    let election_id = engine.create_election(spec.0)?;
    let election = engine.store().get(election_id)?;
    Ok(Json(election.into()))
}
