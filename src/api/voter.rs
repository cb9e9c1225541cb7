use rocket::{serde::json::Json, Route, State};

use crate::engine::VotingEngine;
use crate::error::Result;
use crate::model::api::{
    reply::{Ack, Reply},
    voter::{RegistrationRequest, VoteRequest, VoterStatus},
};

pub fn routes() -> Vec<Route> {
    routes![register_voter, cast_vote, voter_status]
}

#[post("/register-voter", data = "<request>", format = "json")]
async fn register_voter(
    request: Json<RegistrationRequest>,
    engine: &State<VotingEngine>,
) -> Result<Json<Reply<Ack>>> {
    let (voter, nid, election_id) = request.0.into_parts()?;
    engine.register(&voter, &nid, election_id)?;
    Ok(Json(Ack::new("Voter registered successfully")))
}

#[post("/cast-vote", data = "<request>", format = "json")]
async fn cast_vote(
    request: Json<VoteRequest>,
    engine: &State<VotingEngine>,
) -> Result<Json<Reply<Ack>>> {
    let (voter, election_id, candidate) = request.0.into_parts()?;
    engine.cast_vote(&voter, election_id, &candidate)?;
    Ok(Json(Ack::new("Vote cast successfully")))
}

#[get("/voter-status/<voter_address>")]
async fn voter_status(
    voter_address: &str,
    engine: &State<VotingEngine>,
) -> Result<Json<Reply<VoterStatus>>> {
    let status = engine.get_status(voter_address)?;
    Ok(Json(Reply::ok(status)))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{json, Value},
    };

    use crate::model::api::election::ElectionSpec;
    use crate::model::election::ElectionStore;

    use super::*;

    const JATIYA: &str = "Jatiya Party";

    #[backend_test]
    async fn registration_scenario(client: Client, engine: VotingEngine) {
        let response = register(&client, &RegistrationRequest::example("0xA", "NID1")).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": true, "message": "Voter registered successfully"})
        );

        let response = register(&client, &RegistrationRequest::example("0xA", "NID1")).await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": false, "error": "Voter already registered"})
        );

        let response = register(&client, &RegistrationRequest::example("0xB", "NID1")).await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": false, "error": "NID already used"})
        );

        assert_eq!(
            engine.get_status("0xA").unwrap(),
            VoterStatus {
                registered: true,
                voted: false
            }
        );
        assert_eq!(engine.get_status("0xB").unwrap(), VoterStatus::default());
    }

    #[backend_test]
    async fn missing_fields(client: Client) {
        let response = client
            .post(uri!("/api", register_voter()))
            .header(ContentType::JSON)
            .body(json!({"voter_address": "0xA"}).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": false, "error": "Voter address and NID are required"})
        );

        let response = client
            .post(uri!("/api", cast_vote()))
            .header(ContentType::JSON)
            .body(json!({"candidate_name": JATIYA}).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": false, "error": "Voter address and candidate name are required"})
        );
    }

    #[backend_test]
    async fn malformed_body(client: Client) {
        let response = client
            .post(uri!("/api", register_voter()))
            .header(ContentType::JSON)
            .body("{not json")
            .dispatch()
            .await;
        assert!(response.status().class().is_client_error());
        assert_eq!(body(response).await["success"], json!(false));
    }

    #[backend_test]
    async fn voting_scenario(client: Client, store: ElectionStore) {
        let response = vote(&client, &VoteRequest::example("0xA", JATIYA)).await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": false, "error": "Voter not registered"})
        );

        let response = register(&client, &RegistrationRequest::example("0xA", "NID1")).await;
        assert_eq!(Status::Ok, response.status());

        let response = vote(&client, &VoteRequest::example("0xA", "NoSuchCandidate")).await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(store.get_results(1).unwrap().total_votes, 0);

        let response = vote(&client, &VoteRequest::example("0xA", JATIYA)).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": true, "message": "Vote cast successfully"})
        );
        assert_eq!(store.get_results(1).unwrap().results[JATIYA], 1);

        let response = vote(&client, &VoteRequest::example("0xA", JATIYA)).await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": false, "error": "Already voted"})
        );
        assert_eq!(store.get_results(1).unwrap().total_votes, 1);
    }

    #[backend_test]
    async fn status_endpoint(client: Client, engine: VotingEngine) {
        let response = client.get(uri!("/api", voter_status("0xA"))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            body(response).await,
            json!({"success": true, "registered": false, "voted": false})
        );

        engine.register("0xA", "NID1", 1).unwrap();
        engine.cast_vote("0xA", 1, JATIYA).unwrap();

        let response = client.get(uri!("/api", voter_status("0xA"))).dispatch().await;
        assert_eq!(
            body(response).await,
            json!({"success": true, "registered": true, "voted": true})
        );
    }

    #[backend_test(empty)]
    async fn other_elections(client: Client, engine: VotingEngine) {
        let election_id = engine.create_election(ElectionSpec::example()).unwrap();

        // Nothing at the default election ID.
        let response = register(&client, &RegistrationRequest::example("0xA", "NID1")).await;
        assert_eq!(Status::NotFound, response.status());

        let request = RegistrationRequest {
            election_id,
            ..RegistrationRequest::example("0xA", "NID1")
        };
        let response = register(&client, &request).await;
        assert_eq!(Status::Ok, response.status());

        let request = VoteRequest {
            election_id,
            ..VoteRequest::example("0xA", "Carol")
        };
        let response = vote(&client, &request).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(engine.get_results(election_id).unwrap().results["Carol"], 1);
    }

    async fn register<'c>(client: &'c Client, request: &RegistrationRequest) -> LocalResponse<'c> {
        client
            .post(uri!("/api", register_voter()))
            .header(ContentType::JSON)
            .body(serde_json::to_string(request).unwrap())
            .dispatch()
            .await
    }

    async fn vote<'c>(client: &'c Client, request: &VoteRequest) -> LocalResponse<'c> {
        client
            .post(uri!("/api", cast_vote()))
            .header(ContentType::JSON)
            .body(serde_json::to_string(request).unwrap())
            .dispatch()
            .await
    }

    async fn body(response: LocalResponse<'_>) -> Value {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }
}
