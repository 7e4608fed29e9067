//! End-to-end async facade tests against a local echo server.

mod common;

use common::{petstore_definition, spawn_server};
use openapi_dynamic_client::{AsyncClient, Error, OpenApiClient, TransportConfig};
use serde_json::json;

async fn client_for(server_base: &str) -> AsyncClient {
    OpenApiClient::new(petstore_definition(server_base))
        .async_client(TransportConfig::default())
        .await
        .expect("facade")
}

#[tokio::test]
async fn calls_an_operation_end_to_end() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let res = client.call("getPetById", json!({"petId": 42})).await.unwrap();
    assert_eq!(res.status, 200);
    assert!(res.is_success());
    assert_eq!(res.data["method"], "GET");
    assert_eq!(res.data["path"], "/pets/42");
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn the_three_invocation_styles_are_equivalent() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;
    let args = json!({"petId": 7});

    let generic = client.call("getPetById", args.clone()).await.unwrap();
    let indexed = client["getPetById"].invoke(args.clone()).await.unwrap();
    let explicit = client.functions()["getPetById"]
        .invoke(args)
        .await
        .unwrap();

    // Identical bound requests regardless of invocation style.
    assert_eq!(generic.config, indexed.config);
    assert_eq!(generic.config, explicit.config);
    assert_eq!(generic.data["path"], "/pets/7");
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn missing_required_parameter_issues_no_request() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let err = client.call("findPetsByStatus", json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        Error::MissingParameter { ref operation, ref name }
            if operation == "findPetsByStatus" && name == "status"
    ));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn unknown_operation_issues_no_request() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let err = client.call("doesNotExist", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::UnknownOperation(ref id) if id == "doesNotExist"));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn non_2xx_statuses_flow_through_the_envelope() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let res = client.call("alwaysMissing", json!({})).await.unwrap();
    assert_eq!(res.status, 404);
    assert!(!res.is_success());
    assert_eq!(res.data, json!({"error": "missing"}));
}

#[tokio::test]
async fn undeclared_arguments_become_query_parameters() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let res = client
        .call("listPets", json!({"limit": 5, "verbose": true}))
        .await
        .unwrap();
    assert_eq!(res.data["query"], "limit=5&verbose=true");
}

#[tokio::test]
async fn json_body_round_trips() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let pet = json!({"name": "Fido", "tag": "dog"});
    let res = client
        .call("createPet", json!({"data": pet.clone()}))
        .await
        .unwrap();
    assert_eq!(res.data["method"], "POST");
    assert_eq!(res.data["headers"]["content-type"], "application/json");
    let echoed: serde_json::Value =
        serde_json::from_str(res.data["body"].as_str().unwrap()).unwrap();
    assert_eq!(echoed, pet);
    // The envelope's config echoes the exact payload that was bound.
    assert_eq!(
        res.config.body,
        Some(openapi_dynamic_client::BodyPayload::Json(pet))
    );

    // The declared body is required.
    let err = client.call("createPet", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "data"));
}

#[tokio::test]
async fn form_bodies_are_url_encoded() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let res = client
        .call("login", json!({"data": {"username": "u", "password": "p w"}}))
        .await
        .unwrap();
    assert_eq!(
        res.data["headers"]["content-type"],
        "application/x-www-form-urlencoded"
    );
    assert_eq!(res.data["body"], "username=u&password=p+w");
}

#[tokio::test]
async fn header_cookie_and_adhoc_headers_reach_the_wire() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let res = client
        .call(
            "getProfile",
            json!({
                "x-api-key": "k-1",
                "session": "abc",
                "headers": {"authorization": "Bearer t"}
            }),
        )
        .await
        .unwrap();
    assert_eq!(res.data["headers"]["x-api-key"], "k-1");
    assert_eq!(res.data["headers"]["cookie"], "session=abc");
    assert_eq!(res.data["headers"]["authorization"], "Bearer t");
}

#[tokio::test]
async fn text_responses_surface_as_strings() {
    let server = spawn_server().await;
    let client = client_for(&server.base_url).await;

    let res = client.call("getText", json!({})).await.unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.data, json!("hello, plain text"));
}

#[tokio::test]
async fn loads_a_definition_by_url_with_relative_server() {
    let server = spawn_server().await;

    // The served definition declares `servers: [{url: "/"}]`, so the base
    // URL must resolve against the definition's own URL.
    let api = OpenApiClient::new(format!("{}/openapi.json", server.base_url));
    let client = api.async_client(TransportConfig::default()).await.unwrap();

    let res = client.call("getPetById", json!({"petId": 3})).await.unwrap();
    assert_eq!(res.data["path"], "/pets/3");
    assert_eq!(client.operations().first().copied(), Some("getPetById"));
}

#[tokio::test]
async fn unreachable_definition_url_is_a_spec_load_error() {
    let api = OpenApiClient::new("http://127.0.0.1:1/openapi.json");
    let err = api
        .async_client(TransportConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SpecLoad { .. }));
}

#[tokio::test]
async fn per_request_headers_from_config_are_attached() {
    let server = spawn_server().await;
    let config = TransportConfig {
        headers: [("x-client".to_string(), "dyn-1".to_string())].into(),
        ..TransportConfig::default()
    };
    let client = OpenApiClient::new(petstore_definition(&server.base_url))
        .async_client(config)
        .await
        .unwrap();

    let res = client.call("listPets", json!({})).await.unwrap();
    assert_eq!(res.data["headers"]["x-client"], "dyn-1");
}
