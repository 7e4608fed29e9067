//! Calls the public Swagger Petstore through a facade generated at
//! runtime from its published OpenAPI definition.
//!
//! Run with: `cargo run --example petstore`

use anyhow::Result;
use openapi_dynamic_client::{OpenApiClient, TransportConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let api = OpenApiClient::new("https://petstore3.swagger.io/api/v3/openapi.json");
    let client = api.async_client(TransportConfig::default()).await?;

    println!("discovered {} operations", client.operations().len());
    for id in client.operations().iter().take(5) {
        println!("  {id}");
    }

    let res = client
        .call("findPetsByStatus", json!({"status": "available"}))
        .await?;
    println!("findPetsByStatus -> HTTP {}", res.status);
    if let Some(first) = res.data.as_array().and_then(|pets| pets.first()) {
        println!("first available pet: {first}");
    }

    // The same operations described as function-calling tools.
    if let Some(tool) = client.tools().first() {
        println!("first tool: {}", serde_json::to_string_pretty(&tool.openai_format())?);
    }

    Ok(())
}
