use crate::error::Result;
use crate::model::{EndpointParameter, EndpointRecord, HttpMethod, ParameterType};
use std::collections::BTreeMap;
use std::path::Path;

/// Records written to an empty store on first run.
pub fn default_endpoints() -> Vec<EndpointRecord> {
    vec![
        EndpointRecord {
            path: "/api/v1/users".into(),
            method: HttpMethod::Get,
            description: "Lists every user in the system.".into(),
            group: Some("Users".into()),
            parameters: Vec::new(),
            example_request: Some("GET /api/v1/users".into()),
            example_response: Some(r#"{ "users": [ { "id": 1, "name": "Alice" } ] }"#.into()),
            snippets: BTreeMap::from([
                (
                    "curl".to_string(),
                    "curl -X GET http://localhost:3000/api/v1/users".to_string(),
                ),
                (
                    "python".to_string(),
                    "import requests\n\n\
                     resp = requests.get(\"http://localhost:3000/api/v1/users\")\n\
                     print(resp.json())"
                        .to_string(),
                ),
                (
                    "javascript".to_string(),
                    "fetch(\"http://localhost:3000/api/v1/users\")\n  \
                     .then(resp => resp.json())\n  \
                     .then(console.log)"
                        .to_string(),
                ),
                (
                    "rust".to_string(),
                    "let users: serde_json::Value =\n    \
                     reqwest::get(\"http://localhost:3000/api/v1/users\")\n        \
                     .await?\n        \
                     .json()\n        \
                     .await?;"
                        .to_string(),
                ),
            ]),
        },
        EndpointRecord {
            path: "/api/v1/users".into(),
            method: HttpMethod::Post,
            description: "Creates a new user.".into(),
            group: Some("Users".into()),
            parameters: vec![
                EndpointParameter {
                    name: "name".into(),
                    param_type: ParameterType::String,
                    required: true,
                    description: "Full name of the user".into(),
                },
                EndpointParameter {
                    name: "email".into(),
                    param_type: ParameterType::String,
                    required: true,
                    description: "Email address of the user".into(),
                },
            ],
            example_request: Some(
                r#"POST /api/v1/users { "name": "Bob", "email": "bob@example.com" }"#.into(),
            ),
            example_response: Some(
                r#"{ "id": 2, "name": "Bob", "email": "bob@example.com" }"#.into(),
            ),
            snippets: BTreeMap::from([
                (
                    "curl".to_string(),
                    "curl -X POST http://localhost:3000/api/v1/users \\\n     \
                     -H \"Content-Type: application/json\" \\\n     \
                     -d '{\"name\":\"Bob\",\"email\":\"bob@example.com\"}'"
                        .to_string(),
                ),
                (
                    "python".to_string(),
                    "import requests\n\n\
                     resp = requests.post(\"http://localhost:3000/api/v1/users\",\n    \
                     json={\"name\": \"Bob\", \"email\": \"bob@example.com\"})\n\
                     print(resp.json())"
                        .to_string(),
                ),
            ]),
        },
    ]
}

/// Load a list of records from a YAML or JSON seed file.
pub fn load_seed_file(path: &Path) -> Result<Vec<EndpointRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_seed_str(&content)
}

/// Parse a YAML (or JSON, which YAML accepts) list of records.
pub fn parse_seed_str(content: &str) -> Result<Vec<EndpointRecord>> {
    let records: Vec<EndpointRecord> = serde_yaml::from_str(content)?;
    Ok(records)
}
