#![allow(dead_code)]

use form_builder::engine::transport::MockTransport;
use form_builder::schema::form_model::FormSchema;
use serde_json::{Value, json};

pub const COUNTRIES_URL: &str = "https://api.test/countries";

pub fn states_url(country: &str) -> String {
    format!("https://api.test/states?country={}", country)
}

pub fn cities_url(state: &str) -> String {
    format!("https://api.test/cities?state={}", state)
}

pub fn schema_from(value: Value) -> FormSchema {
    serde_json::from_value(value).expect("fixture schema is valid")
}

/// country -> state -> city, plus an unrelated required email field.
pub fn geo_schema() -> FormSchema {
    schema_from(json!({
        "id": "form_geo",
        "name": "Address",
        "fields": [
            {
                "id": "f_country", "type": "country", "name": "country", "label": "Country",
                "apiDataSource": {
                    "type": "api",
                    "endpoint": COUNTRIES_URL,
                    "responsePath": "data",
                    "labelKey": "name",
                    "valueKey": "id"
                }
            },
            {
                "id": "f_state", "type": "state", "name": "state", "label": "State",
                "apiDataSource": {
                    "type": "dependency",
                    "dependsOn": "f_country",
                    "dependencyEndpoint": "https://api.test/states?country={value}",
                    "labelKey": "name",
                    "valueKey": "id"
                }
            },
            {
                "id": "f_city", "type": "city", "name": "city", "label": "City",
                "apiDataSource": {
                    "type": "dependency",
                    "dependsOn": "f_state",
                    "dependencyEndpoint": "https://api.test/cities?state={value}",
                    "labelKey": "name",
                    "valueKey": "id"
                }
            },
            {
                "id": "f_email", "type": "email", "name": "email", "label": "Email",
                "validation": { "required": true }
            }
        ]
    }))
}

pub fn geo_transport() -> MockTransport {
    MockTransport::new()
        .with_json(
            COUNTRIES_URL,
            json!({ "data": [
                { "id": 1, "name": "India", "code": "IN" },
                { "id": 2, "name": "Nepal", "code": "NP" }
            ]}),
        )
        .with_json(
            &states_url("1"),
            json!([{ "id": 10, "name": "Kerala" }, { "id": 11, "name": "Goa" }]),
        )
        .with_json(&states_url("2"), json!([{ "id": 20, "name": "Bagmati" }]))
        .with_json(&cities_url("10"), json!([{ "id": 100, "name": "Kochi" }]))
        .with_json(
            &cities_url("11"),
            json!([{ "id": 110, "name": "Panaji" }, { "id": 111, "name": "Margao" }]),
        )
}

/// A -> B -> C -> D chain of static-rooted dependency fields, plus an
/// independent E. Every dependent endpoint is `https://api.test/<id>?p={value}`.
pub fn chain_schema() -> FormSchema {
    let dependent = |id: &str, parent: &str| {
        json!({
            "id": id, "type": "select", "name": id,
            "apiDataSource": {
                "type": "dependency",
                "dependsOn": parent,
                "dependencyEndpoint": format!("https://api.test/{}?p={{value}}", id),
                "labelKey": "name",
                "valueKey": "id"
            }
        })
    };
    schema_from(json!({
        "id": "form_chain",
        "name": "Chain",
        "fields": [
            {
                "id": "a", "type": "select", "name": "a",
                "apiDataSource": { "type": "static", "staticData": [
                    { "label": "One", "value": "1" },
                    { "label": "Two", "value": "2" }
                ]}
            },
            dependent("b", "a"),
            dependent("c", "b"),
            dependent("d", "c"),
            { "id": "e", "type": "text", "name": "e" }
        ]
    }))
}

pub fn chain_url(id: &str, parent: &str) -> String {
    format!("https://api.test/{}?p={}", id, parent)
}

pub fn chain_transport() -> MockTransport {
    MockTransport::new()
        .with_json(&chain_url("b", "1"), json!([{ "id": "b1", "name": "B one" }]))
        .with_json(&chain_url("b", "2"), json!([{ "id": "b2", "name": "B two" }]))
        .with_json(&chain_url("c", "b1"), json!([{ "id": "c1", "name": "C one" }]))
        .with_json(&chain_url("c", "b2"), json!([{ "id": "c2", "name": "C two" }]))
        .with_json(&chain_url("d", "c1"), json!([{ "id": "d1", "name": "D one" }]))
}
