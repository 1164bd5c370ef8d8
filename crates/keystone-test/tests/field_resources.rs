//! Creating related resources through field paths.

use http::StatusCode;
use keystone_core::{QueryParams, ResourceId};
use keystone_test::TestClient;
use serde_json::{json, Value};

fn task_body(name: &str) -> Value {
    json!({"data": {"type": "tasks", "attributes": {"name": name}}})
}

fn project_body(name: &str) -> Value {
    json!({"data": {"type": "projects", "attributes": {"name": name}}})
}

fn create_task(client: &TestClient) -> String {
    client
        .post("/tasks")
        .json(&task_body("sample task"))
        .send()
        .assert_status(StatusCode::CREATED)
        .data_id()
        .expect("generated task id")
}

#[test]
fn post_to_one_field_creates_and_links_project() {
    let (client, store) = TestClient::sample().unwrap();
    let task_id = create_task(&client);

    let response = client
        .post(format!("/tasks/{task_id}/project"))
        .json(&project_body("sample project"))
        .send();

    response
        .assert_status(StatusCode::CREATED)
        .assert_json_pointer("/data/type", &json!("projects"))
        .assert_json_pointer("/data/attributes/name", &json!("sample project"));
    let project_id = response.data_id().expect("generated project id");

    let source = ResourceId::from(task_id.parse::<i64>().unwrap());
    let target = client
        .app()
        .registry()
        .entry("tasks")
        .unwrap()
        .relationship_repository("project")
        .unwrap()
        .find_one_target(&source, "project", &QueryParams::new())
        .unwrap()
        .expect("linked project");
    assert_eq!(target.id.unwrap().to_string(), project_id);
    assert_eq!(store.count("projects"), 1);
}

#[test]
fn post_to_missing_parent_saves_nothing() {
    let (client, store) = TestClient::sample().unwrap();

    client
        .post("/tasks/999/project")
        .json(&project_body("sample project"))
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Resource not found");

    assert_eq!(store.count("projects"), 0);
}

#[test]
fn post_with_wrong_body_type_saves_nothing() {
    let (client, store) = TestClient::sample().unwrap();
    let task_id = create_task(&client);

    client
        .post(format!("/tasks/{task_id}/project"))
        .json(&task_body("not a project"))
        .send()
        .assert_error(StatusCode::BAD_REQUEST, "Request body error");

    assert_eq!(store.count("tasks"), 1);
    assert_eq!(store.count("projects"), 0);
}

#[test]
fn post_to_many_field_appends() {
    let (client, _store) = TestClient::sample().unwrap();
    let task_id = create_task(&client);

    for name in ["first", "second"] {
        client
            .post(format!("/tasks/{task_id}/projects"))
            .json(&project_body(name))
            .send()
            .assert_status(StatusCode::CREATED);
    }

    let response = client.get(format!("/tasks/{task_id}/projects")).send();
    response.assert_status(StatusCode::OK);
    let names: Vec<Value> = match response.data() {
        Some(Value::Array(projects)) => projects.iter().map(|p| p["attributes"]["name"].clone()).collect(),
        other => panic!("expected an array, got {other:?}"),
    };
    assert_eq!(names, [json!("first"), json!("second")]);
}

#[test]
fn get_unset_to_one_field_is_null() {
    let (client, _store) = TestClient::sample().unwrap();
    let task_id = create_task(&client);

    client
        .get(format!("/tasks/{task_id}/project"))
        .send()
        .assert_status(StatusCode::OK)
        .assert_json_pointer("/data", &Value::Null)
        .assert_json_pointer(
            "/links/self",
            &json!(format!("https://service.local/tasks/{task_id}/project")),
        );
}
