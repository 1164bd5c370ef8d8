//! Document shape of successful responses.

use http::StatusCode;
use keystone_test::TestClient;
use serde_json::{json, Value};

fn create(client: &TestClient, resource_type: &str, name: &str) -> String {
    client
        .post(format!("/{resource_type}"))
        .json(&json!({"data": {"type": resource_type, "attributes": {"name": name}}}))
        .send()
        .assert_status(StatusCode::CREATED)
        .data_id()
        .expect("generated id")
}

#[test]
fn empty_relationships_render_null_and_empty_linkage() {
    let (client, _store) = TestClient::sample().unwrap();
    let id = create(&client, "tasks", "sample task");

    client
        .get(format!("/tasks/{id}"))
        .send()
        .assert_status(StatusCode::OK)
        .assert_content_type(keystone::document::MEDIA_TYPE)
        .assert_json_pointer("/data/id", &json!(id))
        .assert_json_pointer("/data/attributes", &json!({"name": "sample task", "description": null}))
        .assert_json_pointer("/data/relationships/project/linkage", &Value::Null)
        .assert_json_pointer("/data/relationships/projects/linkage", &json!([]))
        .assert_json_pointer(
            "/data/relationships/project/self",
            &json!(format!("https://service.local/tasks/{id}/relationships/project")),
        )
        .assert_json_pointer(
            "/data/relationships/project/related",
            &json!(format!("https://service.local/tasks/{id}/project")),
        )
        .assert_json_pointer(
            "/data/links/self",
            &json!(format!("https://service.local/tasks/{id}")),
        );
}

#[test]
fn include_side_loads_related_resources_once() {
    let (client, _store) = TestClient::sample().unwrap();
    let task = create(&client, "tasks", "sample task");
    let project = create(&client, "projects", "sample project");

    let linkage = json!({"data": {"type": "projects", "id": project}});
    client
        .patch(format!("/tasks/{task}/relationships/project"))
        .json(&linkage)
        .send()
        .assert_no_content();
    client
        .post(format!("/tasks/{task}/relationships/projects"))
        .json(&json!({"data": [{"type": "projects", "id": project}]}))
        .send()
        .assert_no_content();

    let without = client.get(format!("/tasks/{task}")).send();
    without.assert_json_pointer(
        "/data/relationships/project/linkage",
        &json!({"type": "projects", "id": project}),
    );
    assert!(without.pointer("/included").is_none());

    let with = client
        .get(format!("/tasks/{task}"))
        .query("include=project,projects")
        .send();
    with.assert_status(StatusCode::OK);
    let included = with.included();
    assert_eq!(included.len(), 1, "{included:?}");
    assert_eq!(included[0]["type"], "projects");
    assert_eq!(included[0]["id"], project.as_str());
}

#[test]
fn sparse_fieldsets_filter_attributes() {
    let (client, _store) = TestClient::sample().unwrap();
    let id = create(&client, "tasks", "sample task");

    client
        .get(format!("/tasks/{id}"))
        .query("fields%5Btasks%5D=name")
        .send()
        .assert_json_pointer("/data/attributes", &json!({"name": "sample task"}));
}

#[test]
fn collection_lists_every_resource() {
    let (client, _store) = TestClient::sample().unwrap();
    create(&client, "projects", "first");
    create(&client, "projects", "second");

    let response = client.get("/projects/").send();
    response
        .assert_status(StatusCode::OK)
        .assert_json_pointer("/links/self", &json!("https://service.local/projects"));
    assert_eq!(response.data().and_then(|d| d.as_array().map(Vec::len)), Some(2));
}

#[test]
fn relationship_endpoints_set_replace_and_remove() {
    let (client, _store) = TestClient::sample().unwrap();
    let task = create(&client, "tasks", "sample task");
    let first = create(&client, "projects", "first");
    let second = create(&client, "projects", "second");
    let path = format!("/tasks/{task}/relationships/projects");

    client
        .post(&path)
        .json(&json!({"data": [{"type": "projects", "id": first}, {"type": "projects", "id": second}]}))
        .send()
        .assert_no_content();

    let linkage = client.get(&path).send();
    linkage
        .assert_status(StatusCode::OK)
        .assert_json_pointer(
            "/data",
            &json!([{"type": "projects", "id": first}, {"type": "projects", "id": second}]),
        )
        .assert_json_pointer("/links/self", &json!(format!("https://service.local{path}")))
        .assert_json_pointer(
            "/links/related",
            &json!(format!("https://service.local/tasks/{task}/projects")),
        );

    client
        .delete(&path)
        .json(&json!({"data": [{"type": "projects", "id": first}]}))
        .send()
        .assert_no_content();
    client
        .get(&path)
        .send()
        .assert_json_pointer("/data", &json!([{"type": "projects", "id": second}]));

    client
        .patch(&path)
        .json(&json!({"data": []}))
        .send()
        .assert_no_content();
    client.get(&path).send().assert_json_pointer("/data", &json!([]));
}

#[test]
fn to_one_relationship_patch_null_clears() {
    let (client, _store) = TestClient::sample().unwrap();
    let task = create(&client, "tasks", "sample task");
    let project = create(&client, "projects", "sample project");
    let path = format!("/tasks/{task}/relationships/project");

    client
        .patch(&path)
        .json(&json!({"data": {"type": "projects", "id": project}}))
        .send()
        .assert_no_content();
    client
        .get(&path)
        .send()
        .assert_json_pointer("/data", &json!({"type": "projects", "id": project}));

    client.patch(&path).json(&json!({"data": null})).send().assert_no_content();
    client.get(&path).send().assert_json_pointer("/data", &Value::Null);
}

#[test]
fn patch_merges_and_delete_removes() {
    let (client, store) = TestClient::sample().unwrap();
    let id = create(&client, "tasks", "sample task");

    client
        .patch(format!("/tasks/{id}"))
        .json(&json!({"data": {"type": "tasks", "id": id, "attributes": {"description": "details"}}}))
        .send()
        .assert_status(StatusCode::OK)
        .assert_json_pointer(
            "/data/attributes",
            &json!({"name": "sample task", "description": "details"}),
        );

    client.delete(format!("/tasks/{id}")).send().assert_no_content();
    assert_eq!(store.count("tasks"), 0);
    client
        .get(format!("/tasks/{id}"))
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Resource not found");
}
