// tests/folders_api.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use pdms::error::PdmsError;
use pdms::folder::FolderStore;
use pdms::users::RoleName;

#[tokio::test]
async fn test_folder_tree() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let project = app.project(&admin, "Depot").await;

    let drawings = app.folder(&admin, project, "Drawings", None).await;
    let contracts = app.folder(&admin, project, "Contracts", None).await;
    let floor = app.folder(&admin, project, "Floor Plans", Some(drawings)).await;
    let level1 = app.folder(&admin, project, "Level 1", Some(floor)).await;

    let (status, roots) = app
        .get(&format!("/api/projects/{}/folders", project), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    let roots = roots.as_array().unwrap();
    assert_eq!(roots.len(), 2);
    // Same display order, so sorted by name
    assert_eq!(roots[0]["id"], contracts);
    assert_eq!(roots[1]["id"], drawings);
    assert_eq!(roots[1]["hasSubfolders"], true);
    assert_eq!(roots[0]["hasSubfolders"], false);
    assert_eq!(roots[1]["createdBy"]["email"], "admin@example.com");

    let (_, children) = app
        .get(&format!("/api/folders/{}/subfolders", drawings), &admin)
        .await;
    assert_eq!(children[0]["id"], floor);
    assert_eq!(children[0]["parentFolderId"], drawings);

    let (status, path) = app.get(&format!("/api/folders/{}/path", level1), &admin).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = path
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Drawings", "Floor Plans", "Level 1"]);

    // Each folder gets a directory under its project
    let dir = app
        .storage
        .path()
        .join(format!("projects/{}/{}", project, level1));
    assert!(dir.is_dir());
}

#[tokio::test]
async fn test_folder_validation() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let project = app.project(&admin, "Depot").await;
    let other = app.project(&admin, "Other").await;
    let foreign = app.folder(&admin, other, "Foreign", None).await;
    app.folder(&admin, project, "Drawings", None).await;

    let cases = [
        (json!({ "name": "  ", "projectId": project }), StatusCode::BAD_REQUEST),
        (json!({ "name": "a/b", "projectId": project }), StatusCode::BAD_REQUEST),
        (json!({ "name": "x".repeat(256), "projectId": project }), StatusCode::BAD_REQUEST),
        (
            json!({ "name": "Sub", "projectId": project, "parentFolderId": foreign }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "name": "Sub", "projectId": project, "parentFolderId": 9999 }),
            StatusCode::NOT_FOUND,
        ),
        (json!({ "name": "Sub", "projectId": 9999 }), StatusCode::NOT_FOUND),
        (json!({ "name": " Drawings ", "projectId": project }), StatusCode::CONFLICT),
    ];

    for (body, expected) in cases {
        let (status, response) = app.post("/api/folders", Some(&admin), body.clone()).await;
        assert_eq!(status, expected, "{} -> {}", body, response);
    }

    // The same name is fine under a different parent
    let archive = app.folder(&admin, project, "Archive", None).await;
    app.folder(&admin, project, "Drawings", Some(archive)).await;
}

#[tokio::test]
async fn test_folder_access_follows_project_membership() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let (member_id, member) = app.user("tm@example.com", &[RoleName::TeamMember]).await;
    let (_, outsider) = app.user("out@example.com", &[RoleName::TeamMember]).await;
    let project = app.project(&admin, "Depot").await;
    app.add_member(&admin, project, member_id, "TEAM_MEMBER").await;

    // Any member may create folders
    let folder = app.folder(&member, project, "Site Photos", None).await;

    let (status, _) = app.get(&format!("/api/folders/{}", folder), &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(&format!("/api/projects/{}/folders", project), &outsider)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/folders/9999", &outsider).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_empty_folders_are_deleted() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let project = app.project(&admin, "Depot").await;
    let parent = app.folder(&admin, project, "Parent", None).await;
    let child = app.folder(&admin, project, "Child", Some(parent)).await;
    let docs = app.folder(&admin, project, "Docs", None).await;
    app.text_document(&admin, project, docs, "readme", "hello").await;

    let (status, _) = app.delete(&format!("/api/folders/{}", parent), &admin).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.delete(&format!("/api/folders/{}", docs), &admin).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete folder that contains documents");

    let (status, _) = app.delete(&format!("/api/folders/{}", child), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/api/folders/{}", parent), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let dir = app
        .storage
        .path()
        .join(format!("projects/{}/{}", project, parent));
    assert!(!dir.exists());

    let (status, _) = app.get(&format!("/api/folders/{}", parent), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_creates_keep_sibling_names_unique() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let project = app.project(&admin, "Depot").await;

    for round in 0..10 {
        let name = format!("Docs{}", round);
        let body = json!({ "name": name, "projectId": project });
        let (first, second) = tokio::join!(
            app.post("/api/folders", Some(&admin), body.clone()),
            app.post("/api/folders", Some(&admin), body.clone()),
        );

        let mut statuses = [first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT], "round {}", round);
    }

    let (_, roots) = app
        .get(&format!("/api/projects/{}/folders", project), &admin)
        .await;
    assert_eq!(roots.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_duplicate_insert_is_a_conflict() {
    let app = TestApp::new().await;
    let (admin_id, admin) = app.admin().await;
    let project = app.project(&admin, "Depot").await;
    let parent = app.folder(&admin, project, "Drawings", None).await;

    let store = FolderStore::new(app.pool.clone());
    store.create(project, None, "Site", admin_id).await.unwrap();
    store.create(project, Some(parent), "Site", admin_id).await.unwrap();

    let root_dup = store.create(project, None, "Site", admin_id).await;
    assert!(matches!(root_dup, Err(PdmsError::Conflict(_))));
    let child_dup = store.create(project, Some(parent), "Site", admin_id).await;
    assert!(matches!(child_dup, Err(PdmsError::Conflict(_))));
}

#[tokio::test]
async fn test_delete_succeeds_when_directory_cannot_be_removed() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let project = app.project(&admin, "Depot").await;
    let folder = app.folder(&admin, project, "Scratch", None).await;

    // A plain file where the folder directory should be
    let dir = app.storage.path().join(format!("projects/{}/{}", project, folder));
    std::fs::remove_dir_all(&dir).unwrap();
    std::fs::write(&dir, b"not a directory").unwrap();

    let (status, _) = app.delete(&format!("/api/folders/{}", folder), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/folders/{}", folder), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
