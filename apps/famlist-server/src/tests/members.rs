use super::*;

#[tokio::test]
async fn admin_changes_roles_and_members_are_notified() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "viewer").await;

    let (status, body) = ts
        .request(
            "PATCH",
            &format!("/api/families/{}/members/{}", family_id, bob.id),
            Some(&alice),
            Some(json!({ "role": "editor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "editor");

    ts.wait_for_notifications(&bob, "role_changed", 1).await;
}

#[tokio::test]
async fn non_admin_cannot_change_roles() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "editor").await;

    let (status, _) = ts
        .request(
            "PATCH",
            &format!("/api/families/{}/members/{}", family_id, alice.id),
            Some(&bob),
            Some(json!({ "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn last_admin_cannot_be_demoted_or_removed() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (status, body) = ts
        .request(
            "PATCH",
            &format!("/api/families/{}/members/{}", family_id, alice.id),
            Some(&alice),
            Some(json!({ "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "rule_violation");

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("/api/families/{}/members/{}", family_id, alice.id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn member_can_leave_and_others_hear_about_it() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "viewer").await;

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("/api/families/{}/members/{}", family_id, bob.id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, members) = ts
        .request(
            "GET",
            &format!("/api/families/{}/members", family_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 1);

    ts.wait_for_notifications(&alice, "member_left", 1).await;
}

#[tokio::test]
async fn admin_removes_member_and_target_is_notified() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "viewer").await;

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("/api/families/{}/members/{}", family_id, bob.id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The removed member keeps the notification about their removal.
    ts.wait_for_notifications(&bob, "member_removed", 1).await;
}

#[tokio::test]
async fn non_admin_cannot_remove_others() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "editor").await;

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("/api/families/{}/members/{}", family_id, alice.id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn removing_a_stranger_is_404() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("/api/families/{}/members/{}", family_id, Uuid::new_v4()),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn demotion_is_allowed_once_a_second_admin_exists() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "editor").await;

    let (status, _) = ts
        .request(
            "PATCH",
            &format!("/api/families/{}/members/{}", family_id, bob.id),
            Some(&alice),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ts
        .request(
            "PATCH",
            &format!("/api/families/{}/members/{}", family_id, alice.id),
            Some(&alice),
            Some(json!({ "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "viewer");
}
