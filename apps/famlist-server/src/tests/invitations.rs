use super::*;
use chrono::{Duration, Utc};
use famlist_storage::{CreateInvitationParams, Role, Store};

#[tokio::test]
async fn invite_accept_makes_a_member_at_the_invited_role() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (status, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "Bob@Example.com", "role": "editor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["email"], "bob@example.com");
    let invitation_id = body["id"].as_str().unwrap().to_string();

    // The invitee can see it; an unrelated user cannot.
    let (status, _) = ts
        .request(
            "GET",
            &format!("/api/invitations/{}", invitation_id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let carol = user("carol@example.com");
    let (status, _) = ts
        .request(
            "GET",
            &format!("/api/invitations/{}", invitation_id),
            Some(&carol),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, member) = ts
        .request(
            "POST",
            &format!("/api/invitations/{}/respond", invitation_id),
            Some(&bob),
            Some(json!({ "action": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["role"], "editor");
    assert_eq!(member["user_id"], bob.id.to_string());
    assert_eq!(member["invited_by"], alice.id.to_string());

    // Admin hears about the join.
    ts.wait_for_notifications(&alice, "member_joined", 1).await;
}

#[tokio::test]
async fn any_member_can_view_an_invitation() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "viewer").await;

    let (_, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "carol@example.com", "role": "viewer" })),
        )
        .await;
    let invitation_id = body["id"].as_str().unwrap().to_string();

    // Bob is only a viewer, but membership alone grants read access.
    let (status, body) = ts
        .request(
            "GET",
            &format!("/api/invitations/{}", invitation_id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["email"], "carol@example.com");
}

#[tokio::test]
async fn inviting_writes_no_notification_rows_for_members() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "editor").await;

    let (status, _) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "carol@example.com", "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Rename afterwards as a marker; once that fanout has landed, any rows
    // from the invite would already be visible too.
    let (status, _) = ts
        .request(
            "PATCH",
            &format!("/api/families/{}", family_id),
            Some(&alice),
            Some(json!({ "name": "Smythes" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let bobs = ts.wait_for_notifications(&bob, "family_updated", 1).await;

    // The invitee is reached by email only; members get nothing.
    assert!(!bobs
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["kind"] == "invitation_created"));
}

#[tokio::test]
async fn unknown_respond_action_is_invalid_request() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (_, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "bob@example.com", "role": "viewer" })),
        )
        .await;
    let invitation_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = ts
        .request(
            "POST",
            &format!("/api/invitations/{}/respond", invitation_id),
            Some(&bob),
            Some(json!({ "action": "destroy" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");

    // Same for an unknown role at invite time.
    let (status, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "carol@example.com", "role": "owner" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn only_admins_can_invite() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    ts.join_family(family_id, &alice, &bob, "editor").await;

    let (status, _) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&bob),
            Some(json!({ "email": "carol@example.com", "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_and_already_member_invites_are_rejected() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let invite = |email: &str| {
        json!({ "email": email, "role": "viewer" })
    };
    let uri = format!("/api/families/{}/invitations", family_id);

    let (status, _) = ts
        .request("POST", &uri, Some(&alice), Some(invite("bob@example.com")))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ts
        .request("POST", &uri, Some(&alice), Some(invite("BOB@example.com")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "rule_violation");

    let (status, body) = ts
        .request("POST", &uri, Some(&alice), Some(invite("alice@example.com")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "rule_violation");
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (status, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "not-an-email", "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn only_the_invited_email_may_respond() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (_, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "bob@example.com", "role": "viewer" })),
        )
        .await;
    let invitation_id = body["id"].as_str().unwrap().to_string();

    let carol = user("carol@example.com");
    let (status, _) = ts
        .request(
            "POST",
            &format!("/api/invitations/{}/respond", invitation_id),
            Some(&carol),
            Some(json!({ "action": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn second_response_is_a_conflict() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    let (_, body) = ts
        .request(
            "POST",
            &format!("/api/families/{}/invitations", family_id),
            Some(&alice),
            Some(json!({ "email": "bob@example.com", "role": "viewer" })),
        )
        .await;
    let invitation_id = body["id"].as_str().unwrap().to_string();
    let respond_uri = format!("/api/invitations/{}/respond", invitation_id);

    let (status, _) = ts
        .request(
            "POST",
            &respond_uri,
            Some(&bob),
            Some(json!({ "action": "reject" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ts
        .request(
            "POST",
            &respond_uri,
            Some(&bob),
            Some(json!({ "action": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "already_responded");
}

#[tokio::test]
async fn responding_to_an_expired_invitation_is_gone() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;

    // Backdate through the store so no sleeping is needed.
    let invitation = ts
        .store
        .create_invitation(
            &CreateInvitationParams {
                family_id,
                email: bob.email.clone(),
                role: Role::Viewer,
                invited_by: alice.id,
            },
            Utc::now() - Duration::days(8),
        )
        .await
        .unwrap();

    let (status, body) = ts
        .request(
            "POST",
            &format!("/api/invitations/{}/respond", invitation.id),
            Some(&bob),
            Some(json!({ "action": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"]["code"], "expired");

    // Viewing it reports the same: gone, not pending.
    let (status, _) = ts
        .request(
            "GET",
            &format!("/api/invitations/{}", invitation.id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn pending_list_and_cancel() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    let uri = format!("/api/families/{}/invitations", family_id);

    let (_, body) = ts
        .request(
            "POST",
            &uri,
            Some(&alice),
            Some(json!({ "email": "bob@example.com", "role": "viewer" })),
        )
        .await;
    let invitation_id = body["id"].as_str().unwrap().to_string();

    let (status, pending) = ts.request("GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("{}/{}", uri, invitation_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, pending) = ts.request("GET", &uri, Some(&alice), None).await;
    assert!(pending.as_array().unwrap().is_empty());

    // A cancelled invitation can no longer be accepted.
    let (status, _) = ts
        .request(
            "POST",
            &format!("/api/invitations/{}/respond", invitation_id),
            Some(&bob),
            Some(json!({ "action": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancelling_a_responded_invitation_is_a_conflict() {
    let ts = test_server().await;
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");
    let family_id = ts.create_family(&alice, "Smiths").await;
    let uri = format!("/api/families/{}/invitations", family_id);

    let (_, body) = ts
        .request(
            "POST",
            &uri,
            Some(&alice),
            Some(json!({ "email": "bob@example.com", "role": "viewer" })),
        )
        .await;
    let invitation_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = ts
        .request(
            "POST",
            &format!("/api/invitations/{}/respond", invitation_id),
            Some(&bob),
            Some(json!({ "action": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ts
        .request(
            "DELETE",
            &format!("{}/{}", uri, invitation_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
