mod common;

use axum::http::StatusCode;
use common::{TestApp, TINY_GIF};

#[tokio::test]
async fn test_profile_is_public() {
    let app = TestApp::new().await;
    app.user("Barney").await;

    let response = app.get("/Barney/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Barney"));
}

#[tokio::test]
async fn test_new_post_shows_on_index() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    app.state.page_cache.clear();

    let response = app
        .post_form("/new/", Some(&barney), &[("text", "post for test")])
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));

    let response = app.get("/", Some(&barney)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("post for test"));
}

#[tokio::test]
async fn test_new_post_requires_login() {
    let app = TestApp::new().await;
    app.user("Barney").await;

    let response = app
        .post_form("/new/", None, &[("text", "text for test")])
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/auth/login/?next=/new/"));
    assert_eq!(app.post_count().await, 0);

    let response = app.get("/new/", None).await;
    assert_eq!(response.location(), Some("/auth/login/?next=/new/"));
}

#[tokio::test]
async fn test_new_post_form_errors() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;

    let response = app.get("/new/", Some(&barney)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("name=\"text\""));

    let response = app
        .post_form("/new/", Some(&barney), &[("text", "   ")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("This field is required."));

    let response = app
        .post_form("/new/", Some(&barney), &[("text", "hello"), ("group", "999")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Select a valid choice."));
    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn test_new_post_with_image_upload() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    let group = app.group("Test group", "testgroup").await;
    let group_id = group.id.to_string();

    let response = app
        .post_multipart(
            "/new/",
            Some(&barney),
            &[("text", "picture post"), ("group", &group_id)],
            Some(("pixel.gif", TINY_GIF)),
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);

    let page = app.state.post_service.list(
        rainbow_posts::models::post::PostFilter::All,
        None,
        5,
    )
    .await
    .unwrap();
    let post = &page.items[0];
    assert_eq!(post.text, "picture post");
    assert_eq!(post.group_id, Some(group.id));
    let image = post.image.clone().expect("image stored");

    let media = app.get(&format!("/media/{}", image), None).await;
    assert_eq!(media.status, StatusCode::OK);

    let response = app
        .post_multipart(
            "/new/",
            Some(&barney),
            &[("text", "not a picture")],
            Some(("notes.txt", b"plain text")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Upload a valid image."));
}

#[tokio::test]
async fn test_post_published_on_all_pages() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    let group = app.group("Test group", "testgroup").await;
    let post = app.post(&barney.user, "test text", Some(&group), true).await;
    app.state.page_cache.clear();

    for url in ["/".to_string(), "/Barney/".to_string(), format!("/Barney/{}/", post.id)] {
        let response = app.get(&url, Some(&barney)).await;
        assert_eq!(response.status, StatusCode::OK, "{}", url);
        assert!(response.body.contains("<img"), "{}", url);
        assert!(response.body.contains("test text"), "{}", url);
        assert!(response.body.contains("/Barney/"), "{}", url);
        assert!(response.body.contains("Test group"), "{}", url);
    }

    let response = app.get("/group/testgroup/", None).await;
    assert!(response.body.contains("test text"));
}

#[tokio::test]
async fn test_post_edit_by_author() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    let group = app.group("Test group", "testgroup").await;
    let new_group = app.group("Raffaello", "rafaello").await;
    let post = app.post(&barney.user, "test text", Some(&group), true).await;
    let edit_url = format!("/Barney/{}/edit/", post.id);

    let response = app.get(&edit_url, Some(&barney)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("test text"));

    let new_group_id = new_group.id.to_string();
    let response = app
        .post_form(
            &edit_url,
            Some(&barney),
            &[("group", &new_group_id), ("text", "edit test text")],
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some(format!("/Barney/{}/", post.id).as_str()));

    let updated = app.state.post_service.get(post.id).await.unwrap().unwrap();
    assert_eq!(updated.text, "edit test text");
    assert_eq!(updated.group_id, Some(new_group.id));
    assert_eq!(updated.image, post.image);
    assert_eq!(updated.author_id, barney.user.id);

    app.state.page_cache.clear();
    for url in ["/".to_string(), "/Barney/".to_string(), format!("/Barney/{}/", post.id)] {
        let response = app.get(&url, Some(&barney)).await;
        assert!(response.body.contains("<img"), "{}", url);
        assert!(response.body.contains("edit test text"), "{}", url);
        assert!(response.body.contains("Raffaello"), "{}", url);
    }
}

#[tokio::test]
async fn test_post_edit_can_clear_image() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    let post = app.post(&barney.user, "with picture", None, true).await;

    let response = app
        .post_form(
            &format!("/Barney/{}/edit/", post.id),
            Some(&barney),
            &[("text", "with picture"), ("image-clear", "on")],
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);

    let updated = app.state.post_service.get(post.id).await.unwrap().unwrap();
    assert_eq!(updated.image, None);
}

#[tokio::test]
async fn test_post_edit_by_other_user_changes_nothing() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    let lola = app.user("Lola").await;
    let group = app.group("Test group", "testgroup").await;
    let post = app.post(&barney.user, "first draft", Some(&group), false).await;
    let edit_url = format!("/Barney/{}/edit/", post.id);

    let response = app.get(&edit_url, Some(&lola)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .post_form(&edit_url, Some(&lola), &[("text", "hijacked"), ("group", "")])
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let unchanged = app.state.post_service.get(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "first draft");
    assert_eq!(unchanged.group_id, Some(group.id));
}

#[tokio::test]
async fn test_post_edit_requires_login() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    let post = app.post(&barney.user, "first draft", None, false).await;
    let edit_url = format!("/Barney/{}/edit/", post.id);

    let response = app.post_form(&edit_url, None, &[("text", "anonymous")]).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location(),
        Some(format!("/auth/login/?next={}", edit_url).as_str())
    );
    let unchanged = app.state.post_service.get(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "first draft");
}

#[tokio::test]
async fn test_post_page_requires_matching_author() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    app.user("Lola").await;
    let post = app.post(&barney.user, "text", None, false).await;

    assert_eq!(app.get(&format!("/Barney/{}/", post.id), None).await.status, StatusCode::OK);
    assert_eq!(app.get(&format!("/Lola/{}/", post.id), None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/Barney/9999/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/Barney/abc/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get(&format!("/Lola/{}/edit/", post.id), Some(&barney)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_unknown_group_is_404() {
    let app = TestApp::new().await;
    let response = app.get("/group/missing/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_pagination() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    for i in 0..7 {
        app.post(&barney.user, &format!("numbered post {}", i), None, false).await;
    }

    let first = app.get("/Barney/", None).await;
    assert!(first.body.contains("numbered post 6"));
    assert!(!first.body.contains("numbered post 1"));
    assert!(first.body.contains("Posts: 7"));

    let second = app.get("/Barney/?page=2", None).await;
    assert!(second.body.contains("numbered post 1"));
    assert!(!second.body.contains("numbered post 6"));

    let clamped = app.get("/Barney/?page=50", None).await;
    assert_eq!(clamped.status, StatusCode::OK);
    assert!(clamped.body.contains("numbered post 0"));

    let huge = app.get("/Barney/?page=99999999999999999999", None).await;
    assert_eq!(huge.status, StatusCode::OK);
    assert!(huge.body.contains("numbered post 0"));
    assert!(!huge.body.contains("numbered post 6"));

    let garbage = app.get("/Barney/?page=abc", None).await;
    assert!(garbage.body.contains("numbered post 6"));
}
