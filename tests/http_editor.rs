mod support;

use axum::http::{Method, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::json;

use support::{Part, TestApp, admin_multipart, json_body};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-png";

fn stored_images(app: &TestApp) -> usize {
    std::fs::read_dir(app.media_dir.path().join("images"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn bold_wraps_the_selection() {
    let app = TestApp::new();

    let response = app
        .admin_json(
            Method::POST,
            "/admin/api/editor/insert",
            json!({
                "content": "say hello",
                "selection": { "start": 4, "end": 9 },
                "syntax": "bold",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["content"], "say **hello**");
    assert_eq!(body["fragment"], "**hello**");
    assert_eq!(body["selection"]["start"], 13);
    assert!(
        body["preview"]["html"]
            .as_str()
            .expect("html")
            .contains("<strong>hello</strong>")
    );
    assert!(body.get("pending_image").is_none());
}

#[tokio::test]
async fn selection_offsets_are_utf16_units() {
    let app = TestApp::new();

    // The emoji occupies two UTF-16 code units, so "a" sits at 2..3.
    let body = json_body(
        app.admin_json(
            Method::POST,
            "/admin/api/editor/insert",
            json!({
                "content": "😀ab",
                "selection": { "start": 2, "end": 3 },
                "syntax": "bold",
            }),
        )
        .await,
    )
    .await;
    assert_eq!(body["content"], "😀**a**b");
    assert_eq!(body["selection"]["start"], 7);
}

#[tokio::test]
async fn empty_selection_inserts_placeholder_heading() {
    let app = TestApp::new();

    let body = json_body(
        app.admin_json(
            Method::POST,
            "/admin/api/editor/insert",
            json!({
                "content": "Intro",
                "selection": { "start": 5, "end": 5 },
                "syntax": "h2",
            }),
        )
        .await,
    )
    .await;
    assert_eq!(body["content"], "Intro\n## Heading\n");
}

#[tokio::test]
async fn image_syntax_defers_to_an_upload() {
    let app = TestApp::new();

    let body = json_body(
        app.admin_json(
            Method::POST,
            "/admin/api/editor/insert",
            json!({
                "content": "abc",
                "selection": { "start": 1, "end": 2 },
                "syntax": "image",
            }),
        )
        .await,
    )
    .await;
    assert_eq!(body["content"], "abc");
    assert_eq!(body["pending_image"]["selection"]["start"], 1);
    assert_eq!(body["pending_image"]["selection"]["end"], 2);
    assert!(body.get("fragment").is_none());
}

#[tokio::test]
async fn unknown_syntax_is_rejected() {
    let app = TestApp::new();

    let response = app
        .admin_json(
            Method::POST,
            "/admin/api/editor/insert",
            json!({ "content": "abc", "syntax": "blink" }),
        )
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn uploaded_image_lands_at_captured_selection() {
    let app = TestApp::new();

    // The caret sat after "Intro" when the upload began; the author kept
    // typing at the end of the document meanwhile.
    let request = admin_multipart(
        "/admin/api/editor/images",
        &[
            Part::Text("content", "Intro more text typed later"),
            Part::Text("start", "5"),
            Part::Text("end", "5"),
            Part::File {
                name: "file",
                file_name: "photo.png",
                content_type: "image/png",
                data: PNG,
            },
        ],
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let url = body["image"]["url"].as_str().expect("url").to_string();
    assert!(url.starts_with("http://localhost:3000/media/images/"));
    assert!(url.ends_with(".png"));
    assert_eq!(
        body["content"],
        format!("Intro\n![Image]({url})\n more text typed later")
    );
    assert_eq!(body["preview"]["image_sources"][0], url);
    assert_eq!(body["awaiting_images"], true);
    assert_eq!(stored_images(&app), 1);
}

#[tokio::test]
async fn paste_uploads_only_the_first_image() {
    let app = TestApp::new();

    let request = admin_multipart(
        "/admin/api/editor/paste",
        &[
            Part::Text("content", "before after"),
            Part::Text("start", "7"),
            Part::Text("end", "7"),
            Part::File {
                name: "item",
                file_name: "note.txt",
                content_type: "text/plain",
                data: b"not an image",
            },
            Part::File {
                name: "item",
                file_name: "first.png",
                content_type: "image/png",
                data: PNG,
            },
            Part::File {
                name: "item",
                file_name: "second.jpg",
                content_type: "image/jpeg",
                data: b"jpeg-bytes",
            },
        ],
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["image"]["content_type"], "image/png");
    let url = body["image"]["url"].as_str().expect("url");
    assert_eq!(body["content"], format!("before \n![Image]({url})\nafter"));
    assert_eq!(stored_images(&app), 1);
}

#[tokio::test]
async fn text_only_paste_changes_nothing() {
    let app = TestApp::new();

    let request = admin_multipart(
        "/admin/api/editor/paste",
        &[
            Part::Text("content", "unchanged"),
            Part::Text("start", "0"),
            Part::Text("end", "0"),
            Part::File {
                name: "item",
                file_name: "clip.txt",
                content_type: "text/plain",
                data: b"hello",
            },
        ],
    );
    let body = json_body(app.send(request).await).await;
    assert!(body["image"].is_null());
    assert_eq!(body["content"], "unchanged");
    assert_eq!(stored_images(&app), 0);
}

#[tokio::test]
async fn preview_reports_image_sources() {
    let app = TestApp::new();

    let body = json_body(
        app.admin_json(
            Method::POST,
            "/admin/api/editor/preview",
            json!({ "markdown": "![a](https://x.test/a.png)\n\n<script>alert(1)</script>" }),
        )
        .await,
    )
    .await;
    assert_eq!(body["image_sources"], json!(["https://x.test/a.png"]));
    assert!(!body["html"].as_str().expect("html").contains("<script>"));
}

#[tokio::test]
async fn uploads_reject_non_images_and_serve_images() {
    let app = TestApp::new();

    let rejected = app
        .send(admin_multipart(
            "/admin/api/uploads",
            &[Part::File {
                name: "file",
                file_name: "notes.txt",
                content_type: "text/plain",
                data: b"hello",
            }],
        ))
        .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let created = app
        .send(admin_multipart(
            "/admin/api/uploads",
            &[Part::File {
                name: "file",
                file_name: "cover.png",
                content_type: "image/png",
                data: PNG,
            }],
        ))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let key = json_body(created).await["key"]
        .as_str()
        .expect("key")
        .to_string();

    let served = app.get(&format!("/media/{key}")).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = served
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert_eq!(bytes.as_ref(), PNG);

    assert_eq!(
        app.get("/media/images/missing.png").await.status(),
        StatusCode::NOT_FOUND
    );
}
