use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wedding_photos::services::catalog::{PhotoCatalog, SqliteCatalog};
use wedding_photos::services::upload::{IncomingFile, PhotoError, PhotoStore};
use wedding_photos::{Config, Database};

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.upload_dir = dir.join("uploads").display().to_string();
    config.storage.database_path = dir.join("uploads.db").display().to_string();
    config.upload.thumb_size = 100;
    config.upload.max_upload_size_mb = 1;
    config
}

fn open_catalog(config: &Config) -> Arc<dyn PhotoCatalog> {
    let db = Database::open(&config.storage.database_path).expect("Failed to open database");
    db.migrate().expect("Failed to run migrations");
    Arc::new(SqliteCatalog::new(db))
}

fn create_test_store() -> (TempDir, PhotoStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(dir.path());
    let store = PhotoStore::from_config(&config, open_catalog(&config));
    store.paths().ensure().expect("Failed to create directories");
    (dir, store)
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 90))
        .expect("Failed to encode jpeg");
    buffer.into_inner()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}

mod store_integration_tests {
    use super::*;

    #[test]
    fn test_save_writes_original_thumbnail_and_record() {
        let (_dir, store) = create_test_store();
        let data = jpeg(400, 200);

        let photo = store
            .save(&IncomingFile::new("Beach.JPG", data.clone()), Some(" Tante Erna "))
            .expect("Failed to save photo");

        assert_eq!(photo.original_name, "Beach.JPG");
        assert_eq!(photo.uploader_name.as_deref(), Some("Tante Erna"));
        assert_eq!(photo.size_bytes, data.len() as i64);
        assert_eq!(photo.file_type.as_deref(), Some("jpg"));
        assert!(photo.filename.ends_with(".jpg"));

        let original = store.paths().original_path(&photo.filename).unwrap();
        assert_eq!(std::fs::read(original).unwrap(), data);

        let thumb_name = photo.thumbnail.clone().expect("thumbnail missing");
        let thumb_path = store.paths().thumbnail_path(&thumb_name).unwrap();
        let thumb = image::open(thumb_path).expect("Failed to open thumbnail");
        assert_eq!(thumb.dimensions(), (100, 50));

        let listed = store.catalog().list().unwrap();
        assert_eq!(listed, vec![photo]);
    }

    #[test]
    fn test_disallowed_extension_writes_nothing() {
        let (_dir, store) = create_test_store();
        let report = store.save_batch(vec![IncomingFile::new("notes.txt", b"hello".to_vec())], None);

        assert!(report.saved.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, "file type .txt is not allowed");
        assert_eq!(file_count(store.paths().upload_dir()), 0);
        assert_eq!(store.catalog().stats().unwrap().count, 0);
    }

    #[test]
    fn test_corrupt_image_rejected() {
        let (_dir, store) = create_test_store();
        let err = store
            .save(&IncomingFile::new("fake.jpg", b"not really a jpeg".to_vec()), None)
            .unwrap_err();

        assert!(matches!(err, PhotoError::Decode(_)));
        assert!(err.is_client_error());
        assert_eq!(file_count(store.paths().upload_dir()), 0);
    }

    #[test]
    fn test_batch_files_are_independent() {
        let (_dir, store) = create_test_store();
        let report = store.save_batch(
            vec![
                IncomingFile::new("one.jpg", jpeg(50, 50)),
                IncomingFile::new("virus.exe", b"MZ".to_vec()),
                IncomingFile::new("two.jpg", jpeg(60, 40)),
                IncomingFile::new("broken.png", b"\x89PNG garbage".to_vec()),
            ],
            None,
        );

        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].original_name, "virus.exe");
        assert_eq!(report.rejected[1].reason, "unsupported or corrupt image");
        assert_eq!(store.catalog().stats().unwrap().count, 2);
    }

    #[test]
    fn test_identical_names_do_not_collide() {
        let (_dir, store) = create_test_store();
        let report = store.save_batch(
            (0..5)
                .map(|_| IncomingFile::new("IMG_0001.jpg", jpeg(20, 20)))
                .collect(),
            None,
        );

        assert_eq!(report.saved.len(), 5);
        let mut names: Vec<_> = report.saved.iter().map(|p| p.filename.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
        assert_eq!(file_count(store.paths().upload_dir()), 5);
    }

    #[test]
    fn test_list_newest_first_and_stats() {
        let (_dir, store) = create_test_store();
        let first = store.save(&IncomingFile::new("a.jpg", jpeg(10, 10)), None).unwrap();
        let second = store.save(&IncomingFile::new("b.jpg", jpeg(10, 10)), None).unwrap();

        let listed = store.catalog().list().unwrap();
        assert_eq!(listed[0].filename, second.filename);
        assert_eq!(listed[1].filename, first.filename);

        let stats = store.catalog().stats().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_bytes, first.size_bytes + second.size_bytes);
    }

    #[test]
    fn test_thumbnail_failure_keeps_original() {
        let (_dir, store) = create_test_store();
        std::fs::remove_dir_all(store.paths().thumb_dir()).expect("Failed to remove thumb dir");
        let data = jpeg(200, 100);

        let photo = store
            .save(&IncomingFile::new("a.jpg", data.clone()), None)
            .expect("Save should succeed without a thumbnail");

        assert!(photo.thumbnail.is_none());
        let original = store.paths().original_path(&photo.filename).unwrap();
        assert_eq!(std::fs::read(original).unwrap(), data);

        let stored = store.catalog().get(&photo.filename).unwrap().unwrap();
        assert!(stored.thumbnail.is_none());
    }

    #[test]
    fn test_store_refuses_shared_thumbnail_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.storage.thumb_dir = Some(config.storage.upload_dir.clone());

        assert!(config.validate().is_err());
        let store = PhotoStore::from_config(&config, open_catalog(&config));
        assert!(store.paths().ensure().is_err());
    }

    #[test]
    fn test_delete_removes_files_and_record() {
        let (_dir, store) = create_test_store();
        let photo = store.save(&IncomingFile::new("a.jpg", jpeg(30, 30)), None).unwrap();
        let original = store.paths().original_path(&photo.filename).unwrap();
        let thumb = store
            .paths()
            .thumbnail_path(photo.thumbnail.as_deref().unwrap())
            .unwrap();

        let removed = store.delete(&photo.filename).expect("Failed to delete");
        assert_eq!(removed.filename, photo.filename);
        assert!(!original.exists());
        assert!(!thumb.exists());
        assert!(store.catalog().get(&photo.filename).unwrap().is_none());

        assert!(matches!(
            store.delete(&photo.filename),
            Err(PhotoError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_tolerates_missing_files() {
        let (_dir, store) = create_test_store();
        let photo = store.save(&IncomingFile::new("a.jpg", jpeg(30, 30)), None).unwrap();
        std::fs::remove_file(store.paths().original_path(&photo.filename).unwrap()).unwrap();

        assert!(store.delete(&photo.filename).is_ok());
        assert_eq!(store.catalog().stats().unwrap().count, 0);
    }

    #[test]
    fn test_regenerate_missing_thumbnails() {
        let (_dir, store) = create_test_store();
        let photo = store.save(&IncomingFile::new("a.jpg", jpeg(300, 150)), None).unwrap();
        let thumb_name = photo.thumbnail.clone().unwrap();
        let thumb_path = store.paths().thumbnail_path(&thumb_name).unwrap();
        std::fs::remove_file(&thumb_path).unwrap();

        assert_eq!(store.regenerate_thumbnails().unwrap(), 1);
        assert!(thumb_path.is_file());

        // Nothing left to do on a second pass.
        assert_eq!(store.regenerate_thumbnails().unwrap(), 0);
    }

    #[test]
    fn test_catalog_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let filename = {
            let store = PhotoStore::from_config(&config, open_catalog(&config));
            store.paths().ensure().unwrap();
            store
                .save(&IncomingFile::new("keep.jpg", jpeg(10, 10)), None)
                .unwrap()
                .filename
        };

        let catalog = open_catalog(&config);
        assert!(catalog.get(&filename).unwrap().is_some());
    }
}

mod http_integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;
    use wedding_photos::web::{self, AppState, ADMIN_CODE_HEADER};

    const BOUNDARY: &str = "----weddingphotosboundary";

    struct TestApp {
        dir: TempDir,
        router: Router,
    }

    fn create_app(upload_code: Option<&str>, admin_code: Option<&str>) -> TestApp {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = test_config(dir.path());
        config.access.upload_code = upload_code.map(str::to_string);
        config.access.admin_code = admin_code.map(str::to_string);

        let catalog = open_catalog(&config);
        let state = AppState::new(config, catalog).expect("Failed to build state");
        state.store.paths().ensure().expect("Failed to create directories");

        TestApp {
            dir,
            router: web::router(Arc::new(state)),
        }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, Vec<u8>),
    }

    fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(parts: Vec<Part<'_>>, json: bool) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if json {
            builder = builder.header(header::ACCEPT, "application/json");
        }
        builder.body(Body::from(multipart_body(parts))).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = send(app, request).await;
        let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn upload_one(app: &TestApp, filename: &str) -> String {
        let (status, report) = send_json(
            app,
            upload_request(vec![Part::File("files", filename, jpeg(80, 60))], true),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        report["saved"][0]["filename"]
            .as_str()
            .expect("saved filename")
            .to_string()
    }

    #[tokio::test]
    async fn test_open_upload_and_listing() {
        let app = create_app(None, None);
        let (status, report) = send_json(
            &app,
            upload_request(
                vec![
                    Part::Text("name", "Uncle Bob"),
                    Part::File("files", "first.jpg", jpeg(80, 60)),
                    Part::File("files", "second.jpg", jpeg(60, 80)),
                ],
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["saved"].as_array().unwrap().len(), 2);
        assert_eq!(report["rejected"].as_array().unwrap().len(), 0);
        assert_eq!(report["saved"][0]["uploader_name"], "Uncle Bob");

        let (status, list) = send_json(&app, get("/api/list")).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap().clone();
        assert_eq!(list.len(), 2);
        assert!(list[0]["url"].as_str().unwrap().starts_with("http://localhost/uploads/"));
        assert!(list[0]["thumb"].as_str().unwrap().contains("/thumbs/"));

        let (_, stats) = send_json(&app, get("/api/stats")).await;
        assert_eq!(stats["total_photos"], 2);
        assert_eq!(stats["status"], "active");
    }

    #[tokio::test]
    async fn test_upload_code_required() {
        let app = create_app(Some("love2024"), None);

        let (status, body) = send_json(
            &app,
            upload_request(vec![Part::File("files", "a.jpg", jpeg(10, 10))], true),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");

        let (status, _) = send_json(
            &app,
            upload_request(
                vec![
                    Part::Text("code", "wrong"),
                    Part::File("files", "a.jpg", jpeg(10, 10)),
                ],
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, stats) = send_json(&app, get("/api/stats")).await;
        assert_eq!(stats["total_photos"], 0);

        let (status, report) = send_json(
            &app,
            upload_request(
                vec![
                    Part::Text("code", "love2024"),
                    Part::File("files", "a.jpg", jpeg(10, 10)),
                ],
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["saved"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_code_rejected_before_file_data() {
        let app = create_app(Some("love2024"), None);

        // The body stops mid-file without a closing boundary. Reading it to
        // the end would fail as malformed; the code check must answer first.
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"code\"\r\n\r\nwrong\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"a.jpg\"\r\n\r\n",
                b = BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(&jpeg(10, 10)[..20]);

        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .header(header::ACCEPT, "application/json")
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn test_code_must_precede_files() {
        let app = create_app(Some("love2024"), None);
        let (status, _) = send_json(
            &app,
            upload_request(
                vec![
                    Part::File("files", "a.jpg", jpeg(10, 10)),
                    Part::Text("code", "love2024"),
                ],
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, stats) = send_json(&app, get("/api/stats")).await;
        assert_eq!(stats["total_photos"], 0);
    }

    #[tokio::test]
    async fn test_listing_without_thumbnail() {
        let app = create_app(None, None);
        std::fs::remove_dir_all(app.dir.path().join("uploads/thumbs"))
            .expect("Failed to remove thumb dir");

        let filename = upload_one(&app, "no-thumb.jpg").await;

        let (status, list) = send_json(&app, get("/api/list")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["filename"], filename.as_str());
        assert!(list[0]["thumb"].is_null());

        let (status, _, _) = send(&app, get(&format!("/uploads/{}", filename))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body)
            .unwrap()
            .contains(&format!("src=\"/uploads/{}\"", filename)));
    }

    #[tokio::test]
    async fn test_form_upload_redirects_with_flash() {
        let app = create_app(Some("love2024"), None);

        let (status, headers, _) = send(
            &app,
            upload_request(
                vec![
                    Part::Text("code", "nope"),
                    Part::File("files", "a.jpg", jpeg(10, 10)),
                ],
                false,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/upload");
        assert!(headers[header::SET_COOKIE].to_str().unwrap().starts_with("flash="));

        let (status, headers, _) = send(
            &app,
            upload_request(
                vec![
                    Part::Text("code", "love2024"),
                    Part::File("files", "a.jpg", jpeg(10, 10)),
                ],
                false,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_upload_without_files() {
        let app = create_app(None, None);
        let (status, _) = send_json(&app, upload_request(vec![Part::Text("name", "x")], true)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mixed_batch_reports_rejections() {
        let app = create_app(None, None);
        let (status, report) = send_json(
            &app,
            upload_request(
                vec![
                    Part::File("files", "ok.jpg", jpeg(10, 10)),
                    Part::File("files", "bad.txt", b"text".to_vec()),
                ],
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["saved"].as_array().unwrap().len(), 1);
        assert_eq!(report["rejected"][0]["original_name"], "bad.txt");
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let app = create_app(None, None);
        let mut big = jpeg(10, 10);
        big.resize(2 * 1024 * 1024, 0);

        let (status, report) = send_json(
            &app,
            upload_request(vec![Part::File("files", "big.jpg", big)], true),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(report["saved"].as_array().unwrap().is_empty());
        assert!(report["rejected"][0]["reason"]
            .as_str()
            .unwrap()
            .starts_with("file too large"));
    }

    #[tokio::test]
    async fn test_serves_original_and_thumbnail() {
        let app = create_app(None, None);
        let filename = upload_one(&app, "pic.jpg").await;

        let (status, headers, body) = send(&app, get(&format!("/uploads/{}", filename))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(&body[..2], &[0xFF, 0xD8]);

        let (_, list) = send_json(&app, get("/api/list")).await;
        let thumb_url = list[0]["thumb"].as_str().unwrap().to_string();
        let thumb_path = thumb_url.trim_start_matches("http://localhost");
        let (status, _, _) = send(&app, get(thumb_path)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, get("/uploads/missing.jpg")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&app, get("/uploads/..%2Fuploads.db")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_api_requires_admin_code() {
        let app = create_app(None, Some("boss"));
        let filename = upload_one(&app, "pic.jpg").await;
        let uri = format!("/api/photos/{}", filename);

        let delete = |code: Option<&str>| {
            let mut builder = Request::builder().method("DELETE").uri(&uri);
            if let Some(code) = code {
                builder = builder.header(ADMIN_CODE_HEADER, code);
            }
            builder.body(Body::empty()).unwrap()
        };

        let (status, _) = send_json(&app, delete(None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send_json(&app, delete(Some("guess"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(&app, delete(Some("boss"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) = send(&app, get(&format!("/uploads/{}", filename))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_json(&app, delete(Some("boss"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");

        let (_, stats) = send_json(&app, get("/api/stats")).await;
        assert_eq!(stats["total_photos"], 0);
    }

    #[tokio::test]
    async fn test_admin_form_delete() {
        let app = create_app(None, Some("boss"));
        let filename = upload_one(&app, "pic.jpg").await;

        let form = |code: &str| {
            Request::builder()
                .method("POST")
                .uri("/admin/delete")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("admin_code={}&filename={}", code, filename)))
                .unwrap()
        };

        let (status, _, _) = send(&app, form("wrong")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, headers, _) = send(&app, form("boss")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/?admin=boss");

        let (_, stats) = send_json(&app, get("/api/stats")).await;
        assert_eq!(stats["total_photos"], 0);
    }

    #[tokio::test]
    async fn test_gallery_page_renders() {
        let app = create_app(None, Some("boss"));
        upload_one(&app, "cake-cutting.jpg").await;

        let (status, headers, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("cake-cutting.jpg"));
        assert!(!html.contains("/admin/delete"));

        let (_, _, body) = send(&app, get("/?admin=boss")).await;
        assert!(String::from_utf8(body).unwrap().contains("/admin/delete"));

        let (_, _, body) = send(&app, get("/?admin=nope")).await;
        assert!(!String::from_utf8(body).unwrap().contains("/admin/delete"));
    }

    #[tokio::test]
    async fn test_upload_page_shows_code_field_only_when_required() {
        let app = create_app(Some("love2024"), None);
        let (status, _, body) = send(&app, get("/upload")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("name=\"code\""));

        let app = create_app(None, None);
        let (_, _, body) = send(&app, get("/upload")).await;
        assert!(!String::from_utf8(body).unwrap().contains("name=\"code\""));
    }

    #[tokio::test]
    async fn test_qr_code_png() {
        let app = create_app(None, None);
        let (status, headers, body) = send(&app, get("/qr.png")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_health_and_static_assets() {
        let app = create_app(None, None);
        let (status, _, body) = send(&app, get("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        let (status, headers, _) = send(&app, get("/static/css/styles.css")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/css"));

        let (status, _, _) = send(&app, get("/static/missing.js")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
