use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use tunevault::api::{self, AppState};
use tunevault::config::Config;
use tunevault::db::init_db;
use tunevault::{NewSong, Repository, SongId};

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    token: String,
    temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let upload_dir = temp_dir.path().join("uploads").to_string_lossy().to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let config = Config::for_paths(db_path, upload_dir);
    let app = api::create_router(AppState::new(repo.clone(), config));

    let user_id = repo.register_user("curator", "pw").await.unwrap();
    let token = repo.create_session(user_id, 1).await.unwrap().token;

    TestApp {
        app,
        repo,
        token,
        temp: temp_dir,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", self.token));
        let req = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(axum::body::Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(axum::body::Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn song(&self, title: &str, configure: impl FnOnce(&mut NewSong)) -> SongId {
        let mut song = NewSong::new(title, format!("/music/{}.mp3", title));
        configure(&mut song);
        self.repo.insert_song(&song).await.unwrap()
    }
}

fn titles(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["songTitle"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_get_update_delete_song() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(
            "POST",
            "/v1/songs",
            Some(json!({
                "songTitle": "Dancing Queen",
                "path": "/music/queen.mp3",
                "author": "ABBA",
                "tempoStart": 96,
                "tempoEnd": 104
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uuid = body["uuid"].as_str().unwrap().to_string();

    let (status, body) = app.send("GET", &format!("/v1/songs/{}", uuid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["songTitle"], "Dancing Queen");
    assert_eq!(body["tempoRange"], "96-104");
    assert_eq!(body["queryCount"], 0);

    let (status, body) = app
        .send(
            "PUT",
            &format!("/v1/songs/{}", uuid),
            Some(json!({"songTitle": "Dancing Queen (Live)", "path": "/music/live.mp3"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["songTitle"], "Dancing Queen (Live)");
    assert_eq!(body["author"], Value::Null);

    let (status, _) = app.send("DELETE", &format!("/v1/songs/{}", uuid), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send("GET", &format!("/v1/songs/{}", uuid), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_songs_are_rejected() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(
            "POST",
            "/v1/songs",
            Some(json!({"songTitle": "Backwards", "path": "/a.mp3", "tempoStart": 120, "tempoEnd": 80})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tempo"));

    let (status, _) = app
        .send("POST", "/v1/songs", Some(json!({"path": "/a.mp3"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("GET", "/v1/songs/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send("GET", "/v1/songs", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_tempo_filter_uses_interval_overlap() {
    let app = setup_test_app().await;
    let set_tempo = |start, end| {
        move |s: &mut NewSong| {
            s.tempo_start = Some(start);
            s.tempo_end = Some(end);
        }
    };
    app.song("Slow Start", set_tempo(60, 75)).await;
    app.song("Late Overlap", set_tempo(85, 100)).await;
    app.song("Inside", set_tempo(72, 84)).await;
    app.song("Too Fast", set_tempo(95, 120)).await;
    app.song("No Tempo", |_| {}).await;

    let (status, body) = app
        .send("GET", "/v1/search?tempoStart=70&tempoEnd=90", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut found = titles(&body, "results");
    found.sort();
    assert_eq!(found, vec!["Inside", "Late Overlap", "Slow Start"]);
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_title_match_outranks_tags_match() {
    let app = setup_test_app().await;
    app.song("Quiet Evening", |s| s.tags = Some("sunrise,ambient".into()))
        .await;
    app.song("Sunrise Boulevard", |_| {}).await;
    app.song("Unrelated", |_| {}).await;

    let (status, body) = app.send("GET", "/v1/search?q=sunrise", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        titles(&body, "results"),
        vec!["Sunrise Boulevard", "Quiet Evening", "Unrelated"],
        "non-matching songs rank last"
    );
}

#[tokio::test]
async fn test_search_filters_by_metadata() {
    let app = setup_test_app().await;
    app.song("Waterloo", |s| {
        s.author = Some("ABBA".into());
        s.music_key = Some("D".into());
    })
    .await;
    app.song("Fernando", |s| {
        s.author = Some("ABBA".into());
        s.music_key = Some("A".into());
    })
    .await;
    app.song("Heroes", |s| s.author = Some("Bowie".into())).await;

    let (_, body) = app.send("GET", "/v1/search?author=ABBA&musicKey=A", None).await;
    assert_eq!(titles(&body, "results"), vec!["Fernando"]);

    let (_, body) = app.send("GET", "/v1/search?author=Nobody", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_search_bumps_query_count_and_trending() {
    let app = setup_test_app().await;
    let hit = app.song("Popular Tune", |_| {}).await;
    app.song("Obscure Tune", |_| {}).await;

    for _ in 0..2 {
        let (status, _) = app.send("GET", "/v1/search?q=popular&limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let song = app.repo.get_song(&hit).await.unwrap().unwrap();
    assert_eq!(song.query_count, 2);

    let (status, body) = app.send("GET", "/v1/songs/trending?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body, "songs"), vec!["Popular Tune"]);
}

#[tokio::test]
async fn test_lyrics_search_finds_substring() {
    let app = setup_test_app().await;
    let long_verse = format!(
        "{} you can dance, you can jive {}",
        "night is young and the music's high ".repeat(8),
        "having the time of your life ".repeat(8)
    );
    app.song("Dancing Queen", |s| s.lyrics = Some(long_verse.clone()))
        .await;
    app.song("Heroes", |s| s.lyrics = Some("we can be heroes just for one day".into()))
        .await;
    app.song("Silent", |_| {}).await;

    let (status, body) = app
        .send("GET", "/v1/search/lyrics?q=You%20Can%20Dance", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body, "results")[0], "Dancing Queen");

    let (status, _) = app.send("GET", "/v1/search/lyrics?q=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_combined_search_appends_lyrics_matches_once() {
    let app = setup_test_app().await;
    app.song("Heroes", |s| s.lyrics = Some("we can be heroes just for one day".into()))
        .await;
    app.song("Dancing Queen", |s| s.lyrics = Some("you can dance you can jive".into()))
        .await;

    let (status, body) = app
        .send("GET", "/v1/search?q=heroes&limit=1&lyrics=we%20can%20be%20heroes", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body, "results"), vec!["Heroes"]);

    let (_, body) = app
        .send("GET", "/v1/search?q=heroes&limit=1&lyrics=you%20can%20dance", None)
        .await;
    assert_eq!(titles(&body, "results"), vec!["Heroes", "Dancing Queen"]);
}

#[tokio::test]
async fn test_batch_update_skips_invalid_patches() {
    let app = setup_test_app().await;
    let a = app
        .song("A", |s| {
            s.tempo_start = Some(80);
            s.tempo_end = Some(90);
        })
        .await;
    let b = app.song("B", |_| {}).await;

    let (status, body) = app
        .send(
            "POST",
            "/v1/songs/batch",
            Some(json!([
                {"uuid": a.as_str(), "tempo_start": 100},
                {"uuid": b.as_str(), "author": "New Author", "tempoStart": 60, "tempoEnd": 70},
                {"uuid": b.as_str(), "query_count": 999},
                {"author": "no uuid"}
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let a = app.repo.get_song(&a).await.unwrap().unwrap();
    assert_eq!(a.tempo_start, Some(80), "constraint-violating patch not applied");
    let b = app.repo.get_song(&b).await.unwrap().unwrap();
    assert_eq!(b.author.as_deref(), Some("New Author"));
    assert_eq!(b.tempo_range.as_deref(), Some("60-70"));
    assert_eq!(b.query_count, 0);
}

#[tokio::test]
async fn test_recommendations_prefer_close_tempo() {
    let app = setup_test_app().await;
    let seed = app
        .song("Seed", |s| {
            s.category = Some("disco".into());
            s.tempo_start = Some(100);
            s.tempo_end = Some(110);
        })
        .await;
    app.song("Near", |s| {
        s.category = Some("disco".into());
        s.tempo_start = Some(102);
        s.tempo_end = Some(112);
    })
    .await;
    app.song("Far", |s| {
        s.category = Some("disco".into());
        s.tempo_start = Some(60);
        s.tempo_end = Some(70);
    })
    .await;
    app.song("Other Genre", |s| {
        s.category = Some("metal".into());
        s.tempo_start = Some(100);
        s.tempo_end = Some(110);
    })
    .await;

    let (status, body) = app
        .send("GET", &format!("/v1/songs/{}/recommendations", seed), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body, "songs"), vec!["Near", "Far"]);

    let (status, _) = app
        .send("GET", &format!("/v1/songs/{}/recommendations", SongId::generate()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_stores_file_and_creates_song() {
    let app = setup_test_app().await;
    let boundary = "tunevault-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"song_title\"\r\n\r\nUploaded Song\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"tempo_start\"\r\n\r\n90\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"tempo_end\"\r\n\r\n95\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"My Song.mp3\"\r\n\
         Content-Type: audio/mpeg\r\n\r\nID3-fake-audio\r\n--{b}--\r\n",
        b = boundary
    );
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/songs/upload")
        .header("Authorization", format!("Bearer {}", app.token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(axum::body::Body::from(body))
        .unwrap();

    let resp = app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let created: Value = serde_json::from_slice(&bytes).unwrap();
    let uuid: SongId = created["uuid"].as_str().unwrap().parse().unwrap();

    let song = app.repo.get_song(&uuid).await.unwrap().unwrap();
    assert_eq!(song.song_title, "Uploaded Song");
    assert_eq!(song.tempo_range.as_deref(), Some("90-95"));
    assert!(song.path.ends_with("_My_Song.mp3"));
    assert!(song.path.starts_with(app.temp.path().join("uploads").to_str().unwrap()));
    assert_eq!(std::fs::read(&song.path).unwrap(), b"ID3-fake-audio");
}

#[tokio::test]
async fn test_rejected_upload_leaves_no_files_behind() {
    let app = setup_test_app().await;
    let boundary = "tunevault-boundary";
    let uploads = app.temp.path().join("uploads");

    for (tempo_start, tempo_end) in [("120", "80"), ("fast", "90")] {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"early.mp3\"\r\n\
             Content-Type: audio/mpeg\r\n\r\nID3-fake-audio\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"img\"; filename=\"cover.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNG\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"song_title\"\r\n\r\nBackwards\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"tempo_start\"\r\n\r\n{s}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"tempo_end\"\r\n\r\n{e}\r\n--{b}--\r\n",
            b = boundary,
            s = tempo_start,
            e = tempo_end
        );
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/songs/upload")
            .header("Authorization", format!("Bearer {}", app.token))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(axum::body::Body::from(body))
            .unwrap();

        let resp = app.app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "tempo {}-{}", tempo_start, tempo_end);

        let leftover = std::fs::read_dir(&uploads)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0, "tempo {}-{} left files behind", tempo_start, tempo_end);
    }

    assert!(app.repo.list_songs(None).await.unwrap().is_empty());
}
