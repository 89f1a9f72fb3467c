use anyhow::Result;
use async_trait::async_trait;
use httpmock::prelude::*;
use page_imgzip::{BatchOrchestrator, HarvestConfig, HarvestError, PageStatus, Sleeper};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _delay: Duration) {}
}

fn orchestrator(root: &Path, urls: &[String]) -> BatchOrchestrator {
    let input = root.join("web.txt");
    std::fs::write(&input, urls.join("\n\n")).unwrap();
    let config = HarvestConfig {
        input_path: input,
        output_root: root.join("out"),
        report_path: Some(root.join("out/report.json")),
        ..HarvestConfig::default()
    };
    BatchOrchestrator::with_sleeper(config, Arc::new(InstantSleeper)).unwrap()
}

fn zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.push((file.name().to_string(), data));
    }
    entries.sort();
    entries
}

fn mock_image(server: &MockServer, path: &str, content_type: &str, body: &'static [u8]) {
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200).header("content-type", content_type).body(body);
    });
}

#[tokio::test]
async fn failing_page_does_not_affect_its_neighbours() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/first");
        then.status(200).body(
            r#"<html><head><title>First Page</title></head><body>
                <img src="img/a.png"><img src="/img/b">
            </body></html>"#,
        );
    });
    let broken_page = server.mock(|when, then| {
        when.method(GET).path("/second");
        then.status(500);
    });
    let third_markup = format!(
        r#"<html><head><title>Third: Page</title></head><body><img src="{}"></body></html>"#,
        server.url("/cdn/c.jpg")
    );
    server.mock(|when, then| {
        when.method(GET).path("/third");
        then.status(200).body(&third_markup);
    });
    mock_image(&server, "/img/a.png", "image/png", b"aaa");
    mock_image(&server, "/img/b", "image/gif", b"bbb");
    mock_image(&server, "/cdn/c.jpg", "image/jpeg", b"ccc");

    let urls = vec![
        server.url("/first"),
        server.url("/second"),
        server.url("/third"),
    ];
    let report = orchestrator(temp.path(), &urls).run().await?;

    let out = temp.path().join("out");
    assert_eq!(
        zip_entries(&out.join("First Page.zip")),
        vec![
            ("001.png".to_string(), b"aaa".to_vec()),
            ("002.gif".to_string(), b"bbb".to_vec()),
        ]
    );
    assert_eq!(
        zip_entries(&out.join("Third Page.zip")),
        vec![("001.jpg".to_string(), b"ccc".to_vec())]
    );
    assert!(!out.join("First Page_images").exists());
    assert!(!out.join("Third Page_images").exists());

    // Title and image fetch each hit the broken page once.
    broken_page.assert_hits(2);
    assert!(out.join("untitled_images").is_dir());
    assert!(!out.join("untitled.zip").exists());

    assert_eq!(report.pages.len(), 3);
    assert!(matches!(
        report.pages[0].status,
        PageStatus::Archived {
            images_found: 2,
            images_saved: 2,
            ..
        }
    ));
    assert!(matches!(report.pages[1].status, PageStatus::PageFailed { .. }));
    assert_eq!(report.pages[1].title, "untitled");
    assert!(matches!(report.pages[2].status, PageStatus::Archived { .. }));
    assert_eq!(report.failed(), 1);
    Ok(())
}

#[tokio::test]
async fn page_without_images_leaves_no_archive() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/text");
        then.status(200)
            .body("<html><head><title>Just Text</title></head><body><p>hi</p></body></html>");
    });

    let report = orchestrator(temp.path(), &[server.url("/text")])
        .run()
        .await?;

    let out = temp.path().join("out");
    assert_eq!(report.pages[0].status, PageStatus::NoImages);
    assert!(!out.join("Just Text.zip").exists());
    let dir = out.join("Just Text_images");
    assert!(dir.is_dir());
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 0);
    assert!(!report.has_failures());
    Ok(())
}

#[tokio::test]
async fn slow_title_fetch_still_archives_under_fallback_name() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    // Slower than the title timeout, well inside the page timeout.
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .delay(Duration::from_millis(600))
            .body(r#"<html><head><title>Never Seen</title></head><body><img src="/a.png"></body></html>"#);
    });
    mock_image(&server, "/a.png", "image/png", b"aaa");

    let input = temp.path().join("web.txt");
    std::fs::write(&input, server.url("/slow"))?;
    let out = temp.path().join("out");
    let config = HarvestConfig {
        input_path: input,
        output_root: out.clone(),
        title_timeout: Duration::from_millis(200),
        page_timeout: Duration::from_secs(10),
        ..HarvestConfig::default()
    };
    let report = BatchOrchestrator::with_sleeper(config, Arc::new(InstantSleeper))?
        .run()
        .await?;

    assert_eq!(report.pages[0].title, "untitled");
    assert!(matches!(
        report.pages[0].status,
        PageStatus::Archived {
            images_found: 1,
            images_saved: 1,
            ..
        }
    ));
    assert_eq!(
        zip_entries(&out.join("untitled.zip")),
        vec![("001.png".to_string(), b"aaa".to_vec())]
    );
    assert!(!out.join("untitled_images").exists());
    assert!(!out.join("Never Seen.zip").exists());
    Ok(())
}

#[tokio::test]
async fn failed_images_are_left_out_of_the_archive() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mixed");
        then.status(200).body(
            r#"<title>Mixed</title><img src="/gone.png"><img src="/ok.png"><img src="/gone2.png">"#,
        );
    });
    let gone = server.mock(|when, then| {
        when.method(GET).path("/gone.png");
        then.status(404);
    });
    let gone2 = server.mock(|when, then| {
        when.method(GET).path("/gone2.png");
        then.status(502);
    });
    mock_image(&server, "/ok.png", "image/png", b"ok");

    let report = orchestrator(temp.path(), &[server.url("/mixed")])
        .run()
        .await?;

    gone.assert_hits(3);
    gone2.assert_hits(3);
    let out = temp.path().join("out");
    assert_eq!(
        zip_entries(&out.join("Mixed.zip")),
        vec![("002.png".to_string(), b"ok".to_vec())]
    );
    assert!(!out.join("Mixed_images").exists());
    assert!(matches!(
        report.pages[0].status,
        PageStatus::Archived {
            images_found: 3,
            images_saved: 1,
            ..
        }
    ));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("report.json"))?)?;
    assert_eq!(json["pages"][0]["status"], "archived");
    assert_eq!(json["pages"][0]["images_saved"], 1);
    Ok(())
}

#[tokio::test]
async fn repeated_runs_produce_identical_names() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gallery");
        then.status(200).body(
            r#"<title>Gallery</title>
               <img src="z.png"><img src="a.gif"><img src="m"><img src="b.jpeg">"#,
        );
    });
    mock_image(&server, "/z.png", "image/png", b"z");
    mock_image(&server, "/a.gif", "image/gif", b"a");
    mock_image(&server, "/m", "image/png", b"m");
    mock_image(&server, "/b.jpeg", "image/jpeg", b"b");

    let urls = vec![server.url("/gallery")];
    let archive = temp.path().join("out/Gallery.zip");

    orchestrator(temp.path(), &urls).run().await?;
    let first = zip_entries(&archive);
    orchestrator(temp.path(), &urls).run().await?;
    let second = zip_entries(&archive);

    let names: Vec<&str> = first.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["001.png", "002.gif", "003.png", "004.jpeg"]);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn missing_url_list_aborts_the_run() {
    let temp = TempDir::new().unwrap();
    let config = HarvestConfig {
        input_path: temp.path().join("web.txt"),
        output_root: temp.path().join("out"),
        ..HarvestConfig::default()
    };
    let orchestrator = BatchOrchestrator::with_sleeper(config, Arc::new(InstantSleeper)).unwrap();

    let result = orchestrator.run().await;

    assert!(matches!(result, Err(HarvestError::InputNotFound { .. })));
    assert!(!temp.path().join("out").exists());
}
