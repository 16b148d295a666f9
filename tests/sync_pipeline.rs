use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use solipull::config::SyncConfig;
use solipull::net::{CrawlLimits, HttpFetcher};
use solipull::observer::{Observer, Severity, TracingObserver};
use solipull::scrapers::{ComicReleasesScraper, ScrapeRequest};
use solipull::service::SolicitationService;
use solipull::store::{JsonStore, MemoryStore, Persistence};
use solipull::{ComicBook, Format};
use tokio_util::sync::CancellationToken;

const DC_PAGE: &str = r#"<!doctype html>
<html>
  <body>
    <div class="wp-block-columns">
      <div class="wp-block-column">
        <p>BATMAN #1</p>
        <p>Writer(s): MATT FRACTION<br>Artist(s): JORGE JIMENEZ<br>$4.99 US | 40 pages</p>
        <p>On Sale: 3/4/26</p>
      </div>
    </div>
    <div class="wp-block-columns">
      <div class="wp-block-column">
        <p>DETECTIVE COMICS #1107</p>
        <p>Writer(s): TOM TAYLOR<br>Artist(s): MIKEL JANIN<br>$4.99 US | 32 pages</p>
        <p>On Sale: 3/25/26</p>
      </div>
    </div>
    <div class="wp-block-columns">
      <div class="wp-block-column">
        <p>BATMAN #1</p>
        <p>Writer(s): MATT FRACTION<br>Artist(s): JORGE JIMENEZ<br>$4.99 US | 40 pages</p>
        <p>On Sale: 3/4/26</p>
      </div>
    </div>
  </body>
</html>
"#;

const MARVEL_PAGE: &str = r#"<!doctype html>
<html>
  <body>
    <div class="wp-block-columns">
      <div class="wp-block-column">
        <p>X-MEN #1</p>
        <p>Writer(s): JED MACKAY<br>$4.99 US | 32 pages</p>
      </div>
    </div>
    <div>
      <p>FOC 01/26/26,<strong>ON-SALE 03/11/26</strong></p>
      <ul class="wp-block-list"><li>X-MEN #1</li></ul>
    </div>
  </body>
</html>
"#;

fn sitemap(base_url: &str, year: i32) -> String {
    let next = year + 1;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base_url}/2025/12/dc-march-{year}-solicitations/</loc></url>
  <url><loc>{base_url}/2025/12/marvel-march-{year}-solicitations/</loc></url>
  <url><loc>{base_url}/2025/12/dc-march-{next}-solicitations/</loc></url>
  <url><loc>{base_url}/2025/12/image-march-{year}-solicitations/</loc></url>
  <url><loc>{base_url}/about/</loc></url>
</urlset>
"#
    )
}

/// Counts scraped records and completion events.
#[derive(Default)]
struct ProgressCounter {
    comics: AtomicUsize,
    completions: AtomicUsize,
}

impl Observer for ProgressCounter {
    fn on_url_found(&self, _n: usize) {}

    fn on_navigation_complete(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    fn on_comic_book_scraped(&self, n: usize) {
        self.comics.fetch_add(n, Ordering::Relaxed);
    }

    fn on_scraping_complete(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, _context: &str, _severity: Severity, _message: &str, _fields: &[(&str, &str)]) {}
}

fn spawn_site_server() -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let base_url = format!("http://{}", server.server_addr());
    let year = Local::now().year();
    let sitemap = sitemap(&base_url, year);

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let path = request.url().to_string();
            let (status, body) = if path == "/sitemap.xml" {
                (200, sitemap.clone())
            } else if path == format!("/2025/12/dc-march-{year}-solicitations/") {
                (200, DC_PAGE.to_string())
            } else if path == format!("/2025/12/marvel-march-{year}-solicitations/") {
                (200, MARVEL_PAGE.to_string())
            } else if path.contains("image-") {
                panic!("unrequested publisher was fetched: {path}");
            } else {
                (500, "internal error".to_string())
            };

            let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
        }
    });

    (base_url, shutdown_tx, handle)
}

fn config(base_url: &str) -> SyncConfig {
    SyncConfig {
        sitemap_url: format!("{base_url}/sitemap.xml"),
        request_timeout_secs: 5,
        batch_size: 2,
        list: CrawlLimits::new(1, 0),
        detail: CrawlLimits::new(2, 0),
        ..SyncConfig::default()
    }
}

fn service(config: &SyncConfig, store: Arc<dyn Persistence>) -> SolicitationService {
    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout()).unwrap();
    let scraper = ComicReleasesScraper::new(config, Arc::new(fetcher)).unwrap();
    SolicitationService::new(Arc::new(scraper), store, config).unwrap()
}

fn request() -> ScrapeRequest {
    ScrapeRequest::new(vec!["march".into()], vec!["dc".into(), "marvel".into()])
}

fn find<'a>(comics: &'a [ComicBook], title: &str) -> &'a ComicBook {
    comics
        .iter()
        .find(|c| c.title == title)
        .unwrap_or_else(|| panic!("{title} missing from {comics:?}"))
}

#[tokio::test]
async fn sync_scrapes_dedups_and_persists_in_batches() {
    let (base_url, shutdown, handle) = spawn_site_server();
    let config = config(&base_url);
    let store = Arc::new(MemoryStore::new());
    let svc = service(&config, store.clone());

    let report = svc
        .sync(&request(), Arc::new(TracingObserver), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.urls_found, 3);
    assert_eq!(report.pages_scraped, 2);
    assert_eq!(report.comics_scraped, 4);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.committed, 3);
    assert_eq!(report.batches, 2);
    assert_eq!(report.errors, 1);

    let comics = store.get_all().await.unwrap();
    assert_eq!(comics.len(), 3);

    let batman = find(&comics, "Batman");
    assert_eq!(batman.publisher, "dc");
    assert_eq!(batman.format, Some(Format::Single));
    assert_eq!(batman.release_date, NaiveDate::from_ymd_opt(2026, 3, 4));
    assert_eq!(batman.creators.len(), 2);

    let xmen = find(&comics, "X-Men");
    assert_eq!(xmen.publisher, "marvel");
    assert_eq!(xmen.release_date, NaiveDate::from_ymd_opt(2026, 3, 11));

    shutdown.send(()).unwrap();
    handle.join().unwrap();
}

#[tokio::test]
async fn repeated_sync_into_json_store_is_idempotent() {
    let (base_url, shutdown, handle) = spawn_site_server();
    let config = config(&base_url);
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::in_dir(dir.path()));

    for _ in 0..2 {
        service(&config, store.clone())
            .sync(&request(), Arc::new(TracingObserver), &CancellationToken::new())
            .await
            .unwrap();
    }

    let comics = store.get_all().await.unwrap();
    assert_eq!(comics.len(), 3);
    assert!(store.path().exists());

    shutdown.send(()).unwrap();
    handle.join().unwrap();
}

#[tokio::test]
async fn cancelled_sync_fetches_no_solicitation_pages() {
    let (base_url, shutdown, handle) = spawn_site_server();
    let config = config(&base_url);
    let store = Arc::new(MemoryStore::new());
    let svc = service(&config, store.clone());

    let progress = Arc::new(ProgressCounter::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = svc
        .sync(&request(), progress.clone(), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(progress.comics.load(Ordering::Relaxed), 0);
    assert_eq!(progress.completions.load(Ordering::Relaxed), 0);
    assert!(store.is_empty());

    shutdown.send(()).unwrap();
    handle.join().unwrap();
}
