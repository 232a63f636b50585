use chrono::{TimeZone, Utc};
use energy_news_digest::config::FeedKind;
use energy_news_digest::ingest::providers::FeedProvider;
use energy_news_digest::ingest::types::SourceProvider;
use energy_news_digest::ingest::Normalizer;
use energy_news_digest::ItemType;

const RSS_XML: &str = include_str!("fixtures/grid_rss.xml");
const YT_XML: &str = include_str!("fixtures/channel_youtube.xml");

#[tokio::test]
async fn rss_fixture_yields_raw_entries() {
    let p = FeedProvider::from_fixture("Field Wire", FeedKind::Rss, RSS_XML);
    assert_eq!(p.name(), "Field Wire");

    let raw = p.fetch_latest().await.expect("rss parse ok");
    assert_eq!(raw.len(), 5);

    let first = &raw[0];
    assert_eq!(first.title.as_deref(), Some("New 500kV substation energized in Texas"));
    assert_eq!(first.category.as_deref(), Some("Transmission"));
    assert_eq!(first.published.as_deref(), Some("Mon, 19 Oct 2026 08:15:00 GMT"));
    assert_eq!(first.image.as_deref(), Some("https://gridweekly.test/img/substation.jpg"));
    assert_eq!(first.item_type, ItemType::Article);

    assert_eq!(raw[1].published.as_deref(), Some("2026-10-18T17:00:00Z"), "dc:date fallback");
    assert_eq!(raw[4].image.as_deref(), Some("https://gridweekly.test/img/transformer.jpg"));
}

#[tokio::test]
async fn rss_entries_normalize_into_items() {
    let p = FeedProvider::from_fixture("Field Wire", FeedKind::Rss, RSS_XML);
    let raw = p.fetch_latest().await.unwrap();
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

    let (items, dropped) = Normalizer::default().normalize_all(raw, now);
    assert_eq!(dropped, 1, "entry with an empty title is dropped");
    assert_eq!(items.len(), 4);

    let sub = &items[0];
    assert_eq!(sub.url, "https://gridweekly.test/news/500kv-substation-texas");
    assert_eq!(
        sub.summary.as_deref(),
        Some("The utility energized a 500 kV substation to relieve congestion.")
    );
    assert_eq!(sub.published, Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 0).unwrap());
    assert_eq!(
        items[1].summary.as_deref(),
        Some("Developers bid for new lease areas - a first for the region.")
    );

    let undated = items.iter().find(|i| i.title == "Transformer shortage eases").unwrap();
    assert_eq!(undated.published, now);
}

#[tokio::test]
async fn youtube_fixture_skips_entries_without_video_id() {
    let p = FeedProvider::from_fixture("Energy Channel", FeedKind::Youtube, YT_XML);
    let raw = p.fetch_latest().await.expect("atom parse ok");
    assert_eq!(raw.len(), 2);

    let v = &raw[0];
    assert_eq!(v.item_type, ItemType::Video);
    assert_eq!(v.video_id.as_deref(), Some("abc123XYZ_0"));
    assert_eq!(v.link.as_deref(), Some("https://www.youtube.com/watch?v=abc123XYZ_0"));
    assert_eq!(v.description.as_deref(), Some("Converter stations, cables and the grid."));
    assert_eq!(v.published.as_deref(), Some("2026-10-19T06:00:00+00:00"));

    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let (items, _) = Normalizer::default().normalize_all(raw, now);
    assert_eq!(
        items[0].image.as_deref(),
        Some("https://i.ytimg.com/vi/abc123XYZ_0/hqdefault.jpg")
    );
    assert_eq!(items[0].publisher, "Energy Channel");
}

#[tokio::test]
async fn max_entries_truncates_and_bad_xml_errors() {
    let p = FeedProvider::from_fixture("Field Wire", FeedKind::Rss, RSS_XML).with_max_entries(2);
    assert_eq!(p.fetch_latest().await.unwrap().len(), 2);

    let broken = FeedProvider::from_fixture("Broken", FeedKind::Rss, "<rss><channel><item>");
    assert!(broken.fetch_latest().await.is_err());
}
