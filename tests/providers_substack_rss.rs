// tests/providers_substack_rss.rs
use blockwall_feeds::ingest::providers::substack_rss::SubstackRssProvider;
use blockwall_feeds::ingest::types::FeedSource;

const SUBSTACK_XML: &str = include_str!("fixtures/substack_rss.xml");
const ATOM_XML: &str = include_str!("fixtures/atom.xml");

#[tokio::test]
async fn rss_fixture_maps_item_fields() {
    let provider = SubstackRssProvider::from_fixture(SUBSTACK_XML);
    let entries = provider.fetch_entries().await.expect("rss parse ok");
    assert_eq!(entries.len(), 7, "every <item> becomes an entry");

    let first = &entries[0];
    assert_eq!(first.title.as_deref(), Some("Restaking after the merge"));
    assert_eq!(
        first.link.as_deref(),
        Some("https://insights.blockwall.vc/p/restaking-after-the-merge")
    );
    assert_eq!(first.author.as_deref(), Some("Dominic Ryder"));
    assert_eq!(first.raw_date(), Some("Fri, 15 Mar 2024 10:30:00 GMT"));
    assert_eq!(first.published_parsed, Some(vec![2024, 3, 15, 10, 30, 0]));
    assert_eq!(first.media_content.len(), 1);
    assert_eq!(
        first.media_content[0].url.as_deref(),
        Some("https://substackcdn.com/image/restaking.jpg")
    );
    assert_eq!(first.content.len(), 1);
    assert!(first.content[0].value.contains("<img"));

    // No description, no media
    let third = &entries[2];
    assert!(third.summary.is_none());
    assert!(third.media_content.is_empty());

    // Offset dates are normalized to UTC
    assert_eq!(entries[4].published_parsed, Some(vec![2024, 1, 16, 1, 30, 0]));
    assert!(entries[4].author.is_none());

    // Unparsable pubDate keeps the raw text but has no tuple
    assert_eq!(entries[5].raw_date(), Some("sometime last week"));
    assert!(entries[5].published_parsed.is_none());
}

#[tokio::test]
async fn atom_fixture_maps_entry_fields() {
    let provider = SubstackRssProvider::from_fixture(ATOM_XML);
    let entries = provider.fetch_entries().await.expect("atom parse ok");
    assert_eq!(entries.len(), 3);

    let first = &entries[0];
    assert_eq!(first.title.as_deref(), Some("Rollup <i>sequencing</i>"));
    assert_eq!(
        first.link.as_deref(),
        Some("https://notes.blockwall.vc/rollup-sequencing")
    );
    assert_eq!(first.author.as_deref(), Some("Dominic Ryder"));
    assert_eq!(first.published_parsed, Some(vec![2024, 3, 15, 8, 30, 0]));
    assert_eq!(
        first.summary.as_deref(),
        Some("<p>Shared sequencers, compared.</p>")
    );
    assert_eq!(first.content.len(), 1);
    assert_eq!(
        first.content[0].value,
        r#"<p><img src="https://notes.blockwall.vc/seq.png"></p>"#
    );
    assert!(first.media_content.is_empty());

    let second = &entries[1];
    assert_eq!(
        second.link.as_deref(),
        Some("https://notes.blockwall.vc/only-updated")
    );
    assert_eq!(second.raw_date(), Some("2024-02-01T00:00:00Z"));
    assert!(second.published_parsed.is_none());
}

#[tokio::test]
async fn atom_media_and_content_are_kept_apart() {
    let provider = SubstackRssProvider::from_fixture(ATOM_XML);
    let entries = provider.fetch_entries().await.expect("atom parse ok");

    let third = &entries[2];
    assert_eq!(third.media_content.len(), 1);
    assert_eq!(
        third.media_content[0].url.as_deref(),
        Some("https://notes.blockwall.vc/cover.jpg")
    );
    assert_eq!(third.content.len(), 1);
    assert!(third.content[0]
        .value
        .contains(r#"<img src="https://notes.blockwall.vc/inline.png">"#));
    assert_eq!(third.published_parsed, Some(vec![2024, 1, 10, 12, 0, 0]));
}

#[tokio::test]
async fn file_mode_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("feed.xml");
    std::fs::write(&p, SUBSTACK_XML).unwrap();

    let provider = SubstackRssProvider::from_file(&p);
    assert_eq!(provider.origin(), p.display().to_string());
    let entries = provider.fetch_entries().await.expect("file parse ok");
    assert_eq!(entries.len(), 7);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let provider = SubstackRssProvider::from_file("/definitely/not/here.xml");
    assert!(provider.fetch_entries().await.is_err());
}

#[tokio::test]
async fn html_page_is_rejected() {
    let provider = SubstackRssProvider::from_fixture("<!DOCTYPE html><html><body>404</body></html>");
    let err = provider.fetch_entries().await.unwrap_err();
    assert!(format!("{err:#}").contains("unsupported feed root"));
}
