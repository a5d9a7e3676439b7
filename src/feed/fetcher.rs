use std::{sync::LazyLock, time::Duration};

use anyhow::{Context, Result};
use log::{error, info};
use regex::Regex;
use reqwest::Client;
use roxmltree::{Document, Node, ParsingOptions};

use super::state::FeedItem;

static IMG_SRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img src="([^"]+)""#).unwrap());

const DEFAULT_TITLE: &str = "No Title";
const DEFAULT_LINK: &str = "#";

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build feed HTTP client")
}

/// Fetch and parse the feed a single time. Any failure is logged and yields
/// an empty list; there is no retry.
pub async fn fetch_once(client: &Client, url: &str) -> Vec<FeedItem> {
    match try_fetch(client, url).await {
        Ok(items) => {
            info!("feed {} yielded {} items with images", url, items.len());
            items
        }
        Err(err) => {
            error!("failed to fetch or parse feed {}: {err:#}", url);
            Vec::new()
        }
    }
}

async fn try_fetch(client: &Client, url: &str) -> Result<Vec<FeedItem>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .context("feed responded with an error status")?;

    let body = response
        .text()
        .await
        .context("failed to read feed body")?;

    parse_feed(&body)
}

/// Parse every `item` record in the document, keeping only those whose
/// description carries an image.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options).context("feed is not well-formed XML")?;

    let items = doc
        .descendants()
        .filter(|node| is_named(node, "item"))
        .map(|node| parse_item(&node))
        .filter(|item| !item.image_url.is_empty())
        .collect();

    Ok(items)
}

fn parse_item(item: &Node) -> FeedItem {
    let title = child_text(item, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let link = child_text(item, "link").unwrap_or_else(|| DEFAULT_LINK.to_string());
    let description = child_text(item, "description").unwrap_or_default();

    FeedItem {
        title,
        link,
        image_url: extract_image_url(&description),
    }
}

/// First `<img src="...">` reference in an HTML fragment, or `""`.
pub fn extract_image_url(description: &str) -> String {
    IMG_SRC_REGEX
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

// Local name only, so RSS 1.0 feeds with a default namespace still match.
fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

// Concatenated text of the first matching descendant; empty text counts as missing.
fn child_text(item: &Node, name: &str) -> Option<String> {
    let node = item.descendants().skip(1).find(|node| is_named(node, name))?;
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    const THREE_ITEMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>News</title>
    <item>
      <title>First</title>
      <link>https://news.example/1</link>
      <description><![CDATA[<p><img src="https://img.example/1.jpg" width="10"/></p>Lead one]]></description>
    </item>
    <item>
      <title>Second</title>
      <link>https://news.example/2</link>
      <description>No picture here</description>
    </item>
    <item>
      <title>Third</title>
      <link>https://news.example/3</link>
      <description>&lt;img src="https://img.example/3.jpg"&gt; text &lt;img src="https://img.example/other.jpg"&gt;</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn drops_items_without_images_and_keeps_order() {
        let items = parse_feed(THREE_ITEMS).unwrap();
        assert_eq!(
            items,
            vec![
                FeedItem {
                    title: "First".into(),
                    link: "https://news.example/1".into(),
                    image_url: "https://img.example/1.jpg".into(),
                },
                FeedItem {
                    title: "Third".into(),
                    link: "https://news.example/3".into(),
                    image_url: "https://img.example/3.jpg".into(),
                },
            ]
        );
    }

    #[test]
    fn missing_title_and_link_fall_back() {
        let xml = r#"<rss><channel><item><description>&lt;img src="a.png"&gt;</description></item></channel></rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "No Title");
        assert_eq!(items[0].link, "#");
    }

    #[test]
    fn default_namespace_feed_is_parsed() {
        let xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://news.example/"><title>News</title></channel>
  <item rdf:about="https://news.example/a">
    <title>A</title>
    <link>https://news.example/a</link>
    <description>&lt;img src="https://img.example/a.jpg"&gt;</description>
  </item>
</rdf:RDF>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(
            items,
            vec![FeedItem {
                title: "A".into(),
                link: "https://news.example/a".into(),
                image_url: "https://img.example/a.jpg".into(),
            }]
        );
    }

    #[test]
    fn image_pattern_requires_src_first() {
        assert_eq!(extract_image_url(r#"<img src="x.jpg">"#), "x.jpg");
        assert_eq!(extract_image_url(r#"<img alt="" src="x.jpg">"#), "");
        assert_eq!(extract_image_url(r#"<img src="">"#), "");
        assert_eq!(extract_image_url("plain text"), "");
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_feed("<rss><item>").is_err());
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/rss/news")
    }

    #[tokio::test]
    async fn fetch_once_parses_served_feed() {
        let url = serve_once("200 OK", THREE_ITEMS).await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let items = fetch_once(&client, &url).await;
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["First", "Third"]);
    }

    #[tokio::test]
    async fn error_status_degrades_to_empty() {
        let url = serve_once("503 Service Unavailable", THREE_ITEMS).await;
        let client = build_client(Duration::from_secs(5)).unwrap();
        assert!(fetch_once(&client, &url).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_degrades_to_empty() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = build_client(Duration::from_secs(5)).unwrap();
        assert!(fetch_once(&client, &format!("http://{addr}/rss")).await.is_empty());
    }
}
