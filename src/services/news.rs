//! Live headlines from an RSS 2.0 feed

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::{get_text, http_agent};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{Location, NewsArticle};

/// Most headlines kept from one fetch
pub const MAX_HEADLINES: usize = 10;

const DEFAULT_COUNTRY: &str = "US";

/// Shown when the feed cannot be fetched or is empty
pub fn fallback_headlines() -> Vec<NewsArticle> {
    vec![NewsArticle {
        id: "n1".to_string(),
        headline: "Live headlines are unavailable right now. Stay tuned for the latest updates."
            .to_string(),
        sub_headline: None,
        source: "TEEVO".to_string(),
    }]
}

/// Fetch up to [`MAX_HEADLINES`] headlines for the viewer's country.
pub fn get_headlines(location: Option<&Location>, config: &AppConfig) -> Vec<NewsArticle> {
    let url = feed_url(&config.news_feed_url, location);
    let agent = http_agent(config.fetch_timeout());

    let result = get_text(&agent, &url, &[], &config.user_agent).and_then(|body| parse_rss(&body));
    match result {
        Ok(articles) if !articles.is_empty() => {
            tracing::debug!(count = articles.len(), "headlines refreshed");
            articles
        }
        Ok(_) => {
            tracing::warn!(url = %url, "headline feed had no items");
            fallback_headlines()
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "headline feed unavailable");
            fallback_headlines()
        }
    }
}

/// Fill the `{country}` placeholder of a feed URL template
pub fn feed_url(template: &str, location: Option<&Location>) -> String {
    let country = location
        .map(|l| l.country.as_str())
        .filter(|c| c.len() == 2)
        .unwrap_or(DEFAULT_COUNTRY);
    template.replace("{country}", country)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Description,
    Link,
    Guid,
    Source,
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: String,
    description: String,
    link: String,
    guid: String,
    source: String,
}

/// Parse RSS 2.0 `<item>`s into articles, keeping at most [`MAX_HEADLINES`].
pub fn parse_rss(xml: &str) -> Result<Vec<NewsArticle>, FetchError> {
    let mut reader = Reader::from_str(xml);

    let mut articles = Vec::new();
    let mut channel_title = String::new();
    let mut in_channel_title = false;
    let mut item: Option<ItemBuilder> = None;
    let mut field: Option<Field> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"item" => item = Some(ItemBuilder::default()),
                    b"title" if item.is_none() && channel_title.is_empty() => {
                        in_channel_title = true;
                        text_buf.clear();
                    }
                    tag if item.is_some() => {
                        field = match tag {
                            b"title" => Some(Field::Title),
                            b"description" => Some(Field::Description),
                            b"link" => Some(Field::Link),
                            b"guid" => Some(Field::Guid),
                            b"source" => Some(Field::Source),
                            _ => None,
                        };
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if field.is_some() || in_channel_title {
                    let raw = String::from_utf8_lossy(&e);
                    text_buf.push_str(&decode_entities(&raw));
                }
            }
            Event::GeneralRef(e) => {
                if field.is_some() || in_channel_title {
                    let entity = format!("&{};", String::from_utf8_lossy(&e));
                    text_buf.push_str(&decode_entities(&entity));
                }
            }
            Event::CData(e) => {
                if field.is_some() || in_channel_title {
                    text_buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"item" => {
                        if let Some(built) = item.take() {
                            let index = articles.len();
                            if let Some(article) = finish_item(built, index, &channel_title) {
                                articles.push(article);
                                if articles.len() == MAX_HEADLINES {
                                    break;
                                }
                            }
                        }
                        field = None;
                    }
                    b"title" if in_channel_title => {
                        channel_title = collapse_whitespace(&text_buf);
                        in_channel_title = false;
                    }
                    _ => {
                        if let (Some(current), Some(builder)) = (field.take(), item.as_mut()) {
                            let value = std::mem::take(&mut text_buf);
                            match current {
                                Field::Title => builder.title = value,
                                Field::Description => builder.description = value,
                                Field::Link => builder.link = value,
                                Field::Guid => builder.guid = value,
                                Field::Source => builder.source = value,
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

fn finish_item(item: ItemBuilder, index: usize, channel_title: &str) -> Option<NewsArticle> {
    let mut headline = collapse_whitespace(&item.title);
    if headline.is_empty() {
        return None;
    }

    let source = match collapse_whitespace(&item.source) {
        s if !s.is_empty() => s,
        _ if !channel_title.is_empty() => channel_title.to_string(),
        _ => "RSS".to_string(),
    };

    // Aggregators append " - Source" to every title
    if let Some(stripped) = headline.strip_suffix(&format!(" - {}", source)) {
        headline = stripped.trim_end().to_string();
    }

    // Escaped HTML descriptions still carry entities once the tags are gone
    let description = decode_entities(&strip_tags(&item.description));
    let sub_headline = Some(collapse_whitespace(&description))
        .filter(|s| !s.is_empty() && *s != headline && !s.starts_with(&headline));

    let id = [item.guid.trim(), item.link.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("n{}", index + 1));

    Some(NewsArticle {
        id,
        headline,
        sub_headline,
        source,
    })
}

/// Decode the XML predefined entities and numeric character references
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| {
            let name = &tail[1..end];
            let c = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Drop HTML markup from a description
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
