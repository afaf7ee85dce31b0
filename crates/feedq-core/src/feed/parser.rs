use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::models::RawEntry;
use crate::{Error, Result};

/// Parse RSS/Atom feed content into raw entries.
///
/// The entry `url` is its identity: the document's own `<id>`/`<guid>` when
/// present, else the first link. StackExchange rewrites link slugs when a
/// question is retitled but keeps the id, so the id is the stable key.
///
/// `rank` comes from a per-entry `rank` element when the feed carries one
/// (StackExchange feeds use `re:rank`); otherwise the 1-based position of the
/// entry in the document is used.
pub fn parse_entries(content: &[u8]) -> Result<Vec<RawEntry>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    // Not fatal: feeds that are not well-formed XML for quick-xml (e.g. JSON Feed)
    // keep their parsed ids and fall back to positional ranks.
    let scanned = scan_entries(content).unwrap_or_default();

    let entries = feed
        .entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let meta = scanned.get(index).copied().unwrap_or(EntryMeta {
                rank: None,
                has_id: true,
            });

            let id = entry.id.trim().to_string();
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .filter(|href| !href.is_empty());

            // feed-rs invents an id for items without one; only a document id is a key
            let url = match link {
                Some(link) if !meta.has_id || id.is_empty() => link,
                _ => id,
            };

            if url.is_empty() {
                tracing::debug!("Skipping feed entry {} without url or id", index);
                return None;
            }

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string());

            let rank = meta.rank.unwrap_or(index as i64 + 1);

            Some(RawEntry { url, rank, title })
        })
        .collect();

    Ok(entries)
}

/// What the raw document says about one `entry`/`item`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EntryMeta {
    rank: Option<i64>,
    has_id: bool,
}

/// Scan every `entry`/`item` element, in document order, for a `rank` child
/// and a non-empty `id`/`guid` child
fn scan_entries(content: &[u8]) -> Result<Vec<EntryMeta>> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<EntryMeta> = Vec::new();
    let mut buf = Vec::new();
    // Element depth below the current entry; 0 outside entries
    let mut depth = 0usize;
    let mut in_rank = false;
    let mut in_id = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" | b"item" if depth == 0 => {
                    depth = 1;
                    entries.push(EntryMeta::default());
                }
                name if depth > 0 => {
                    in_rank = depth == 1 && name == b"rank";
                    in_id = depth == 1 && (name == b"id" || name == b"guid");
                    depth += 1;
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_rank || in_id => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::FeedParse(format!("Invalid entry text: {}", e)))?;
                if let Some(meta) = entries.last_mut() {
                    if in_rank {
                        if let Ok(rank) = text.trim().parse::<i64>() {
                            meta.rank = Some(rank);
                        }
                    } else if !text.trim().is_empty() {
                        meta.has_id = true;
                    }
                }
            }
            Ok(Event::End(_)) => {
                in_rank = false;
                in_id = false;
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::FeedParse(format!("Failed to scan feed: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STACKEXCHANGE_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:re="http://purl.org/atompub/rank/1.0">
  <title type="text">newest rust questions</title>
  <id>https://stackoverflow.com/feeds/tag?tagnames=rust</id>
  <updated>2026-10-17T10:00:00Z</updated>
  <entry>
    <id>https://stackoverflow.com/q/100</id>
    <re:rank scheme="https://stackoverflow.com">3</re:rank>
    <title type="text">How do lifetimes work?</title>
    <link rel="alternate" href="https://stackoverflow.com/questions/100/lifetimes" />
    <updated>2026-10-17T09:00:00Z</updated>
  </entry>
  <entry>
    <id>https://stackoverflow.com/q/101</id>
    <re:rank scheme="https://stackoverflow.com">0</re:rank>
    <title type="text">Borrow checker &amp; closures</title>
    <link rel="alternate" href="https://stackoverflow.com/questions/101/closures" />
    <updated>2026-10-17T08:00:00Z</updated>
  </entry>
</feed>"#;

    const PLAIN_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <link>https://example.com</link>
    <description>d</description>
    <item><title>First</title><link>https://example.com/1</link><guid>https://example.com/p/1</guid></item>
    <item><title>Second</title><link>https://example.com/2</link><guid> </guid></item>
    <item><link>https://example.com/3</link></item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_atom_with_rank() {
        let entries = parse_entries(STACKEXCHANGE_ATOM.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].url, "https://stackoverflow.com/q/100");
        assert_eq!(entries[0].rank, 3);
        assert_eq!(entries[0].title, "How do lifetimes work?");

        assert_eq!(entries[1].rank, 0);
        assert_eq!(entries[1].title, "Borrow checker & closures");
    }

    #[test]
    fn test_parse_rss_without_rank_uses_position() {
        let entries = parse_entries(PLAIN_RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[2].rank, 3);
        assert_eq!(entries[2].title, "Untitled");
        assert_eq!(entries[2].url, "https://example.com/3");
    }

    #[test]
    fn test_rss_guid_is_the_key_and_link_the_fallback() {
        let entries = parse_entries(PLAIN_RSS.as_bytes()).unwrap();
        assert_eq!(entries[0].url, "https://example.com/p/1");
        assert_eq!(entries[1].url, "https://example.com/2");
        assert_eq!(entries[2].url, "https://example.com/3");
    }

    #[test]
    fn test_retitled_question_keeps_its_key() {
        let before = STACKEXCHANGE_ATOM;
        let after = STACKEXCHANGE_ATOM.replace(
            "https://stackoverflow.com/questions/100/lifetimes",
            "https://stackoverflow.com/questions/100/lifetimes-in-traits",
        );

        let first = parse_entries(before.as_bytes()).unwrap();
        let second = parse_entries(after.as_bytes()).unwrap();
        assert_eq!(first[0].url, second[0].url);
        assert_eq!(first[0].url, "https://stackoverflow.com/q/100");
    }

    #[test]
    fn test_scan_ignores_nested_ids() {
        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
  <source><id>urn:source</id></source>
  <re:rank xmlns:re="http://purl.org/atompub/rank/1.0">7</re:rank>
</entry></feed>"#;
        let meta = scan_entries(atom.as_bytes()).unwrap();
        assert_eq!(meta, vec![EntryMeta { rank: Some(7), has_id: false }]);
    }

    #[test]
    fn test_parse_garbage_is_feed_parse_error() {
        let result = parse_entries(b"<html><body>not a feed</body></html>");
        assert!(matches!(result, Err(Error::FeedParse(_))));
    }
}
