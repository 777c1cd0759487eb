//! Streaming-markup (XML/RSS) parser: a single-pass pull reader matching the
//! mapped root path against the stack of currently-open tag names.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{parse_script_config, ParseIssue, ParseOutcome, ScriptParser};
use crate::config::{ScriptConfig, SectionMapping};
use crate::error::Result;
use crate::types::{Category, Item, Script};

pub struct RssParser;

/// Item field slots a markup mapping can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Id,
    Title,
    Pic,
    Content,
    CategoryId,
    Tags,
    SourceUrl,
}

/// One mapped field: which element feeds which slot, optionally via an
/// attribute (`element@attribute` form) captured at element-open time.
#[derive(Debug, Clone)]
struct FieldTarget {
    slot: Slot,
    element: String,
    attribute: Option<String>,
}

fn field_target(slot: Slot, descriptor: &str) -> Option<FieldTarget> {
    if descriptor.is_empty() {
        return None;
    }
    match descriptor.split_once('@') {
        Some((element, attribute)) => Some(FieldTarget {
            slot,
            element: element.to_string(),
            attribute: Some(attribute.to_string()),
        }),
        None => Some(FieldTarget {
            slot,
            element: descriptor.to_string(),
            attribute: None,
        }),
    }
}

fn field_targets(mapping: &SectionMapping) -> Vec<FieldTarget> {
    let optional = [
        (Slot::Pic, &mapping.pic_field),
        (Slot::Content, &mapping.content_field),
        (Slot::CategoryId, &mapping.category_id_field),
        (Slot::Tags, &mapping.tags_field),
        (Slot::SourceUrl, &mapping.source_url_field),
    ];
    let mut targets = Vec::new();
    targets.extend(field_target(Slot::Id, &mapping.id_field));
    targets.extend(field_target(Slot::Title, &mapping.title_field));
    for (slot, descriptor) in optional {
        if let Some(d) = descriptor {
            targets.extend(field_target(slot, d));
        }
    }
    targets
}

/// Capture attribute-form fields from an opening tag.
fn capture_attributes(
    tag: &BytesStart<'_>,
    element: &str,
    targets: &[FieldTarget],
    values: &mut HashMap<Slot, String>,
) {
    for target in targets {
        let Some(attr_name) = &target.attribute else { continue };
        if target.element != element || values.contains_key(&target.slot) {
            continue;
        }
        for attr in tag.attributes().flatten() {
            if String::from_utf8_lossy(attr.key.local_name().as_ref()) == attr_name.as_str() {
                if let Ok(value) = attr.unescape_value() {
                    values.insert(target.slot, value.to_string());
                }
            }
        }
    }
}

fn capture_text(
    element: &str,
    text: &str,
    targets: &[FieldTarget],
    values: &mut HashMap<Slot, String>,
) {
    for target in targets {
        if target.attribute.is_none() && target.element == element {
            // Concatenate split text events for the same element.
            values.entry(target.slot).or_default().push_str(text);
        }
    }
}

/// Pull records out of the markup stream. Accumulation runs while the open
/// tag stack sits at the root path; one value map per materialized record.
fn collect_records(
    raw: &str,
    mapping: &SectionMapping,
) -> (Vec<HashMap<Slot, String>>, Vec<ParseIssue>) {
    let segments: Vec<&str> = mapping
        .root_path
        .split('.')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return (
            Vec::new(),
            vec![ParseIssue::payload("mapping has no root path")],
        );
    }

    let targets = field_targets(mapping);
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut in_record = false;
    let mut values: HashMap<Slot, String> = HashMap::new();
    let mut records = Vec::new();
    let mut issues = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                stack.push(name.clone());
                if stack.len() == segments.len() && stack.iter().eq(segments.iter()) {
                    in_record = true;
                    values.clear();
                }
                if in_record {
                    capture_attributes(&e, &name, &targets, &mut values);
                }
            }
            Ok(Event::Empty(e)) => {
                // Self-closing tags never join the stack, but attribute-form
                // fields (e.g. enclosure@url) are usually carried on them.
                if in_record {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    capture_attributes(&e, &name, &targets, &mut values);
                }
            }
            Ok(Event::Text(e)) => {
                if in_record {
                    if let (Some(element), Ok(text)) = (stack.last(), e.unescape()) {
                        capture_text(element, text.trim(), &targets, &mut values);
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_record {
                    if let Some(element) = stack.last() {
                        let text = String::from_utf8_lossy(&e).to_string();
                        capture_text(element, text.trim(), &targets, &mut values);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if in_record
                    && name == *segments.last().unwrap()
                    && stack.iter().eq(segments.iter())
                {
                    records.push(std::mem::take(&mut values));
                    in_record = false;
                }
                if stack.last().map(|s| s.as_str()) == Some(name.as_str()) {
                    stack.pop();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                // Malformed markup: keep what was built before the failure.
                issues.push(ParseIssue {
                    record_index: Some(records.len()),
                    message: format!("markup error: {e}"),
                });
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    (records, issues)
}

fn slot(values: &mut HashMap<Slot, String>, slot: Slot) -> Option<String> {
    values.remove(&slot).filter(|v| !v.is_empty())
}

impl ScriptParser for RssParser {
    fn parse_items(
        &self,
        raw: &str,
        mapping: &SectionMapping,
        script_id: &str,
    ) -> ParseOutcome<Item> {
        let (records, issues) = collect_records(raw, mapping);
        let rows = records
            .into_iter()
            .map(|mut values| Item {
                id: slot(&mut values, Slot::Id).unwrap_or_default(),
                title: slot(&mut values, Slot::Title).unwrap_or_default(),
                pic: slot(&mut values, Slot::Pic),
                content: slot(&mut values, Slot::Content),
                category_id: slot(&mut values, Slot::CategoryId),
                tags: slot(&mut values, Slot::Tags),
                source_url: slot(&mut values, Slot::SourceUrl),
                script_id: script_id.to_string(),
            })
            .collect();
        ParseOutcome { rows, issues }
    }

    /// Category extraction is not implemented for markup feeds; callers get
    /// an empty list, not an error.
    fn parse_categories(
        &self,
        _raw: &str,
        _mapping: &SectionMapping,
        _script_id: &str,
    ) -> ParseOutcome<Category> {
        ParseOutcome::empty()
    }

    /// Feeds usually need no embedded config: the conventional RSS 2.0 item
    /// layout is assumed when the script carries none.
    fn derive_mapping(&self, script: &Script) -> Result<ScriptConfig> {
        if script.config.is_some() {
            return parse_script_config(script);
        }
        Ok(ScriptConfig {
            items_state: true,
            categories_state: false,
            items_mapping: Some(default_feed_mapping(&script.api_url)),
            categories_mapping: None,
        })
    }
}

/// The conventional RSS 2.0 item mapping.
pub fn default_feed_mapping(api_url: &str) -> SectionMapping {
    SectionMapping {
        root_path: "rss.channel.item".to_string(),
        id_field: "guid".to_string(),
        title_field: "title".to_string(),
        pic_field: Some("enclosure@url".to_string()),
        content_field: Some("description".to_string()),
        category_id_field: None,
        tags_field: Some("category".to_string()),
        parent_id_field: None,
        source_url_field: Some("link".to_string()),
        url_type: 1,
        api_url: api_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <item>
      <guid>post-1</guid>
      <title>First post</title>
      <link>https://example.com/1</link>
      <description><![CDATA[Hello <b>world</b>]]></description>
      <enclosure url="https://example.com/1.jpg" type="image/jpeg"/>
    </item>
    <item>
      <guid>post-2</guid>
      <title>Second post</title>
      <link>https://example.com/2</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_feed_items() {
        let mapping = default_feed_mapping("https://example.com/feed");
        let outcome = RssParser.parse_items(FEED, &mapping, "s1");
        assert!(outcome.is_clean());
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].id, "post-1");
        assert_eq!(outcome.rows[0].title, "First post");
        assert_eq!(outcome.rows[0].source_url.as_deref(), Some("https://example.com/1"));
        assert_eq!(outcome.rows[1].id, "post-2");
    }

    #[test]
    fn captures_attribute_form_fields() {
        let mapping = default_feed_mapping("https://example.com/feed");
        let outcome = RssParser.parse_items(FEED, &mapping, "s1");
        assert_eq!(outcome.rows[0].pic.as_deref(), Some("https://example.com/1.jpg"));
        assert!(outcome.rows[1].pic.is_none());
    }

    #[test]
    fn cdata_text_is_captured() {
        let mapping = default_feed_mapping("https://example.com/feed");
        let outcome = RssParser.parse_items(FEED, &mapping, "s1");
        assert_eq!(outcome.rows[0].content.as_deref(), Some("Hello <b>world</b>"));
    }

    #[test]
    fn unmatched_root_path_yields_empty_without_error() {
        let mut mapping = default_feed_mapping("https://example.com/feed");
        mapping.root_path = "feed.entry".to_string();
        let outcome = RssParser.parse_items(FEED, &mapping, "s1");
        assert!(outcome.rows.is_empty());
        assert!(outcome.is_clean());
    }

    #[test]
    fn missing_mapped_tags_default_to_empty_strings() {
        let mut mapping = default_feed_mapping("https://example.com/feed");
        mapping.id_field = "missing".to_string();
        let outcome = RssParser.parse_items(FEED, &mapping, "s1");
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].id, "");
    }

    #[test]
    fn truncated_markup_keeps_records_built_so_far() {
        let truncated = &FEED[..FEED.find("<item>\n      <guid>post-2").unwrap() + 6];
        let mapping = default_feed_mapping("https://example.com/feed");
        let outcome = RssParser.parse_items(truncated, &mapping, "s1");
        assert_eq!(outcome.rows.len(), 1);
    }

    #[test]
    fn categories_are_an_explicit_stub() {
        let mapping = default_feed_mapping("https://example.com/feed");
        let outcome = RssParser.parse_categories(FEED, &mapping, "s1");
        assert!(outcome.rows.is_empty());
        assert!(outcome.is_clean());
    }

    #[test]
    fn derive_mapping_defaults_when_config_absent() {
        let script = Script::new("feed", "https://example.com/feed", 1);
        let cfg = RssParser.derive_mapping(&script).unwrap();
        assert!(cfg.items_state);
        assert_eq!(cfg.items_mapping.unwrap().root_path, "rss.channel.item");
    }
}
