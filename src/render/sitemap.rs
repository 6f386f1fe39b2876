//! sitemap.xml and robots.txt.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::domain::Campaign;

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn push_url(xml: &mut String, loc: &str, lastmod: Option<DateTime<Utc>>, priority: &str) {
    let _ = write!(xml, "  <url>\n    <loc>{}</loc>\n", xml_escape(loc));
    if let Some(lastmod) = lastmod {
        let _ = writeln!(xml, "    <lastmod>{}</lastmod>", lastmod.format("%Y-%m-%d"));
    }
    let _ = write!(xml, "    <priority>{}</priority>\n  </url>\n", priority);
}

/// Sitemap for the home page, every category index and every
/// published record. Drafts are left out.
pub fn sitemap_xml(origin: &str, records: &[Campaign]) -> String {
    let published: Vec<&Campaign> = records.iter().filter(|c| !c.is_draft()).collect();

    // Category index lastmod is the newest record it lists
    let mut categories: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
    for record in &published {
        let entry = categories.entry(&record.category).or_insert(record.updated_at);
        if record.updated_at > *entry {
            *entry = record.updated_at;
        }
    }

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    push_url(&mut xml, &format!("{}/", origin), categories.values().max().copied(), "1.0");

    for (category, lastmod) in &categories {
        push_url(&mut xml, &format!("{}/{}", origin, category), Some(*lastmod), "0.8");
    }

    for record in &published {
        let priority = if record.kind.can_parent() { "0.8" } else { "0.6" };
        push_url(
            &mut xml,
            &format!("{}{}", origin, record.canonical_path()),
            Some(record.updated_at),
            priority,
        );
    }

    xml.push_str("</urlset>\n");
    xml
}

pub fn robots_txt(origin: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /cron/\n\nSitemap: {}/sitemap.xml\n",
        origin
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CampaignKind, Language, NewCampaign};

    fn record(slug: &str, category: &str) -> Campaign {
        NewCampaign {
            slug: slug.to_string(),
            kind: CampaignKind::Blog,
            category: category.to_string(),
            language: Language::EnUs,
            product_name: slug.to_string(),
            title: slug.to_string(),
            description: String::new(),
            affiliate_link: String::new(),
            image_url: String::new(),
            gallery_images: vec![],
            content: serde_json::Value::Null,
            parent_id: None,
        }
        .into_campaign()
        .unwrap()
    }

    #[test]
    fn test_sitemap_lists_categories_and_records() {
        let records = vec![
            record("espresso-x", "home"),
            record("laptop-z", "tech"),
            record("draft-air-fryers-0011aabb", "home"),
        ];
        let xml = sitemap_xml("https://example.com", &records);

        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/home</loc>"));
        assert!(xml.contains("<loc>https://example.com/tech</loc>"));
        assert!(xml.contains("<loc>https://example.com/home/espresso-x</loc>"));
        assert!(xml.contains("<loc>https://example.com/tech/laptop-z</loc>"));
        assert!(!xml.contains("draft-"));
        assert_eq!(xml.matches("<url>").count(), 5);
    }

    #[test]
    fn test_sitemap_empty_store() {
        let xml = sitemap_xml("https://example.com", &[]);
        assert_eq!(xml.matches("<url>").count(), 1);
        assert!(!xml.contains("<lastmod>"));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b<c>"), "a&amp;b&lt;c&gt;");
    }

    #[test]
    fn test_robots() {
        let robots = robots_txt("https://example.com");
        assert!(robots.contains("Disallow: /api/"));
        assert!(robots.contains("Disallow: /cron/"));
        assert!(robots.ends_with("Sitemap: https://example.com/sitemap.xml\n"));
    }
}
