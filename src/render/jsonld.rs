//! schema.org structured data embedded in pages.

use maud::{html, Markup, PreEscaped};
use serde_json::{json, Value};

use crate::core::Crumb;
use crate::domain::{Campaign, CampaignContent, FaqEntry, MAX_RATING};

/// `<script type="application/ld+json">` with `</` escaped so the
/// payload cannot close the element early
pub fn script(value: &Value) -> Markup {
    let body = value.to_string().replace("</", "<\\/");
    html! {
        script type="application/ld+json" { (PreEscaped(body)) }
    }
}

/// Primary entity for a campaign page
pub fn for_campaign(origin: &str, campaign: &Campaign, children: &[Campaign]) -> Value {
    let url = format!("{}{}", origin, campaign.canonical_path());
    let description = campaign.content.meta_description();

    match &campaign.content {
        CampaignContent::Landing(_) => {
            let mut product = json!({
                "@context": "https://schema.org",
                "@type": "Product",
                "name": campaign.product_name,
                "description": description,
                "url": url,
            });
            if !campaign.image_url.is_empty() {
                product["image"] = json!(campaign.image_url);
            }
            if !campaign.affiliate_link.is_empty() {
                product["offers"] = json!({
                    "@type": "Offer",
                    "url": campaign.affiliate_link,
                });
            }
            product
        }
        CampaignContent::Blog(blog) => {
            let mut review = json!({
                "@context": "https://schema.org",
                "@type": "Review",
                "name": campaign.title,
                "url": url,
                "inLanguage": campaign.language.code(),
                "datePublished": campaign.created_at.to_rfc3339(),
                "dateModified": campaign.updated_at.to_rfc3339(),
                "itemReviewed": {
                    "@type": "Product",
                    "name": campaign.product_name,
                },
            });
            if let Some(rating) = blog.rating {
                review["reviewRating"] = json!({
                    "@type": "Rating",
                    "ratingValue": rating,
                    "bestRating": MAX_RATING,
                });
            }
            if !blog.verdict.is_empty() {
                review["reviewBody"] = json!(blog.verdict);
            }
            review
        }
        CampaignContent::Hub(_) => {
            let parts: Vec<Value> = children
                .iter()
                .map(|child| {
                    json!({
                        "@type": "WebPage",
                        "name": child.title,
                        "url": format!("{}{}", origin, child.canonical_path()),
                    })
                })
                .collect();
            json!({
                "@context": "https://schema.org",
                "@type": "CollectionPage",
                "name": campaign.title,
                "description": description,
                "url": url,
                "hasPart": parts,
            })
        }
    }
}

/// `BreadcrumbList`, or `None` for an empty trail
pub fn breadcrumb_list(origin: &str, crumbs: &[Crumb]) -> Option<Value> {
    if crumbs.is_empty() {
        return None;
    }
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(i, crumb)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": crumb.title,
                "item": format!("{}{}", origin, crumb.path),
            })
        })
        .collect();

    Some(json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    }))
}

/// `FAQPage`, or `None` when there are no entries
pub fn faq_page(entries: &[FaqEntry]) -> Option<Value> {
    if entries.is_empty() {
        return None;
    }
    let questions: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "@type": "Question",
                "name": entry.question,
                "acceptedAnswer": {"@type": "Answer", "text": entry.answer},
            })
        })
        .collect();

    Some(json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": questions,
    }))
}
