//! Server-rendered public pages.
//!
//! Everything except a campaign's `description` (trusted admin HTML) is
//! escaped by maud.

pub mod jsonld;
pub mod sitemap;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde_json::Value;

use crate::core::Crumb;
use crate::domain::{
    BlogContent, Campaign, CampaignContent, FaqEntry, HubContent, InternalLink, LandingContent,
    Language, MAX_RATING,
};

pub use sitemap::{robots_txt, sitemap_xml};

/// Site-wide values every page needs
#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    /// Absolute origin without trailing slash
    pub origin: String,
}

impl Site {
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        Self {
            name: name.into(),
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }
}

/// Everything a campaign page shows besides the record itself
#[derive(Debug, Clone, Default)]
pub struct CampaignPage {
    pub breadcrumb: Vec<Crumb>,
    /// Only filled for hubs
    pub children: Vec<Campaign>,
    pub related: Vec<Campaign>,
}

/// Fixed page copy in the language of the generated text
#[derive(Debug, PartialEq, Eq)]
pub struct Labels {
    pub check_price: &'static str,
    pub faq: &'static str,
    pub see_also: &'static str,
    pub verdict: &'static str,
    pub related: &'static str,
    pub in_this_guide: &'static str,
    pub guides: &'static str,
    pub latest: &'static str,
    pub home: &'static str,
    pub disclosure: &'static str,
}

static EN_US: Labels = Labels {
    check_price: "Check price",
    faq: "FAQ",
    see_also: "See also",
    verdict: "Verdict",
    related: "Related",
    in_this_guide: "In this guide",
    guides: "Guides",
    latest: "Latest",
    home: "Home",
    disclosure: "This page contains affiliate links.",
};

static PT_BR: Labels = Labels {
    check_price: "Ver preço",
    faq: "Perguntas frequentes",
    see_also: "Veja também",
    verdict: "Veredito",
    related: "Relacionados",
    in_this_guide: "Neste guia",
    guides: "Guias",
    latest: "Recentes",
    home: "Início",
    disclosure: "Esta página contém links de afiliado.",
};

static ES_ES: Labels = Labels {
    check_price: "Ver precio",
    faq: "Preguntas frecuentes",
    see_also: "Ver también",
    verdict: "Veredicto",
    related: "Relacionados",
    in_this_guide: "En esta guía",
    guides: "Guías",
    latest: "Recientes",
    home: "Inicio",
    disclosure: "Esta página contiene enlaces de afiliado.",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::EnUs => &EN_US,
            Language::PtBr => &PT_BR,
            Language::EsEs => &ES_ES,
        }
    }
}

/// Index pages follow their first record; an empty site falls back to English
fn index_language(records: &[Campaign]) -> Language {
    records.first().map(|r| r.language).unwrap_or(Language::EnUs)
}

struct Head<'a> {
    title: &'a str,
    description: &'a str,
    canonical: String,
    language: Language,
    structured: Vec<Value>,
}

fn layout(site: &Site, head: Head<'_>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(head.language.code()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (head.title) " | " (site.name) }
                @if !head.description.is_empty() {
                    meta name="description" content=(head.description);
                }
                link rel="canonical" href=(head.canonical);
                @for value in &head.structured {
                    (jsonld::script(value))
                }
            }
            body {
                header {
                    a href="/" { (site.name) }
                }
                main { (body) }
                footer {
                    p { (Labels::for_language(head.language).disclosure) }
                }
            }
        }
    }
}

fn breadcrumb_nav(crumbs: &[Crumb]) -> Markup {
    html! {
        @if !crumbs.is_empty() {
            nav aria-label="Breadcrumb" {
                ol {
                    @for crumb in crumbs {
                        li { a href=(crumb.path) { (crumb.title) } }
                    }
                }
            }
        }
    }
}

fn cta(campaign: &Campaign, label: &str, labels: &Labels) -> Markup {
    let label = if label.is_empty() { labels.check_price } else { label };
    html! {
        @if !campaign.affiliate_link.is_empty() {
            a.cta href=(campaign.affiliate_link) rel="sponsored nofollow noopener" target="_blank" {
                (label)
            }
        }
    }
}

fn hero_image(campaign: &Campaign) -> Markup {
    html! {
        @if !campaign.image_url.is_empty() {
            img src=(campaign.image_url) alt=(campaign.product_name);
        }
        @if !campaign.gallery_images.is_empty() {
            div.gallery {
                @for src in &campaign.gallery_images {
                    img src=(src) alt=(campaign.product_name) loading="lazy";
                }
            }
        }
    }
}

fn faq_section(entries: &[FaqEntry], labels: &Labels) -> Markup {
    html! {
        @if !entries.is_empty() {
            section.faq {
                h2 { (labels.faq) }
                @for entry in entries {
                    details {
                        summary { (entry.question) }
                        p { (entry.answer) }
                    }
                }
            }
        }
    }
}

/// Links point inside the record's own category; a link to another
/// category lands on the canonical redirect
fn internal_links(category: &str, links: &[InternalLink], labels: &Labels) -> Markup {
    html! {
        @if !links.is_empty() {
            aside.internal-links {
                h2 { (labels.see_also) }
                ul {
                    @for link in links {
                        li { a href={ "/" (category) "/" (link.slug) } { (link.anchor_text) } }
                    }
                }
            }
        }
    }
}

fn card_list(records: &[Campaign]) -> Markup {
    html! {
        ul.cards {
            @for record in records {
                li {
                    a href=(record.canonical_path()) { (record.title) }
                    @let summary = record.content.meta_description();
                    @if !summary.is_empty() {
                        p { (summary) }
                    }
                }
            }
        }
    }
}

fn landing_body(campaign: &Campaign, content: &LandingContent, labels: &Labels) -> Markup {
    let headline = if content.headline.is_empty() {
        campaign.title.as_str()
    } else {
        content.headline.as_str()
    };
    html! {
        h1 { (headline) }
        @if !content.subheadline.is_empty() {
            p.subheadline { (content.subheadline) }
        }
        (hero_image(campaign))
        div.description { (PreEscaped(&campaign.description)) }
        @if !content.benefits.is_empty() {
            ul.benefits {
                @for benefit in &content.benefits { li { (benefit) } }
            }
        }
        @if !content.features.is_empty() {
            section.features {
                @for feature in &content.features {
                    div {
                        h3 { (feature.title) }
                        p { (feature.description) }
                    }
                }
            }
        }
        (cta(campaign, &content.cta_text, labels))
    }
}

fn blog_body(campaign: &Campaign, content: &BlogContent, labels: &Labels) -> Markup {
    html! {
        article {
            h1 { (campaign.title) }
            (hero_image(campaign))
            div.description { (PreEscaped(&campaign.description)) }
            p.intro { (content.intro) }
            @for section in &content.sections {
                section {
                    h2 { (section.heading) }
                    p { (section.body) }
                }
            }
            @if !content.pros.is_empty() || !content.cons.is_empty() {
                div.pros-cons {
                    ul.pros { @for pro in &content.pros { li { (pro) } } }
                    ul.cons { @for con in &content.cons { li { (con) } } }
                }
            }
            @if !content.verdict.is_empty() {
                section.verdict {
                    h2 { (labels.verdict) }
                    p { (content.verdict) }
                    @if let Some(rating) = content.rating {
                        p.rating { (format!("{:.1} / {}", rating, MAX_RATING)) }
                    }
                }
            }
            (cta(campaign, "", labels))
        }
    }
}

fn hub_body(
    campaign: &Campaign,
    content: &HubContent,
    children: &[Campaign],
    labels: &Labels,
) -> Markup {
    html! {
        h1 { (campaign.title) }
        div.description { (PreEscaped(&campaign.description)) }
        @if !content.intro.is_empty() {
            p.intro { (content.intro) }
        }
        @for section in &content.sections {
            section {
                h2 { (section.heading) }
                p { (section.body) }
            }
        }
        @if !children.is_empty() {
            section.children {
                h2 { (labels.in_this_guide) }
                (card_list(children))
            }
        }
    }
}

/// Full page for one campaign
pub fn campaign_page(site: &Site, campaign: &Campaign, page: &CampaignPage) -> Markup {
    let content = &campaign.content;
    let labels = Labels::for_language(campaign.language);

    let mut structured = vec![jsonld::for_campaign(&site.origin, campaign, &page.children)];
    structured.extend(jsonld::breadcrumb_list(&site.origin, &page.breadcrumb));
    structured.extend(jsonld::faq_page(content.faq()));

    let title = match content.meta_title() {
        "" => campaign.title.as_str(),
        t => t,
    };
    let head = Head {
        title,
        description: content.meta_description(),
        canonical: site.url(&campaign.canonical_path()),
        language: campaign.language,
        structured,
    };

    let main = match content {
        CampaignContent::Landing(c) => landing_body(campaign, c, labels),
        CampaignContent::Blog(c) => blog_body(campaign, c, labels),
        CampaignContent::Hub(c) => hub_body(campaign, c, &page.children, labels),
    };

    layout(
        site,
        head,
        html! {
            (breadcrumb_nav(&page.breadcrumb))
            (main)
            (faq_section(content.faq(), labels))
            (internal_links(&campaign.category, content.internal_links(), labels))
            @if !page.related.is_empty() {
                aside.related {
                    h2 { (labels.related) }
                    (card_list(&page.related))
                }
            }
        },
    )
}

/// Category index listing its published records
pub fn category_page(site: &Site, category: &str, records: &[Campaign]) -> Markup {
    let heading = category.replace('-', " ");
    let head = Head {
        title: &heading,
        description: "",
        canonical: site.url(&format!("/{}", category)),
        language: index_language(records),
        structured: Vec::new(),
    };

    layout(
        site,
        head,
        html! {
            h1 { (heading) }
            (card_list(records))
        },
    )
}

/// Home page: top-level hubs first, then the newest records
pub fn home_page(site: &Site, records: &[Campaign]) -> Markup {
    let (hubs, rest): (Vec<Campaign>, Vec<Campaign>) = records
        .iter()
        .cloned()
        .partition(|r| r.kind.can_parent() && r.parent_id.is_none());
    let language = index_language(records);
    let labels = Labels::for_language(language);

    let head = Head {
        title: labels.home,
        description: "",
        canonical: site.url("/"),
        language,
        structured: Vec::new(),
    };

    layout(
        site,
        head,
        html! {
            h1 { (site.name) }
            @if !hubs.is_empty() {
                section.hubs {
                    h2 { (labels.guides) }
                    (card_list(&hubs))
                }
            }
            section.latest {
                h2 { (labels.latest) }
                (card_list(&rest))
            }
        },
    )
}
