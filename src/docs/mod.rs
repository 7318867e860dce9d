//! HTTP documentation source.
//!
//! Fetches the landing page of a technology's official documentation,
//! converts it to Markdown and splits it into heading-delimited sections.
//! Technologies without a known site get a single fallback entry.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DocsConfig;
use crate::error::{DocsError, DocsResult};
use crate::services::DocumentationSource;
use crate::workflow::DocumentationEntry;

/// Sections with a body this short or shorter are navigation noise.
const MIN_SECTION_CHARS: usize = 80;

/// Known documentation base URLs, keyed by lower-cased technology name.
const KNOWN_DOC_URLS: &[(&str, &str)] = &[
    // Backend
    ("fastapi", "https://fastapi.tiangolo.com"),
    ("flask", "https://flask.palletsprojects.com"),
    ("django", "https://docs.djangoproject.com"),
    ("express", "https://expressjs.com"),
    ("langchain", "https://python.langchain.com/docs"),
    ("langgraph", "https://langchain-ai.github.io/langgraph"),
    ("pydantic", "https://docs.pydantic.dev"),
    ("sqlalchemy", "https://docs.sqlalchemy.org"),
    ("celery", "https://docs.celeryq.dev"),
    ("tokio", "https://tokio.rs/tokio/tutorial"),
    ("axum", "https://docs.rs/axum/latest/axum"),
    ("serde", "https://serde.rs"),
    // AI / ML
    ("openai", "https://platform.openai.com/docs"),
    ("gemini", "https://ai.google.dev/docs"),
    ("groq", "https://console.groq.com/docs"),
    ("huggingface", "https://huggingface.co/docs"),
    ("pytorch", "https://pytorch.org/docs"),
    ("tensorflow", "https://www.tensorflow.org/api_docs"),
    // Databases
    ("supabase", "https://supabase.com/docs"),
    ("qdrant", "https://qdrant.tech/documentation"),
    ("mongodb", "https://www.mongodb.com/docs"),
    ("redis", "https://redis.io/docs"),
    ("postgresql", "https://www.postgresql.org/docs"),
    // Frontend
    ("nextjs", "https://nextjs.org/docs"),
    ("next.js", "https://nextjs.org/docs"),
    ("react", "https://react.dev"),
    ("vue", "https://vuejs.org/guide"),
    ("tailwind", "https://tailwindcss.com/docs"),
    ("tailwindcss", "https://tailwindcss.com/docs"),
    ("typescript", "https://www.typescriptlang.org/docs"),
    // Infrastructure
    ("terraform", "https://developer.hashicorp.com/terraform/docs"),
    ("docker", "https://docs.docker.com"),
    ("kubernetes", "https://kubernetes.io/docs"),
    ("gcp", "https://cloud.google.com/docs"),
    ("aws", "https://docs.aws.amazon.com"),
];

/// [`DocumentationSource`] backed by official documentation websites.
#[derive(Clone)]
pub struct HttpDocsSource {
    client: Client,
    sites: HashMap<String, String>,
    max_sections: usize,
}

impl HttpDocsSource {
    /// Create a source with the built-in site registry.
    pub fn new(config: &DocsConfig) -> DocsResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let sites = KNOWN_DOC_URLS
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect();

        Ok(Self {
            client,
            sites,
            max_sections: config.max_sections_per_tech,
        })
    }

    /// Register (or replace) the documentation site for a technology.
    pub fn with_site(mut self, technology: &str, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.sites
            .insert(normalize(technology), base_url.trim_end_matches('/').to_string());
        self
    }

    /// Documentation base URL for a technology, if one is known.
    pub fn site_for(&self, technology: &str) -> Option<&str> {
        self.sites.get(&normalize(technology)).map(String::as_str)
    }

    async fn fetch_page(&self, url: &str) -> DocsResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DocsError::Timeout {
                    url: url.to_string(),
                }
            } else {
                DocsError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                DocsError::Timeout {
                    url: url.to_string(),
                }
            } else {
                DocsError::Http(e)
            }
        })
    }
}

#[async_trait]
impl DocumentationSource for HttpDocsSource {
    async fn fetch(&self, technology: &str, _context: &str) -> DocsResult<Vec<DocumentationEntry>> {
        let Some(base_url) = self.site_for(technology) else {
            warn!(technology = %technology, "No known documentation site, using fallback");
            return Ok(vec![DocumentationEntry::fallback(technology)]);
        };

        let start = Instant::now();
        let html = self.fetch_page(base_url).await?;
        let markdown = html2md::rewrite_html(&html, false);
        debug!(
            technology = %technology,
            html_len = html.len(),
            markdown_len = markdown.len(),
            "Converted documentation page"
        );

        let entries: Vec<DocumentationEntry> = split_markdown_sections(&markdown, technology)
            .into_iter()
            .take(self.max_sections)
            .map(|section| {
                let url = match section.anchor {
                    Some(anchor) => format!("{}#{}", base_url, anchor),
                    None => base_url.to_string(),
                };
                DocumentationEntry::new(technology, url, section.title, section.body)
            })
            .collect();

        info!(
            technology = %technology,
            sections = entries.len(),
            latency_ms = start.elapsed().as_millis(),
            "Fetched documentation"
        );

        Ok(entries)
    }
}

/// A heading-delimited chunk of a documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// Slug of the heading; `None` for text before the first heading.
    pub anchor: Option<String>,
    /// Body text with whitespace collapsed.
    pub body: String,
}

/// Split Markdown at level 1-3 headings, dropping sections with short bodies.
///
/// Headings inside fenced code blocks are body text. Text before the first
/// heading is titled after the page's first H1, or `"<technology> Documentation"`.
pub fn split_markdown_sections(markdown: &str, technology: &str) -> Vec<Section> {
    let page_title = markdown
        .lines()
        .find_map(|line| match heading(line) {
            Some((1, text)) if !text.is_empty() => Some(text),
            _ => None,
        })
        .unwrap_or_else(|| format!("{} Documentation", technology));

    let mut sections = Vec::new();
    let mut current = Section {
        title: page_title.clone(),
        anchor: None,
        body: String::new(),
    };
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let parsed = if in_fence { None } else { heading(line) };
        match parsed {
            Some((_, text)) => {
                push_section(&mut sections, current);
                let anchor = slugify(&text);
                current = Section {
                    title: if text.is_empty() { page_title.clone() } else { text },
                    anchor: (!anchor.is_empty()).then_some(anchor),
                    body: String::new(),
                };
            }
            None => {
                current.body.push_str(line);
                current.body.push('\n');
            }
        }
    }
    push_section(&mut sections, current);

    sections
}

fn push_section(sections: &mut Vec<Section>, mut section: Section) {
    section.body = collapse_whitespace(&section.body);
    if section.body.chars().count() > MIN_SECTION_CHARS {
        sections.push(section);
    }
}

/// Level and cleaned text of an ATX heading of level 1-3.
fn heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    Some((level, collapse_whitespace(&strip_links(text))))
}

/// Replace `[text](target)` with `text`.
fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find("](").map(|i| open + i) else {
            break;
        };
        let Some(end) = rest[close..].find(')').map(|i| close + i) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&rest[open + 1..close]);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize(technology: &str) -> String {
    technology.trim().to_lowercase()
}

/// Lower-case, alphanumerics kept, everything else folded into single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
