//! Article download + extraction (title and body text from an HTML page).

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::debug;

use crate::{errors::Error, ports::ArticleSource, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub text: String,
}

impl Article {
    /// Title and body joined the way they are fed to the analysis prompt.
    pub fn into_content(self) -> String {
        format!("{}\n\n{}", self.title, self.text)
    }
}

/// [`ArticleSource`] over plain HTTP GET.
#[derive(Clone, Debug)]
pub struct HttpArticleSource {
    http: reqwest::Client,
}

impl HttpArticleSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ArticleSource for HttpArticleSource {
    async fn fetch_article(&self, url: &str) -> Result<Article> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Article(format!("download failed for {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Article(format!(
                "download failed for {url}: HTTP {status}"
            )));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| Error::Article(format!("failed to read body of {url}: {e}")))?;
        debug!(url, bytes = html.len(), "downloaded article page");

        Ok(parse_article(&html))
    }
}

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

macro_rules! regex {
    ($pattern:expr) => {{
        static CELL: OnceLock<Regex> = OnceLock::new();
        re(&CELL, $pattern)
    }};
}

/// Extract the title and readable body text of an HTML document.
///
/// Body text comes from `<p>` elements (inside `<article>` when the page has one),
/// falling back to the whole tag-stripped `<body>`.
pub fn parse_article(html: &str) -> Article {
    let html = strip_non_content(html);

    let title = meta_title(&html)
        .or_else(|| {
            regex!(r"(?is)<title\b[^>]*>(.*?)</title>")
                .captures(&html)
                .map(|c| clean_fragment(&c[1]))
        })
        .unwrap_or_default();

    let scope = regex!(r"(?is)<article\b[^>]*>(.*?)</article>")
        .captures(&html)
        .map(|c| c[1].to_string());

    let mut text = scope
        .as_deref()
        .map(paragraphs)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| paragraphs(&html));

    if text.is_empty() {
        let body = regex!(r"(?is)<body\b[^>]*>(.*)</body>")
            .captures(&html)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| html.clone());
        let without_title = regex!(r"(?is)<head\b[^>]*>.*?</head>").replace_all(&body, " ");
        text = clean_fragment(&without_title);
    }

    Article { title, text }
}

fn strip_non_content(html: &str) -> String {
    let mut out = regex!(r"(?s)<!--.*?-->").replace_all(html, " ").into_owned();
    for pattern in [
        regex!(r"(?is)<script\b[^>]*>.*?</script\s*>"),
        regex!(r"(?is)<style\b[^>]*>.*?</style\s*>"),
        regex!(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>"),
    ] {
        out = pattern.replace_all(&out, " ").into_owned();
    }
    out
}

fn meta_title(html: &str) -> Option<String> {
    let tag_re = regex!(r#"(?is)<meta\b[^>]*(?:property|name)\s*=\s*["']og:title["'][^>]*>"#);
    let content_re = regex!(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#);

    let tag = tag_re.find(html)?;
    let caps = content_re.captures(tag.as_str())?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let title = clean_fragment(raw);
    (!title.is_empty()).then_some(title)
}

fn paragraphs(html: &str) -> String {
    regex!(r"(?is)<p\b[^>]*>(.*?)</p\s*>")
        .captures_iter(html)
        .map(|c| clean_fragment(&c[1]))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strip tags, decode entities, collapse whitespace.
fn clean_fragment(fragment: &str) -> String {
    let stripped = regex!(r"<[^>]*>").replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    regex!(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")
        .replace_all(text, |c: &Captures| {
            let name = &c[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "ndash" => Some('–'),
                    "mdash" => Some('—'),
                    "hellip" => Some('…'),
                    "rsquo" => Some('’'),
                    "lsquo" => Some('‘'),
                    "rdquo" => Some('”'),
                    "ldquo" => Some('“'),
                    _ => None,
                }
            };
            decoded
                .map(|ch| ch.to_string())
                .unwrap_or_else(|| c[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
<head>
  <title>Ignored &amp; Fallback</title>
  <meta property="og:title" content="Moon made of cheese, says study">
  <style>p { color: red }</style>
  <script>var p = "<p>not text</p>";</script>
</head>
<body>
  <nav><p>Subscribe now</p></nav>
  <article>
    <h1>Moon made of cheese</h1>
    <p>Scientists at the <b>Institute</b> announced&nbsp;results.</p>
    <!-- <p>hidden</p> -->
    <p>Critics   call it
       &quot;nonsense&quot;.</p>
  </article>
</body>
</html>"#;

    #[test]
    fn extracts_og_title_and_article_paragraphs() {
        let a = parse_article(PAGE);
        assert_eq!(a.title, "Moon made of cheese, says study");
        assert_eq!(
            a.text,
            "Scientists at the Institute announced results.\n\nCritics call it \"nonsense\"."
        );
    }

    #[test]
    fn falls_back_to_title_tag_and_all_paragraphs() {
        let html = "<html><head><title>A &#8216;quote&#x2019;</title></head>\
                    <body><p>One.</p><div><p>Two.</p></div></body></html>";
        let a = parse_article(html);
        assert_eq!(a.title, "A ‘quote’");
        assert_eq!(a.text, "One.\n\nTwo.");
    }

    #[test]
    fn falls_back_to_body_text_without_paragraphs() {
        let html = "<html><head><title>T</title></head><body><div>Just <i>some</i> text</div></body></html>";
        let a = parse_article(html);
        assert_eq!(a.text, "Just some text");
    }

    #[test]
    fn content_joins_title_and_body() {
        let a = Article {
            title: "T".to_string(),
            text: "Body".to_string(),
        };
        assert_eq!(a.into_content(), "T\n\nBody");
    }

    #[tokio::test]
    async fn http_source_fetches_and_parses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/news/1")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(PAGE)
            .create_async()
            .await;

        let src = HttpArticleSource::new("satya-test").unwrap();
        let a = src
            .fetch_article(&format!("{}/news/1", server.url()))
            .await
            .unwrap();
        assert_eq!(a.title, "Moon made of cheese, says study");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_source_reports_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let src = HttpArticleSource::new("satya-test").unwrap();
        let err = src
            .fetch_article(&format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Article(_)));
        assert!(err.to_string().contains("404"));
    }
}
