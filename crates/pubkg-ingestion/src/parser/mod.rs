//! PubMed / PMC XML parsing.
//!
//! Handles both efetch `<PubmedArticleSet>` records (metadata + abstract)
//! and PMC JATS articles (`<body>` with nested `<sec>` elements).

pub mod xml;

use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, instrument};

use pubkg_common::{ArticleMetadata, ParsedArticle, PubkgError, Result};

pub use xml::{XmlDocument, XmlElement, XmlNode};

/// Load and parse an XML file into an element tree.
pub fn load_xml_from_file(path: impl AsRef<Path>) -> Result<XmlDocument> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PubkgError::NotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    XmlDocument::parse(&String::from_utf8_lossy(&bytes))
}

/// Parse a PubMed XML file into a [`ParsedArticle`].
#[instrument]
pub fn parse_pubmed_xml(path: &Path) -> Result<ParsedArticle> {
    let doc = load_xml_from_file(path)?;
    Ok(parse_document(&doc))
}

pub fn parse_pubmed_xml_str(xml: &str) -> Result<ParsedArticle> {
    let doc = XmlDocument::parse(xml)?;
    Ok(parse_document(&doc))
}

pub fn parse_document(doc: &XmlDocument) -> ParsedArticle {
    let article = ParsedArticle {
        metadata: extract_metadata(doc),
        abstract_text: extract_abstract(doc),
        full_text: extract_full_text(doc),
        sections: extract_sections(doc),
    };
    debug!(
        pmid = ?article.metadata.pmid,
        abstract_len = article.abstract_text.len(),
        full_text_len = article.full_text.len(),
        sections = article.sections.len(),
        "Parsed PubMed XML"
    );
    article
}

// ── Metadata ──────────────────────────────────────────────────────────────────

fn trimmed_text(e: &XmlElement) -> String {
    e.text_content().trim().to_string()
}

pub fn extract_metadata(doc: &XmlDocument) -> ArticleMetadata {
    let root = doc.root();

    let pmid = root.find("PMID").map(trimmed_text);
    let doi = root
        .find_all("ArticleId")
        .into_iter()
        .find(|e| e.attr("IdType") == Some("doi"))
        .map(trimmed_text);
    let title = root.find("ArticleTitle").map(|e| e.text_content());
    let journal = root.find_child_of("Journal", "Title").map(trimmed_text);

    // Month only counts with a year, day only with a month
    let mut pub_date = String::new();
    if let Some(year) = root.find_child_of("PubDate", "Year") {
        pub_date = trimmed_text(year);
        if let Some(month) = root.find_child_of("PubDate", "Month") {
            pub_date = format!("{} {}", trimmed_text(month), pub_date);
            if let Some(day) = root.find_child_of("PubDate", "Day") {
                pub_date = format!("{} {}", trimmed_text(day), pub_date);
            }
        }
    }

    let authors = root
        .find_all("Author")
        .into_iter()
        .filter_map(|author| {
            let last = author.child("LastName").map(trimmed_text).filter(|s| !s.is_empty());
            let first = author
                .child("ForeName")
                .map(trimmed_text)
                .filter(|s| !s.is_empty())
                .or_else(|| author.child("FirstName").map(trimmed_text).filter(|s| !s.is_empty()));
            match (first, last) {
                (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
                (Some(f), None) => Some(f),
                (None, Some(l)) => Some(l),
                (None, None) => None,
            }
        })
        .collect();

    let keywords = root
        .find_all("Keyword")
        .into_iter()
        .map(trimmed_text)
        .filter(|k| !k.is_empty())
        .collect();

    ArticleMetadata { pmid, doi, title, journal, pub_date, authors, keywords }
}

// ── Abstract ──────────────────────────────────────────────────────────────────

const ABSTRACT_CONTAINERS: &[&str] = &["Abstract", "ArticleSummary", "Summary", "Description"];

/// Extract the abstract, falling back through progressively weaker sources.
/// Never returns an empty string: the last resort is a placeholder.
pub fn extract_abstract(doc: &XmlDocument) -> String {
    let root = doc.root();

    // Structured abstract sections
    let sections = root.find_all("AbstractText");
    if !sections.is_empty() {
        return sections
            .iter()
            .map(|s| {
                let text = s.text_content();
                match s.attr("Label").filter(|l| !l.is_empty()) {
                    Some(label) => format!("{}: {}", label, text),
                    None => text,
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    if let Some(abs) = root.find("Abstract") {
        return abs.text_content();
    }

    for name in ["ArticleSummary", "Summary"] {
        let texts: Vec<&str> = root
            .find_all(name)
            .into_iter()
            .flat_map(|e| e.direct_texts())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            return texts.join("\n");
        }
    }

    for article in root.find_all("Article") {
        for name in ABSTRACT_CONTAINERS {
            if let Some(e) = article.find(name) {
                let text = e.text_content();
                if !text.trim().is_empty() {
                    return text.trim().to_string();
                }
            }
        }
    }

    if let Some(title) = root.find("ArticleTitle") {
        return format!("[No abstract available. Article title: {}]", title.text_content());
    }

    "[No abstract available]".to_string()
}

// ── Full text ─────────────────────────────────────────────────────────────────

/// Body text of a PMC article, or abstract plus every other article field.
pub fn extract_full_text(doc: &XmlDocument) -> String {
    let root = doc.root();

    if let Some(body) = root.find("body") {
        return body.text_content();
    }

    let mut parts = Vec::new();
    let abstract_text = extract_abstract(doc);
    if !abstract_text.is_empty() {
        parts.push(abstract_text);
    }
    for article in root.find_all("Article") {
        collect_outside_abstract(article, &mut parts);
    }
    parts.join("\n\n")
}

fn collect_outside_abstract(element: &XmlElement, parts: &mut Vec<String>) {
    for child in element.child_elements() {
        if let Some(text) = child.leading_text().map(str::trim).filter(|t| !t.is_empty()) {
            parts.push(text.to_string());
        }
        if child.name != "Abstract" {
            collect_outside_abstract(child, parts);
        }
    }
}

// ── Sections ──────────────────────────────────────────────────────────────────

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Collapse whitespace runs, strip HTML-like tags and trim.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = whitespace_regex().replace_all(text, " ");
    let untagged = tag_regex().replace_all(&collapsed, "");
    untagged.trim().to_string()
}

fn heading_of(e: &XmlElement) -> Option<String> {
    Some(e.text_content().trim().to_lowercase()).filter(|t| !t.is_empty())
}

/// Split an article into named sections (abstract first, in document order).
pub fn extract_sections(doc: &XmlDocument) -> IndexMap<String, String> {
    let root = doc.root();
    let mut sections = IndexMap::new();

    let abstract_text = extract_abstract(doc);
    if !abstract_text.is_empty() {
        sections.insert("abstract".to_string(), abstract_text);
    }

    for sec in root.find_all("sec") {
        let mut title = sec
            .child("title")
            .and_then(heading_of)
            .unwrap_or_else(|| format!("section_{}", sections.len()));
        let text = clean_text(&sec.text_content());
        if sections.contains_key(&title) {
            title = format!("{}_{}", title, sections.len());
        }
        sections.insert(title, text);
    }

    // Only the abstract so far: try generic <div> divisions
    if sections.len() <= 1 {
        for (i, div) in root.find_all("div").into_iter().enumerate() {
            let title = div
                .child("title")
                .or_else(|| div.find("h1"))
                .or_else(|| div.find("h2"))
                .and_then(heading_of)
                .unwrap_or_else(|| format!("section_{}", i + 1));
            let text = clean_text(&div.text_content());
            if !text.is_empty() && !sections.contains_key(&title) {
                sections.insert(title, text);
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EFETCH: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">32133153</PMID>
      <Article>
        <Journal>
          <JournalIssue>
            <PubDate><Year>2020</Year><Month>Mar</Month><Day>05</Day></PubDate>
          </JournalIssue>
          <Title>Journal of Virology</Title>
        </Journal>
        <ArticleTitle>ACE2 and <i>SARS-CoV-2</i> entry</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">SARS-CoV-2 binds ACE2.</AbstractText>
          <AbstractText Label="RESULTS">Fever and cough were common.</AbstractText>
        </Abstract>
        <AuthorList>
          <Author><LastName>Smith</LastName><ForeName>John</ForeName></Author>
          <Author><LastName>Doe</LastName></Author>
          <Author><FirstName>Ana</FirstName></Author>
          <Author><CollectiveName>Consortium</CollectiveName></Author>
        </AuthorList>
      </Article>
      <KeywordList><Keyword>COVID-19</Keyword><Keyword> ACE2 </Keyword></KeywordList>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">32133153</ArticleId>
        <ArticleId IdType="doi">10.1000/jv.2020.1</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_extract_metadata() {
        let doc = XmlDocument::parse(EFETCH).unwrap();
        let meta = extract_metadata(&doc);
        assert_eq!(meta.pmid.as_deref(), Some("32133153"));
        assert_eq!(meta.doi.as_deref(), Some("10.1000/jv.2020.1"));
        assert_eq!(meta.title.as_deref(), Some("ACE2 and SARS-CoV-2 entry"));
        assert_eq!(meta.journal.as_deref(), Some("Journal of Virology"));
        assert_eq!(meta.pub_date, "05 Mar 2020");
        assert_eq!(meta.authors, vec!["John Smith", "Doe", "Ana"]);
        assert_eq!(meta.keywords, vec!["COVID-19", "ACE2"]);
    }

    #[test]
    fn test_structured_abstract_labels() {
        let doc = XmlDocument::parse(EFETCH).unwrap();
        assert_eq!(
            extract_abstract(&doc),
            "BACKGROUND: SARS-CoV-2 binds ACE2.\n\nRESULTS: Fever and cough were common."
        );
    }

    #[test]
    fn test_pub_date_requires_year() {
        let doc = XmlDocument::parse(
            "<r><PubDate><Month>Jan</Month><Day>1</Day></PubDate></r>",
        )
        .unwrap();
        assert_eq!(extract_metadata(&doc).pub_date, "");

        let doc = XmlDocument::parse(
            "<r><PubDate><Year>2019</Year><Day>1</Day></PubDate></r>",
        )
        .unwrap();
        assert_eq!(extract_metadata(&doc).pub_date, "2019");
    }

    #[test]
    fn test_abstract_fallbacks() {
        let doc = XmlDocument::parse("<r><Abstract>Plain abstract</Abstract></r>").unwrap();
        assert_eq!(extract_abstract(&doc), "Plain abstract");

        let doc = XmlDocument::parse(
            "<r><ArticleSummary> first </ArticleSummary><ArticleSummary>second</ArticleSummary></r>",
        )
        .unwrap();
        assert_eq!(extract_abstract(&doc), "first\nsecond");

        let doc = XmlDocument::parse(
            "<r><Article><Description>  A description.  </Description></Article></r>",
        )
        .unwrap();
        assert_eq!(extract_abstract(&doc), "A description.");

        let doc = XmlDocument::parse("<r><ArticleTitle>Only a title</ArticleTitle></r>").unwrap();
        assert_eq!(
            extract_abstract(&doc),
            "[No abstract available. Article title: Only a title]"
        );

        let doc = XmlDocument::parse("<r><Other/></r>").unwrap();
        assert_eq!(extract_abstract(&doc), "[No abstract available]");
    }

    #[test]
    fn test_full_text_without_body_skips_abstract_subtree() {
        let doc = XmlDocument::parse(EFETCH).unwrap();
        let full = extract_full_text(&doc);
        let parts: Vec<&str> = full.split("\n\n").collect();
        assert!(parts[0].starts_with("BACKGROUND:"));
        assert!(parts.contains(&"Journal of Virology"));
        assert!(parts.contains(&"Smith"));
        // AbstractText contents appear only once, via the abstract itself
        assert_eq!(full.matches("Fever and cough").count(), 1);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \n\t b <b>bold</b>  c "), "a b bold c");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_sections_from_pmc_body() {
        let xml = r#"<article>
  <front><article-meta><abstract><p>ignored here</p></abstract></article-meta></front>
  <body>
    <sec><title>Introduction</title>
      <p>Diabetes is common.</p></sec>
    <sec><title>Methods</title> <p>We used PCR.</p></sec>
    <sec><p>Untitled section.</p></sec>
    <sec><title>Methods</title> <p>More methods.</p></sec>
  </body>
</article>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let sections = extract_sections(&doc);
        let names: Vec<&str> = sections.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["abstract", "introduction", "methods", "section_3", "methods_4"]
        );
        assert_eq!(sections["introduction"], "Introduction Diabetes is common.");
        assert_eq!(sections["methods_4"], "Methods More methods.");
        assert!(extract_full_text(&doc).contains("We used PCR."));
    }

    #[test]
    fn test_div_fallback_sections() {
        let xml = "<html><div><h1>Overview</h1> <p>Text one.</p></div><div><p>Text two.</p></div><div/></html>";
        let doc = XmlDocument::parse(xml).unwrap();
        let sections = extract_sections(&doc);
        let names: Vec<&str> = sections.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["abstract", "overview", "section_2"]);
        assert_eq!(sections["section_2"], "Text two.");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = parse_pubmed_xml(Path::new("/no/such/pubmed.xml")).unwrap_err();
        assert!(matches!(err, PubkgError::NotFound(_)));
    }
}
