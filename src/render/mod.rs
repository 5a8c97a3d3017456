//! Résumé PDF rendering.

mod layout;
mod metrics;

use std::path::Path;

use anyhow::{Context, Result};
use lopdf::{content::Content, dictionary, Dictionary, Document, Object, Stream};

use crate::domain::Resume;

use layout::{Color, Composer, Page, Style, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
use metrics::{wrap, Font};

const NAME: Style = Style::new(Font::Bold, 24.0, 28.0);
const TITLE: Style = Style::new(Font::Regular, 14.0, 16.0);
const SECTION: Style = Style::new(Font::Bold, 12.0, 14.0).colored(Color::DarkGray);
const SUB_HEADING: Style = Style::new(Font::Bold, 10.0, 12.0);
const BODY: Style = Style::new(Font::Regular, 9.0, 11.0);
const BODY_BOLD: Style = Style::new(Font::Bold, 9.0, 11.0);
const LINK: Style = Style::new(Font::Regular, 9.0, 11.0).colored(Color::Blue);

const INCH: f32 = 72.0;
const SECTION_GAP: f32 = 0.2 * INCH;
const HEADER_LEFT_WIDTH: f32 = 4.5 * INCH;

/// Renders the résumé into PDF bytes.
pub fn render_resume(resume: &Resume) -> Result<Vec<u8>> {
    let mut composer = Composer::new();
    header(&mut composer, resume);

    section(&mut composer, "SUMMARY");
    if let Some(summary) = &resume.summary {
        composer.paragraph(summary, &BODY, 0.0);
    }

    section(&mut composer, "EDUCATION");
    for edu in &resume.education {
        if let Some(degree) = &edu.degree {
            composer.paragraph(degree, &SUB_HEADING, 0.0);
        }
        split_row(
            &mut composer,
            edu.institution.as_deref(),
            edu.duration.as_deref(),
        );
        if let Some(gpa) = &edu.gpa {
            composer.paragraph(&format!("GPA: {gpa}"), &BODY, 0.0);
        }
    }

    section(&mut composer, "SKILLS");
    for group in &resume.skills {
        composer.labelled(
            &format!("{}:", group.label()),
            &group.items.join(", "),
            &BODY_BOLD,
            &BODY,
        );
    }

    section(&mut composer, "WORK EXPERIENCE");
    for job in &resume.experience {
        let heading = match (&job.company, &job.location) {
            (Some(company), Some(location)) => Some(format!("{company}, {location}")),
            (Some(company), None) => Some(company.clone()),
            (None, Some(location)) => Some(location.clone()),
            (None, None) => None,
        };
        if let Some(heading) = heading {
            composer.paragraph(&heading, &SUB_HEADING, 0.0);
        }
        split_row(&mut composer, job.title.as_deref(), job.duration.as_deref());
        for item in &job.responsibilities {
            composer.bullet(item, &BODY, 0.4 * INCH, 0.2 * INCH);
        }
    }

    section(&mut composer, "PROJECTS");
    for project in &resume.projects {
        if let Some(title) = &project.title {
            composer.paragraph(&format!("{title}:"), &SUB_HEADING, 0.0);
        }
        if let Some(description) = &project.description {
            composer.paragraph(description, &BODY, 0.0);
        }
        composer.space(0.1 * INCH);
    }

    composer.labelled(
        "CERTIFICATIONS:",
        &resume.certifications.join(", "),
        &BODY_BOLD,
        &BODY,
    );

    let pages = composer.finish();
    tracing::debug!(target: "render", pages = pages.len(), "résumé laid out");
    assemble(pages)
}

/// Renders the résumé and writes it to `path`, creating parent directories.
pub async fn write_resume_pdf(resume: &Resume, path: &Path) -> Result<()> {
    let bytes = render_resume(resume)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        target: "render",
        path = %path.display(),
        bytes = bytes.len(),
        "résumé PDF created"
    );
    Ok(())
}

/// Name and title on the left; email, phone and profile links right-aligned.
fn header(composer: &mut Composer, resume: &Resume) {
    let contact = &resume.contact;
    let rows: [(Option<(&str, &Style)>, Option<Contact>, f32); 4] = [
        (
            resume.name.as_deref().map(|n| (n, &NAME)),
            contact.email.as_deref().map(|e| Contact::Plain(format!("Email: {e}"))),
            NAME.leading,
        ),
        (
            resume.title.as_deref().map(|t| (t, &TITLE)),
            contact.phone.as_deref().map(|p| Contact::Plain(format!("Phone: {p}"))),
            TITLE.leading,
        ),
        (
            None,
            contact.linkedin.as_deref().map(|u| Contact::Link("LinkedIn", u.to_string())),
            LINK.leading,
        ),
        (
            None,
            contact.github.as_deref().map(|u| Contact::Link("GitHub", u.to_string())),
            LINK.leading,
        ),
    ];

    for (left, right, leading) in rows {
        if left.is_none() && right.is_none() {
            continue;
        }
        let baseline = composer.next_line(leading);
        if let Some((text, style)) = left {
            // keep long names clear of the contact column
            let fitted = fit(text, style, HEADER_LEFT_WIDTH);
            composer.text(MARGIN, baseline, &fitted, style);
        }
        match right {
            Some(Contact::Plain(text)) => {
                composer.text_right(baseline, &text, &BODY_BOLD);
            }
            Some(Contact::Link(label, uri)) => {
                let x = composer.text_right(baseline, label, &LINK);
                composer.link(x, baseline, label, &LINK, &uri);
            }
            None => {}
        }
    }
    composer.space(0.1 * INCH);
}

enum Contact {
    Plain(String),
    Link(&'static str, String),
}

fn section(composer: &mut Composer, title: &str) {
    composer.space(SECTION_GAP);
    composer.paragraph(title, &SECTION, 0.0);
    composer.rule();
}

/// Left text wrapped in a 3.5in column, right text bold and flush right on
/// the first line.
fn split_row(composer: &mut Composer, left: Option<&str>, right: Option<&str>) {
    if left.is_none() && right.is_none() {
        return;
    }
    let lines = left
        .map(|text| wrap(text, BODY.font, BODY.size, 3.5 * INCH))
        .unwrap_or_default();
    let mut lines = lines.iter();

    let baseline = composer.next_line(BODY.leading);
    if let Some(first) = lines.next() {
        composer.text(MARGIN, baseline, first, &BODY);
    }
    if let Some(right) = right {
        composer.text_right(baseline, right, &BODY_BOLD);
    }
    for line in lines {
        let baseline = composer.next_line(BODY.leading);
        composer.text(MARGIN, baseline, line, &BODY);
    }
}

/// Truncates `text` with an ellipsis so it fits in `width` points.
fn fit(text: &str, style: &Style, width: f32) -> String {
    if style.width(text) <= width {
        return text.to_string();
    }
    let mut fitted = String::new();
    for c in text.chars() {
        fitted.push(c);
        if style.width(&format!("{fitted}...")) > width {
            fitted.pop();
            break;
        }
    }
    format!("{}...", fitted.trim_end())
}

fn assemble(pages: Vec<Page>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page.operations,
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().context("failed to encode page content")?,
        ));
        let annots: Vec<Object> = page
            .links
            .into_iter()
            .map(|link| {
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => link.rect.iter().map(|v| Object::from(*v)).collect::<Vec<_>>(),
                    "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
                    "A" => dictionary! {
                        "S" => "URI",
                        "URI" => Object::string_literal(link.uri),
                    },
                }))
            })
            .collect();
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !annots.is_empty() {
            page_dict.set("Annots", annots);
        }
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                PAGE_WIDTH.into(),
                PAGE_HEIGHT.into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("failed to serialize PDF")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_resume;
    use serde_json::json;

    fn sample() -> Resume {
        Resume::from_value(&sample_resume()).unwrap()
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn minimal_resume_renders_a_pdf() {
        let resume = Resume::from_value(&json!({
            "name": "Jane Doe",
            "title": "Analyst",
            "education": [],
            "experience": [],
            "projects": [],
            "certifications": []
        }))
        .unwrap();
        let bytes = render_resume(&resume).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn empty_resume_still_renders() {
        let bytes = render_resume(&Resume::default()).unwrap();
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn missing_fields_do_not_crash() {
        let resume = Resume::from_value(&json!({
            "name": "Jane Doe",
            "contact": {"github": "https://github.com/janedoe"},
            "education": [{"degree": "BSc"}],
            "experience": [{"title": "Intern", "responsibilities": ["Did things"]}],
            "projects": [{"description": "No title here"}]
        }))
        .unwrap();
        assert!(render_resume(&resume).is_ok());
    }

    #[test]
    fn long_experience_spills_onto_more_pages() {
        let mut resume = sample();
        let bullets = vec!["Reconciled regional revenue figures against the ledger every week".to_string(); 150];
        resume.experience[0].responsibilities = bullets;
        assert!(page_count(&render_resume(&resume).unwrap()) > 1);
    }

    #[test]
    fn fit_truncates_long_text() {
        let fitted = fit(&"x".repeat(200), &NAME, 100.0);
        assert!(fitted.ends_with("..."));
        assert!(NAME.width(&fitted) <= 100.0);
    }

    #[tokio::test]
    async fn writes_sample_resume_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("resume.pdf");
        write_resume_pdf(&sample(), &path).await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        assert!(page_count(&bytes) >= 1);
    }
}
