use super::{CollaboratorError, TextExtractor};
use async_trait::async_trait;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Upload extensions the extractor knows how to read.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Pdf,
    Docx,
    Text,
}

impl SourceFormat {
    fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Reads PDF, Word and plain-text files from local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, CollaboratorError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_blocking(&path))
            .await
            .map_err(|err| CollaboratorError::Service(format!("extraction task failed: {err}")))?
    }
}

fn extract_blocking(path: &Path) -> Result<String, CollaboratorError> {
    let format = SourceFormat::detect(path)
        .ok_or_else(|| CollaboratorError::UnsupportedFormat(path.to_path_buf()))?;

    match format {
        SourceFormat::Pdf => extract_pdf(path),
        SourceFormat::Docx => extract_docx(path),
        SourceFormat::Text => std::fs::read_to_string(path).map_err(|source| io_error(path, source)),
    }
}

fn extract_pdf(path: &Path) -> Result<String, CollaboratorError> {
    if !path.exists() {
        return Err(io_error(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }

    let text = pdf_extract::extract_text(path).map_err(|err| {
        CollaboratorError::MalformedResponse(format!(
            "unable to read PDF text from {}: {err}",
            path.display()
        ))
    })?;

    let pages: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();
    Ok(pages.join("\n").trim().to_string())
}

fn extract_docx(path: &Path) -> Result<String, CollaboratorError> {
    let file = File::open(path).map_err(|source| io_error(path, source))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|err| {
        CollaboratorError::MalformedResponse(format!("{} is not a Word document: {err}", path.display()))
    })?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|err| {
            CollaboratorError::MalformedResponse(format!(
                "{} has no document body: {err}",
                path.display()
            ))
        })?
        .read_to_string(&mut xml)
        .map_err(|source| io_error(path, source))?;

    Ok(docx_xml_to_text(&xml))
}

pub(crate) fn docx_xml_to_text(xml: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("static pattern compiles"));

    let with_breaks = xml.replace("</w:p>", "\n");
    let stripped = tag.replace_all(&with_breaks, "");
    let text = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    text.trim().to_string()
}

fn io_error(path: &Path, source: std::io::Error) -> CollaboratorError {
    CollaboratorError::Io {
        path: PathBuf::from(path),
        source,
    }
}

pub fn is_supported(file_name: &str) -> bool {
    SourceFormat::detect(Path::new(file_name)).is_some()
}
