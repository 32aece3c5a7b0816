use anyhow::{Context, Result};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pdfdesk::page_range::parse_page_selection;
use pdfdesk::pdf::images::{images_to_pdf, ImagePdfOptions};
use pdfdesk::pdf::merge::merge_documents;
use pdfdesk::pdf::PdfDocument;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "Paths of the PDF files to merge, in order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfImagesRequest {
    #[schemars(description = "Paths of the image files, one page per image")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
    #[schemars(description = "Resolution used to size pages from image pixels (default: 72)")]
    #[serde(default = "default_dpi")]
    pub dpi: f32,
}

fn default_dpi() -> f32 {
    ImagePdfOptions::default().dpi
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfDeletePagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to delete, counted from 1 (e.g., '2,5-7,9')")]
    pub pages: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to keep, counted from 1 (e.g., '1-5,10')")]
    pub pages: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParsePagesRequest {
    #[schemars(description = "Page selection (e.g., '9,2,5-7')")]
    pub pages: String,
    #[schemars(description = "Number of pages in the document, to reject pages beyond it")]
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => {
            warn!(error = %e, "tool call failed");
            format!("Error: {:#}", e)
        }
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer, creation date, and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        to_json(PdfDocument::open(&path).map(|doc| {
            let info = doc.get_info();
            PdfInfoResult {
                path,
                version: info.version,
                page_count: info.page_count,
                title: info.title,
                author: info.author,
                creator: info.creator,
                producer: info.producer,
                creation_date: info.creation_date,
                subject: info.subject,
                keywords: info.keywords,
            }
        }))
    }

    #[tool(description = "Merge several PDF files, in the given order, into one new PDF")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        to_json(merge(req))
    }

    #[tool(description = "Convert image files (png, jpeg, bmp, tiff, webp, gif) into one PDF with a page per image")]
    fn pdf_images_to_pdf(&self, Parameters(req): Parameters<PdfImagesRequest>) -> String {
        to_json(convert_images(req))
    }

    #[tool(description = "Delete pages from a PDF and save the result to a new file. Pages are counted from 1, e.g. '2,5-7,9'. Any invalid page fails the whole request.")]
    fn pdf_delete_pages(&self, Parameters(req): Parameters<PdfDeletePagesRequest>) -> String {
        to_json(delete_pages(req))
    }

    #[tool(description = "Keep only the selected pages of a PDF and save them to a new file. Pages are counted from 1, e.g. '1-5,10'.")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        to_json(extract_pages(req))
    }

    #[tool(description = "Validate a page selection like '9,2,5-7' and return its sorted pages and canonical form")]
    fn pdf_parse_pages(&self, Parameters(req): Parameters<ParsePagesRequest>) -> String {
        let result = parse_page_selection(&req.pages, req.total).map(|selection| {
            PageSelectionResult {
                canonical: selection.to_string(),
                pages: selection.into(),
            }
        });
        to_json(result.map_err(anyhow::Error::from))
    }
}

fn merge(req: PdfMergeRequest) -> Result<WriteResult> {
    let documents = req
        .inputs
        .iter()
        .map(|input| PdfDocument::open(input).map(|d| d.doc))
        .collect::<Result<Vec<_>>>()?;
    let mut merged = merge_documents(documents)?;
    let page_count = merged.get_pages().len() as u32;
    PdfDocument::save(&mut merged, &req.output)?;
    info!(inputs = req.inputs.len(), output = %req.output, "merged PDFs");

    Ok(WriteResult {
        output_path: req.output,
        page_count,
    })
}

fn convert_images(req: PdfImagesRequest) -> Result<WriteResult> {
    let images = req
        .inputs
        .iter()
        .map(|input| std::fs::read(input).with_context(|| format!("Failed to read image: {}", input)))
        .collect::<Result<Vec<_>>>()?;
    let mut doc = images_to_pdf(&images, &ImagePdfOptions { dpi: req.dpi })?;
    PdfDocument::save(&mut doc, &req.output)?;

    Ok(WriteResult {
        output_path: req.output,
        page_count: images.len() as u32,
    })
}

fn delete_pages(req: PdfDeletePagesRequest) -> Result<DeleteResult> {
    let doc = PdfDocument::open(&req.path)?;
    let total = doc.page_count();
    let selection = parse_page_selection(&req.pages, Some(total))?;
    let mut new_doc = doc.delete_pages(&selection)?;
    PdfDocument::save(&mut new_doc, &req.output)?;
    info!(path = %req.path, deleted = %selection, "deleted pages");

    Ok(DeleteResult {
        output_path: req.output,
        remaining_page_count: selection.complement(total).len() as u32,
        deleted_pages: selection.into(),
    })
}

fn extract_pages(req: PdfExtractRequest) -> Result<WriteResult> {
    let doc = PdfDocument::open(&req.path)?;
    let selection = parse_page_selection(&req.pages, Some(doc.page_count()))?;
    let mut new_doc = doc.extract_pages(&selection)?;
    PdfDocument::save(&mut new_doc, &req.output)?;

    Ok(WriteResult {
        output_path: req.output,
        page_count: selection.len() as u32,
    })
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub version: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WriteResult {
    pub output_path: String,
    pub page_count: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeleteResult {
    pub output_path: String,
    pub deleted_pages: Vec<u32>,
    pub remaining_page_count: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageSelectionResult {
    pub pages: Vec<u32>,
    pub canonical: String,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF editing tools. Use pdf_info to get the page count, pdf_merge to combine \
                 PDFs, pdf_images_to_pdf to turn images into a PDF, pdf_delete_pages or \
                 pdf_extract to remove or keep pages, and pdf_parse_pages to check a page \
                 selection before editing."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();
    info!("starting MCP server on stdio");

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
