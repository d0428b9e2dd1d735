use crate::error::Result;
use crate::model::EndpointRecord;
use pulldown_cmark_escape::{escape_html, escape_html_body_text, FmtWriter};
use serde::Serialize;
use std::fmt::{self, Write};

/// Output forms a record can be rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    /// JSON with only path, method and description
    Compact,
    Markdown,
    Html,
}

/// Language of the section headings in prose output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    EnUs,
    #[default]
    PtBr,
}

struct Labels {
    method: &'static str,
    description: &'static str,
    parameters: &'static str,
    example_request: &'static str,
    example_response: &'static str,
    snippets: &'static str,
    required: &'static str,
    optional: &'static str,
}

impl Labels {
    fn requirement(&self, required: bool) -> &'static str {
        if required {
            self.required
        } else {
            self.optional
        }
    }
}

impl Locale {
    fn labels(self) -> Labels {
        match self {
            Locale::EnUs => Labels {
                method: "Method",
                description: "Description",
                parameters: "Parameters",
                example_request: "Example Request",
                example_response: "Example Response",
                snippets: "Code Snippets",
                required: "required",
                optional: "optional",
            },
            Locale::PtBr => Labels {
                method: "Método",
                description: "Descrição",
                parameters: "Parâmetros",
                example_request: "Exemplo de requisição",
                example_response: "Exemplo de resposta",
                snippets: "Snippets de código",
                required: "obrigatório",
                optional: "opcional",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CompactEndpoint<'a> {
    path: &'a str,
    method: &'a str,
    description: &'a str,
}

/// Render a list of records. Markdown documents are separated by `---`.
pub fn render_records(
    records: &[EndpointRecord],
    format: Format,
    locale: Locale,
) -> Result<String> {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(records)?,
        Format::Yaml => serde_yaml::to_string(records)?,
        Format::Compact => {
            let compact: Vec<CompactEndpoint<'_>> = records
                .iter()
                .map(|record| CompactEndpoint {
                    path: &record.path,
                    method: record.method.as_str(),
                    description: &record.description,
                })
                .collect();
            serde_json::to_string_pretty(&compact)?
        }
        Format::Markdown => records
            .iter()
            .map(|record| to_markdown(record, locale))
            .collect::<Result<Vec<_>>>()?
            .join("\n---\n"),
        Format::Html => records
            .iter()
            .map(|record| to_html(record, locale))
            .collect::<Result<Vec<_>>>()?
            .join("\n"),
    };
    Ok(rendered)
}

pub fn to_markdown(record: &EndpointRecord, locale: Locale) -> Result<String> {
    let mut md = String::new();
    write_markdown(&mut md, record, &locale.labels())?;
    Ok(md)
}

pub fn to_html(record: &EndpointRecord, locale: Locale) -> Result<String> {
    let mut html = String::new();
    write_html(&mut html, record, &locale.labels())?;
    Ok(html)
}

fn write_markdown(md: &mut String, record: &EndpointRecord, labels: &Labels) -> fmt::Result {
    writeln!(md, "# {}\n", record.path)?;
    writeln!(md, "**{}:** {}\n", labels.method, record.method)?;
    writeln!(md, "**{}:** {}\n", labels.description, record.description)?;

    if !record.parameters.is_empty() {
        writeln!(md, "## {}\n", labels.parameters)?;
        for param in &record.parameters {
            writeln!(
                md,
                "- **{}** ({}): {} ({})",
                param.name,
                param.param_type,
                param.description,
                labels.requirement(param.required)
            )?;
        }
        md.push('\n');
    }

    if let Some(request) = &record.example_request {
        writeln!(md, "## {}\n\n```\n{request}\n```\n", labels.example_request)?;
    }
    if let Some(response) = &record.example_response {
        writeln!(md, "## {}\n\n```json\n{response}\n```\n", labels.example_response)?;
    }

    if !record.snippets.is_empty() {
        writeln!(md, "## {}\n", labels.snippets)?;
        for (language, code) in &record.snippets {
            writeln!(md, "### {language}\n\n```{language}\n{code}\n```\n")?;
        }
    }
    Ok(())
}

fn write_html(html: &mut String, record: &EndpointRecord, labels: &Labels) -> fmt::Result {
    html.push_str("<h1>");
    escape_html(FmtWriter(&mut *html), &record.path)?;
    html.push_str("</h1>\n");

    writeln!(html, "<p><strong>{}:</strong> {}</p>", labels.method, record.method)?;
    write!(html, "<p><strong>{}:</strong> ", labels.description)?;
    escape_html_body_text(FmtWriter(&mut *html), &record.description)?;
    html.push_str("</p>\n");

    if !record.parameters.is_empty() {
        writeln!(html, "<h2>{}</h2>\n<ul>", labels.parameters)?;
        for param in &record.parameters {
            html.push_str("<li><strong>");
            escape_html_body_text(FmtWriter(&mut *html), &param.name)?;
            write!(html, "</strong> ({}): ", param.param_type)?;
            escape_html_body_text(FmtWriter(&mut *html), &param.description)?;
            writeln!(html, " ({})</li>", labels.requirement(param.required))?;
        }
        html.push_str("</ul>\n");
    }

    if let Some(request) = &record.example_request {
        writeln!(html, "<h2>{}</h2>", labels.example_request)?;
        html.push_str("<pre><code>");
        escape_html(FmtWriter(&mut *html), request)?;
        html.push_str("</code></pre>\n");
    }
    if let Some(response) = &record.example_response {
        writeln!(html, "<h2>{}</h2>", labels.example_response)?;
        html.push_str("<pre><code class=\"json\">");
        escape_html(FmtWriter(&mut *html), response)?;
        html.push_str("</code></pre>\n");
    }

    if !record.snippets.is_empty() {
        writeln!(html, "<h2>{}</h2>", labels.snippets)?;
        for (language, code) in &record.snippets {
            let mut escaped_language = String::new();
            escape_html(FmtWriter(&mut escaped_language), language)?;
            writeln!(html, "<h3>{escaped_language}</h3>")?;
            write!(html, "<pre><code class=\"{escaped_language}\">")?;
            escape_html(FmtWriter(&mut *html), code)?;
            html.push_str("</code></pre>\n");
        }
    }
    Ok(())
}
