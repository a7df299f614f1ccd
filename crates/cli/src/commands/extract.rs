//! Address extraction command, for checking what a value would contribute

use anyhow::{Context, Result};
use std::io::Read;
use tabled::Tabled;
use topology_lib::{ServiceReference, UrlExtractor};

use crate::output::{print_warning, table, to_json, OutputFormat};

/// Row for extracted references table
#[derive(Tabled)]
struct ReferenceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "URL")]
    url: String,
}

/// Run the extractor over `texts`, or over stdin when none are given
pub fn extract_references(
    extractor: &UrlExtractor,
    texts: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let texts = if texts.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        vec![buf]
    } else {
        texts
    };

    let references: Vec<ServiceReference> =
        texts.iter().flat_map(|t| extractor.extract(t)).collect();

    match format {
        OutputFormat::Json => println!("{}", to_json(&references)?),
        OutputFormat::Table | OutputFormat::Dot => {
            if references.is_empty() {
                print_warning("No in-cluster service addresses found");
                return Ok(());
            }
            let rows: Vec<ReferenceRow> = references
                .iter()
                .map(|r| ReferenceRow {
                    service: r.service.clone(),
                    namespace: r.namespace.clone(),
                    port: r.port,
                    protocol: r.protocol.to_string(),
                    url: r.url.clone(),
                })
                .collect();
            println!("{}", table(&rows));
        }
    }

    Ok(())
}
