use std::path::Path;

use joblog_core::export::{render_export, ExportFormat as CoreExportFormat};
use joblog_core::search::sort_newest_first;

use crate::cli::ExportFormat;
use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let mut applications = db.list_applications().await?;
    sort_newest_first(&mut applications);

    let format = match format {
        ExportFormat::Json => CoreExportFormat::Json,
        ExportFormat::Markdown => CoreExportFormat::Markdown,
    };
    let rendered = render_export(&applications, format)?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
