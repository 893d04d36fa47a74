use std::path::Path;

use crate::commands::common::{open_database, resolve_application};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let app = resolve_application(id, &db).await?;

    db.delete_application(&app.id).await?;
    println!("{}", app.id);
    Ok(())
}
