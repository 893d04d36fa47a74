use std::path::Path;

use chrono::Local;

use crate::cli::AddArgs;
use crate::commands::common::{draft_from_add_args, open_database};
use crate::error::CliError;

pub async fn run_add(args: &AddArgs, db_path: &Path) -> Result<(), CliError> {
    let draft = draft_from_add_args(args, Local::now().date_naive())?;

    let db = open_database(db_path).await?;
    let app = db.create_application(&draft).await?;

    println!("{}", app.id);
    Ok(())
}
