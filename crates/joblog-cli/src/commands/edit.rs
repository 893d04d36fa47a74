use std::path::Path;

use crate::cli::EditArgs;
use crate::commands::common::{draft_from_edit_args, open_database, resolve_application};
use crate::error::CliError;

pub async fn run_edit(args: &EditArgs, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let current = resolve_application(&args.id, &db).await?;

    let draft = draft_from_edit_args(&current, args);
    if draft == current.to_draft() {
        println!("{}", current.id);
        return Ok(());
    }

    let updated = db.update_application(&current.id, &draft).await?;
    println!("{}", updated.id);
    Ok(())
}
