use std::path::Path;

use crate::commands::common::{
    application_to_list_item, format_application_details, open_database, resolve_application,
};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let app = resolve_application(id, &db).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&application_to_list_item(&app))?
        );
    } else {
        for line in format_application_details(&app) {
            println!("{line}");
        }
    }
    Ok(())
}
