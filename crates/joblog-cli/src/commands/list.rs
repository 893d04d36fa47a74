use std::path::Path;

use joblog_core::search::{sort_newest_first, ApplicationFilter};

use crate::commands::common::{
    application_to_list_item, format_application_lines, open_database, ApplicationListItem,
};
use crate::error::CliError;

pub async fn run_list(filter: &ApplicationFilter, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let mut applications = filter.apply(db.list_applications().await?);
    sort_newest_first(&mut applications);

    if as_json {
        let json_items = applications
            .iter()
            .map(application_to_list_item)
            .collect::<Vec<ApplicationListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if applications.is_empty() {
        println!("No applications found.");
    } else {
        for line in format_application_lines(&applications) {
            println!("{line}");
        }
    }

    Ok(())
}
