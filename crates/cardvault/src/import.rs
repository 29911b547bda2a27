use crate::prelude::{println, *};
use colored::Colorize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cardvault_core::import::import_collection;
use cardvault_core::record::CollectionRecord;
use cardvault_core::view::{project, ViewState};

use crate::enrich::{spawn_save, wait_for_save};
use crate::store::Store;

#[derive(Debug, clap::Args, Clone)]
#[command(after_help = "EXAMPLES:
  # Import a collection export (replaces the stored collection):
  cardvault import ~/Downloads/collection.csv

  # Import for a specific user:
  cardvault --user alice import collection.csv

NOTES:
  - Recognized columns: Name, Set code, Quantity, Foil, Scryfall ID, Collector number
  - Other columns are ignored; missing or malformed cells fall back to empty values
  - Run `cardvault enrich` afterwards to fetch market prices")]
pub struct ImportOptions {
    /// CSV export to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Read and normalize a CSV export from disk
pub fn import_file(path: &Path) -> Result<Vec<CollectionRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    import_collection(BufReader::new(file))
        .with_context(|| format!("Failed to import {}", path.display()))
}

pub async fn run(options: ImportOptions, global: crate::Global) -> Result<()> {
    let records = import_file(&options.file)?;
    log::info!(
        "Imported {} records from {}",
        records.len(),
        options.file.display()
    );

    let store = Arc::new(Store::from_global(&global)?);
    if global.verbose {
        println!("Saving collection to {}", store.describe());
    }

    wait_for_save(spawn_save(store, global.user.clone(), records.clone())).await?;

    let view = project(&records, &ViewState::default());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Imported".green().bold(),
        records.len().to_string().bright_white().bold(),
        "records".green().bold()
    );
    crate::view::output_formatted(&view);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_import_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name,Set code,Quantity,Scryfall ID").unwrap();
        writeln!(file, "Lightning Bolt,2xm,4,abc-123").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Shock,m19,x,").unwrap();

        let records = import_file(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Lightning Bolt");
        assert_eq!(records[0].quantity, 4);
        assert_eq!(records[1].name, "Shock");
        assert_eq!(records[1].quantity, 0);
        assert_eq!(records[1].lookup_id(), None);
    }

    #[tokio::test]
    async fn test_run_reports_failed_save() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-directory");
        std::fs::write(&blocker, "").unwrap();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name,Quantity").unwrap();
        writeln!(file, "Lightning Bolt,4").unwrap();

        let options = ImportOptions {
            file: file.path().to_path_buf(),
            json: true,
        };
        let global = crate::Global {
            user: "alice".to_string(),
            data_dir: Some(blocker.join("sub")),
            verbose: false,
        };

        let err = run(options, global).await.unwrap_err();

        assert!(format!("{err:?}").contains("Collection was not saved"));
    }

    #[tokio::test]
    async fn test_run_stores_collection() {
        let temp_dir = tempfile::TempDir::new().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name,Quantity").unwrap();
        writeln!(file, "Lightning Bolt,4").unwrap();

        let options = ImportOptions {
            file: file.path().to_path_buf(),
            json: true,
        };
        let global = crate::Global {
            user: "alice".to_string(),
            data_dir: Some(temp_dir.path().to_path_buf()),
            verbose: false,
        };

        run(options, global.clone()).await.unwrap();

        let view = crate::view::view_data(String::new(), 1, &global)
            .await
            .unwrap();
        assert_eq!(view.total_items, 1);
        assert_eq!(view.page[0].name, "Lightning Bolt");
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
