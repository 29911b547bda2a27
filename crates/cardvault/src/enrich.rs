use crate::prelude::{println, *};
use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::task::JoinHandle;

use cardvault_core::catalog::{LookupError, LookupResult};
use cardvault_core::enrich::{merge_outcomes, summarize, BatchSummary};
use cardvault_core::record::CollectionRecord;
use cardvault_core::view::{project, ViewState};

use crate::catalog::{CardCatalog, CatalogConfig, ScryfallClient};
use crate::store::{CollectionStore, Store};

/// Lookups in flight at once unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, clap::Args, Clone)]
pub struct EnrichOptions {
    /// Maximum number of catalog lookups in flight
    #[arg(short, long, env = "CARDVAULT_CONCURRENCY", default_value = "8")]
    pub concurrency: usize,

    /// Per-lookup timeout in seconds
    #[arg(long, env = "CARDVAULT_LOOKUP_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// A finished batch
///
/// `persist` tracks the background save of `records`. Dropping it does not
/// cancel the save.
#[derive(Debug)]
pub struct EnrichedBatch {
    pub records: Vec<CollectionRecord>,
    pub summary: BatchSummary,
    pub persist: JoinHandle<Result<(), Error>>,
}

/// Drives one enrichment batch over a user's collection
///
/// Callers must not run two batches for the same user concurrently.
pub struct Enricher<C, S> {
    catalog: C,
    store: Arc<S>,
    user_id: String,
    concurrency: usize,
}

impl<C, S> Enricher<C, S>
where
    C: CardCatalog,
    S: CollectionStore + 'static,
{
    pub fn new(catalog: C, store: Arc<S>, user_id: impl Into<String>) -> Self {
        Self {
            catalog,
            store,
            user_id: user_id.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn lookup_record(&self, record: &CollectionRecord) -> LookupResult {
        match record.lookup_id() {
            Some(id) => self.catalog.lookup(id).await,
            None => Err(LookupError::MissingIdentifier),
        }
    }

    /// Resolve every record, returning results in input order
    ///
    /// At most `concurrency` lookups run at once. Records without an
    /// identifier resolve immediately without touching the catalog.
    pub async fn lookup_all(
        &self,
        records: &[CollectionRecord],
        progress: Option<&ProgressBar>,
    ) -> Vec<LookupResult> {
        stream::iter(records.iter().map(|record| self.lookup_record(record)))
            .buffered(self.concurrency)
            .inspect(|_| {
                if let Some(bar) = progress {
                    bar.inc(1);
                }
            })
            .collect()
            .await
    }

    /// Enrich the whole record set and schedule a save of the result
    pub async fn enrich_all(
        &self,
        records: Vec<CollectionRecord>,
        progress: Option<&ProgressBar>,
    ) -> EnrichedBatch {
        log::info!(
            "Enriching {} records for {} ({} concurrent lookups)",
            records.len(),
            self.user_id,
            self.concurrency
        );

        let outcomes = self.lookup_all(&records, progress).await;

        for (record, outcome) in records.iter().zip(&outcomes) {
            if let Err(LookupError::LookupFailed(message)) = outcome {
                log::warn!("Lookup failed for {:?}: {}", record.name, message);
            }
        }

        let merged = merge_outcomes(records, outcomes);
        let summary = summarize(&merged);

        log::info!(
            "Batch finished: {} enriched, {} failed, total value {:.2}",
            summary.enriched,
            summary.failed(),
            summary.total_value
        );

        let persist = spawn_save(Arc::clone(&self.store), self.user_id.clone(), merged.clone());

        EnrichedBatch {
            records: merged,
            summary,
            persist,
        }
    }
}

/// Save a collection in the background
///
/// Failures are logged; callers that await the handle also get the error back.
pub fn spawn_save<S>(
    store: Arc<S>,
    user_id: String,
    records: Vec<CollectionRecord>,
) -> JoinHandle<Result<(), Error>>
where
    S: CollectionStore + 'static,
{
    tokio::spawn(async move {
        let result = store.save(&user_id, &records).await;
        match &result {
            Ok(()) => log::debug!("Saved {} records for {}", records.len(), user_id),
            Err(e) => log::warn!("Failed to save collection for {}: {}", user_id, e),
        }
        result
    })
}

/// Wait for a background save to finish, surfacing its failure
pub async fn wait_for_save(persist: JoinHandle<Result<(), Error>>) -> Result<()> {
    persist
        .await
        .map_err(|e| eyre!("Background save did not complete: {}", e))?
        .wrap_err("Collection was not saved")
}

/// Load a user's collection, enrich it and wait for the save to land
pub async fn enrich_data(options: &EnrichOptions, global: &crate::Global) -> Result<EnrichedBatch> {
    let store = Arc::new(Store::from_global(global)?);

    let records = store
        .load(&global.user)
        .await?
        .ok_or_eyre("No collection stored for this user; run `cardvault import <file>` first")?;

    let config = CatalogConfig::from_env().with_overrides(options.timeout);
    let catalog = ScryfallClient::new(&config)?;
    let enricher = Enricher::new(catalog, store, global.user.clone())
        .with_concurrency(options.concurrency);

    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| eyre!("Invalid progress template: {}", e))?
            .progress_chars("=> "),
    );
    progress.set_message("looking up prices");

    let batch = enricher.enrich_all(records, Some(&progress)).await;
    progress.finish_and_clear();

    Ok(batch)
}

pub async fn run(options: EnrichOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Enriching collection for {}...", global.user);
    }

    let EnrichedBatch {
        records,
        summary,
        persist,
    } = enrich_data(&options, &global).await?;

    wait_for_save(persist).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        crate::view::output_formatted(&project(&records, &ViewState::default()));
        anstream::print!("{}", format_summary_text(&summary));
    }

    Ok(())
}

/// Convert a batch summary to formatted text with colors
fn format_summary_text(summary: &BatchSummary) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!(
        "{}\n",
        format!("ENRICHED {} RECORDS", summary.total)
            .bright_cyan()
            .bold()
    ));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    result.push_str(&format!(
        "\n    {}: {} | {}: {}\n",
        "Enriched".green(),
        summary.enriched.to_string().bright_white(),
        "Priced".green(),
        summary.priced.to_string().bright_white()
    ));
    result.push_str(&format!(
        "    {}: {} | {}: {} | {}: {}\n",
        "Missing identifier".red(),
        summary.missing_identifier.to_string().bright_white(),
        "No listing id".red(),
        summary.no_listing_id.to_string().bright_white(),
        "Lookup failed".red(),
        summary.lookup_failed.to_string().bright_white()
    ));
    result.push_str(&format!(
        "    {}: {}\n",
        "Total value".green(),
        cardvault_core::view::format_total(summary.total_value)
            .bright_yellow()
            .bold()
    ));

    result.push_str(&format!("\n{}:\n", "To browse the collection".bright_white().bold()));
    result.push_str(&format!("  {}\n", "cardvault view".cyan()));
    if summary.lookup_failed > 0 {
        result.push_str(&format!(
            "\n{}:\n",
            "To retry failed lookups".bright_white().bold()
        ));
        result.push_str(&format!("  {}\n", "cardvault enrich".cyan()));
    }

    result.push('\n');
    result
}
