use crate::prelude::{eprintln, println, *};
use colored::Colorize;

use cardvault_core::view::{format_price, format_total, project, CollectionView, ViewState};

use crate::store::{CollectionStore, Store};

#[derive(Debug, clap::Args, Clone)]
pub struct ViewOptions {
    /// Only show cards whose name contains this text (case-insensitive)
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load the user's collection and project the requested page
pub async fn view_data(
    search: String,
    page: usize,
    global: &crate::Global,
) -> Result<CollectionView> {
    let store = Store::from_global(global)?;
    let records = store.load(&global.user).await?.unwrap_or_default();

    Ok(project(&records, &ViewState::new(search, page)))
}

pub async fn run(options: ViewOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Loading collection for {}...", global.user);
    }

    let view = view_data(options.search.clone(), options.page, &global).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        output_formatted(&view);
    }

    Ok(())
}

/// Build the collection table for one page, with the total value footer
fn build_table(view: &CollectionView) -> prettytable::Table {
    let mut table = crate::prelude::new_table();
    table.set_titles(prettytable::row![
        "Image",
        "Name",
        "Set",
        "Foil",
        "Quantity",
        "Market Price",
        "Error"
    ]);

    for record in &view.page {
        let error = record
            .enrichment_error()
            .map(|e| e.to_string())
            .unwrap_or_default();

        table.add_row(prettytable::row![
            record.image_url().unwrap_or("-"),
            &record.name,
            &record.set_code,
            &record.foil,
            record.quantity,
            format_price(record.market_price()),
            error
        ]);
    }

    table.add_empty_row();
    table.add_row(prettytable::row![
        "Total Value",
        "",
        "",
        "",
        "",
        format_total(view.total_value),
        ""
    ]);

    table
}

/// One selector entry per page, current page highlighted
fn format_page_selector(view: &CollectionView) -> String {
    (1..=view.total_pages)
        .map(|page| {
            if page == view.current_page {
                format!("[{page}]").bright_cyan().bold().to_string()
            } else {
                format!(" {page} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Navigation hints for the collection view
fn format_navigation(view: &CollectionView) -> String {
    let mut result = String::new();

    if view.total_pages > 1 {
        result.push_str(&format!(
            "\n{}: {}\n",
            "Pages".bright_white().bold(),
            format_page_selector(view)
        ));
    }

    result.push_str(&format!(
        "\n{} {} {} {} ({} {})\n",
        "Showing page".bright_white(),
        view.current_page.to_string().bright_cyan().bold(),
        "of".bright_white(),
        view.total_pages.to_string().bright_cyan().bold(),
        view.total_items.to_string().bright_cyan().bold(),
        "matching records".bright_white()
    ));

    if let Some(next) = &view.next_page_command {
        result.push_str(&format!("  {}: {}\n", "Next page".green(), next.cyan()));
    }
    if let Some(prev) = &view.prev_page_command {
        result.push_str(&format!("  {}: {}\n", "Previous page".green(), prev.cyan()));
    }

    result
}

pub fn output_formatted(view: &CollectionView) {
    if view.page.is_empty() {
        if view.total_items == 0 {
            println!("No records found.");
        } else {
            println!("No records on page {}.", view.current_page);
        }
    }

    build_table(view).printstd();
    eprintln!("{}", format_navigation(view));
}
