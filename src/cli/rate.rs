use super::ui;
use crate::core::period::DISPLAY_DATE_FORMAT;
use crate::core::{BimonthlyRateService, ResolvedRate};
use anyhow::Result;
use comfy_table::Cell;

impl ResolvedRate {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
        table.add_row(vec![ui::label_cell("Period"), Cell::new(&self.period_key)]);
        table.add_row(vec![
            ui::label_cell("Reference date"),
            Cell::new(self.reference_date.format(DISPLAY_DATE_FORMAT)),
        ]);
        table.add_row(vec![
            ui::label_cell("Quotation date"),
            Cell::new(self.quotation_date.format(DISPLAY_DATE_FORMAT)),
        ]);
        table.add_row(vec![ui::label_cell("Buy rate"), ui::rate_cell(self.buy_rate)]);
        table.add_row(vec![ui::label_cell("Sell rate"), ui::rate_cell(self.sell_rate)]);

        let mut output = format!(
            "\nReference rate: {}\n",
            ui::style_text(&self.period_key, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());

        let origin = if self.from_cache { "cached" } else { "fresh" };
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Source: {} ({origin})", self.source_label),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

pub async fn run(service: &BimonthlyRateService) -> Result<()> {
    let period = service.current_period();
    let pb = ui::new_spinner(&format!("Fetching PTAX rate for {}...", period.display_name()));
    let result = service.get_current_rate().await;
    pb.finish_and_clear();

    let rate = result?;
    println!("{}", rate.display_as_table());
    Ok(())
}
