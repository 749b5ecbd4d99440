use super::ui;
use crate::core::{BimonthlyRateService, PeriodInfo};
use anyhow::Result;
use comfy_table::Cell;

impl PeriodInfo {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Period"),
            ui::header_cell("Months"),
            ui::header_cell("Starts"),
            ui::header_cell("Year"),
        ]);
        table.add_row(vec![
            Cell::new(&self.key),
            Cell::new(&self.display_name),
            Cell::new(&self.start_date_display),
            Cell::new(self.year),
        ]);

        format!(
            "\n{}\n{}",
            ui::style_text("Current bimonth", ui::StyleType::Title),
            table
        )
    }
}

pub fn run(service: &BimonthlyRateService) -> Result<()> {
    println!("{}", service.get_current_period_info().display_as_table());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_as_table() {
        console::set_colors_enabled(false);
        let info = PeriodInfo {
            key: "2026-B6".to_string(),
            display_name: "November/December".to_string(),
            start_date_display: "01/11/2026".to_string(),
            year: 2026,
        };

        let output = info.display_as_table();

        assert!(output.contains("Current bimonth"));
        assert!(output.contains("2026-B6"));
        assert!(output.contains("November/December"));
        assert!(output.contains("01/11/2026"));
    }
}
