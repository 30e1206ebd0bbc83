//! The `quizmark band` command.

use anyhow::Result;
use comfy_table::{Cell, Color, Table};

use quizmark_core::band::{table_for, BandTable, BandTier};
use quizmark_core::model::Skill;

pub fn execute(skill: Skill, correct: Option<usize>, total: Option<usize>) -> Result<()> {
    let table = table_for(skill)?;

    let Some(correct) = correct else {
        print_table(table);
        return Ok(());
    };

    let total = total.unwrap_or(table.canonical_total);
    anyhow::ensure!(
        correct <= total,
        "correct count {correct} exceeds total {total}"
    );

    let band = table.band(correct, total);
    let tier = BandTier::from_band(band);
    if total == table.canonical_total {
        println!("{skill}: {correct}/{total} -> band {band:.1} ({tier})");
    } else {
        println!(
            "{skill}: {correct}/{total} (scaled {}/{}) -> band {band:.1} ({tier})",
            table.scale(correct, total),
            table.canonical_total
        );
    }
    Ok(())
}

fn print_table(band_table: &BandTable) {
    let mut table = Table::new();
    table.set_header(vec![
        format!("Correct (of {})", band_table.canonical_total),
        "Band".to_string(),
    ]);
    for (threshold, band) in band_table.steps {
        table.add_row(vec![
            Cell::new(format!("{threshold}+")),
            Cell::new(format!("{band:.1}")).fg(tier_color(BandTier::from_band(*band))),
        ]);
    }
    table.add_row(vec![
        Cell::new("below"),
        Cell::new(format!("{:.1}", band_table.minimum)),
    ]);
    println!("{} band table\n{table}", band_table.skill);
}

pub(crate) fn tier_color(tier: BandTier) -> Color {
    match tier {
        BandTier::Excellent => Color::Green,
        BandTier::Good => Color::Blue,
        BandTier::Fair => Color::Yellow,
        BandTier::Low => Color::Red,
    }
}
