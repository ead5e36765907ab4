use chrono::Local;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::roster::Student;
use crate::seating::SeatingChart;

/// Formats a student as first name plus last initial, e.g. "Ada L."
pub fn format_student_name(student: &Student) -> String {
    let first = student.first_name();
    match student.last_name().chars().next() {
        Some(initial) => format!("{} {}.", first, initial),
        None => first.to_string(),
    }
}

fn write_chart<W: fmt::Write>(out: &mut W, roster_name: &str, chart: &SeatingChart) -> fmt::Result {
    writeln!(out, "** {} Seating Chart **", roster_name)?;
    writeln!(out, "Generated {}", Local::now().format("%Y-%m-%d %H:%M"))?;

    let mut current_row = None;
    for table in &chart.tables {
        if current_row != Some(table.row) {
            writeln!(out, "\n--- Row {} ---", table.row + 1)?;
            current_row = Some(table.row);
        }
        writeln!(out, "\n{} [{}]", table.name, table.color)?;
        for seat in &table.seats {
            match &seat.student {
                Some(student) => writeln!(out, "  {}. {}", seat.seat_number, format_student_name(student))?,
                None => writeln!(out, "  {}. [EMPTY]", seat.seat_number)?,
            }
        }
    }
    Ok(())
}

/// Renders the chart as plain text: a header, then each table with numbered seats
pub fn chart_to_text(roster_name: &str, chart: &SeatingChart) -> String {
    let mut out = String::new();
    // Formatting into a String cannot fail
    if let Err(e) = write_chart(&mut out, roster_name, chart) {
        log::error!("Failed to render chart: {}", e);
    }
    out
}

/// Writes the chart text to a file
pub fn write_chart_to_file<P: AsRef<Path>>(
    roster_name: &str,
    chart: &SeatingChart,
    filename: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;
    file.write_all(chart_to_text(roster_name, chart).as_bytes())?;
    Ok(())
}

/// Prints a chart in a readable format
pub fn print_chart(roster_name: &str, chart: &SeatingChart) {
    println!("\n=== {} Seating Chart ===", roster_name);
    println!("Students seated: {}", chart.seated_count());
    println!("Tables used: {}", chart.tables.len());

    if !chart.diagnostics.is_empty() {
        println!("⚠️  Notes ({}):", chart.diagnostics.len());
        for note in &chart.diagnostics {
            println!("  - {}", note);
        }
    }

    for table in &chart.tables {
        let names: Vec<String> = table
            .seats
            .iter()
            .map(|seat| match &seat.student {
                Some(student) => format!("{}: {}", seat.seat_number, format_student_name(student)),
                None => format!("{}: [EMPTY]", seat.seat_number),
            })
            .collect();
        println!(
            "  {} ({}/{}) -> {}",
            table.name,
            table.occupied(),
            table.capacity,
            names.join(", ")
        );
    }
}
