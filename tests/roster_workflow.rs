//! End-to-end flow: import a CSV roster, save it, seat it, export the chart.

use rand::rngs::StdRng;
use rand::SeedableRng;

use seating_chart::display::chart_to_text;
use seating_chart::parser::read_roster;
use seating_chart::seating::{generate_with_rng, Grouping, GroupingType, SeatingPreferences};
use seating_chart::store::JsonStore;

const CLASS_CSV: &str = "\
First Name,Last Name,Level
Ada,Lovelace,High
Alan,Turing,High
Grace,Hopper,Mid
Edsger,Dijkstra,Mid
Barbara,Liskov,Low
Donald,Knuth,Low
Frances,Allen,Mid
";

#[test]
fn imported_roster_round_trips_through_store_and_seats() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();

    let roster = read_roster(CLASS_CSV.as_bytes()).unwrap();
    assert_eq!(roster.len(), 7);
    assert_eq!(roster.grouping_columns(), vec!["None", "First Name", "Last Name", "Level"]);

    store.save_roster("Period 1", &roster).unwrap();
    assert_eq!(store.list_rosters().unwrap(), vec!["Period 1".to_string()]);
    let loaded = store.load_roster("Period 1").unwrap();
    assert_eq!(loaded, roster);

    store.save_preferences(&SeatingPreferences::new(2, 4, 3)).unwrap();
    let prefs = store.load_preferences().unwrap();

    let mut rng = StdRng::seed_from_u64(2024);
    let grouping = Grouping::from_selection("Level", GroupingType::Mixed);
    let chart = generate_with_rng(&loaded, &prefs, &grouping, &mut rng).unwrap();
    assert_eq!(chart.table_sizes(), vec![4, 3]);
    assert!(chart.diagnostics.is_empty());

    let text = chart_to_text("Period 1", &chart);
    assert!(text.starts_with("** Period 1 Seating Chart **"));
    assert!(text.contains("Table 1 [#f9f9f9]"));
    assert!(text.contains("Table 2 [#f9f9f9]"));
    assert!(text.contains("Ada L."));
}

#[test]
fn edited_roster_is_seated_with_new_column() {
    let mut roster = read_roster(CLASS_CSV.as_bytes()).unwrap();
    roster.insert_column(2, "Team").unwrap();
    for row in 0..roster.len() {
        let team = if row % 2 == 0 { "Red" } else { "Blue" };
        roster.set_cell(row, "Team", team).unwrap();
    }

    let prefs = SeatingPreferences::new(3, 4, 3);
    let mut rng = StdRng::seed_from_u64(5);
    let chart = generate_with_rng(&roster, &prefs, &Grouping::by("Team", GroupingType::Same), &mut rng)
        .unwrap();

    let teams: Vec<&str> = chart.students().map(|s| s.group_key("Team")).collect();
    assert_eq!(teams.len(), 7);
    assert_eq!(teams.windows(2).filter(|w| w[0] != w[1]).count(), 1);
}
