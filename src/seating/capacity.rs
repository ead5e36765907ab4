use super::types::SeatingPreferences;

/// Number of seats to lay out at table `table_index`, given `seated` of `total`
/// students already placed.
///
/// Starts from the target table size. When the students still to seat don't split
/// evenly, and the tables left to fill (counted against the whole roster) are no
/// more than the seats a full-size split would leave short, the table drops one
/// seat. This moves the short tables forward so the last table is not left with a
/// handful of students. The result is never below `min_students_per_table`.
pub fn effective_capacity(
    total: usize,
    seated: usize,
    table_index: usize,
    prefs: &SeatingPreferences,
) -> usize {
    let target = prefs.students_per_table;
    if target == 0 {
        return 0;
    }

    let remaining = total.saturating_sub(seated);
    let leftover = remaining % target;
    if leftover == 0 {
        return target;
    }

    let tables_left = total.div_ceil(target) as i64 - table_index as i64;
    let short_by = (target - leftover) as i64;
    if tables_left <= short_by {
        (target - 1).max(prefs.min_students_per_table)
    } else {
        target
    }
}

/// Full-size tables the remaining students could still fill
pub fn tables_remaining(total: usize, seated: usize, students_per_table: usize) -> usize {
    if students_per_table == 0 {
        return 0;
    }
    total.saturating_sub(seated) / students_per_table
}
