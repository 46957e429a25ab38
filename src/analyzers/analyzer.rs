use crate::analyzers::aggregate::{Accumulator, valid_records};
use crate::analyzers::category::{AgeBounds, age_category};
use crate::analyzers::types::{GroupRow, Record, Reduction, ShareRow, parse_finite};
use crate::analyzers::utility::pct;
use crate::source::{CsvTable, Person, SourceError, read_csv_pairs, read_csv_sales};
use std::path::Path;
use tracing::info;

/// Mean of `value_column` for every distinct `key_column` label in a CSV file.
pub fn group_averages(
    path: impl AsRef<Path>,
    key_column: &str,
    value_column: &str,
    delimiter: u8,
) -> Result<Vec<GroupRow>, SourceError> {
    let pairs = read_csv_pairs(path, key_column, value_column, delimiter)?;
    let total = pairs.len();

    let acc: Accumulator = valid_records(pairs).collect();
    let groups = acc.into_rows(Reduction::Mean);

    let used: usize = groups.iter().map(|g| g.count).sum();
    info!(
        rows = total,
        skipped = total - used,
        groups = groups.len(),
        "Averages computed"
    );
    Ok(groups)
}

/// Total revenue (quantity times price) per product, sorted by product name.
pub fn product_revenue(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<GroupRow>, SourceError> {
    let records = read_csv_sales(path, delimiter)?;
    let acc: Accumulator = records.into_iter().collect();
    let groups = acc.into_rows(Reduction::Sum);

    info!(products = groups.len(), "Revenue computed");
    Ok(groups)
}

/// Revenue of one product. Names are matched exactly; an unknown product has
/// no revenue.
pub fn revenue_for(groups: &[GroupRow], product: &str) -> f64 {
    groups
        .iter()
        .find(|g| g.key == product)
        .map(|g| g.value)
        .unwrap_or(0.0)
}

/// Distinct product names, sorted.
pub fn products(groups: &[GroupRow]) -> Vec<String> {
    let mut names: Vec<String> = groups.iter().map(|g| g.key.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Mean age and head count per age category.
///
/// People without a valid age, or outside `bounds`, are left out.
pub fn age_groups(people: &[Person], bounds: &AgeBounds) -> Vec<GroupRow> {
    let acc: Accumulator = people
        .iter()
        .filter_map(|p| p.age)
        .filter(|age| bounds.contains(*age))
        .map(|age| Record {
            key: age_category(age).to_string(),
            value: age,
        })
        .collect();

    acc.into_rows(Reduction::Mean)
}

pub fn people_in_range<'a>(people: &'a [Person], bounds: &AgeBounds) -> Vec<&'a Person> {
    people
        .iter()
        .filter(|p| p.age.is_some_and(|age| bounds.contains(age)))
        .collect()
}

/// Looks people up by name, ignoring case. With `partial`, any name that
/// contains `query` matches.
pub fn find_people<'a>(people: &'a [Person], query: &str, partial: bool) -> Vec<&'a Person> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    people
        .iter()
        .filter(|p| {
            let name = p.name.to_lowercase();
            if partial {
                name.contains(&query)
            } else {
                name == query
            }
        })
        .collect()
}

/// The youngest and the oldest person with a valid age. Ties go to whoever
/// comes first.
pub fn youngest_oldest(people: &[Person]) -> Option<(&Person, &Person)> {
    let mut aged = people.iter().filter_map(|p| p.age.map(|age| (p, age)));
    let first = aged.next()?;

    let (youngest, oldest) = aged.fold((first, first), |(young, old), current| {
        (
            if current.1 < young.1 { current } else { young },
            if current.1 > old.1 { current } else { old },
        )
    });
    Some((youngest.0, oldest.0))
}

/// Rows of `table` whose `column` holds a number at or above `threshold`.
pub fn rows_at_or_above<'a>(
    table: &'a CsvTable,
    column: &str,
    threshold: f64,
) -> Result<Vec<&'a [String]>, SourceError> {
    let index = table.column_index(column)?;
    Ok(table
        .rows
        .iter()
        .filter(|row| {
            row.get(index)
                .and_then(|cell| parse_finite(cell))
                .is_some_and(|v| v >= threshold)
        })
        .map(Vec::as_slice)
        .collect())
}

/// How often each non-blank cell occurs, most frequent first.
pub fn shares<S: AsRef<str>>(cells: &[S]) -> Vec<ShareRow> {
    let acc: Accumulator = cells
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .map(|c| Record {
            key: c.to_string(),
            value: 1.0,
        })
        .collect();

    let groups = acc.into_rows(Reduction::Count);
    let total: usize = groups.iter().map(|g| g.count).sum();

    let mut shares: Vec<ShareRow> = groups
        .into_iter()
        .map(|g| ShareRow {
            percent: pct(g.count, total),
            count: g.count,
            key: g.key,
        })
        .collect();
    shares.sort_by(|l, r| r.count.cmp(&l.count).then_with(|| l.key.cmp(&r.key)));
    shares
}
