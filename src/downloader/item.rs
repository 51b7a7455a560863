//! Turning listing records into download items

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::ItemError;
use crate::models::{FilingRecord, Item};

/// Suffix of every downloaded report
pub const REPORT_SUFFIX: &str = "pdf";

/// A record that could not be planned, with the destination it would have used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub record_index: usize,
    pub identity_key: Option<String>,
    pub destination: Option<PathBuf>,
    pub error: ItemError,
}

/// Items to download plus the records that were rejected while planning
#[derive(Debug, Clone, Default)]
pub struct ItemPlan {
    pub items: Vec<Item>,
    pub rejected: Vec<Rejection>,
}

/// Derive the destination of a report from its symbol and financial year pair.
///
/// This is the only place destination paths are computed; planning and
/// reconciliation both go through it.
pub fn destination_for(output_dir: &Path, record: &FilingRecord) -> Result<PathBuf, ItemError> {
    let identity_key = identity_key(record).ok_or(ItemError::MissingIdentityKey)?;
    let missing_period = || ItemError::MissingPeriod(identity_key.to_string());
    let fy_from = non_blank(&record.fy_from).ok_or_else(missing_period)?;
    let fy_to = non_blank(&record.fy_to).ok_or_else(missing_period)?;

    let file_name = format!(
        "{}_{}_{}.{}",
        sanitize(identity_key),
        sanitize(fy_from),
        sanitize(fy_to),
        REPORT_SUFFIX
    );
    Ok(output_dir.join(file_name))
}

/// Build the download items for a record set.
///
/// Records sharing a destination with the same symbol are repeat listings of
/// one filing and produce a single item. Records whose destinations collide
/// across different symbols are all rejected.
pub fn plan_items(records: &[FilingRecord], output_dir: &Path) -> ItemPlan {
    let mut plan = ItemPlan::default();
    let mut groups: Vec<(PathBuf, Vec<usize>)> = Vec::new();
    let mut group_by_path: HashMap<PathBuf, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        match destination_for(output_dir, record) {
            Ok(path) => {
                let slot = *group_by_path.entry(path.clone()).or_insert_with(|| {
                    groups.push((path, Vec::new()));
                    groups.len() - 1
                });
                groups[slot].1.push(index);
            }
            Err(error) => {
                warn!("Skipping record {}: {}", index, error);
                plan.rejected.push(Rejection {
                    record_index: index,
                    identity_key: identity_key(record).map(str::to_string),
                    destination: None,
                    error,
                });
            }
        }
    }

    for (path, members) in groups {
        let first_key = identity_key(&records[members[0]]).unwrap_or_default();

        if let Some(&other) = members
            .iter()
            .find(|&&i| identity_key(&records[i]).unwrap_or_default() != first_key)
        {
            let error = ItemError::DuplicateDestination {
                path: path.clone(),
                first: first_key.to_string(),
                second: identity_key(&records[other]).unwrap_or_default().to_string(),
            };
            warn!("Rejecting {} records: {}", members.len(), error);
            reject_all(&mut plan, records, &members, &path, error);
            continue;
        }

        match members.iter().find_map(|&i| non_blank(&records[i].attachment_file)) {
            Some(url) => plan.items.push(Item {
                identity_key: first_key.to_string(),
                resource_url: url.to_string(),
                destination_path: path,
            }),
            None => {
                let error = ItemError::MissingResourceUrl(first_key.to_string());
                warn!("Skipping {}: {}", path.display(), error);
                reject_all(&mut plan, records, &members, &path, error);
            }
        }
    }

    plan
}

fn reject_all(
    plan: &mut ItemPlan,
    records: &[FilingRecord],
    members: &[usize],
    path: &Path,
    error: ItemError,
) {
    for &index in members {
        plan.rejected.push(Rejection {
            record_index: index,
            identity_key: identity_key(&records[index]).map(str::to_string),
            destination: Some(path.to_path_buf()),
            error: error.clone(),
        });
    }
}

fn identity_key(record: &FilingRecord) -> Option<&str> {
    non_blank(&record.symbol)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
