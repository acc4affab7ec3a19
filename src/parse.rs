//! Turning message bodies into lists the reconciler understands.

use crate::{error::user_input, reconcile::DesiredEntry};
use anyhow::Result;
use serenity::all::{ChannelId, UserId};

/// One name per line, blank lines skipped.
pub fn ordered_names(text: &str) -> Result<Vec<DesiredEntry>> {
    let entries: Vec<DesiredEntry> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(DesiredEntry::named)
        .collect();

    if entries.is_empty() {
        return user_input("The referenced message does not list any names.");
    }
    Ok(entries)
}

/// `roleName, member, member, ...` per line.
///
/// Rows without at least one member are skipped, as are empty member cells.
pub fn assignment_rows(text: &str) -> Result<Vec<DesiredEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => return user_input(format!("Could not read row {}: {}", line + 1, e)),
        };
        let mut cells = record.iter();
        let Some(name) = cells.next().filter(|name| !name.is_empty()) else {
            continue;
        };
        let members: Vec<String> = cells
            .filter(|cell| !cell.is_empty())
            .map(str::to_owned)
            .collect();
        if members.is_empty() {
            continue;
        }
        entries.push(DesiredEntry {
            name: name.to_owned(),
            members,
        });
    }

    if entries.is_empty() {
        return user_input("The referenced message has no `role, member, ...` rows.");
    }
    Ok(entries)
}

/// `old,new` per line.  Lines without a comma are ignored; only the first comma splits.
pub fn rename_pairs(text: &str) -> Result<Vec<(String, String)>> {
    let pairs: Vec<(String, String)> = text
        .lines()
        .filter_map(|line| line.split_once(','))
        .map(|(old, new)| (old.trim().to_owned(), new.trim().to_owned()))
        .filter(|(old, new)| !old.is_empty() && !new.is_empty())
        .collect();

    if pairs.is_empty() {
        return user_input("The referenced message has no `old,new` lines.");
    }
    Ok(pairs)
}

/// `<@123>` or `<@!123>`.
pub fn user_mention(token: &str) -> Option<UserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    inner.parse::<u64>().ok().filter(|&id| id != 0).map(UserId::new)
}

/// `<#123>` or a bare id.
pub fn channel_ref(token: &str) -> Option<ChannelId> {
    let inner = token
        .strip_prefix("<#")
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token);
    inner.parse::<u64>().ok().filter(|&id| id != 0).map(ChannelId::new)
}

/// The first argument of `input`, quotes honoured, and everything after it exactly as typed
/// apart from the whitespace that separated the two.
pub fn first_arg(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start();
    let mut quoted = false;
    let mut end = input.len();
    for (i, c) in input.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let (first, rest) = input.split_at(end);
    let first = split_args(first).into_iter().next()?;
    Some((first, rest.trim_start()))
}

/// Split command arguments on whitespace, keeping `"double quoted"` runs together.
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}
