//! Converges a named, ordered collection in a guild (the roles below the bot, or the channels of a
//! category) towards a list a moderator typed into a message.
//!
//! Planning is pure: the planners take a snapshot of the guild and return the operations needed.
//! Those operations are then handed to [`apply_operations`] which issues them one at a time.
//! Nothing here ever deletes an entity.

mod apply;
pub mod discord;

pub use apply::{apply_operations, EntityStore, Outcome, Report};

use serenity::all::UserId;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// One line of a moderator's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredEntry {
    pub name: String,
    /// Member tokens, only used when assigning roles.  Either a mention or a user name.
    pub members: Vec<String>,
}

impl DesiredEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }
}

/// A role or channel that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEntity<Id> {
    pub id: Id,
    pub name: String,
    pub position: usize,
    /// Current holders.  Always empty for channels.
    pub members: HashSet<UserId>,
}

/// A single mutation against the guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<Id> {
    /// `position` is `None` when the caller does not care where the new entity lands.
    Create {
        name: String,
        position: Option<usize>,
    },
    Move {
        id: Id,
        name: String,
        position: usize,
    },
    Rename {
        id: Id,
        from: String,
        to: String,
    },
    AddMember {
        id: Id,
        role: String,
        member: UserId,
    },
    RemoveMember {
        id: Id,
        role: String,
        member: UserId,
    },
}

impl<Id> std::fmt::Display for Operation<Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Operation::Create {
                name,
                position: Some(position),
            } => write!(f, "create `{}` at position {}", name, position),
            Operation::Create {
                name,
                position: None,
            } => write!(f, "create `{}`", name),
            Operation::Move { name, position, .. } => {
                write!(f, "move `{}` to position {}", name, position)
            }
            Operation::Rename { from, to, .. } => write!(f, "rename `{}` to `{}`", from, to),
            Operation::AddMember { role, member, .. } => {
                write!(f, "give `{}` to <@{}>", role, member)
            }
            Operation::RemoveMember { role, member, .. } => {
                write!(f, "take `{}` from <@{}>", role, member)
            }
        }
    }
}

/// Plan the moves and creations that put `live` into the order of `desired`.
///
/// Operations come out in desired order, which is also the order they must be applied in: the
/// guild only supports "set absolute position", so a later operation may shift an earlier entity
/// and only serial application in index order converges.  A name listed twice ends up at the
/// position of its last occurrence.
pub fn plan_order<Id: Copy>(
    desired: &[DesiredEntry],
    live: &[LiveEntity<Id>],
) -> Vec<Operation<Id>> {
    let by_name: HashMap<&str, &LiveEntity<Id>> =
        live.iter().map(|e| (e.name.as_str(), e)).collect();

    desired
        .iter()
        .enumerate()
        .map(|(position, entry)| match by_name.get(entry.name.as_str()) {
            Some(entity) => Operation::Move {
                id: entity.id,
                name: entity.name.clone(),
                position,
            },
            None => Operation::Create {
                name: entry.name.clone(),
                position: Some(position),
            },
        })
        .collect()
}

/// Membership changes for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub to_add: BTreeSet<UserId>,
    pub to_remove: BTreeSet<UserId>,
    /// Tokens that named nobody in the guild.
    pub unresolved: Vec<String>,
}

impl MembershipPlan {
    /// Removals first, then additions.
    pub fn operations<Id: Copy>(&self, id: Id, role: &str) -> Vec<Operation<Id>> {
        let removes = self.to_remove.iter().map(|&member| Operation::RemoveMember {
            id,
            role: role.to_owned(),
            member,
        });
        let adds = self.to_add.iter().map(|&member| Operation::AddMember {
            id,
            role: role.to_owned(),
            member,
        });
        removes.chain(adds).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Diff the members listed in `entry` against the current holders of `role`.
///
/// `directory` maps user names to ids.  Mentions bypass it.
pub fn plan_membership<Id>(
    entry: &DesiredEntry,
    role: &LiveEntity<Id>,
    directory: &HashMap<String, UserId>,
) -> MembershipPlan {
    let mut wanted = BTreeSet::new();
    let mut unresolved = Vec::new();

    for token in &entry.members {
        let resolved = crate::parse::user_mention(token).or_else(|| directory.get(token).copied());
        match resolved {
            Some(id) => {
                wanted.insert(id);
            }
            None => unresolved.push(token.clone()),
        }
    }

    MembershipPlan {
        to_add: wanted
            .iter()
            .filter(|id| !role.members.contains(id))
            .copied()
            .collect(),
        to_remove: role
            .members
            .iter()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect(),
        unresolved,
    }
}

/// Plan renames for every entity whose trimmed name equals an `old` name.
pub fn plan_renames<Id: Copy>(
    pairs: &[(String, String)],
    live: &[LiveEntity<Id>],
) -> Vec<Operation<Id>> {
    let mut ops = Vec::new();
    for (old, new) in pairs {
        for entity in live.iter().filter(|e| e.name.trim() == old) {
            ops.push(Operation::Rename {
                id: entity.id,
                from: entity.name.clone(),
                to: new.clone(),
            });
        }
    }
    ops
}

/// Something that did not end up where the list said it should.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Missing(String),
    /// `name` sits at or below `after`, although the list puts it above.
    OutOfOrder { name: String, after: String },
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Mismatch::Missing(name) => write!(f, "`{}` does not exist", name),
            Mismatch::OutOfOrder { name, after } => {
                write!(f, "`{}` is not placed after `{}`", name, after)
            }
        }
    }
}

/// Re-check a freshly fetched snapshot against the list.
///
/// Only the relative order of the listed entities is checked, since unlisted entities are allowed
/// to sit between them.
pub fn verify_order<Id: Eq + Hash + Copy>(
    desired: &[DesiredEntry],
    live: &[LiveEntity<Id>],
) -> Vec<Mismatch> {
    let by_name: HashMap<&str, &LiveEntity<Id>> =
        live.iter().map(|e| (e.name.as_str(), e)).collect();

    // Later duplicates win, so only keep each name at its last index.
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (i, entry) in desired.iter().enumerate() {
        last_index.insert(entry.name.as_str(), i);
    }

    let mut mismatches = Vec::new();
    let mut previous: Option<&LiveEntity<Id>> = None;
    for (i, entry) in desired.iter().enumerate() {
        if last_index.get(entry.name.as_str()) != Some(&i) {
            continue;
        }
        let Some(entity) = by_name.get(entry.name.as_str()) else {
            mismatches.push(Mismatch::Missing(entry.name.clone()));
            continue;
        };
        if let Some(prev) = previous {
            if entity.position <= prev.position {
                mismatches.push(Mismatch::OutOfOrder {
                    name: entity.name.clone(),
                    after: prev.name.clone(),
                });
            }
        }
        previous = Some(entity);
    }
    mismatches
}
