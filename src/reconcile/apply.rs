use super::Operation;
use crate::{error::StoreError, log_outcome};
use serenity::all::UserId;
use std::collections::HashMap;

/// The guild-side half of reconciliation.  Each call is one remote mutation.
#[serenity::async_trait]
pub trait EntityStore: Send + Sync {
    type Id: Copy + Send + Sync + std::fmt::Debug;

    /// What the store holds, e.g. "role".  Used in logs.
    fn kind(&self) -> &'static str;

    /// Create `name` wherever the guild puts new entities.  Positioning is a separate `move_to`.
    async fn create(&self, name: &str) -> Result<Self::Id, StoreError>;
    async fn move_to(&self, id: Self::Id, position: usize) -> Result<(), StoreError>;
    async fn rename(&self, id: Self::Id, name: &str) -> Result<(), StoreError>;

    async fn add_member(&self, _id: Self::Id, _member: UserId) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("membership"))
    }

    async fn remove_member(&self, _id: Self::Id, _member: UserId) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("membership"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<Id> {
    Applied,
    Created(Id),
    Failed(StoreError),
}

impl<Id> Outcome<Id> {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

/// What happened during a run, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<Id> {
    pub entries: Vec<(Operation<Id>, Outcome<Id>)>,
    /// Things the user should know about that were never attempted.
    pub warnings: Vec<String>,
}

impl<Id> Default for Report<Id> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<Id> Report<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn extend(&mut self, other: Report<Id>) {
        self.entries.extend(other.entries);
        self.warnings.extend(other.warnings);
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|(_, o)| !o.is_success()).count()
    }

    /// One line per attempted operation, then warnings, then totals.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (op, outcome) in &self.entries {
            match outcome {
                Outcome::Failed(err) => out.push_str(&format!("✘ {}: {}\n", op, err)),
                _ => out.push_str(&format!("✔ {}\n", op)),
            }
        }
        for warning in &self.warnings {
            out.push_str(&format!("⚠ {}\n", warning));
        }
        let failures = self.failures();
        out.push_str(&format!(
            "{} of {} change(s) applied",
            self.entries.len() - failures,
            self.entries.len()
        ));
        if failures > 0 {
            out.push_str(&format!(", {} failed", failures));
        }
        out
    }
}

/// Issue `ops` one after another against `store`.
///
/// A failing operation is recorded and the run carries on; nothing is retried.  A positioned
/// `Create` is recorded as the creation followed by the move that places it, so a created entity
/// that cannot be moved still shows up as created.  Creating a name that was already created
/// earlier in the same run only moves that new entity, so a list that repeats a missing name does
/// not produce duplicates.
pub async fn apply_operations<S: EntityStore>(
    ops: Vec<Operation<S::Id>>,
    store: &S,
) -> Report<S::Id> {
    let mut report = Report::new();
    let mut created: HashMap<String, S::Id> = HashMap::new();

    for op in ops {
        let (id, name, position) = match op {
            Operation::Create { name, position } => {
                let id = match created.get(&name).copied() {
                    Some(id) => id,
                    None => {
                        let creation = Operation::Create {
                            name: name.clone(),
                            position: None,
                        };
                        match store.create(&name).await {
                            Ok(id) => {
                                created.insert(name.clone(), id);
                                record(&mut report, store, creation, Outcome::Created(id));
                                id
                            }
                            Err(err) => {
                                record(&mut report, store, creation, Outcome::Failed(err));
                                continue;
                            }
                        }
                    }
                };
                match position {
                    Some(position) => (id, name, position),
                    None => continue,
                }
            }
            Operation::Move { id, name, position } => (id, name, position),
            other => {
                let result = match &other {
                    Operation::Rename { id, to, .. } => store.rename(*id, to).await,
                    Operation::AddMember { id, member, .. } => store.add_member(*id, *member).await,
                    Operation::RemoveMember { id, member, .. } => {
                        store.remove_member(*id, *member).await
                    }
                    Operation::Create { .. } | Operation::Move { .. } => continue,
                };
                record(&mut report, store, other, applied(result));
                continue;
            }
        };

        let result = store.move_to(id, position).await;
        record(
            &mut report,
            store,
            Operation::Move { id, name, position },
            applied(result),
        );
    }

    report
}

fn applied<Id>(result: Result<(), StoreError>) -> Outcome<Id> {
    match result {
        Ok(()) => Outcome::Applied,
        Err(err) => Outcome::Failed(err),
    }
}

fn record<S: EntityStore>(
    report: &mut Report<S::Id>,
    store: &S,
    op: Operation<S::Id>,
    outcome: Outcome<S::Id>,
) {
    match &outcome {
        Outcome::Failed(err) => log_outcome!(false, "{}: {}: {}", store.kind(), op, err),
        _ => log_outcome!(true, "{}: {}", store.kind(), op),
    }
    report.entries.push((op, outcome));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reconcile::{plan_membership, plan_order, verify_order, DesiredEntry, LiveEntity};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Guild stand-in.  Entities are kept in position order and renumbered densely after every
    /// change, so moving one entity shifts the others the way Discord does.
    #[derive(Default)]
    pub struct MemoryStore {
        pub entities: Mutex<Vec<LiveEntity<u64>>>,
        /// Members whose role changes are refused.
        pub protected: HashSet<UserId>,
        /// Refuse every move, as when the bot may create but not reorder.
        pub frozen: bool,
        pub calls: Mutex<usize>,
    }

    fn renumber(entities: &mut [LiveEntity<u64>]) {
        for (position, entity) in entities.iter_mut().enumerate() {
            entity.position = position;
        }
    }

    impl MemoryStore {
        pub fn with(mut entities: Vec<LiveEntity<u64>>) -> Self {
            entities.sort_by_key(|e| e.position);
            renumber(&mut entities);
            Self {
                entities: Mutex::new(entities),
                ..Default::default()
            }
        }

        pub fn snapshot(&self) -> Vec<LiveEntity<u64>> {
            self.entities.lock().unwrap().clone()
        }

        fn with_entity<T>(
            &self,
            id: u64,
            f: impl FnOnce(&mut LiveEntity<u64>) -> T,
        ) -> Result<T, StoreError> {
            *self.calls.lock().unwrap() += 1;
            let mut entities = self.entities.lock().unwrap();
            entities
                .iter_mut()
                .find(|e| e.id == id)
                .map(f)
                .ok_or(StoreError::NotFound(format!("entity {}", id)))
        }
    }

    #[serenity::async_trait]
    impl EntityStore for MemoryStore {
        type Id = u64;

        fn kind(&self) -> &'static str {
            "memory"
        }

        async fn create(&self, name: &str) -> Result<u64, StoreError> {
            *self.calls.lock().unwrap() += 1;
            let mut entities = self.entities.lock().unwrap();
            let id = entities.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            let position = entities.len();
            entities.push(LiveEntity {
                id,
                name: name.to_owned(),
                position,
                members: HashSet::new(),
            });
            Ok(id)
        }

        async fn move_to(&self, id: u64, position: usize) -> Result<(), StoreError> {
            *self.calls.lock().unwrap() += 1;
            if self.frozen {
                return Err(StoreError::PermissionDenied("role hierarchy".into()));
            }
            let mut entities = self.entities.lock().unwrap();
            let from = entities
                .iter()
                .position(|e| e.id == id)
                .ok_or(StoreError::NotFound(format!("entity {}", id)))?;
            let entity = entities.remove(from);
            let to = position.min(entities.len());
            entities.insert(to, entity);
            renumber(&mut entities);
            Ok(())
        }

        async fn rename(&self, id: u64, name: &str) -> Result<(), StoreError> {
            self.with_entity(id, |e| e.name = name.to_owned())
        }

        async fn add_member(&self, id: u64, member: UserId) -> Result<(), StoreError> {
            if self.protected.contains(&member) {
                return Err(StoreError::PermissionDenied("role hierarchy".into()));
            }
            self.with_entity(id, |e| {
                e.members.insert(member);
            })
        }

        async fn remove_member(&self, id: u64, member: UserId) -> Result<(), StoreError> {
            if self.protected.contains(&member) {
                return Err(StoreError::PermissionDenied("role hierarchy".into()));
            }
            self.with_entity(id, |e| {
                e.members.remove(&member);
            })
        }
    }

    fn entity(id: u64, name: &str, position: usize) -> LiveEntity<u64> {
        LiveEntity {
            id,
            name: name.to_owned(),
            position,
            members: HashSet::new(),
        }
    }

    fn desired(names: &[&str]) -> Vec<DesiredEntry> {
        names.iter().map(|n| DesiredEntry::named(*n)).collect()
    }

    fn position_of(live: &[LiveEntity<u64>], name: &str) -> usize {
        live.iter()
            .find(|e| e.name == name)
            .map(|e| e.position)
            .unwrap()
    }

    #[tokio::test]
    async fn moves_shift_their_neighbours() {
        let store = MemoryStore::with(vec![entity(1, "a", 0), entity(2, "b", 1), entity(3, "c", 2)]);

        store.move_to(3, 0).await.unwrap();

        let names: Vec<String> = store.snapshot().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(position_of(&store.snapshot(), "b"), 2);
    }

    #[tokio::test]
    async fn converges_and_replans_to_no_op_moves() {
        let store = MemoryStore::with(vec![
            entity(1, "X", 2),
            entity(2, "Y", 0),
            entity(3, "unlisted", 1),
        ]);
        let list = desired(&["Y", "new", "X"]);

        let report = apply_operations(plan_order(&list, &store.snapshot()), &store).await;
        assert_eq!(report.failures(), 0);

        let live = store.snapshot();
        assert_eq!(position_of(&live, "Y"), 0);
        assert_eq!(position_of(&live, "new"), 1);
        assert_eq!(position_of(&live, "X"), 2);
        assert_eq!(position_of(&live, "unlisted"), 3);

        let again = plan_order(&list, &live);
        assert!(again.iter().all(|op| match op {
            Operation::Move { id, position, .. } =>
                live.iter().find(|e| e.id == *id).unwrap().position == *position,
            _ => false,
        }));
    }

    #[tokio::test]
    async fn applying_out_of_order_misplaces_entities() {
        let store = MemoryStore::with(vec![entity(1, "x", 0), entity(2, "a", 1), entity(3, "b", 2)]);
        let list = desired(&["b", "a"]);
        let mut ops = plan_order(&list, &store.snapshot());
        ops.reverse();

        apply_operations(ops, &store).await;

        let live = store.snapshot();
        assert_eq!(position_of(&live, "b"), 0);
        assert_eq!(position_of(&live, "a"), 2);
    }

    #[tokio::test]
    async fn applying_in_order_places_entities_at_their_index() {
        let store = MemoryStore::with(vec![entity(1, "x", 0), entity(2, "a", 1), entity(3, "b", 2)]);
        let list = desired(&["b", "a"]);

        apply_operations(plan_order(&list, &store.snapshot()), &store).await;

        let live = store.snapshot();
        assert_eq!(position_of(&live, "b"), 0);
        assert_eq!(position_of(&live, "a"), 1);
        assert_eq!(position_of(&live, "x"), 2);
    }

    #[tokio::test]
    async fn last_duplicate_wins() {
        let store = MemoryStore::with(vec![entity(1, "A", 0), entity(2, "B", 5)]);
        let list = desired(&["A", "B", "A"]);

        apply_operations(plan_order(&list, &store.snapshot()), &store).await;

        let live = store.snapshot();
        assert_eq!(position_of(&live, "B"), 0);
        assert_eq!(position_of(&live, "A"), 1);
        assert!(verify_order(&list, &live).is_empty());
    }

    #[tokio::test]
    async fn repeated_missing_name_is_created_once() {
        let store = MemoryStore::default();
        let list = desired(&["A", "B", "A"]);

        let report = apply_operations(plan_order(&list, &store.snapshot()), &store).await;

        let live = store.snapshot();
        assert_eq!(live.len(), 2);
        assert!(position_of(&live, "B") < position_of(&live, "A"));
        let creations = report
            .entries
            .iter()
            .filter(|(op, _)| matches!(op, Operation::Create { .. }))
            .count();
        assert_eq!(creations, 2);
        assert!(matches!(report.entries[0].1, Outcome::Created(_)));
        assert!(matches!(
            report.entries.last(),
            Some((Operation::Move { position: 2, .. }, Outcome::Applied))
        ));
    }

    #[tokio::test]
    async fn created_entity_that_cannot_move_is_still_created() {
        let mut store = MemoryStore::with(vec![entity(1, "X", 0)]);
        store.frozen = true;
        let list = desired(&["New", "X", "New"]);

        let report = apply_operations(plan_order(&list, &store.snapshot()), &store).await;

        let live = store.snapshot();
        assert_eq!(live.iter().filter(|e| e.name == "New").count(), 1);
        assert!(matches!(report.entries[0], (Operation::Create { .. }, Outcome::Created(_))));
        assert!(matches!(
            report.entries[1],
            (Operation::Move { .. }, Outcome::Failed(StoreError::PermissionDenied(_)))
        ));
        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.failures(), 3);
        assert!(report.summary().starts_with("✔ create `New`\n✘ move `New` to position 0"));
    }

    #[tokio::test]
    async fn failed_creation_is_reported_once() {
        struct Refusing;

        #[serenity::async_trait]
        impl EntityStore for Refusing {
            type Id = u64;

            fn kind(&self) -> &'static str {
                "refusing"
            }

            async fn create(&self, _name: &str) -> Result<u64, StoreError> {
                Err(StoreError::PermissionDenied("manage roles".into()))
            }

            async fn move_to(&self, _id: u64, _position: usize) -> Result<(), StoreError> {
                unreachable!("nothing exists to move")
            }

            async fn rename(&self, _id: u64, _name: &str) -> Result<(), StoreError> {
                unreachable!("nothing exists to rename")
            }
        }

        let report = apply_operations(plan_order(&desired(&["a"]), &[]), &Refusing).await;

        assert_eq!(report.entries.len(), 1);
        assert!(matches!(
            report.entries[0].1,
            Outcome::Failed(StoreError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_run() {
        let mut store = MemoryStore::with(vec![entity(1, "Team", 0)]);
        store.protected.insert(UserId::new(2));
        let entry = DesiredEntry {
            name: "Team".into(),
            members: vec!["<@1>".into(), "<@2>".into(), "<@3>".into()],
        };

        let plan = plan_membership(&entry, &store.snapshot()[0], &HashMap::new());
        let report = apply_operations(plan.operations(1, "Team"), &store).await;

        let outcomes: Vec<bool> = report.entries.iter().map(|(_, o)| o.is_success()).collect();
        assert_eq!(outcomes, vec![true, false, true]);
        assert!(matches!(
            report.entries[1].1,
            Outcome::Failed(StoreError::PermissionDenied(_))
        ));
        assert_eq!(*store.calls.lock().unwrap(), 2);
        assert!(report.summary().ends_with("2 of 3 change(s) applied, 1 failed"));
    }

    #[tokio::test]
    async fn membership_converges() {
        let mut team = entity(1, "Team", 0);
        team.members = [UserId::new(1), UserId::new(4)].into_iter().collect();
        let store = MemoryStore::with(vec![team]);
        let entry = DesiredEntry {
            name: "Team".into(),
            members: vec!["<@1>".into(), "<@2>".into()],
        };

        let plan = plan_membership(&entry, &store.snapshot()[0], &HashMap::new());
        apply_operations(plan.operations(1, "Team"), &store).await;

        let again = plan_membership(&entry, &store.snapshot()[0], &HashMap::new());
        assert!(again.to_add.is_empty());
        assert!(again.to_remove.is_empty());
    }

    #[tokio::test]
    async fn missing_entity_is_reported_not_fatal() {
        let store = MemoryStore::with(vec![entity(1, "a", 0)]);
        let ops = vec![
            Operation::Move {
                id: 7,
                name: "gone".into(),
                position: 0,
            },
            Operation::Rename {
                id: 1,
                from: "a".into(),
                to: "b".into(),
            },
        ];

        let report = apply_operations(ops, &store).await;
        assert!(matches!(
            report.entries[0].1,
            Outcome::Failed(StoreError::NotFound(_))
        ));
        assert_eq!(report.entries[1].1, Outcome::Applied);
        assert_eq!(store.snapshot()[0].name, "b");
    }

    #[test]
    fn summary_lists_warnings() {
        let mut report: Report<u64> = Report::new();
        report.entries.push((
            Operation::Create {
                name: "new".into(),
                position: Some(0),
            },
            Outcome::Created(1),
        ));
        report.warn("`ghost` matched nobody");

        assert_eq!(
            report.summary(),
            "✔ create `new` at position 0\n⚠ `ghost` matched nobody\n1 of 1 change(s) applied"
        );
    }

    fn names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]", 1..8)
    }

    fn live_from(names: &[String]) -> Vec<LiveEntity<u64>> {
        let mut seen = HashSet::new();
        names
            .iter()
            .filter(|n| seen.insert(n.to_string()))
            .enumerate()
            .map(|(i, n)| entity(i as u64 + 1, n, (i * 7) % 5))
            .collect()
    }

    fn run(list: &[DesiredEntry], store: &MemoryStore) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(apply_operations(plan_order(list, &store.snapshot()), store));
    }

    proptest! {
        #[test]
        fn never_references_unlisted_entities(wanted in names(), existing in names()) {
            let list: Vec<DesiredEntry> = wanted.iter().map(DesiredEntry::named).collect();
            let live = live_from(&existing);
            for op in plan_order(&list, &live) {
                if let Operation::Move { id, .. } = op {
                    let name = &live.iter().find(|e| e.id == id).unwrap().name;
                    prop_assert!(wanted.contains(name));
                }
            }
        }

        #[test]
        fn preserves_order_without_duplicates(existing in names(), extra in names()) {
            let mut seen = HashSet::new();
            let wanted: Vec<String> = extra
                .iter()
                .chain(existing.iter())
                .filter(|n| seen.insert(n.to_string()))
                .cloned()
                .collect();
            let list: Vec<DesiredEntry> = wanted.iter().map(DesiredEntry::named).collect();
            let store = MemoryStore::with(live_from(&existing));

            run(&list, &store);

            let live = store.snapshot();
            for (i, name) in wanted.iter().enumerate() {
                prop_assert_eq!(position_of(&live, name), i);
            }
            let only_moves = plan_order(&list, &live)
                .iter()
                .all(|op| matches!(op, Operation::Move { .. }));
            prop_assert!(only_moves);
            prop_assert!(verify_order(&list, &live).is_empty());
        }

        #[test]
        fn last_occurrences_end_up_in_order(wanted in names(), existing in names()) {
            let list: Vec<DesiredEntry> = wanted.iter().map(DesiredEntry::named).collect();
            let store = MemoryStore::with(live_from(&existing));

            run(&list, &store);

            let live = store.snapshot();
            let distinct: HashSet<&String> = wanted.iter().collect();
            prop_assert_eq!(
                live.iter().filter(|e| distinct.contains(&e.name)).count(),
                distinct.len()
            );
            let mismatches = verify_order(&list, &live);
            prop_assert!(mismatches.is_empty(), "{:?}", mismatches);
        }
    }
}
