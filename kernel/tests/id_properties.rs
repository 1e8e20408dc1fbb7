//! Property tests for id assignment.

use proptest::prelude::*;
use transcripts_kernel::{StudentId, TranscriptStore};

#[derive(Debug, Clone)]
enum Op {
    Add,
    /// Delete the live student at this index (modulo the live count).
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Add),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn ids_strictly_increase_and_are_never_reused(ops in prop::collection::vec(op(), 1..64)) {
        let mut store = TranscriptStore::new();
        let mut issued: Vec<StudentId> = Vec::new();

        for op in ops {
            match op {
                Op::Add => {
                    let id = store.add_student("Aziza").unwrap();
                    if let Some(last) = issued.last() {
                        prop_assert!(id > *last);
                    }
                    prop_assert!(!issued.contains(&id));
                    issued.push(id);
                }
                Op::Delete(index) => {
                    let live = store.get_student_ids("Aziza");
                    if live.is_empty() {
                        continue;
                    }
                    let id = live[index % live.len()];
                    store.delete_student(id).unwrap();
                    prop_assert!(store.delete_student(id).is_err());
                }
            }
            prop_assert!(store.verify().is_ok());
        }

        let live = store.get_student_ids("Aziza");
        prop_assert!(live.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(live.iter().all(|id| issued.contains(id)));
    }
}
