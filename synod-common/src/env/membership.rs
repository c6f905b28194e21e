use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::utils::ProcessId;

/// Immutable, ordered list of the processes taking part in a run.
///
/// Cloning shares the same snapshot; nobody can change it after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ProcessId>", into = "Vec<ProcessId>")]
pub struct MembershipView {
    peers: Arc<[ProcessId]>,
}

impl MembershipView {
    pub fn new(peers: Vec<ProcessId>) -> Self {
        Self { peers: peers.into() }
    }

    /// View containing every process of a group of `n`.
    pub fn of_size(n: usize) -> Self {
        Self::new(ProcessId::range(n).collect())
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, id: &ProcessId) -> bool {
        self.peers.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessId> {
        self.peers.iter()
    }

    pub fn peers(&self) -> &[ProcessId] {
        &self.peers
    }
}

impl From<Vec<ProcessId>> for MembershipView {
    fn from(peers: Vec<ProcessId>) -> Self {
        Self::new(peers)
    }
}

impl From<MembershipView> for Vec<ProcessId> {
    fn from(view: MembershipView) -> Self {
        view.peers.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_size() {
        let view = MembershipView::of_size(3);
        assert_eq!(view.len(), 3);
        assert!(view.contains(&ProcessId(2)));
        assert!(!view.contains(&ProcessId(3)));
    }

    #[test]
    fn test_clone_shares_snapshot() {
        let view = MembershipView::of_size(5);
        let copy = view.clone();
        assert!(std::ptr::eq(view.peers().as_ptr(), copy.peers().as_ptr()));
    }

    #[test]
    fn test_serializes_as_list() {
        let view = MembershipView::new(vec![ProcessId(1), ProcessId(0)]);
        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json, "[1,0]");
        let back: MembershipView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
