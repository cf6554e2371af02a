use runtime::pending::RequestId;

use crate::feature::{Cluster, ClusterId, SpiderMember, Stick};

/// Where the single spider layout is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    /// Leaves were requested for `cluster`; only the answer to `request` may open it.
    Loading { cluster: Cluster, request: RequestId },
    Open { cluster: Cluster },
}

/// Single source of truth for the open layout.
///
/// At most one cluster is loading or open at a time, and members and sticks are
/// always replaced together.
#[derive(Debug, Default)]
pub struct SpiderState {
    phase: Phase,
    members: Vec<SpiderMember>,
    sticks: Vec<Stick>,
    hovered_stick: Option<String>,
}

impl SpiderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Open { .. })
    }

    /// The cluster being loaded or shown.
    pub fn current_cluster(&self) -> Option<&Cluster> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Loading { cluster, .. } | Phase::Open { cluster } => Some(cluster),
        }
    }

    pub fn current_cluster_id(&self) -> Option<ClusterId> {
        self.current_cluster().map(|c| c.id)
    }

    /// `true` when `cluster` is already open with members, or already loading.
    pub fn is_showing(&self, cluster: ClusterId) -> bool {
        match &self.phase {
            Phase::Idle => false,
            Phase::Loading { cluster: c, .. } => c.id == cluster,
            Phase::Open { cluster: c } => c.id == cluster && !self.members.is_empty(),
        }
    }

    pub fn begin_loading(&mut self, cluster: Cluster, request: RequestId) {
        self.clear();
        self.phase = Phase::Loading { cluster, request };
    }

    /// The cluster waiting for `request`, if that request is still the live one.
    pub fn loading_cluster(&self, request: RequestId) -> Option<&Cluster> {
        match &self.phase {
            Phase::Loading { cluster, request: r } if *r == request => Some(cluster),
            _ => None,
        }
    }

    /// Replaces the whole layout at once.
    pub fn open(&mut self, cluster: Cluster, members: Vec<SpiderMember>, sticks: Vec<Stick>) {
        debug_assert_eq!(members.len(), sticks.len());
        self.phase = Phase::Open { cluster };
        self.members = members;
        self.sticks = sticks;
        self.hovered_stick = None;
    }

    /// Back to idle. Returns `true` if anything was loading or open.
    pub fn clear(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.phase = Phase::Idle;
        self.members.clear();
        self.sticks.clear();
        self.hovered_stick = None;
        was_active
    }

    pub fn members(&self) -> &[SpiderMember] {
        &self.members
    }

    pub fn sticks(&self) -> &[Stick] {
        &self.sticks
    }

    pub fn hovered_stick(&self) -> Option<&str> {
        self.hovered_stick.as_deref()
    }

    /// Marks `stick_id` as hovered and returns the previously hovered id.
    pub fn set_hovered(&mut self, stick_id: String) -> Option<String> {
        self.hovered_stick.replace(stick_id)
    }

    pub fn take_hovered(&mut self) -> Option<String> {
        self.hovered_stick.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, SpiderState};
    use crate::feature::{Cluster, ClusterId, Feature, SpiderMember, Stick};
    use foundation::math::Position;
    use runtime::pending::RequestId;

    fn cluster(id: u64) -> Cluster {
        Cluster::new(ClusterId(id), Position::new(0.0, 0.0), 2)
    }

    fn pair(i: usize, c: &Cluster) -> (SpiderMember, Stick) {
        let leaf = Feature::point(i as u64, c.position);
        let m = SpiderMember::from_leaf(i, &leaf, c.id, c.position);
        let s = Stick {
            id: m.stick_id.clone(),
            from: c.position,
            to: c.position,
        };
        (m, s)
    }

    fn open(state: &mut SpiderState, c: &Cluster, n: usize) {
        let (members, sticks): (Vec<_>, Vec<_>) = (0..n).map(|i| pair(i, c)).unzip();
        state.open(c.clone(), members, sticks);
    }

    #[test]
    fn starts_idle() {
        let s = SpiderState::new();
        assert!(s.is_idle());
        assert_eq!(s.current_cluster_id(), None);
        assert!(s.members().is_empty());
    }

    #[test]
    fn loading_accepts_only_its_own_request() {
        let mut s = SpiderState::new();
        s.begin_loading(cluster(1), RequestId(4));
        assert!(s.is_showing(ClusterId(1)));
        assert!(!s.is_showing(ClusterId(2)));
        assert_eq!(s.loading_cluster(RequestId(3)), None);
        assert_eq!(s.loading_cluster(RequestId(4)).map(|c| c.id), Some(ClusterId(1)));
    }

    #[test]
    fn open_replaces_members_and_sticks_together() {
        let mut s = SpiderState::new();
        let a = cluster(1);
        open(&mut s, &a, 3);
        assert!(s.is_open());
        assert!(s.is_showing(ClusterId(1)));
        assert_eq!(s.members().len(), 3);
        assert_eq!(s.sticks().len(), 3);
        for (m, st) in s.members().iter().zip(s.sticks()) {
            assert_eq!(m.stick_id, st.id);
        }
    }

    #[test]
    fn open_with_no_members_is_not_showing() {
        let mut s = SpiderState::new();
        open(&mut s, &cluster(1), 0);
        assert!(!s.is_showing(ClusterId(1)));
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = SpiderState::new();
        open(&mut s, &cluster(1), 2);
        assert_eq!(s.set_hovered("1".to_string()), None);
        assert!(s.clear());
        assert_eq!(*s.phase(), Phase::Idle);
        assert!(s.members().is_empty());
        assert!(s.sticks().is_empty());
        assert_eq!(s.hovered_stick(), None);
        assert!(!s.clear());
    }

    #[test]
    fn hover_tracks_previous_id() {
        let mut s = SpiderState::new();
        assert_eq!(s.set_hovered("0".to_string()), None);
        assert_eq!(s.set_hovered("1".to_string()), Some("0".to_string()));
        assert_eq!(s.take_hovered(), Some("1".to_string()));
        assert_eq!(s.take_hovered(), None);
    }
}
