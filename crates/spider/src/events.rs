use foundation::ids::{LayerId, SourceId};
use runtime::pending::RequestId;

use crate::feature::{Cluster, Feature};

/// Event streams the manager listens to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Subscription {
    Click,
    MoveStart,
    LayerClick(LayerId),
    HoverMove(LayerId),
    HoverLeave(LayerId),
}

/// A feature under the pointer, and the source it came from when the host knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub source: Option<SourceId>,
    pub feature: Feature,
}

impl Hit {
    pub fn new(source: Option<SourceId>, feature: Feature) -> Self {
        Self { source, feature }
    }
}

/// Pointer event payload. The first hit is the one that counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseEvent {
    pub hits: Vec<Hit>,
}

impl MouseEvent {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits }
    }

    pub fn first(&self) -> Option<&Hit> {
        self.hits.first()
    }
}

/// Everything the host dispatches into the manager, on one timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Click(MouseEvent),
    MoveStart,
    LayerClick { layer: LayerId, event: MouseEvent },
    HoverMove { layer: LayerId, event: MouseEvent },
    HoverLeave { layer: LayerId },
    LeavesLoaded { request: RequestId, leaves: Vec<Feature> },
    ExpansionZoom { request: RequestId, zoom: f64 },
}

/// Whether the host should go on with its default handling of the event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    PreventDefault,
}

/// Notifications published to the embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum SpiderEvent {
    /// A point was clicked. `cluster` is set when it was picked out of a spider layout.
    FeatureSelected {
        cluster: Option<Cluster>,
        shape: Feature,
    },
    FeatureUnselected,
}
