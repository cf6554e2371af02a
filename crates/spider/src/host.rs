//! Capabilities the manager needs from the embedding map.
//!
//! The host owns the camera, the rendering surfaces and the event wiring; the
//! cluster source owns the clustered data. Neither is implemented here.

use foundation::ids::{LayerId, SourceId};
use foundation::math::Position;
use runtime::pending::RequestId;

use crate::bridge::Projection;
use crate::events::Subscription;
use crate::feature::{ClusterId, Feature, FeatureId};
use crate::options::StickStyle;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// In-memory GeoJSON data with clustering support.
    GeoJson,
    /// Pre-tiled vector data; leaves cannot be retrieved from it.
    VectorTile,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerKind {
    Bubble,
    Symbol,
    Line,
}

/// A rendering layer and the source feeding it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerRef {
    pub id: LayerId,
    pub source: SourceId,
    pub kind: LayerKind,
}

/// Layers the manager asks the host to create.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    /// Point layer for spider members, styled like `style_from` and limited to point geometry.
    SpiderPoints {
        source: SourceId,
        kind: LayerKind,
        style_from: LayerId,
        /// Draw every symbol even when they collide.
        allow_overlap: bool,
    },
    /// Line layer for sticks.
    Sticks { source: SourceId, style: StickStyle },
}

/// All layers involved in one spider manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpiderLayers {
    pub cluster_layer: LayerRef,
    pub unclustered_layer: LayerRef,
    pub spider_feature_layer: LayerRef,
    pub spider_line_layer: LayerRef,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    pub center: Position,
    pub zoom: f64,
    pub max_zoom: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Animation {
    Jump,
    Ease,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraOptions {
    pub center: Position,
    pub zoom: f64,
    pub animation: Animation,
    pub duration_ms: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    Pointer,
    Grab,
}

/// The map surface: projection, camera, rendering and event wiring.
pub trait MapHost: Projection {
    fn camera(&self) -> CameraState;
    fn set_camera(&mut self, camera: CameraOptions);

    fn source_kind(&self, source: SourceId) -> Option<SourceKind>;
    fn add_source(&mut self) -> SourceId;
    fn remove_source(&mut self, source: SourceId);
    /// Replaces everything in `source`.
    fn set_source_features(&mut self, source: SourceId, features: Vec<Feature>);
    fn clear_source(&mut self, source: SourceId);
    /// Transient per-feature hover state, used for stick highlighting.
    fn set_feature_hover(&mut self, source: SourceId, id: &FeatureId, hovered: bool);

    fn add_layer(&mut self, spec: LayerSpec) -> LayerId;
    fn remove_layer(&mut self, layer: LayerId);
    fn set_layer_visible(&mut self, layer: LayerId, visible: bool);
    fn set_line_style(&mut self, layer: LayerId, style: &StickStyle);

    fn set_cursor(&mut self, cursor: Cursor);

    fn subscribe(&mut self, subscription: Subscription);
    fn unsubscribe(&mut self, subscription: Subscription);
}

/// The clustered data behind the cluster layer.
///
/// Requests are non-blocking: the answer is delivered later through
/// [`crate::events::MapEvent::LeavesLoaded`] or
/// [`crate::events::MapEvent::ExpansionZoom`] carrying the same `request`.
pub trait ClusterSource {
    fn request_cluster_leaves(
        &mut self,
        request: RequestId,
        cluster: ClusterId,
        limit: usize,
        offset: usize,
    );
    fn request_expansion_zoom(&mut self, request: RequestId, cluster: ClusterId);
    fn shape_by_id(&self, id: &FeatureId) -> Option<Feature>;
}
