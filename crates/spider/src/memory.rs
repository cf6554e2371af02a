//! Headless host and cluster source.
//!
//! [`MemoryMap`] keeps everything a real map would render in plain collections
//! and projects with a Web Mercator [`Viewport`]; [`MemorySource`] answers
//! requests from explicit cluster contents, one at a time, when the driver
//! asks it to. Together they run the manager without a renderer.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use foundation::ids::{LayerId, SourceId};
use foundation::math::{Position, Vec2, Viewport};
use runtime::pending::RequestId;

use crate::bridge::Projection;
use crate::events::{MapEvent, Subscription};
use crate::feature::{ClusterId, Feature, FeatureId};
use crate::host::{
    CameraOptions, CameraState, ClusterSource, Cursor, LayerKind, LayerRef, LayerSpec, MapHost,
    SourceKind,
};
use crate::manager::SpiderClusterManager;
use crate::options::StickStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLayer {
    pub spec: Option<LayerSpec>,
    pub kind: LayerKind,
    pub source: Option<SourceId>,
    pub visible: bool,
    pub line_style: Option<StickStyle>,
}

#[derive(Debug)]
pub struct MemoryMap {
    viewport: Viewport,
    max_zoom: f64,
    next_id: u64,
    sources: BTreeMap<SourceId, (SourceKind, Vec<Feature>)>,
    layers: BTreeMap<LayerId, MemoryLayer>,
    hovered: BTreeSet<(SourceId, FeatureId)>,
    cursor: Cursor,
    subscriptions: Vec<Subscription>,
    camera_moves: Vec<CameraOptions>,
}

impl MemoryMap {
    pub fn new(viewport: Viewport, max_zoom: f64) -> Self {
        Self {
            viewport,
            max_zoom,
            next_id: 1,
            sources: BTreeMap::new(),
            layers: BTreeMap::new(),
            hovered: BTreeSet::new(),
            cursor: Cursor::Grab,
            subscriptions: Vec::new(),
            camera_moves: Vec::new(),
        }
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Registers a caller-owned data source, such as the clustered one.
    pub fn add_data_source(&mut self, kind: SourceKind) -> SourceId {
        let id = SourceId(self.next());
        self.sources.insert(id, (kind, Vec::new()));
        id
    }

    /// Registers a caller-owned layer rendering `source`.
    pub fn add_user_layer(&mut self, source: SourceId, kind: LayerKind) -> LayerRef {
        let id = LayerId(self.next());
        self.layers.insert(
            id,
            MemoryLayer {
                spec: None,
                kind,
                source: Some(source),
                visible: true,
                line_style: None,
            },
        );
        LayerRef { id, source, kind }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn features(&self, source: SourceId) -> &[Feature] {
        self.sources
            .get(&source)
            .map(|(_, f)| f.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_source(&self, source: SourceId) -> bool {
        self.sources.contains_key(&source)
    }

    pub fn layer(&self, layer: LayerId) -> Option<&MemoryLayer> {
        self.layers.get(&layer)
    }

    pub fn is_hovered(&self, source: SourceId, id: &FeatureId) -> bool {
        self.hovered.contains(&(source, id.clone()))
    }

    pub fn hovered_count(&self) -> usize {
        self.hovered.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn camera_moves(&self) -> &[CameraOptions] {
        &self.camera_moves
    }
}

impl Projection for MemoryMap {
    fn to_pixel(&self, position: Position) -> Vec2 {
        self.viewport.to_pixel(position)
    }

    fn to_position(&self, pixel: Vec2) -> Position {
        self.viewport.to_position(pixel)
    }
}

impl MapHost for MemoryMap {
    fn camera(&self) -> CameraState {
        CameraState {
            center: self.viewport.center,
            zoom: self.viewport.zoom,
            max_zoom: self.max_zoom,
        }
    }

    /// Animations complete instantly.
    fn set_camera(&mut self, camera: CameraOptions) {
        self.viewport.center = camera.center;
        self.viewport.zoom = camera.zoom.min(self.max_zoom);
        self.camera_moves.push(camera);
    }

    fn source_kind(&self, source: SourceId) -> Option<SourceKind> {
        self.sources.get(&source).map(|(kind, _)| *kind)
    }

    fn add_source(&mut self) -> SourceId {
        self.add_data_source(SourceKind::GeoJson)
    }

    fn remove_source(&mut self, source: SourceId) {
        self.sources.remove(&source);
        self.hovered.retain(|(s, _)| *s != source);
    }

    fn set_source_features(&mut self, source: SourceId, features: Vec<Feature>) {
        if let Some((_, slot)) = self.sources.get_mut(&source) {
            *slot = features;
        }
    }

    fn clear_source(&mut self, source: SourceId) {
        if let Some((_, slot)) = self.sources.get_mut(&source) {
            slot.clear();
        }
        self.hovered.retain(|(s, _)| *s != source);
    }

    fn set_feature_hover(&mut self, source: SourceId, id: &FeatureId, hovered: bool) {
        if hovered {
            self.hovered.insert((source, id.clone()));
        } else {
            self.hovered.remove(&(source, id.clone()));
        }
    }

    fn add_layer(&mut self, spec: LayerSpec) -> LayerId {
        let id = LayerId(self.next());
        let (kind, source, line_style) = match &spec {
            LayerSpec::SpiderPoints { source, kind, .. } => (*kind, *source, None),
            LayerSpec::Sticks { source, style } => (LayerKind::Line, *source, Some(style.clone())),
        };
        self.layers.insert(
            id,
            MemoryLayer {
                spec: Some(spec),
                kind,
                source: Some(source),
                visible: true,
                line_style,
            },
        );
        id
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.layers.remove(&layer);
    }

    fn set_layer_visible(&mut self, layer: LayerId, visible: bool) {
        if let Some(l) = self.layers.get_mut(&layer) {
            l.visible = visible;
        }
    }

    fn set_line_style(&mut self, layer: LayerId, style: &StickStyle) {
        if let Some(l) = self.layers.get_mut(&layer) {
            l.line_style = Some(style.clone());
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn subscribe(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscriptions.retain(|s| *s != subscription);
    }
}

/// A request received by [`MemorySource`] and not answered yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    Leaves {
        request: RequestId,
        cluster: ClusterId,
        limit: usize,
        offset: usize,
    },
    ExpansionZoom {
        request: RequestId,
        cluster: ClusterId,
    },
}

#[derive(Debug, Clone)]
struct MemoryCluster {
    expansion_zoom: f64,
    leaves: Vec<Feature>,
}

/// Cluster contents given up front; the clustering itself happens elsewhere.
#[derive(Debug, Default)]
pub struct MemorySource {
    clusters: BTreeMap<ClusterId, MemoryCluster>,
    shapes: BTreeMap<FeatureId, Feature>,
    queue: VecDeque<SourceRequest>,
    leaf_requests: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cluster and registers its leaves as shapes (when they have an id).
    pub fn insert_cluster(
        &mut self,
        cluster: ClusterId,
        expansion_zoom: f64,
        leaves: Vec<Feature>,
    ) {
        for leaf in &leaves {
            if let Some(id) = &leaf.id {
                self.shapes.insert(id.clone(), leaf.clone());
            }
        }
        self.clusters.insert(
            cluster,
            MemoryCluster {
                expansion_zoom,
                leaves,
            },
        );
    }

    pub fn insert_shape(&mut self, shape: Feature) {
        if let Some(id) = &shape.id {
            self.shapes.insert(id.clone(), shape);
        }
    }

    pub fn remove_shape(&mut self, id: &FeatureId) -> Option<Feature> {
        self.shapes.remove(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &SourceRequest> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of leaf requests ever received.
    pub fn leaf_request_count(&self) -> usize {
        self.leaf_requests
    }

    /// Answers the oldest pending request.
    pub fn resolve_next(&mut self) -> Option<MapEvent> {
        let req = self.queue.pop_front()?;
        Some(self.answer(req))
    }

    /// Answers every pending request, oldest first.
    pub fn resolve_all(&mut self) -> Vec<MapEvent> {
        let mut out = Vec::with_capacity(self.queue.len());
        while let Some(ev) = self.resolve_next() {
            out.push(ev);
        }
        out
    }

    /// Unknown clusters have no leaves and can never be broken apart by zooming.
    fn answer(&self, req: SourceRequest) -> MapEvent {
        match req {
            SourceRequest::Leaves {
                request,
                cluster,
                limit,
                offset,
            } => {
                let leaves = self
                    .clusters
                    .get(&cluster)
                    .map(|c| c.leaves.iter().skip(offset).take(limit).cloned().collect())
                    .unwrap_or_default();
                MapEvent::LeavesLoaded { request, leaves }
            }
            SourceRequest::ExpansionZoom { request, cluster } => {
                let zoom = self
                    .clusters
                    .get(&cluster)
                    .map(|c| c.expansion_zoom)
                    .unwrap_or(f64::INFINITY);
                MapEvent::ExpansionZoom { request, zoom }
            }
        }
    }
}

impl ClusterSource for MemorySource {
    fn request_cluster_leaves(
        &mut self,
        request: RequestId,
        cluster: ClusterId,
        limit: usize,
        offset: usize,
    ) {
        self.leaf_requests += 1;
        self.queue.push_back(SourceRequest::Leaves {
            request,
            cluster,
            limit,
            offset,
        });
    }

    fn request_expansion_zoom(&mut self, request: RequestId, cluster: ClusterId) {
        self.queue.push_back(SourceRequest::ExpansionZoom { request, cluster });
    }

    fn shape_by_id(&self, id: &FeatureId) -> Option<Feature> {
        self.shapes.get(id).cloned()
    }
}

/// Feeds source answers back into the manager until nothing is pending.
///
/// Answers can trigger new requests (a zoom answer may open a layout), so this
/// loops rather than draining once.
pub fn run_until_idle(manager: &mut SpiderClusterManager<MemoryMap, MemorySource>) {
    while let Some(event) = manager.source_mut().resolve_next() {
        manager.handle_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryMap, MemorySource, SourceRequest};
    use crate::events::MapEvent;
    use crate::feature::{ClusterId, Feature, FeatureId};
    use crate::host::{ClusterSource, LayerKind, MapHost, SourceKind};
    use foundation::math::{Position, Viewport};
    use runtime::pending::RequestId;

    fn leaves(n: u64) -> Vec<Feature> {
        (0..n).map(|i| Feature::point(i, Position::new(0.0, 0.0))).collect()
    }

    #[test]
    fn answers_leaf_requests_with_limit_and_offset() {
        let mut src = MemorySource::new();
        src.insert_cluster(ClusterId(1), 20.0, leaves(10));
        src.request_cluster_leaves(RequestId(1), ClusterId(1), 3, 4);
        assert_eq!(src.pending_len(), 1);

        let Some(MapEvent::LeavesLoaded { request, leaves }) = src.resolve_next() else {
            panic!("expected leaves");
        };
        assert_eq!(request, RequestId(1));
        let ids: Vec<FeatureId> = leaves.into_iter().filter_map(|f| f.id).collect();
        assert_eq!(ids, vec![FeatureId::Number(4), FeatureId::Number(5), FeatureId::Number(6)]);
        assert_eq!(src.leaf_request_count(), 1);
    }

    #[test]
    fn unknown_cluster_cannot_zoom_apart() {
        let mut src = MemorySource::new();
        src.request_expansion_zoom(RequestId(9), ClusterId(77));
        assert_eq!(
            src.pending().copied().collect::<Vec<_>>(),
            vec![SourceRequest::ExpansionZoom {
                request: RequestId(9),
                cluster: ClusterId(77)
            }]
        );
        assert_eq!(
            src.resolve_all(),
            vec![MapEvent::ExpansionZoom {
                request: RequestId(9),
                zoom: f64::INFINITY
            }]
        );
    }

    #[test]
    fn shapes_are_indexed_by_id() {
        let mut src = MemorySource::new();
        src.insert_cluster(ClusterId(1), 20.0, leaves(2));
        assert!(src.shape_by_id(&FeatureId::Number(1)).is_some());
        assert!(src.remove_shape(&FeatureId::Number(1)).is_some());
        assert!(src.shape_by_id(&FeatureId::Number(1)).is_none());
    }

    #[test]
    fn map_camera_is_clamped_to_max_zoom() {
        let vp = Viewport::new(Position::new(0.0, 0.0), 10.0, 800.0, 600.0);
        let mut map = MemoryMap::new(vp, 18.0);
        let src = map.add_data_source(SourceKind::VectorTile);
        let layer = map.add_user_layer(src, LayerKind::Bubble);
        assert_eq!(map.source_kind(layer.source), Some(SourceKind::VectorTile));

        map.set_camera(crate::host::CameraOptions {
            center: Position::new(1.0, 1.0),
            zoom: 25.0,
            animation: crate::host::Animation::Jump,
            duration_ms: 0,
        });
        assert_eq!(map.camera().zoom, 18.0);
        assert_eq!(map.camera_moves().len(), 1);
    }
}
