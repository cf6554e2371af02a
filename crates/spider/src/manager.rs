//! Interaction controller for spider layouts.
//!
//! [`SpiderClusterManager`] owns the single [`SpiderState`] and reacts to the
//! events the host dispatches: clicks on clusters, spider members and plain
//! points, hover over members, camera moves, and answers to its own
//! asynchronous requests. Answers that arrive after the context they were
//! issued for has changed are dropped.

use foundation::ids::SourceId;
use runtime::event_bus::{Event, EventBus};
use runtime::pending::{PendingRequests, RequestId};
use tracing::{debug, trace};

use crate::bridge::to_positions;
use crate::error::SpiderError;
use crate::events::{MapEvent, MouseEvent, Propagation, SpiderEvent, Subscription};
use crate::feature::{
    Cluster, ClusterId, Feature, FeatureId, HitTarget, STICK_ID_KEY, SpiderMember, Stick, classify,
};
use crate::host::{
    Animation, CameraOptions, ClusterSource, Cursor, LayerKind, LayerRef, LayerSpec, MapHost,
    SourceKind, SpiderLayers,
};
use crate::layout::{LayoutParams, compute_layout};
use crate::options::{OptionField, OptionsPatch, SpiderOptions};
use crate::state::SpiderState;

/// Camera animation used when a cluster can still be broken apart by zooming.
pub const DRILL_DOWN_DURATION_MS: u32 = 200;

#[derive(Debug, Clone)]
enum PendingFetch {
    Leaves(ClusterId),
    ExpansionZoom(Cluster),
}

/// Expands clusters into spider layouts on a host map.
///
/// A manager is single-use: [`SpiderClusterManager::dispose`] consumes it and
/// hands back the host and the cluster source.
pub struct SpiderClusterManager<H: MapHost, S: ClusterSource> {
    host: H,
    source: S,
    options: SpiderOptions,
    layers: SpiderLayers,
    spider_source: SourceId,
    subscriptions: Vec<Subscription>,
    state: SpiderState,
    /// Cluster context reported with `FeatureSelected`; survives `hide`.
    selected_cluster: Option<Cluster>,
    requests: PendingRequests<PendingFetch>,
    zoom_request: Option<RequestId>,
    events: EventBus<SpiderEvent>,
}

impl<H: MapHost, S: ClusterSource> SpiderClusterManager<H, S> {
    /// Wires a manager onto `host`.
    ///
    /// Fails before touching the host when the cluster layer's source cannot list
    /// cluster leaves.
    pub fn new(
        mut host: H,
        source: S,
        cluster_layer: LayerRef,
        unclustered_layer: LayerRef,
        options: OptionsPatch,
    ) -> Result<Self, SpiderError> {
        match host.source_kind(cluster_layer.source) {
            Some(SourceKind::GeoJson) => {}
            Some(kind) => {
                return Err(SpiderError::UnsupportedSource {
                    layer: cluster_layer.id,
                    kind,
                });
            }
            None => {
                return Err(SpiderError::UnknownSource {
                    layer: cluster_layer.id,
                    source: cluster_layer.source,
                });
            }
        }

        let defaults = SpiderOptions::default();
        let spider_source = host.add_source();

        let line_id = host.add_layer(LayerSpec::Sticks {
            source: spider_source,
            style: defaults.stick_style.clone(),
        });
        let point_kind = match unclustered_layer.kind {
            LayerKind::Bubble => LayerKind::Bubble,
            LayerKind::Symbol | LayerKind::Line => LayerKind::Symbol,
        };
        let point_id = host.add_layer(LayerSpec::SpiderPoints {
            source: spider_source,
            kind: point_kind,
            style_from: unclustered_layer.id,
            allow_overlap: point_kind == LayerKind::Symbol,
        });

        let layers = SpiderLayers {
            cluster_layer,
            unclustered_layer,
            spider_feature_layer: LayerRef {
                id: point_id,
                source: spider_source,
                kind: point_kind,
            },
            spider_line_layer: LayerRef {
                id: line_id,
                source: spider_source,
                kind: LayerKind::Line,
            },
        };

        let subscriptions = vec![
            Subscription::Click,
            Subscription::MoveStart,
            Subscription::HoverLeave(point_id),
            Subscription::HoverMove(point_id),
            Subscription::LayerClick(cluster_layer.id),
            Subscription::LayerClick(point_id),
            Subscription::LayerClick(unclustered_layer.id),
        ];
        for sub in &subscriptions {
            host.subscribe(*sub);
        }

        let mut manager = Self {
            host,
            source,
            options: defaults,
            layers,
            spider_source,
            subscriptions,
            state: SpiderState::new(),
            selected_cluster: None,
            requests: PendingRequests::new(),
            zoom_request: None,
            events: EventBus::new(),
        };
        manager.set_options(options);
        Ok(manager)
    }

    /// Collapses the layout, detaches every subscription and removes the spider layers.
    pub fn dispose(mut self) -> (H, S) {
        self.hide_spider_cluster();

        for sub in self.subscriptions.drain(..) {
            self.host.unsubscribe(sub);
        }

        self.host.remove_layer(self.layers.spider_feature_layer.id);
        self.host.remove_layer(self.layers.spider_line_layer.id);
        self.host.clear_source(self.spider_source);
        self.host.remove_source(self.spider_source);
        self.requests.clear();

        debug!("spider cluster manager disposed");
        (self.host, self.source)
    }

    /// An independent copy of the current options.
    pub fn options(&self) -> SpiderOptions {
        self.options.clone()
    }

    /// Merges `patch` into the options. Any open layout is closed first.
    pub fn set_options(&mut self, patch: OptionsPatch) {
        self.hide_spider_cluster();

        for field in self.options.apply(patch) {
            match field {
                OptionField::StickStyle => {
                    let line = self.layers.spider_line_layer.id;
                    self.host.set_line_style(line, &self.options.stick_style);
                }
                OptionField::Visible => {
                    let visible = self.options.visible;
                    self.host
                        .set_layer_visible(self.layers.spider_line_layer.id, visible);
                    self.host
                        .set_layer_visible(self.layers.spider_feature_layer.id, visible);
                }
                _ => {}
            }
        }
    }

    pub fn layers(&self) -> SpiderLayers {
        self.layers
    }

    pub fn state(&self) -> &SpiderState {
        &self.state
    }

    pub fn selected_cluster(&self) -> Option<&Cluster> {
        self.selected_cluster.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Notifications emitted so far and not yet drained.
    pub fn events(&self) -> &[Event<SpiderEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<SpiderEvent>> {
        self.events.drain()
    }

    /// Collapses any open or loading layout. Harmless when nothing is open.
    pub fn hide_spider_cluster(&mut self) {
        if let Some(stick_id) = self.state.take_hovered() {
            self.host
                .set_feature_hover(self.spider_source, &FeatureId::Text(stick_id), false);
        }
        let had_features = !self.state.members().is_empty();
        if self.state.clear() {
            debug!("spider layout collapsed");
        }
        if had_features {
            self.host.clear_source(self.spider_source);
        }
    }

    /// Expands `cluster` in place.
    ///
    /// Re-showing the cluster that is already open (or loading) does nothing.
    pub fn show_spider_cluster(&mut self, cluster: &Cluster) {
        if self.state.is_showing(cluster.id) {
            trace!(cluster = %cluster.id, "cluster already expanded");
            return;
        }

        self.hide_spider_cluster();

        let request = self.requests.issue(PendingFetch::Leaves(cluster.id));
        self.state.begin_loading(cluster.clone(), request);
        self.source.request_cluster_leaves(
            request,
            cluster.id,
            self.options.max_features_in_web,
            0,
        );
        debug!(cluster = %cluster.id, request = request.0, "requested cluster leaves");
    }

    /// Routes one host event through the state machine.
    pub fn handle_event(&mut self, event: MapEvent) -> Propagation {
        match event {
            MapEvent::Click(event) => {
                self.collapse_on_map_event(event.first().and_then(|h| h.source));
                Propagation::Continue
            }
            MapEvent::MoveStart => {
                self.collapse_on_map_event(None);
                Propagation::Continue
            }
            MapEvent::LayerClick { layer, event } => {
                let l = &self.layers;
                if layer != l.cluster_layer.id
                    && layer != l.unclustered_layer.id
                    && layer != l.spider_feature_layer.id
                {
                    return Propagation::Continue;
                }
                self.on_layer_click(&event)
            }
            MapEvent::HoverMove { layer, event } => {
                if layer == self.layers.spider_feature_layer.id {
                    self.highlight_stick(&event);
                }
                Propagation::Continue
            }
            MapEvent::HoverLeave { layer } => {
                if layer == self.layers.spider_feature_layer.id {
                    self.unhighlight_stick();
                }
                Propagation::Continue
            }
            MapEvent::LeavesLoaded { request, leaves } => {
                self.on_leaves_loaded(request, leaves);
                Propagation::Continue
            }
            MapEvent::ExpansionZoom { request, zoom } => {
                self.on_expansion_zoom(request, zoom);
                Propagation::Continue
            }
        }
    }

    /// With `close_web_on_point_click` off, only a hit on some other source collapses;
    /// pans and clicks on empty map leave the web open.
    fn collapse_on_map_event(&mut self, hit_source: Option<SourceId>) {
        let foreign_hit = hit_source.is_some_and(|s| s != self.spider_source);
        if self.options.close_web_on_point_click || foreign_hit {
            self.hide_spider_cluster();
        }
    }

    fn on_layer_click(&mut self, event: &MouseEvent) -> Propagation {
        let Some(hit) = event.first() else {
            return Propagation::Continue;
        };

        match classify(&hit.feature) {
            HitTarget::Cluster(cluster) => {
                self.events.emit(SpiderEvent::FeatureUnselected);

                let request = self
                    .requests
                    .issue(PendingFetch::ExpansionZoom(cluster.clone()));
                self.zoom_request = Some(request);
                self.source.request_expansion_zoom(request, cluster.id);
                self.selected_cluster = Some(cluster);
            }
            HitTarget::SpiderMember { parent_id } => {
                match self.source.shape_by_id(&parent_id) {
                    Some(shape) => self.select(shape),
                    None => debug!(parent = %parent_id, "spider member parent not found"),
                }
                if self.options.close_web_on_point_click {
                    self.hide_spider_cluster();
                }
            }
            HitTarget::Plain => {
                self.selected_cluster = None;
                self.zoom_request = None;
                self.select(hit.feature.clone());
                if self.options.close_web_on_point_click {
                    self.hide_spider_cluster();
                }
            }
        }

        Propagation::PreventDefault
    }

    fn select(&mut self, shape: Feature) {
        self.events.emit(SpiderEvent::FeatureSelected {
            cluster: self.selected_cluster.clone(),
            shape,
        });
    }

    fn on_expansion_zoom(&mut self, request: RequestId, zoom: f64) {
        let Some(PendingFetch::ExpansionZoom(cluster)) = self.requests.resolve(request) else {
            trace!(request = request.0, "unexpected expansion zoom answer");
            return;
        };
        let still_selected = self.selected_cluster.as_ref().map(|c| c.id) == Some(cluster.id);
        if self.zoom_request != Some(request) || !still_selected {
            trace!(cluster = %cluster.id, "discarding stale expansion zoom");
            return;
        }
        self.zoom_request = None;

        let camera = self.host.camera();
        if zoom <= camera.max_zoom {
            debug!(cluster = %cluster.id, zoom, "zooming into cluster");
            self.host.set_camera(CameraOptions {
                center: cluster.position,
                zoom,
                animation: Animation::Ease,
                duration_ms: DRILL_DOWN_DURATION_MS,
            });
        } else {
            self.show_spider_cluster(&cluster);
        }
    }

    fn on_leaves_loaded(&mut self, request: RequestId, mut leaves: Vec<Feature>) {
        let fetched_for = match self.requests.resolve(request) {
            Some(PendingFetch::Leaves(id)) => Some(id),
            _ => None,
        };
        let Some(cluster) = self.state.loading_cluster(request).cloned() else {
            trace!(request = request.0, cluster = ?fetched_for, "discarding stale cluster leaves");
            return;
        };

        if leaves.is_empty() {
            debug!(cluster = %cluster.id, "cluster has no leaves");
            self.state.clear();
            return;
        }
        leaves.truncate(self.options.max_features_in_web);

        // One projection frame for the whole layout.
        let center = self.host.to_pixel(cluster.position);
        let layout = compute_layout(center, leaves.len(), &LayoutParams::from(&self.options));

        let positions = to_positions(&self.host, layout.positions());

        let mut members = Vec::with_capacity(leaves.len());
        let mut sticks = Vec::with_capacity(leaves.len());
        for (i, (leaf, position)) in leaves.iter().zip(positions).enumerate() {
            let member = SpiderMember::from_leaf(i, leaf, cluster.id, position);
            sticks.push(Stick {
                id: member.stick_id.clone(),
                from: cluster.position,
                to: position,
            });
            members.push(member);
        }

        let features = sticks
            .iter()
            .map(Stick::to_feature)
            .chain(members.iter().map(SpiderMember::to_feature))
            .collect();
        self.host.set_source_features(self.spider_source, features);

        debug!(
            cluster = %cluster.id,
            members = members.len(),
            mode = ?layout.mode,
            "spider layout opened"
        );
        self.selected_cluster = Some(cluster.clone());
        self.state.open(cluster, members, sticks);
    }

    fn highlight_stick(&mut self, event: &MouseEvent) {
        if !self.state.is_open() {
            return;
        }
        let Some(stick_id) = event
            .first()
            .and_then(|h| h.feature.property_str(STICK_ID_KEY))
        else {
            return;
        };
        if self.state.hovered_stick() == Some(stick_id) {
            return;
        }

        let stick_id = stick_id.to_string();
        if let Some(old) = self.state.set_hovered(stick_id.clone()) {
            self.host
                .set_feature_hover(self.spider_source, &FeatureId::Text(old), false);
        }
        self.host
            .set_feature_hover(self.spider_source, &FeatureId::Text(stick_id), true);
        self.host.set_cursor(Cursor::Pointer);
    }

    fn unhighlight_stick(&mut self) {
        if let Some(old) = self.state.take_hovered() {
            self.host
                .set_feature_hover(self.spider_source, &FeatureId::Text(old), false);
            self.host.set_cursor(Cursor::Grab);
        }
    }
}
