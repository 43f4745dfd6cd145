//! Frame-by-frame track update.

use std::sync::Arc;

use tracing::{debug, trace};

use super::session::DisplaySession;
use super::RenderFactory;
use crate::lod::{display_layers, DisplayLayer, LodConfig};
use crate::payload::{PayloadFetcher, SampleReading};
use crate::registry::SharedTileLoader;
use crate::tile::{TileKey, TileRef, TileState};
use crate::usage_cache::UsageCache;
use crate::viewport::{Viewport, VisibleRange};

/// What a tile node currently draws.
#[derive(Debug)]
pub enum NodeContent<O> {
    /// The tile is still loading.
    Placeholder,
    /// Render object built from the complete payload.
    Ready(O),
    /// The tile failed; nothing is drawn.
    Blank,
}

/// Position of a node within the track, in fractions of the visible range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub relative_x: f64,
    pub relative_w: f64,
    pub opacity: f64,
    /// Index of the display layer the node belongs to, finest first.
    pub z: usize,
}

impl Placement {
    fn for_tile<P>(tile: &TileRef<P>, range: &VisibleRange, layer: &DisplayLayer, z: usize) -> Self {
        Self {
            relative_x: range.relative(tile.start() as f64),
            relative_w: tile.span() as f64 / range.span(),
            opacity: layer.opacity,
            z,
        }
    }

    /// True if `relative_x` falls within the node.
    pub fn contains(&self, relative_x: f64) -> bool {
        relative_x >= self.relative_x && relative_x < self.relative_x + self.relative_w
    }
}

/// Cached display node for one tile.
pub struct TileNode<P, O> {
    tile: TileRef<P>,
    content: NodeContent<O>,
    placement: Placement,
}

impl<P, O> TileNode<P, O> {
    fn new(tile: TileRef<P>) -> Self {
        Self {
            tile,
            content: NodeContent::Placeholder,
            placement: Placement {
                relative_x: 0.0,
                relative_w: 0.0,
                opacity: 0.0,
                z: 0,
            },
        }
    }

    pub fn tile(&self) -> &TileRef<P> {
        &self.tile
    }

    pub fn content(&self) -> &NodeContent<O> {
        &self.content
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, NodeContent::Placeholder)
    }

    /// Follows the tile's state: placeholders become render objects once the
    /// tile completes, or blank nodes if it failed.
    fn refresh<R>(&mut self, tile: &TileRef<P>, factory: &mut R)
    where
        R: RenderFactory<P, Object = O>,
    {
        if !Arc::ptr_eq(&self.tile, tile) {
            // the loader evicted and recreated this key
            self.release(factory);
            self.tile = Arc::clone(tile);
        }

        if !self.is_placeholder() {
            return;
        }
        match tile.state() {
            TileState::Complete => {
                if let Some(payload) = tile.payload() {
                    self.content = NodeContent::Ready(factory.create(tile, &payload));
                }
            }
            TileState::Error => self.content = NodeContent::Blank,
            TileState::Empty | TileState::Loading => {}
        }
    }

    fn release<R>(&mut self, factory: &mut R)
    where
        R: RenderFactory<P, Object = O>,
    {
        if let NodeContent::Ready(object) =
            std::mem::replace(&mut self.content, NodeContent::Placeholder)
        {
            factory.release(object);
        }
    }
}

/// Outcome of one display pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    /// False while dataset metadata is still loading.
    pub ready: bool,
    pub lod: f64,
    pub layers: Vec<DisplayLayer>,
    /// Some displayed tile is still loading.
    pub loading: bool,
    /// Another pass is needed to pick up pending completions.
    pub needs_update: bool,
    /// Render objects disposed by this pass.
    pub disposed: usize,
}

/// Drives one track: loader tiles in, cached render nodes out.
pub struct TrackDriver<F, R>
where
    F: PayloadFetcher,
    R: RenderFactory<F::Payload>,
{
    loader: SharedTileLoader<F>,
    lod: LodConfig,
    factory: R,
    nodes: UsageCache<TileKey, TileNode<F::Payload, R::Object>>,
    max_idle_frames: Option<u64>,
    loading: bool,
    needs_update: bool,
}

impl<F, R> TrackDriver<F, R>
where
    F: PayloadFetcher,
    R: RenderFactory<F::Payload>,
{
    pub fn new(loader: SharedTileLoader<F>, lod: LodConfig, factory: R) -> Self {
        Self {
            loader,
            lod,
            factory,
            nodes: UsageCache::new(),
            max_idle_frames: None,
            loading: false,
            needs_update: true,
        }
    }

    /// Also evicts loader tiles idle for more than `max_idle_frames` after
    /// each pass.
    pub fn with_tile_gc(mut self, max_idle_frames: u64) -> Self {
        self.max_idle_frames = Some(max_idle_frames);
        self
    }

    pub fn loader(&self) -> &SharedTileLoader<F> {
        &self.loader
    }

    pub fn lod_config(&self) -> &LodConfig {
        &self.lod
    }

    pub fn factory(&self) -> &R {
        &self.factory
    }

    /// True if the last pass showed a loading tile or the loading indicator.
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TileNode<F::Payload, R::Object>> {
        self.nodes.iter().map(|(_, node)| node)
    }

    pub fn node(&self, key: &TileKey) -> Option<&TileNode<F::Payload, R::Object>> {
        self.nodes.peek(key)
    }

    /// Runs one display pass for `viewport` at the session's current frame.
    pub fn update_display(&mut self, session: &DisplaySession, viewport: &Viewport) -> DisplayFrame {
        let shared = Arc::clone(&self.loader);
        let mut loader = shared.lock();
        loader.process_completions();

        if !loader.ready() {
            let disposed = self.clear();
            self.loading = true;
            self.needs_update = true;
            trace!("Loader not ready, showing loading indicator");
            return DisplayFrame {
                ready: false,
                lod: 0.0,
                layers: Vec::new(),
                loading: true,
                needs_update: true,
                disposed,
            };
        }

        let lod = self.lod.continuous_lod(viewport);
        let quantizer = loader.config().quantizer;
        let layers = display_layers(lod, &self.lod, &quantizer);
        let range = viewport.range();
        let frame = session.frame();
        let mut loading = false;

        for (z, layer) in layers.iter().enumerate() {
            for tile in loader.get_tiles(layer.level, range) {
                tile.mark_last_used(frame);
                loading |= tile.state() == TileState::Loading;

                let node = self
                    .nodes
                    .get(tile.key(), || TileNode::new(Arc::clone(&tile)));
                node.refresh(&tile, &mut self.factory);
                node.placement = Placement::for_tile(&tile, range, layer, z);
            }
        }

        let factory = &mut self.factory;
        let disposed = self.nodes.sweep(|_, mut node| node.release(&mut *factory));

        if let Some(max_idle) = self.max_idle_frames {
            loader.collect_garbage(frame, max_idle);
        }

        self.loading = loading;
        self.needs_update = loading;
        debug!(
            lod,
            layers = layers.len(),
            nodes = self.nodes.len(),
            disposed,
            loading,
            "Display pass"
        );

        DisplayFrame {
            ready: true,
            lod,
            layers,
            loading,
            needs_update: loading,
            disposed,
        }
    }

    /// Releases every cached node.
    pub fn clear(&mut self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let factory = &mut self.factory;
        self.nodes.remove_all(|_, mut node| node.release(&mut *factory))
    }
}

impl<F, R> TrackDriver<F, R>
where
    F: PayloadFetcher,
    F::Payload: SampleReading,
    R: RenderFactory<F::Payload>,
{
    /// Reading under the session's primary pointer.
    ///
    /// Among complete nodes under the pointer, the finest level wins.
    pub fn pointer_reading(&self, session: &DisplaySession) -> Option<f32> {
        let pointer = session.primary_pointer()?;
        let x = pointer.relative_x;

        let node = self
            .nodes()
            .filter(|node| node.placement.contains(x) && node.tile.is_complete())
            .min_by_key(|node| node.tile.level())?;

        let payload = node.tile.payload()?;
        let fraction = (x - node.placement.relative_x) / node.placement.relative_w;
        payload.reading(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::loader::{LoaderConfig, TileLoader};
    use crate::lod::LevelQuantizer;
    use crate::source::BoxFuture;
    use crate::tile::{Tile, TileRange};
    use crate::track::AxisPointerStyle;
    use parking_lot::Mutex;
    use tokio::runtime::Handle;

    /// Payload: four samples equal to the tile level, tile 2048 fails.
    struct LevelFetcher;

    struct Samples(Vec<f32>);

    impl SampleReading for Samples {
        fn reading(&self, fraction: f64) -> Option<f32> {
            crate::payload::sample_index(fraction, self.0.len()).map(|i| self.0[i])
        }
    }

    impl PayloadFetcher for LevelFetcher {
        type Payload = Samples;

        fn fetch(&self, range: TileRange) -> BoxFuture<'_, Result<Samples, FetchError>> {
            let result = if range.level() == 0 && range.start() == 2048 {
                Err(FetchError::Network("unreachable".into()))
            } else {
                Ok(Samples(vec![f32::from(range.level()); 4]))
            };
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        created: Vec<TileKey>,
        released: Vec<TileKey>,
    }

    impl RenderFactory<Samples> for RecordingFactory {
        type Object = TileKey;

        fn create(&mut self, tile: &Tile<Samples>, _payload: &Arc<Samples>) -> TileKey {
            self.created.push(tile.key());
            tile.key()
        }

        fn release(&mut self, object: TileKey) {
            self.released.push(object);
        }
    }

    fn shared_loader() -> SharedTileLoader<LevelFetcher> {
        let config = LoaderConfig::new(1024, LevelQuantizer::pyramid(6));
        Arc::new(Mutex::new(TileLoader::new(
            config,
            LevelFetcher,
            Handle::current(),
        )))
    }

    async fn settle(loader: &SharedTileLoader<LevelFetcher>) {
        let mut guard = loader.lock();
        guard.wait_until_idle().await;
    }

    fn driver() -> TrackDriver<LevelFetcher, RecordingFactory> {
        TrackDriver::new(shared_loader(), LodConfig::default(), RecordingFactory::default())
    }

    /// One pixel per base: lod 0, a single layer.
    fn viewport(x0: f64, x1: f64) -> Viewport {
        Viewport::new(x0, x1, x1 - x0).unwrap()
    }

    #[tokio::test]
    async fn test_not_ready_shows_loading_and_polls() {
        let mut driver = driver();
        let session = DisplaySession::new();

        let frame = driver.update_display(&session, &viewport(0.0, 1024.0));
        assert!(!frame.ready);
        assert!(frame.loading);
        assert!(frame.needs_update);
        assert_eq!(driver.nodes().count(), 0);
        assert!(driver.loader().lock().is_empty());
    }

    #[tokio::test]
    async fn test_placeholders_upgrade_when_complete() {
        let mut driver = driver();
        let mut session = DisplaySession::new();
        settle(driver.loader()).await;

        session.advance_frame();
        let frame = driver.update_display(&session, &viewport(0.0, 2048.0));
        assert!(frame.ready);
        assert!(frame.loading);
        assert!(frame.needs_update);
        assert_eq!(frame.layers, vec![DisplayLayer { level: 0, opacity: 1.0 }]);
        assert!(driver.nodes().all(|node| node.is_placeholder()));

        settle(driver.loader()).await;
        session.advance_frame();
        let frame = driver.update_display(&session, &viewport(0.0, 2048.0));
        assert!(!frame.loading);
        assert!(!frame.needs_update);
        assert_eq!(driver.factory().created.len(), 2);
        assert!(driver
            .nodes()
            .all(|node| matches!(node.content(), NodeContent::Ready(_))));
    }

    #[tokio::test]
    async fn test_error_tile_is_blank() {
        let mut driver = driver();
        let session = DisplaySession::new();
        settle(driver.loader()).await;

        driver.update_display(&session, &viewport(2048.0, 3000.0));
        settle(driver.loader()).await;
        driver.update_display(&session, &viewport(2048.0, 3000.0));

        let node = driver.node(&TileKey::new(0, 2048)).unwrap();
        assert!(matches!(node.content(), NodeContent::Blank));
        assert!(driver.factory().created.is_empty());
    }

    #[tokio::test]
    async fn test_untouched_nodes_are_disposed_once() {
        let mut driver = driver();
        let mut session = DisplaySession::new();
        settle(driver.loader()).await;

        driver.update_display(&session, &viewport(4096.0, 6144.0));
        settle(driver.loader()).await;
        session.advance_frame();
        driver.update_display(&session, &viewport(4096.0, 6144.0));
        assert_eq!(driver.factory().created.len(), 2);

        session.advance_frame();
        let frame = driver.update_display(&session, &viewport(0.0, 1024.0));
        assert_eq!(frame.disposed, 2);
        let mut released = driver.factory().released.clone();
        released.sort();
        assert_eq!(released, vec![TileKey::new(0, 4096), TileKey::new(0, 5120)]);

        session.advance_frame();
        let frame = driver.update_display(&session, &viewport(0.0, 1024.0));
        assert_eq!(frame.disposed, 0);
        assert_eq!(driver.factory().released.len(), 2);
    }

    #[tokio::test]
    async fn test_placement_is_relative_to_range() {
        let mut driver = driver();
        let session = DisplaySession::new();
        settle(driver.loader()).await;

        driver.update_display(&session, &viewport(512.0, 2560.0));
        let node = driver.node(&TileKey::new(0, 1024)).unwrap();
        assert_eq!(node.placement().relative_x, 0.25);
        assert_eq!(node.placement().relative_w, 0.5);
        assert_eq!(node.placement().opacity, 1.0);
    }

    #[tokio::test]
    async fn test_pointer_reading_prefers_finest_complete_level() {
        let mut driver = driver();
        let mut session = DisplaySession::new();
        settle(driver.loader()).await;

        // lod 1.5: levels 1 and 2 blended
        let coarse = Viewport::new(0.0, 8192.0, 8192.0 / 2f64.powf(1.5)).unwrap();
        driver.update_display(&session, &coarse);
        settle(driver.loader()).await;
        let frame = driver.update_display(&session, &coarse);
        assert_eq!(frame.layers.len(), 2);

        assert_eq!(driver.pointer_reading(&session), None);

        session.set_axis_pointer("cursor", 0.3, AxisPointerStyle::Active);
        assert_eq!(driver.pointer_reading(&session), Some(1.0));

        session.set_axis_pointer("cursor", 1.5, AxisPointerStyle::Active);
        assert_eq!(driver.pointer_reading(&session), None);
    }

    #[tokio::test]
    async fn test_tile_gc_evicts_idle_loader_tiles() {
        let mut driver = driver().with_tile_gc(5);
        let mut session = DisplaySession::new();
        settle(driver.loader()).await;

        driver.update_display(&session, &viewport(0.0, 1024.0));
        settle(driver.loader()).await;
        assert_eq!(driver.loader().lock().len(), 1);

        for _ in 0..10 {
            session.advance_frame();
            driver.update_display(&session, &viewport(8192.0, 9216.0));
            settle(driver.loader()).await;
        }
        let loader = driver.loader().lock();
        assert!(loader.tile(&TileKey::new(0, 0)).is_none());
        assert!(loader.tile(&TileKey::new(0, 8192)).is_some());
    }
}
