pub mod action;
pub mod command;
pub mod expression;
pub mod undo;

pub mod errors {
    use thiserror::Error;

    use crate::undo::UndoError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("layer '{0}' is locked")]
        LayerLocked(String),
        #[error(transparent)]
        Undo(#[from] UndoError),
    }
}

pub mod scene {
    use radim_core::document::{Document, Entity, EntityId, Pen};
    use radim_core::geometry::{Bounds2D, Point2, Vector2};
    use tracing::debug;

    use crate::action::collab::{
        DrawingContainer, EntityResolver, EntityShape, ResolvedEntity, UndoLedger,
    };
    use crate::errors::EngineError;
    use crate::undo::{UndoError, UndoStack};

    const DEFAULT_ZOOM: f64 = 1.0;
    const MIN_ZOOM: f64 = 0.01;
    const MAX_ZOOM: f64 = 1_000.0;
    const DEFAULT_PICK_TOLERANCE: f64 = 2.0;

    /// 记录视口状态（中心点与缩放）。
    #[derive(Debug, Clone, Copy)]
    pub struct ViewportState {
        pub center: Point2,
        pub zoom: f64,
    }

    impl ViewportState {
        #[inline]
        fn clamp_zoom(value: f64) -> f64 {
            value.clamp(MIN_ZOOM, MAX_ZOOM)
        }

        /// 屏幕坐标（相对视口中心、y 轴向上）换算为图面坐标。
        #[inline]
        pub fn to_world(&self, screen: Point2) -> Point2 {
            self.center
                .translate(Vector2::from(screen.as_vec2() / self.zoom))
        }
    }

    impl Default for ViewportState {
        fn default() -> Self {
            Self {
                center: Point2::new(0.0, 0.0),
                zoom: DEFAULT_ZOOM,
            }
        }
    }

    /// 引擎层负责维护 `Document`、撤销栈和运行时状态（视口、当前图层与画笔）。
    #[derive(Debug)]
    pub struct Scene {
        document: Document,
        undo: UndoStack,
        viewport: ViewportState,
        active_layer: String,
        active_pen: Pen,
        pick_tolerance: f64,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct DemoEntities {
        pub baseline: EntityId,
        pub circle: EntityId,
        pub arc: EntityId,
        pub label: EntityId,
    }

    impl Scene {
        pub fn new() -> Self {
            Self {
                document: Document::new(),
                undo: UndoStack::default(),
                viewport: ViewportState::default(),
                active_layer: "0".to_string(),
                active_pen: Pen::default(),
                pick_tolerance: DEFAULT_PICK_TOLERANCE,
            }
        }

        #[inline]
        pub fn document(&self) -> &Document {
            &self.document
        }

        #[inline]
        pub fn document_mut(&mut self) -> &mut Document {
            &mut self.document
        }

        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.document.entity(id)
        }

        /// 获取当前视口状态。
        #[inline]
        pub fn viewport(&self) -> ViewportState {
            self.viewport
        }

        /// 设置视口中心点。
        #[inline]
        pub fn set_viewport_center(&mut self, center: Point2) {
            self.viewport.center = center;
        }

        /// 设置缩放倍数（自动限制在合法范围内）。
        pub fn set_viewport_zoom(&mut self, zoom: f64) {
            let zoom = if zoom.is_finite() { zoom } else { DEFAULT_ZOOM };
            self.viewport.zoom = ViewportState::clamp_zoom(zoom);
        }

        /// 视口居中到整个文档范围，文档为空时保持不变。
        pub fn zoom_extents(&mut self) -> Option<Bounds2D> {
            let bounds = self.document.bounds()?;
            self.viewport.center = bounds.center();
            Some(bounds)
        }

        #[inline]
        pub fn active_layer_name(&self) -> &str {
            &self.active_layer
        }

        pub fn set_active_layer(&mut self, layer: impl Into<String>) {
            let layer = layer.into();
            self.document.ensure_layer(&layer);
            self.active_layer = layer;
        }

        pub fn set_active_pen(&mut self, pen: Pen) {
            self.active_pen = pen;
        }

        /// 拾取容差，单位为屏幕像素。
        pub fn set_pick_tolerance(&mut self, tolerance: f64) {
            if tolerance.is_finite() && tolerance > 0.0 {
                self.pick_tolerance = tolerance;
            }
        }

        /// 返回距离图面点最近且在容差内的实体。
        pub fn entity_at(&self, point: Point2) -> Option<EntityId> {
            let tolerance = self.pick_tolerance / self.viewport.zoom;
            self.document
                .entities()
                .filter(|(_, entity)| {
                    self.document
                        .layer(entity.layer_name())
                        .is_none_or(|layer| layer.is_visible)
                })
                .map(|(id, entity)| (*id, entity.distance_to(point)))
                .filter(|(_, distance)| *distance <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        }

        #[inline]
        pub fn can_undo(&self) -> bool {
            self.undo.can_undo()
        }

        #[inline]
        pub fn can_redo(&self) -> bool {
            self.undo.can_redo()
        }

        /// 撤销最近一个周期，返回移除的实体数量。
        pub fn undo(&mut self) -> Option<usize> {
            self.undo.undo(&mut self.document)
        }

        pub fn redo(&mut self) -> Option<usize> {
            self.undo.redo(&mut self.document)
        }

        /// 为 CLI / 快速验证填充一组示例实体，返回关键实体 ID。
        pub fn populate_demo(&mut self) -> DemoEntities {
            use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

            let baseline =
                self.document
                    .add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), "0");
            let circle = self
                .document
                .add_circle(Point2::new(50.0, 25.0), 12.5, "GEOM");
            let arc = self
                .document
                .add_arc(Point2::new(20.0, 10.0), 7.5, 0.0, FRAC_PI_2, "GEOM");
            let label = self.document.add_text(
                Point2::new(5.0, 40.0),
                "半径标注示例",
                3.5,
                FRAC_PI_4,
                "ANNOT",
            );

            let ids = DemoEntities {
                baseline,
                circle,
                arc,
                label,
            };

            debug!(
                baseline = ids.baseline.get(),
                circle = ids.circle.get(),
                arc = ids.arc.get(),
                label = ids.label.get(),
                "已创建演示实体"
            );

            ids
        }
    }

    impl Default for Scene {
        fn default() -> Self {
            Self::new()
        }
    }

    impl EntityResolver for Scene {
        fn resolve(&self, screen: Point2) -> Option<ResolvedEntity> {
            let point = self.viewport.to_world(screen);
            let id = self.entity_at(point)?;
            let entity = self.document.entity(id)?;
            Some(ResolvedEntity {
                id,
                shape: EntityShape::of(entity),
            })
        }
    }

    impl DrawingContainer for Scene {
        fn active_layer(&self) -> String {
            self.active_layer.clone()
        }

        fn active_pen(&self) -> Pen {
            self.active_pen.clone()
        }

        fn add_entity(&mut self, entity: Entity) -> Result<EntityId, EngineError> {
            let layer = entity.layer_name();
            if self
                .document
                .layer(layer)
                .is_some_and(|layer| layer.is_locked)
            {
                return Err(EngineError::LayerLocked(layer.to_string()));
            }
            Ok(self.document.add_entity(entity))
        }

        fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
            self.document.remove_entity(id)
        }
    }

    impl UndoLedger for Scene {
        fn begin_cycle(&mut self) -> Result<(), UndoError> {
            self.undo.begin_cycle()
        }

        fn record_add(&mut self, id: EntityId) -> Result<(), UndoError> {
            self.undo.record_add(id)
        }

        fn end_cycle(&mut self) -> Result<(), UndoError> {
            self.undo.end_cycle()
        }

        fn abort_cycle(&mut self) {
            self.undo.abort_cycle();
        }
    }

}
