//! 交互动作依赖的外部协作者接口，以及可直接使用的无界面实现。

use std::cell::RefCell;
use std::rc::Rc;

use radim_core::document::{Entity, EntityId, EntityKind, Pen};
use radim_core::geometry::{Bounds2D, Point2, Vector2};
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::scene::ViewportState;
use crate::undo::UndoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// 原始指针事件，坐标为屏幕坐标（相对视口中心，y 轴向上）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub screen: Point2,
}

impl PointerEvent {
    #[inline]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            screen: Point2::new(x, y),
        }
    }
}

/// 拾取结果中的几何形态：圆与圆弧统一暴露圆心和半径。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityShape {
    Arc { center: Point2, radius: f64 },
    Circle { center: Point2, radius: f64 },
    Other,
}

impl EntityShape {
    pub fn of(entity: &Entity) -> Self {
        match entity {
            Entity::Arc(arc) => EntityShape::Arc {
                center: arc.center,
                radius: arc.radius,
            },
            Entity::Circle(circle) => EntityShape::Circle {
                center: circle.center,
                radius: circle.radius,
            },
            _ => EntityShape::Other,
        }
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityShape::Arc { .. } => EntityKind::Arc,
            EntityShape::Circle { .. } => EntityKind::Circle,
            EntityShape::Other => EntityKind::Other,
        }
    }

    #[inline]
    pub fn center(&self) -> Option<Point2> {
        match self {
            EntityShape::Arc { center, .. } | EntityShape::Circle { center, .. } => Some(*center),
            EntityShape::Other => None,
        }
    }

    #[inline]
    pub fn radius(&self) -> Option<f64> {
        match self {
            EntityShape::Arc { radius, .. } | EntityShape::Circle { radius, .. } => Some(*radius),
            EntityShape::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedEntity {
    pub id: EntityId,
    pub shape: EntityShape,
}

pub trait EntityResolver {
    /// 将屏幕坐标解析为图面上的实体，未命中返回 `None`。
    fn resolve(&self, screen: Point2) -> Option<ResolvedEntity>;
}

pub trait CoordinateSnapper {
    fn snap(&self, event: &PointerEvent) -> Point2;
}

pub trait DrawingContainer {
    fn active_layer(&self) -> String;
    fn active_pen(&self) -> Pen;
    fn add_entity(&mut self, entity: Entity) -> Result<EntityId, EngineError>;
    /// 撤回刚插入、尚未登记撤销的实体。
    fn remove_entity(&mut self, id: EntityId) -> Option<Entity>;
}

pub trait UndoLedger {
    fn begin_cycle(&mut self) -> Result<(), UndoError>;
    fn record_add(&mut self, id: EntityId) -> Result<(), UndoError>;
    fn end_cycle(&mut self) -> Result<(), UndoError>;
    /// 丢弃当前打开的周期，不留下撤销记录。
    fn abort_cycle(&mut self);
}

/// 图面侧协作者的组合：拾取、实体容器与撤销账本通常由同一个场景提供。
pub trait Drawing: EntityResolver + DrawingContainer + UndoLedger {}

impl<T: EntityResolver + DrawingContainer + UndoLedger> Drawing for T {}

pub trait GraphicView {
    fn draw_preview(&mut self, entity: &Entity);
    fn clear_preview(&mut self);
    /// 重绘指定区域，`None` 表示整张图。
    fn redraw(&mut self, region: Option<Bounds2D>);
    fn relative_zero(&self) -> Point2;
    fn move_relative_zero(&mut self, point: Point2);
}

pub trait MessageSurface {
    fn report_error(&mut self, text: &str);
    fn command_message(&mut self, text: &str);
    fn update_hint(&mut self, prompt: &str, cancel_label: &str);
}

/// 将屏幕坐标换算为图面坐标，可选按网格取整。
#[derive(Debug, Clone, Copy)]
pub struct ViewportSnapper {
    viewport: ViewportState,
    grid: Option<f64>,
}

impl ViewportSnapper {
    pub fn new(viewport: ViewportState) -> Self {
        Self {
            viewport,
            grid: None,
        }
    }

    /// 设置网格间距，非正数或非有限值视为关闭网格捕捉。
    pub fn with_grid(mut self, spacing: Option<f64>) -> Self {
        self.grid = spacing.filter(|value| value.is_finite() && *value > 0.0);
        self
    }
}

impl CoordinateSnapper for ViewportSnapper {
    fn snap(&self, event: &PointerEvent) -> Point2 {
        let world = self.viewport.to_world(event.screen);
        match self.grid {
            Some(spacing) => Point2::new(
                (world.x() / spacing).round() * spacing,
                (world.y() / spacing).round() * spacing,
            ),
            None => world,
        }
    }
}

/// 无界面渲染器：保存当前预览实体与相对零点，并统计重绘次数。
#[derive(Debug, Clone)]
pub struct PreviewCanvas {
    preview: Option<Entity>,
    relative_zero: Point2,
    preview_draws: usize,
    redraws: usize,
}

impl PreviewCanvas {
    pub fn new() -> Self {
        Self {
            preview: None,
            relative_zero: Point2::new(0.0, 0.0),
            preview_draws: 0,
            redraws: 0,
        }
    }

    #[inline]
    pub fn preview(&self) -> Option<&Entity> {
        self.preview.as_ref()
    }

    #[inline]
    pub fn preview_draws(&self) -> usize {
        self.preview_draws
    }

    #[inline]
    pub fn redraws(&self) -> usize {
        self.redraws
    }
}

impl Default for PreviewCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicView for PreviewCanvas {
    fn draw_preview(&mut self, entity: &Entity) {
        self.preview = Some(entity.clone());
        self.preview_draws += 1;
    }

    fn clear_preview(&mut self) {
        self.preview = None;
    }

    fn redraw(&mut self, region: Option<Bounds2D>) {
        self.redraws += 1;
        debug!(?region, "重绘图面");
    }

    fn relative_zero(&self) -> Point2 {
        self.relative_zero
    }

    fn move_relative_zero(&mut self, point: Point2) {
        self.relative_zero = point;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Error(String),
    Info(String),
}

#[derive(Debug, Default)]
struct MessageLogInner {
    messages: Vec<Message>,
    hint: (String, String),
}

/// 可克隆的消息记录句柄：一份交给交互动作，另一份用于读取。
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    inner: Rc<RefCell<MessageLogInner>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.borrow().messages.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.inner
            .borrow()
            .messages
            .iter()
            .filter_map(|message| match message {
                Message::Error(text) => Some(text.clone()),
                Message::Info(_) => None,
            })
            .collect()
    }

    /// 最近一次提示（提示语、取消按钮文字）。
    pub fn hint(&self) -> (String, String) {
        self.inner.borrow().hint.clone()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().messages.clear();
    }
}

impl MessageSurface for MessageLog {
    fn report_error(&mut self, text: &str) {
        warn!(message = text, "命令行错误");
        self.inner
            .borrow_mut()
            .messages
            .push(Message::Error(text.to_string()));
    }

    fn command_message(&mut self, text: &str) {
        info!(message = text, "命令行消息");
        self.inner
            .borrow_mut()
            .messages
            .push(Message::Info(text.to_string()));
    }

    fn update_hint(&mut self, prompt: &str, cancel_label: &str) {
        self.inner.borrow_mut().hint = (prompt.to_string(), cancel_label.to_string());
    }
}

/// 极坐标偏移：`origin + polar(magnitude, angle)`。
#[inline]
pub(crate) fn polar_offset(origin: Point2, magnitude: f64, angle: f64) -> Point2 {
    origin.translate(Vector2::from_polar(magnitude, angle))
}
