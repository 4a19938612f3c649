pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，全部坐标使用双精度。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance_to(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        /// 从本点指向 `other` 的方向角（弧度，范围 `(-π, π]`）。两点重合时返回 0。
        #[inline]
        pub fn angle_to(self, other: Point2) -> f64 {
            self.vector_to(other).angle()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，提供极坐标构造与基础度量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        /// 按极坐标（长度、弧度角）构造向量。
        #[inline]
        pub fn from_polar(magnitude: f64, angle: f64) -> Self {
            Self(DVec2::new(magnitude * angle.cos(), magnitude * angle.sin()))
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn angle(self) -> f64 {
            if self.length_squared() <= f64::EPSILON * f64::EPSILON {
                0.0
            } else {
                self.0.y.atan2(self.0.x)
            }
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    #[inline]
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees.to_radians()
    }

    /// 将角度归一化到 `[0, 2π)`。
    pub fn normalize_angle(angle: f64) -> f64 {
        let normalized = angle.rem_euclid(std::f64::consts::TAU);
        if normalized.is_finite() {
            normalized
        } else {
            0.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let min_vec = self.min.as_vec2();
            let max_vec = self.max.as_vec2();
            let center = (min_vec + max_vec) * 0.5;
            Point2::from_vec(center)
        }
    }

}

pub mod document {
    use std::collections::HashMap;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2, Vector2, normalize_angle};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
        #[serde(default)]
        pub is_locked: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
                is_locked: false,
            }
        }
    }

    /// 画笔：颜色（0xRRGGBB）、线宽（毫米）与线型名称。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Pen {
        pub color: u32,
        pub width: f64,
        pub line_type: String,
    }

    impl Default for Pen {
        fn default() -> Self {
            Self {
                color: 0xFF_FF_FF,
                width: 0.25,
                line_type: "CONTINUOUS".to_string(),
            }
        }
    }

    /// 交互层关心的实体类别，只区分圆、圆弧与其他。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EntityKind {
        Arc,
        Circle,
        Other,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Text(Text),
        RadialDimension(RadialDimension),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::Text(text) => &text.layer,
                Entity::RadialDimension(dimension) => &dimension.layer,
            }
        }

        #[inline]
        pub fn pen(&self) -> &Pen {
            match self {
                Entity::Line(line) => &line.pen,
                Entity::Circle(circle) => &circle.pen,
                Entity::Arc(arc) => &arc.pen,
                Entity::Text(text) => &text.pen,
                Entity::RadialDimension(dimension) => &dimension.pen,
            }
        }

        #[inline]
        pub fn kind(&self) -> EntityKind {
            match self {
                Entity::Arc(_) => EntityKind::Arc,
                Entity::Circle(_) => EntityKind::Circle,
                _ => EntityKind::Other,
            }
        }

        /// 计算实体的 2D 轴对齐范围，文本退化为插入点。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            match self {
                Entity::Line(line) => {
                    bounds.include_point(line.start);
                    bounds.include_point(line.end);
                }
                Entity::Circle(circle) => {
                    let radius = circle.radius.abs();
                    let center = circle.center;
                    bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                    bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
                }
                Entity::Arc(arc) => {
                    arc_bounds(arc, &mut bounds);
                }
                Entity::Text(text) => {
                    bounds.include_point(text.insert);
                }
                Entity::RadialDimension(dimension) => {
                    bounds.include_point(dimension.definition_point);
                    bounds.include_point(dimension.leader_endpoint);
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        /// 点到实体轮廓的最短距离，供拾取使用。
        pub fn distance_to(&self, point: Point2) -> f64 {
            match self {
                Entity::Line(line) => segment_distance(line.start, line.end, point),
                Entity::Circle(circle) => {
                    (circle.center.distance_to(point) - circle.radius.abs()).abs()
                }
                Entity::Arc(arc) => arc_distance(arc, point),
                Entity::Text(text) => text.insert.distance_to(point),
                Entity::RadialDimension(dimension) => segment_distance(
                    dimension.definition_point,
                    dimension.leader_endpoint,
                    point,
                ),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
        #[serde(default)]
        pub pen: Pen,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
        #[serde(default)]
        pub pen: Pen,
    }

    /// 圆弧实体，角度以弧度形式储存，遵循数学正方向。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
        #[serde(default)]
        pub pen: Pen,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub rotation: f64,
        pub layer: String,
        #[serde(default)]
        pub pen: Pen,
    }

    /// 半径标注：从定义点（圆心）引出到圆周上的引线，附带标注文字。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RadialDimension {
        pub definition_point: Point2,
        pub leader_endpoint: Point2,
        pub radius: f64,
        pub angle: f64,
        pub text: Option<String>,
        pub layer: String,
        #[serde(default)]
        pub pen: Pen,
    }

    impl RadialDimension {
        /// 自动测量文字，例如 `R12.50`。
        pub fn measured_label(&self, precision: usize) -> String {
            format!("R{:.*}", precision, self.radius)
        }

        /// 实际显示的标注文字：空文本使用测量值，`<>` 占位符替换为测量值。
        pub fn label(&self, precision: usize) -> String {
            match self.text.as_deref() {
                None | Some("") => self.measured_label(precision),
                Some(text) if text.contains("<>") => {
                    text.replace("<>", &self.measured_label(precision))
                }
                Some(text) => text.to_string(),
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: HashMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        #[inline]
        pub fn layer(&self, name: &str) -> Option<&Layer> {
            self.layers.get(name)
        }

        /// 锁定或解锁图层，图层不存在时自动创建。
        pub fn set_layer_locked(&mut self, name: impl AsRef<str>, locked: bool) {
            let key = name.as_ref();
            self.ensure_layer(key);
            if let Some(layer) = self.layers.get_mut(key) {
                layer.is_locked = locked;
            }
        }

        pub fn add_line(
            &mut self,
            start: Point2,
            end: Point2,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Line(Line {
                start,
                end,
                layer: layer.into(),
                pen: Pen::default(),
            }))
        }

        pub fn add_circle(
            &mut self,
            center: Point2,
            radius: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Circle(Circle {
                center,
                radius,
                layer: layer.into(),
                pen: Pen::default(),
            }))
        }

        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
                layer: layer.into(),
                pen: Pen::default(),
            }))
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            rotation: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Text(Text {
                insert,
                content: content.into(),
                height,
                rotation,
                layer: layer.into(),
                pen: Pen::default(),
            }))
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            self.ensure_layer(entity.layer_name());
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        /// 从文档移除实体并返回其数据，供撤销栈保存。
        pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
            let index = self
                .entities
                .iter()
                .position(|(entity_id, _)| *entity_id == id)?;
            Some(self.entities.remove(index).1)
        }

        /// 以原 ID 重新插入实体（重做）。ID 已存在时返回 `false`。
        pub fn restore_entity(&mut self, id: EntityId, entity: Entity) -> bool {
            match self
                .entities
                .binary_search_by_key(&id, |(entity_id, _)| *entity_id)
            {
                Ok(_) => false,
                Err(index) => {
                    self.ensure_layer(entity.layer_name());
                    self.entities.insert(index, (id, entity));
                    self.next_entity_id = self.next_entity_id.max(id.get() + 1);
                    true
                }
            }
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity_count(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities.iter().find_map(|(entity_id, entity)| {
                if *entity_id == id { Some(entity) } else { None }
            })
        }

        #[inline]
        pub fn entity_bounds(&self, id: EntityId) -> Option<Bounds2D> {
            self.entity(id).and_then(Entity::bounds)
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            let mut has = false;
            for (_, entity) in &self.entities {
                if let Some(entity_bounds) = entity.bounds() {
                    bounds.include_bounds(&entity_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    fn canonical_interval(start: f64, end: f64) -> (f64, f64) {
        let start = normalize_angle(start);
        let mut end = normalize_angle(end);
        if (end - start).abs() < 1e-9 {
            end = start + TAU;
        } else if end < start {
            end += TAU;
        }
        (start, end)
    }

    fn arc_point(center: Point2, radius: f64, angle: f64) -> Point2 {
        center.translate(Vector2::from_polar(radius, angle))
    }

    fn arc_bounds(arc: &Arc, bounds: &mut Bounds2D) {
        let radius = arc.radius.abs();
        if radius <= f64::EPSILON {
            bounds.include_point(arc.center);
            return;
        }

        let (start, end) = canonical_interval(arc.start_angle, arc.end_angle);
        bounds.include_point(arc_point(arc.center, radius, start));
        bounds.include_point(arc_point(arc.center, radius, end));

        const QUADRANTS: [f64; 4] = [0.0, FRAC_PI_2, PI, FRAC_PI_2 * 3.0];
        for base in QUADRANTS {
            let mut candidate = base;
            while candidate < start {
                candidate += TAU;
            }
            if candidate <= end {
                bounds.include_point(arc_point(arc.center, radius, candidate));
            }
        }
    }

    fn arc_distance(arc: &Arc, point: Point2) -> f64 {
        let radius = arc.radius.abs();
        let (start, end) = canonical_interval(arc.start_angle, arc.end_angle);
        let mut angle = normalize_angle(arc.center.angle_to(point));
        if angle < start {
            angle += TAU;
        }
        if angle <= end {
            (arc.center.distance_to(point) - radius).abs()
        } else {
            let first = arc_point(arc.center, radius, start).distance_to(point);
            let last = arc_point(arc.center, radius, end).distance_to(point);
            first.min(last)
        }
    }

    fn segment_distance(start: Point2, end: Point2, point: Point2) -> f64 {
        let segment = start.vector_to(end).as_vec2();
        let length_squared = segment.length_squared();
        if length_squared <= f64::EPSILON {
            return start.distance_to(point);
        }
        let t = (start.vector_to(point).as_vec2().dot(segment) / length_squared).clamp(0.0, 1.0);
        Point2::from_vec(start.as_vec2() + segment * t).distance_to(point)
    }

}
