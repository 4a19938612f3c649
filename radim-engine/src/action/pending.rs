use radim_core::document::{EntityId, EntityKind, Pen, RadialDimension};
use radim_core::geometry::Point2;

use super::collab::{EntityShape, ResolvedEntity, polar_offset};

/// 被标注的圆或圆弧。只在一次交互内有效，提交或取消后即丢弃。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseEntityRef {
    pub id: EntityId,
    pub kind: EntityKind,
    /// 定义点：实体圆心，选中后不再变化。
    pub definition_point: Point2,
    pub radius: f64,
}

impl BaseEntityRef {
    /// 仅接受圆和圆弧，其他实体返回 `None`。
    pub fn from_resolved(resolved: &ResolvedEntity) -> Option<Self> {
        match resolved.shape {
            EntityShape::Arc { center, radius } | EntityShape::Circle { center, radius } => {
                Some(Self {
                    id: resolved.id,
                    kind: resolved.shape.kind(),
                    definition_point: center,
                    radius: radius.abs(),
                })
            }
            EntityShape::Other => None,
        }
    }
}

/// 正在编辑的半径标注。引线端点始终等于定义点按 (radius, angle) 的极坐标偏移。
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDimension {
    pub definition_point: Point2,
    pub leader_endpoint: Point2,
    pub radius: f64,
    pub angle: f64,
    pub label_text: Option<String>,
}

impl PendingDimension {
    /// 选中实体后的初始状态，引线沿 0 弧度方向。
    pub fn new(base: &BaseEntityRef) -> Self {
        recompute(base.definition_point, base.radius, base.definition_point)
    }

    pub fn with_label(mut self, label_text: Option<String>) -> Self {
        self.label_text = label_text;
        self
    }

    pub fn to_dimension(&self, layer: impl Into<String>, pen: Pen) -> RadialDimension {
        RadialDimension {
            definition_point: self.definition_point,
            leader_endpoint: self.leader_endpoint,
            radius: self.radius,
            angle: self.angle,
            text: self.label_text.clone(),
            layer: layer.into(),
            pen,
        }
    }
}

/// 根据采样点重新计算标注几何。纯函数，可在每次指针移动时调用。
pub fn recompute(definition_point: Point2, radius: f64, sample: Point2) -> PendingDimension {
    let angle = definition_point.angle_to(sample);
    PendingDimension {
        definition_point,
        leader_endpoint: polar_offset(definition_point, radius, angle),
        radius,
        angle,
        label_text: None,
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn close(a: Point2, b: Point2) -> bool {
        a.distance_to(b) < 1e-9
    }

    #[test]
    fn leader_endpoint_lies_on_radius_toward_sample() {
        let samples = [
            (Point2::new(0.0, 0.0), 10.0, Point2::new(3.0, 4.0)),
            (Point2::new(-2.5, 7.0), 0.75, Point2::new(-40.0, -1.0)),
            (Point2::new(100.0, 100.0), 42.0, Point2::new(100.0, 100.5)),
            (Point2::new(1.0, 1.0), 0.0, Point2::new(9.0, -9.0)),
        ];
        for (definition, radius, sample) in samples {
            let pending = recompute(definition, radius, sample);
            let distance = pending.definition_point.distance_to(pending.leader_endpoint);
            assert!((distance - radius).abs() < 1e-9, "radius mismatch for {sample:?}");
            assert!((pending.angle - definition.angle_to(sample)).abs() < 1e-12);
            assert_eq!(pending.radius, radius);
        }
    }

    #[test]
    fn recompute_uses_sample_direction_only() {
        let center = Point2::new(5.0, 5.0);
        let near = recompute(center, 3.0, Point2::new(6.0, 5.0));
        let far = recompute(center, 3.0, Point2::new(500.0, 5.0));
        assert!(close(near.leader_endpoint, Point2::new(8.0, 5.0)));
        assert_eq!(near, far);

        let up = recompute(center, 3.0, Point2::new(5.0, 50.0));
        assert!((up.angle - FRAC_PI_2).abs() < 1e-12);
        assert!(close(up.leader_endpoint, Point2::new(5.0, 8.0)));

        let left = recompute(center, 3.0, Point2::new(-5.0, 5.0));
        assert!((left.angle - PI).abs() < 1e-12);
    }

    #[test]
    fn base_reference_accepts_only_circular_entities() {
        let arc = ResolvedEntity {
            id: EntityId::new(3),
            shape: EntityShape::Arc {
                center: Point2::new(1.0, 2.0),
                radius: 4.0,
            },
        };
        let base = BaseEntityRef::from_resolved(&arc).expect("arc is accepted");
        assert_eq!(base.kind, EntityKind::Arc);
        assert_eq!(base.definition_point, Point2::new(1.0, 2.0));

        let pending = PendingDimension::new(&base);
        assert!(close(pending.leader_endpoint, Point2::new(5.0, 2.0)));
        assert!(pending.label_text.is_none());

        let line = ResolvedEntity {
            id: EntityId::new(4),
            shape: EntityShape::Other,
        };
        assert!(BaseEntityRef::from_resolved(&line).is_none());
    }

    #[test]
    fn dimension_carries_label_and_style() {
        let pending = recompute(Point2::new(0.0, 0.0), 2.0, Point2::new(0.0, -1.0))
            .with_label(Some("R=2".to_string()));
        let pen = Pen {
            color: 0xFF0000,
            ..Pen::default()
        };
        let dimension = pending.to_dimension("DIM", pen.clone());
        assert_eq!(dimension.layer, "DIM");
        assert_eq!(dimension.pen, pen);
        assert_eq!(dimension.text.as_deref(), Some("R=2"));
        assert!(close(dimension.leader_endpoint, Point2::new(0.0, -2.0)));
    }
}
