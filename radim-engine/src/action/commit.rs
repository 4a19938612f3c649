use radim_core::document::{Entity, EntityId, RadialDimension};
use tracing::{info, warn};

use crate::errors::EngineError;
use crate::undo::UndoError;

use super::collab::{Drawing, GraphicView};
use super::pending::{BaseEntityRef, PendingDimension};

/// 已写入图面的半径标注。
#[derive(Debug, Clone)]
pub struct CommittedDimension {
    pub id: EntityId,
    pub dimension: RadialDimension,
}

/// 生成最终实体并写入图面，随后登记为单个撤销周期。
///
/// 插入失败时直接返回错误，不会打开撤销周期。撤销登记失败时撤回已插入的实体，
/// 并丢弃本次打开的周期，图面与撤销栈保持提交前的状态。提交后重绘图面，
/// 并保持用户的相对零点不变。
pub fn commit(
    pending: &PendingDimension,
    base: &BaseEntityRef,
    drawing: &mut dyn Drawing,
    view: &mut dyn GraphicView,
) -> Result<CommittedDimension, EngineError> {
    let dimension = pending.to_dimension(drawing.active_layer(), drawing.active_pen());
    let region = Entity::RadialDimension(dimension.clone()).bounds();

    let id = drawing.add_entity(Entity::RadialDimension(dimension.clone()))?;

    if let Err(err) = drawing.begin_cycle() {
        roll_back(drawing, id, &err);
        return Err(err.into());
    }
    if let Err(err) = drawing.record_add(id).and_then(|()| drawing.end_cycle()) {
        drawing.abort_cycle();
        roll_back(drawing, id, &err);
        return Err(err.into());
    }

    let relative_zero = view.relative_zero();
    view.redraw(region);
    view.move_relative_zero(relative_zero);

    info!(
        id = id.get(),
        base = base.id.get(),
        radius = dimension.radius,
        angle = dimension.angle.to_degrees(),
        "已创建半径标注"
    );

    Ok(CommittedDimension { id, dimension })
}

fn roll_back(drawing: &mut dyn Drawing, id: EntityId, err: &UndoError) {
    warn!(id = id.get(), error = %err, "撤销登记失败，撤回已插入的标注");
    drawing.remove_entity(id);
}
