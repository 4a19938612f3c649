use radim_core::document::Entity;
use radim_core::geometry::{Point2, deg_to_rad};
use tracing::{debug, info};

use super::collab::{
    CoordinateSnapper, Drawing, GraphicView, MessageSurface, MouseButton, PointerEvent,
    polar_offset,
};
use super::commit::{CommittedDimension, commit};
use super::grammar::{self, TypedCommand};
use super::pending::{BaseEntityRef, PendingDimension, recompute};

const MSG_NOT_CIRCULAR: &str = "Not a circle or arc entity";
const MSG_NO_ENTITY: &str = "No entity found";
const MSG_INVALID_EXPRESSION: &str = "Not a valid expression";
const MSG_AVAILABLE_COMMANDS: &str = "Available commands: ";

/// 对外可见的交互状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// 动作已结束，不再响应输入。
    Idle,
    AwaitingEntity,
    AwaitingPosition,
    AwaitingText,
}

/// 当前状态对应的鼠标提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub prompt: &'static str,
    pub cancel_label: &'static str,
}

/// 每个事件处理期间借用的协作者。
pub struct ActionContext<'a> {
    pub drawing: &'a mut dyn Drawing,
    pub snapper: &'a dyn CoordinateSnapper,
    pub view: &'a mut dyn GraphicView,
}

#[derive(Debug, Clone)]
struct Session {
    base: BaseEntityRef,
    pending: PendingDimension,
}

#[derive(Debug, Clone)]
enum Resume {
    Entity,
    Position(Session),
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    AwaitingEntity,
    AwaitingPosition(Session),
    AwaitingText(Resume),
}

/// 半径标注交互动作：选择圆/圆弧 → 指定引线位置或角度 → 提交。
///
/// 每次提交后都回到 `AwaitingEntity` 开始新的周期，上一周期的状态不会带入下一周期。
pub struct RadialDimensionAction {
    phase: Phase,
    /// 尚未选中实体时输入的标注文字，选中后移入待定标注。
    label: Option<String>,
    messages: Box<dyn MessageSurface>,
}

impl RadialDimensionAction {
    pub fn new(messages: Box<dyn MessageSurface>) -> Self {
        let mut action = Self {
            phase: Phase::AwaitingEntity,
            label: None,
            messages,
        };
        action.update_hint();
        action
    }

    pub fn state(&self) -> InteractionState {
        match &self.phase {
            Phase::Idle => InteractionState::Idle,
            Phase::AwaitingEntity => InteractionState::AwaitingEntity,
            Phase::AwaitingPosition(_) => InteractionState::AwaitingPosition,
            Phase::AwaitingText(_) => InteractionState::AwaitingText,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn base(&self) -> Option<&BaseEntityRef> {
        self.session().map(|session| &session.base)
    }

    pub fn pending(&self) -> Option<&PendingDimension> {
        self.session().map(|session| &session.pending)
    }

    /// 将用于下一次提交的标注文字。
    pub fn label_text(&self) -> Option<&str> {
        match self.session() {
            Some(session) => session.pending.label_text.as_deref(),
            None => self.label.as_deref(),
        }
    }

    pub fn available_commands(&self) -> Vec<&'static str> {
        grammar::available_commands(self.state())
    }

    pub fn hint(&self) -> Hint {
        match self.state() {
            InteractionState::AwaitingEntity => Hint {
                prompt: "Select arc or circle entity",
                cancel_label: "Cancel",
            },
            InteractionState::AwaitingPosition => Hint {
                prompt: "Specify dimension line position or enter angle:",
                cancel_label: "Cancel",
            },
            InteractionState::AwaitingText => Hint {
                prompt: "Enter dimension text:",
                cancel_label: "",
            },
            InteractionState::Idle => Hint {
                prompt: "",
                cancel_label: "",
            },
        }
    }

    /// 已结束的动作重新开始等待选择实体。
    pub fn restart(&mut self) {
        if self.is_finished() {
            self.set_phase(Phase::AwaitingEntity);
        }
    }

    pub fn pointer_move(&mut self, ctx: &mut ActionContext<'_>, event: &PointerEvent) {
        let Phase::AwaitingPosition(session) = &mut self.phase else {
            return;
        };
        let sample = ctx.snapper.snap(event);
        let label = session.pending.label_text.take();
        session.pending = recompute(
            session.base.definition_point,
            session.base.radius,
            sample,
        )
        .with_label(label);

        let preview = session
            .pending
            .to_dimension(ctx.drawing.active_layer(), ctx.drawing.active_pen());
        ctx.view.clear_preview();
        ctx.view.draw_preview(&Entity::RadialDimension(preview));
    }

    pub fn pointer_click(
        &mut self,
        ctx: &mut ActionContext<'_>,
        button: MouseButton,
        event: &PointerEvent,
    ) -> Option<CommittedDimension> {
        match button {
            MouseButton::Left => match self.state() {
                InteractionState::AwaitingEntity => {
                    self.select_entity(ctx, event.screen);
                    None
                }
                InteractionState::AwaitingPosition => {
                    let sample = ctx.snapper.snap(event);
                    self.coordinate_event(ctx, Some(sample))
                }
                InteractionState::AwaitingText | InteractionState::Idle => None,
            },
            MouseButton::Right => {
                self.cancel(ctx);
                None
            }
            MouseButton::Middle => None,
        }
    }

    /// 坐标确认事件（点击或键入坐标）。无坐标的事件直接忽略。
    pub fn coordinate_event(
        &mut self,
        ctx: &mut ActionContext<'_>,
        coordinate: Option<Point2>,
    ) -> Option<CommittedDimension> {
        let Some(coordinate) = coordinate else {
            debug!("忽略空坐标事件");
            return None;
        };
        if self.state() != InteractionState::AwaitingPosition {
            return None;
        }
        self.finish(ctx, coordinate)
    }

    pub fn command(
        &mut self,
        ctx: &mut ActionContext<'_>,
        input: &str,
    ) -> Option<CommittedDimension> {
        if grammar::consumes_verbatim(self.state()) {
            self.accept_label(input);
            return None;
        }

        match grammar::classify(input, self.state()) {
            TypedCommand::Help => {
                let message = format!(
                    "{MSG_AVAILABLE_COMMANDS}{}",
                    self.available_commands().join(", ")
                );
                self.messages.command_message(&message);
                None
            }
            TypedCommand::Text => {
                let resume = match std::mem::replace(&mut self.phase, Phase::Idle) {
                    Phase::AwaitingPosition(session) => Resume::Position(session),
                    _ => Resume::Entity,
                };
                self.set_phase(Phase::AwaitingText(resume));
                None
            }
            TypedCommand::Angle(degrees) => {
                let definition_point = self.session()?.base.definition_point;
                // 单位长度只确定方向，提交前 `finish` 会用实体半径重新计算。
                let sample = polar_offset(definition_point, 1.0, deg_to_rad(degrees));
                self.finish(ctx, sample)
            }
            TypedCommand::InvalidExpression { input, error } => {
                debug!(input = %input, %error, "角度表达式无效");
                self.messages.report_error(MSG_INVALID_EXPRESSION);
                None
            }
            TypedCommand::Unrecognized(command) => {
                self.messages
                    .report_error(&format!("Unknown command: {command}"));
                None
            }
        }
    }

    /// 右键或显式中止：丢弃待定标注回到选择实体；在选择实体阶段取消则结束动作。
    pub fn cancel(&mut self, ctx: &mut ActionContext<'_>) {
        let next = match self.phase {
            Phase::Idle => return,
            Phase::AwaitingEntity => Phase::Idle,
            Phase::AwaitingPosition(_) | Phase::AwaitingText(_) => Phase::AwaitingEntity,
        };
        ctx.view.clear_preview();
        self.label = None;
        debug!(from = ?self.state(), "取消半径标注");
        self.set_phase(next);
    }

    fn select_entity(&mut self, ctx: &mut ActionContext<'_>, screen: Point2) {
        let Some(resolved) = ctx.drawing.resolve(screen) else {
            self.messages.report_error(MSG_NO_ENTITY);
            return;
        };
        let Some(base) = BaseEntityRef::from_resolved(&resolved) else {
            self.messages.report_error(MSG_NOT_CIRCULAR);
            return;
        };

        info!(
            id = base.id.get(),
            kind = ?base.kind,
            radius = base.radius,
            "已选中标注对象"
        );
        ctx.view.move_relative_zero(base.definition_point);
        let pending = PendingDimension::new(&base).with_label(self.label.take());
        self.set_phase(Phase::AwaitingPosition(Session { base, pending }));
    }

    fn accept_label(&mut self, input: &str) {
        let text = input.to_string();
        let next = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingText(Resume::Position(mut session)) => {
                session.pending.label_text = Some(text);
                Phase::AwaitingPosition(session)
            }
            _ => {
                self.label = Some(text);
                Phase::AwaitingEntity
            }
        };
        self.set_phase(next);
    }

    /// 以采样点为最终位置重新计算并提交，然后回到 `AwaitingEntity`。
    fn finish(
        &mut self,
        ctx: &mut ActionContext<'_>,
        sample: Point2,
    ) -> Option<CommittedDimension> {
        let Phase::AwaitingPosition(session) =
            std::mem::replace(&mut self.phase, Phase::AwaitingEntity)
        else {
            return None;
        };
        let Session { base, pending } = session;
        let pending =
            recompute(base.definition_point, base.radius, sample).with_label(pending.label_text);

        ctx.view.clear_preview();
        let committed = match commit(&pending, &base, ctx.drawing, ctx.view) {
            Ok(committed) => Some(committed),
            Err(err) => {
                self.messages
                    .report_error(&format!("Could not add dimension: {err}"));
                None
            }
        };
        self.set_phase(Phase::AwaitingEntity);
        committed
    }

    fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::AwaitingPosition(session)
            | Phase::AwaitingText(Resume::Position(session)) => Some(session),
            _ => None,
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.update_hint();
    }

    fn update_hint(&mut self) {
        let hint = self.hint();
        self.messages.update_hint(hint.prompt, hint.cancel_label);
    }
}

#[cfg(test)]
mod tests {
    use radim_core::document::EntityKind;

    use super::*;
    use crate::action::collab::{MessageLog, PreviewCanvas, ViewportSnapper};
    use crate::scene::Scene;

    #[test]
    fn runs_against_scene_with_grid_snapping() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        let mut canvas = PreviewCanvas::new();
        let log = MessageLog::new();
        let mut action = RadialDimensionAction::new(Box::new(log.clone()));
        let snapper = ViewportSnapper::new(scene.viewport()).with_grid(Some(5.0));

        let mut ctx = ActionContext {
            drawing: &mut scene,
            snapper: &snapper,
            view: &mut canvas,
        };
        action.pointer_click(&mut ctx, MouseButton::Left, &PointerEvent::at(62.5, 25.0));
        assert_eq!(action.base().map(|base| base.kind), Some(EntityKind::Circle));

        // (51.2, 41.9) 捕捉到 (50, 40)，正上方
        let committed = action
            .pointer_click(&mut ctx, MouseButton::Left, &PointerEvent::at(51.2, 41.9))
            .expect("commit");
        assert!((committed.dimension.leader_endpoint.x() - 50.0).abs() < 1e-9);
        assert!((committed.dimension.leader_endpoint.y() - 37.5).abs() < 1e-9);

        assert!(log.errors().is_empty());
        assert!(scene.can_undo());
        assert!(scene.entity(ids.circle).is_some());
        assert!(scene.entity(committed.id).is_some());
    }

    #[test]
    fn middle_button_is_ignored() {
        let mut scene = Scene::new();
        scene.populate_demo();
        let mut canvas = PreviewCanvas::new();
        let log = MessageLog::new();
        let mut action = RadialDimensionAction::new(Box::new(log.clone()));
        let snapper = ViewportSnapper::new(scene.viewport());
        let mut ctx = ActionContext {
            drawing: &mut scene,
            snapper: &snapper,
            view: &mut canvas,
        };

        action.pointer_click(&mut ctx, MouseButton::Middle, &PointerEvent::at(62.5, 25.0));
        assert_eq!(action.state(), InteractionState::AwaitingEntity);
        assert!(log.messages().is_empty());
    }
}
