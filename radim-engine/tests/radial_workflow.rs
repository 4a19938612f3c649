use radim_core::document::{Arc, Circle, Entity, EntityId, Line, Pen};
use radim_core::geometry::Point2;
use radim_engine::action::{
    ActionContext, CommittedDimension, CoordinateSnapper, DrawingContainer, EntityResolver,
    EntityShape, GraphicView, InteractionState, Message, MessageLog, MouseButton, PointerEvent,
    PreviewCanvas, RadialDimensionAction, ResolvedEntity, UndoLedger,
};
use radim_engine::errors::EngineError;
use radim_engine::undo::UndoError;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Add(EntityId),
    Begin,
    Record(EntityId),
    End,
    Remove(EntityId),
    Abort,
}

/// 记录所有写操作的图面替身。
#[derive(Default)]
struct FakeDrawing {
    pickable: Vec<(EntityId, Entity)>,
    added: Vec<(EntityId, Entity)>,
    calls: Vec<Call>,
    reject_inserts: bool,
    fail_begin: bool,
    fail_record: bool,
    cycle_open: bool,
}

impl FakeDrawing {
    fn with(mut self, id: u64, entity: Entity) -> Self {
        self.pickable.push((EntityId::new(id), entity));
        self
    }

    fn undo_brackets(&self) -> usize {
        self.calls.iter().filter(|call| **call == Call::Begin).count()
    }
}

impl EntityResolver for FakeDrawing {
    fn resolve(&self, screen: Point2) -> Option<ResolvedEntity> {
        self.pickable
            .iter()
            .find(|(_, entity)| entity.distance_to(screen) < 0.5)
            .map(|(id, entity)| ResolvedEntity {
                id: *id,
                shape: EntityShape::of(entity),
            })
    }
}

impl DrawingContainer for FakeDrawing {
    fn active_layer(&self) -> String {
        "DIM".to_string()
    }

    fn active_pen(&self) -> Pen {
        Pen::default()
    }

    fn add_entity(&mut self, entity: Entity) -> Result<EntityId, EngineError> {
        if self.reject_inserts {
            return Err(EngineError::LayerLocked("DIM".to_string()));
        }
        let id = EntityId::new(100 + self.added.len() as u64);
        self.added.push((id, entity));
        self.calls.push(Call::Add(id));
        Ok(id)
    }

    fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.calls.push(Call::Remove(id));
        let index = self.added.iter().position(|(added, _)| *added == id)?;
        Some(self.added.remove(index).1)
    }
}

impl UndoLedger for FakeDrawing {
    fn begin_cycle(&mut self) -> Result<(), UndoError> {
        self.calls.push(Call::Begin);
        if self.fail_begin || self.cycle_open {
            return Err(UndoError::CycleAlreadyOpen);
        }
        self.cycle_open = true;
        Ok(())
    }

    fn record_add(&mut self, id: EntityId) -> Result<(), UndoError> {
        self.calls.push(Call::Record(id));
        if self.fail_record || !self.cycle_open {
            return Err(UndoError::NoOpenCycle);
        }
        Ok(())
    }

    fn end_cycle(&mut self) -> Result<(), UndoError> {
        self.calls.push(Call::End);
        if !self.cycle_open {
            return Err(UndoError::NoOpenCycle);
        }
        self.cycle_open = false;
        Ok(())
    }

    fn abort_cycle(&mut self) {
        self.calls.push(Call::Abort);
        self.cycle_open = false;
    }
}

struct IdentitySnapper;

impl CoordinateSnapper for IdentitySnapper {
    fn snap(&self, event: &PointerEvent) -> Point2 {
        event.screen
    }
}

struct Harness {
    drawing: FakeDrawing,
    canvas: PreviewCanvas,
    log: MessageLog,
    action: RadialDimensionAction,
}

impl Harness {
    fn new(drawing: FakeDrawing) -> Self {
        let log = MessageLog::new();
        let action = RadialDimensionAction::new(Box::new(log.clone()));
        Self {
            drawing,
            canvas: PreviewCanvas::new(),
            log,
            action,
        }
    }

    fn click(&mut self, button: MouseButton, x: f64, y: f64) -> Option<CommittedDimension> {
        let mut ctx = ActionContext {
            drawing: &mut self.drawing,
            snapper: &IdentitySnapper,
            view: &mut self.canvas,
        };
        self.action
            .pointer_click(&mut ctx, button, &PointerEvent::at(x, y))
    }

    fn left(&mut self, x: f64, y: f64) -> Option<CommittedDimension> {
        self.click(MouseButton::Left, x, y)
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let mut ctx = ActionContext {
            drawing: &mut self.drawing,
            snapper: &IdentitySnapper,
            view: &mut self.canvas,
        };
        self.action.pointer_move(&mut ctx, &PointerEvent::at(x, y));
    }

    fn command(&mut self, input: &str) -> Option<CommittedDimension> {
        let mut ctx = ActionContext {
            drawing: &mut self.drawing,
            snapper: &IdentitySnapper,
            view: &mut self.canvas,
        };
        self.action.command(&mut ctx, input)
    }

    fn coordinate(&mut self, coordinate: Option<Point2>) -> Option<CommittedDimension> {
        let mut ctx = ActionContext {
            drawing: &mut self.drawing,
            snapper: &IdentitySnapper,
            view: &mut self.canvas,
        };
        self.action.coordinate_event(&mut ctx, coordinate)
    }

    fn cancel(&mut self) {
        let mut ctx = ActionContext {
            drawing: &mut self.drawing,
            snapper: &IdentitySnapper,
            view: &mut self.canvas,
        };
        self.action.cancel(&mut ctx);
    }
}

fn circle(x: f64, y: f64, radius: f64) -> Entity {
    Entity::Circle(Circle {
        center: Point2::new(x, y),
        radius,
        layer: "0".to_string(),
        pen: Pen::default(),
    })
}

fn line() -> Entity {
    Entity::Line(Line {
        start: Point2::new(-20.0, -20.0),
        end: Point2::new(-10.0, -20.0),
        layer: "0".to_string(),
        pen: Pen::default(),
    })
}

fn drawing() -> FakeDrawing {
    FakeDrawing::default()
        .with(1, circle(5.0, 5.0, 3.0))
        .with(2, circle(0.0, 0.0, 10.0))
        .with(3, line())
}

fn close(a: Point2, b: Point2) -> bool {
    a.distance_to(b) < 1e-9
}

#[test]
fn click_move_click_commits_dimension_on_circle() {
    let mut h = Harness::new(drawing());
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);

    assert!(h.left(8.0, 5.0).is_none());
    assert_eq!(h.action.state(), InteractionState::AwaitingPosition);
    let base = h.action.base().expect("base entity selected");
    assert_eq!(base.id, EntityId::new(1));
    assert_eq!(base.definition_point, Point2::new(5.0, 5.0));
    // 选中后相对零点移到圆心
    assert_eq!(h.canvas.relative_zero(), Point2::new(5.0, 5.0));

    h.move_to(8.0, 5.0);
    let committed = h.left(8.0, 5.0).expect("second click commits");

    let dimension = &committed.dimension;
    assert!(close(dimension.leader_endpoint, Point2::new(8.0, 5.0)));
    assert!((dimension.radius - 3.0).abs() < 1e-12);
    assert!(dimension.angle.abs() < 1e-12);
    assert_eq!(dimension.definition_point, Point2::new(5.0, 5.0));
    assert_eq!(dimension.layer, "DIM");
    assert!(dimension.text.is_none());

    assert_eq!(
        h.drawing.calls,
        vec![
            Call::Add(committed.id),
            Call::Begin,
            Call::Record(committed.id),
            Call::End
        ]
    );
    assert_eq!(h.drawing.added.len(), 1);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert!(h.action.pending().is_none());
    assert!(h.canvas.preview().is_none());
    assert_eq!(h.canvas.redraws(), 1);
    assert_eq!(h.canvas.relative_zero(), Point2::new(5.0, 5.0));
    assert!(h.log.errors().is_empty());
}

#[test]
fn arcs_are_accepted_like_circles() {
    let arc = Entity::Arc(Arc {
        center: Point2::new(0.0, 0.0),
        radius: 4.0,
        start_angle: 0.0,
        end_angle: std::f64::consts::PI,
        layer: "0".to_string(),
        pen: Pen::default(),
    });
    let mut h = Harness::new(FakeDrawing::default().with(7, arc));
    h.left(0.0, 4.0);
    assert_eq!(h.action.state(), InteractionState::AwaitingPosition);

    let committed = h.left(0.0, -20.0).expect("commit on arc");
    assert!(close(committed.dimension.leader_endpoint, Point2::new(0.0, -4.0)));
}

#[test]
fn wrong_entity_type_reports_once_and_keeps_state() {
    let mut h = Harness::new(drawing());
    h.left(-15.0, -20.0);

    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert_eq!(h.log.errors(), vec!["Not a circle or arc entity".to_string()]);
    assert!(h.drawing.calls.is_empty());
    assert!(h.action.base().is_none());
}

#[test]
fn empty_pick_reports_missing_entity() {
    let mut h = Harness::new(drawing());
    h.left(500.0, 500.0);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert_eq!(h.log.errors(), vec!["No entity found".to_string()]);
}

#[test]
fn typed_angle_uses_entity_radius_not_unit_direction() {
    let mut h = Harness::new(drawing());
    h.left(10.0, 0.0);
    assert_eq!(h.action.base().map(|base| base.radius), Some(10.0));

    let committed = h.command("45").expect("angle commits");
    let endpoint = committed.dimension.leader_endpoint;
    assert!((endpoint.x() - 7.0710678).abs() < 1e-6);
    assert!((endpoint.y() - 7.0710678).abs() < 1e-6);
    assert!((committed.dimension.radius - 10.0).abs() < 1e-12);
    assert_eq!(h.drawing.undo_brackets(), 1);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
}

#[test]
fn typed_angle_accepts_expressions() {
    let mut h = Harness::new(drawing());
    h.left(10.0, 0.0);
    let committed = h.command("180 / 2").expect("expression commits");
    assert!(close(committed.dimension.leader_endpoint, Point2::new(0.0, 10.0)));
}

#[test]
fn malformed_angle_is_recoverable() {
    let mut h = Harness::new(drawing());
    h.left(10.0, 0.0);
    assert!(h.command("4 5 +").is_none());

    assert_eq!(h.action.state(), InteractionState::AwaitingPosition);
    assert_eq!(h.log.errors(), vec!["Not a valid expression".to_string()]);
    assert!(h.drawing.calls.is_empty());

    assert!(h.command("30").is_some());
}

#[test]
fn label_text_applies_to_next_dimension_and_restores_state() {
    let mut h = Harness::new(drawing());
    h.left(8.0, 5.0);

    h.command("text");
    assert_eq!(h.action.state(), InteractionState::AwaitingText);
    assert!(h.action.available_commands().is_empty());

    h.command("R=10");
    assert_eq!(h.action.state(), InteractionState::AwaitingPosition);
    assert_eq!(h.action.label_text(), Some("R=10"));
    // 选中对象在输入文字期间保持不变
    assert_eq!(h.action.base().map(|base| base.id), Some(EntityId::new(1)));

    h.move_to(5.0, 9.0);
    let committed = h.left(5.0, 9.0).expect("commit");
    assert_eq!(committed.dimension.text.as_deref(), Some("R=10"));
    assert_eq!(committed.dimension.label(2), "R=10");

    // 下一周期从空白开始
    assert!(h.action.label_text().is_none());
    h.left(8.0, 5.0);
    let next = h.left(2.0, 5.0).expect("second commit");
    assert!(next.dimension.text.is_none());
}

#[test]
fn label_text_entered_before_selection_is_carried_into_session() {
    let mut h = Harness::new(drawing());
    h.command("TEXT");
    assert_eq!(h.action.state(), InteractionState::AwaitingText);

    h.command("help");
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert_eq!(h.action.label_text(), Some("help"));
    assert!(h.log.messages().is_empty());

    h.left(8.0, 5.0);
    assert_eq!(h.action.label_text(), Some("help"));
    let committed = h.command("0").expect("commit");
    assert_eq!(committed.dimension.text.as_deref(), Some("help"));
}

#[test]
fn cancel_discards_pending_state_without_touching_drawing() {
    let mut h = Harness::new(drawing());
    h.left(8.0, 5.0);
    h.move_to(5.0, 20.0);
    assert!(h.canvas.preview().is_some());

    h.cancel();
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert!(h.action.pending().is_none());
    assert!(h.action.base().is_none());
    assert!(h.canvas.preview().is_none());

    h.left(8.0, 5.0);
    h.command("text");
    h.cancel();
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert!(h.action.pending().is_none());
    assert!(h.action.label_text().is_none());

    assert!(h.drawing.calls.is_empty());
    assert!(h.drawing.added.is_empty());
}

#[test]
fn right_click_cancels_and_finishes_from_entity_selection() {
    let mut h = Harness::new(drawing());
    h.left(8.0, 5.0);
    h.click(MouseButton::Right, 0.0, 0.0);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);

    h.click(MouseButton::Right, 0.0, 0.0);
    assert_eq!(h.action.state(), InteractionState::Idle);
    assert!(h.action.is_finished());
    assert_eq!(h.log.hint(), (String::new(), String::new()));

    // 已结束的动作不再响应点击
    h.left(8.0, 5.0);
    assert_eq!(h.action.state(), InteractionState::Idle);

    h.action.restart();
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
}

#[test]
fn pointer_moves_only_update_preview() {
    let mut h = Harness::new(drawing());
    h.left(10.0, 0.0);

    for step in 0..50 {
        let angle = step as f64 * 0.1;
        h.move_to(30.0 * angle.cos(), 30.0 * angle.sin());
    }

    assert!(h.drawing.calls.is_empty());
    assert_eq!(h.drawing.undo_brackets(), 0);
    assert_eq!(h.canvas.preview_draws(), 50);
    let pending = h.action.pending().expect("pending dimension");
    assert!((pending.definition_point.distance_to(pending.leader_endpoint) - 10.0).abs() < 1e-9);
    match h.canvas.preview() {
        Some(Entity::RadialDimension(preview)) => {
            assert_eq!(preview.leader_endpoint, pending.leader_endpoint);
        }
        other => panic!("unexpected preview: {other:?}"),
    }
}

#[test]
fn pointer_moves_while_selecting_are_ignored() {
    let mut h = Harness::new(drawing());
    h.move_to(8.0, 5.0);
    assert_eq!(h.canvas.preview_draws(), 0);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
}

#[test]
fn empty_coordinate_event_is_silently_ignored() {
    let mut h = Harness::new(drawing());
    h.left(8.0, 5.0);
    assert!(h.coordinate(None).is_none());
    assert_eq!(h.action.state(), InteractionState::AwaitingPosition);
    assert!(h.log.messages().is_empty());

    let committed = h.coordinate(Some(Point2::new(5.0, 0.0))).expect("typed coordinate");
    assert!(close(committed.dimension.leader_endpoint, Point2::new(5.0, 2.0)));
}

#[test]
fn rejected_insert_reports_error_and_opens_no_undo_bracket() {
    let mut drawing = drawing();
    drawing.reject_inserts = true;
    let mut h = Harness::new(drawing);
    h.left(8.0, 5.0);

    assert!(h.left(8.0, 5.0).is_none());
    assert_eq!(h.drawing.undo_brackets(), 0);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    let errors = h.log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("locked"));
}

#[test]
fn ledger_refusing_to_open_cycle_removes_inserted_dimension() {
    let mut drawing = drawing();
    drawing.fail_begin = true;
    let mut h = Harness::new(drawing);
    h.left(8.0, 5.0);

    assert!(h.left(8.0, 5.0).is_none());
    let id = EntityId::new(100);
    assert_eq!(
        h.drawing.calls,
        vec![Call::Add(id), Call::Begin, Call::Remove(id)]
    );
    assert!(h.drawing.added.is_empty());
    assert!(!h.drawing.cycle_open);
    assert_eq!(h.canvas.redraws(), 0);
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert_eq!(h.log.errors().len(), 1);
}

#[test]
fn failed_registration_closes_cycle_and_keeps_ledger_usable() {
    let mut drawing = drawing();
    drawing.fail_record = true;
    let mut h = Harness::new(drawing);
    h.left(8.0, 5.0);

    assert!(h.left(8.0, 5.0).is_none());
    let id = EntityId::new(100);
    assert_eq!(
        h.drawing.calls,
        vec![
            Call::Add(id),
            Call::Begin,
            Call::Record(id),
            Call::Abort,
            Call::Remove(id)
        ]
    );
    assert!(h.drawing.added.is_empty());
    assert!(!h.drawing.cycle_open);

    // 账本恢复后下一次提交照常成功
    h.drawing.fail_record = false;
    h.drawing.calls.clear();
    h.left(8.0, 5.0);
    let committed = h.left(8.0, 5.0).expect("commit after recovery");
    assert_eq!(
        h.drawing.calls,
        vec![
            Call::Add(committed.id),
            Call::Begin,
            Call::Record(committed.id),
            Call::End
        ]
    );
    assert_eq!(h.drawing.added.len(), 1);
}

#[test]
fn hints_and_commands_follow_state() {
    let mut h = Harness::new(drawing());
    assert_eq!(
        h.log.hint(),
        ("Select arc or circle entity".to_string(), "Cancel".to_string())
    );
    assert_eq!(h.action.available_commands(), vec!["text"]);

    h.command("help");
    assert_eq!(
        h.log.messages(),
        vec![Message::Info("Available commands: text".to_string())]
    );

    h.left(8.0, 5.0);
    assert_eq!(
        h.log.hint().0,
        "Specify dimension line position or enter angle:"
    );

    h.command("text");
    assert_eq!(
        h.log.hint(),
        ("Enter dimension text:".to_string(), String::new())
    );
    assert_eq!(h.action.hint().prompt, "Enter dimension text:");
}

#[test]
fn unknown_keyword_while_selecting_is_reported() {
    let mut h = Harness::new(drawing());
    h.command("explode");
    assert_eq!(h.action.state(), InteractionState::AwaitingEntity);
    assert_eq!(h.log.errors(), vec!["Unknown command: explode".to_string()]);
}

#[test]
fn consecutive_cycles_do_not_share_state() {
    let mut h = Harness::new(drawing());

    h.left(8.0, 5.0);
    let first = h.command("90").expect("first");
    h.left(10.0, 0.0);
    let second = h.command("90").expect("second");

    assert!(close(first.dimension.leader_endpoint, Point2::new(5.0, 8.0)));
    assert!(close(second.dimension.leader_endpoint, Point2::new(0.0, 10.0)));
    assert_ne!(first.id, second.id);
    assert_eq!(h.drawing.undo_brackets(), 2);
}
