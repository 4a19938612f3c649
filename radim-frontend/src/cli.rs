use radim_config::DrawingConfig;
use radim_core::document::{Entity, EntityId, Pen};
use radim_core::geometry::Point2;
use radim_engine::action::grammar;
use radim_engine::action::{
    ActionContext, CommittedDimension, InteractionState, MessageSurface, MouseButton,
    PointerEvent, PreviewCanvas, RadialDimensionAction, ViewportSnapper,
};
use radim_engine::command::{CommandBus, CommandContext, CommandRequest};
use radim_engine::expression::evaluate;
use radim_engine::scene::{DemoEntities, Scene};
use tracing::{debug, info, warn};

use crate::errors::FrontendError;
use crate::recent::RecentItems;

/// 演示脚本：选圆拖动标注、按角度标注圆弧、自定义文字、错误输入与撤销。
pub const DEMO_SCRIPT: &str = "\
# 选中基线会被拒绝
click 50 0
# 选圆并拖动引线
click 62.5 25
move 70 40
move 60 45
click 60 45
# 按角度标注圆弧
click 27.5 10
45
# 自定义标注文字
click 62.5 25
text
<> TYP
180 + 30
# 无效角度与取消
help
click 62.5 25
4 5 +
cancel
undo
redo
history
zoom_extents
";

/// 一行脚本的含义。
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    Move(Point2),
    Click(MouseButton, Point2),
    /// 键入坐标，`None` 表示空坐标事件。
    Coordinate(Option<Point2>),
    Cancel,
    Restart,
    History,
    Scene(String),
    Keyboard(String),
}

/// 解析脚本行。空行与 `#` 注释返回 `None`。
///
/// 在文字输入状态下整行原样交给交互动作，不识别任何关键字。
pub fn parse_line(
    line: &str,
    verbatim: bool,
    bus: &CommandBus,
) -> Result<Option<ScriptLine>, FrontendError> {
    if verbatim {
        return Ok(Some(ScriptLine::Keyboard(line.to_string())));
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut parts = trimmed.split_whitespace();
    let keyword = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let parsed = match keyword.as_str() {
        "move" => ScriptLine::Move(parse_point(trimmed, &args)?),
        "click" => ScriptLine::Click(MouseButton::Left, parse_point(trimmed, &args)?),
        "rclick" => ScriptLine::Click(MouseButton::Right, parse_point(trimmed, &args)?),
        "coord" if args.is_empty() => ScriptLine::Coordinate(None),
        "coord" => ScriptLine::Coordinate(Some(parse_point(trimmed, &args)?)),
        "cancel" if args.is_empty() => ScriptLine::Cancel,
        "dimradial" if args.is_empty() => ScriptLine::Restart,
        "history" if args.is_empty() => ScriptLine::History,
        name if args.is_empty() && bus.handles(name) => ScriptLine::Scene(name.to_string()),
        _ => ScriptLine::Keyboard(trimmed.to_string()),
    };
    Ok(Some(parsed))
}

fn parse_point(line: &str, args: &[&str]) -> Result<Point2, FrontendError> {
    let [x, y] = args else {
        return Err(FrontendError::MissingCoordinate {
            line: line.to_string(),
        });
    };
    let coordinate = |text: &str| {
        evaluate(text).map_err(|source| FrontendError::InvalidCoordinate {
            line: line.to_string(),
            source,
        })
    };
    Ok(Point2::new(coordinate(*x)?, coordinate(*y)?))
}

/// 命令行消息输出：错误与消息打印到标准输出并同步写入日志。
#[derive(Debug, Default)]
pub struct ConsoleMessages;

impl MessageSurface for ConsoleMessages {
    fn report_error(&mut self, text: &str) {
        warn!(message = text, "交互错误");
        println!("[错误] {text}");
    }

    fn command_message(&mut self, text: &str) {
        info!(message = text, "交互消息");
        println!("[消息] {text}");
    }

    fn update_hint(&mut self, prompt: &str, cancel_label: &str) {
        debug!(prompt, cancel_label, "更新提示");
        if prompt.is_empty() {
            return;
        }
        if cancel_label.is_empty() {
            println!("[提示] {prompt}");
        } else {
            println!("[提示] {prompt} (右键: {cancel_label})");
        }
    }
}

/// 一次文本前端会话：场景、无界面渲染器与半径标注动作。
pub struct Session {
    scene: Scene,
    canvas: PreviewCanvas,
    action: RadialDimensionAction,
    bus: CommandBus,
    history: RecentItems<String>,
    grid_snap: Option<f64>,
    precision: usize,
}

impl Session {
    pub fn new(drawing: &DrawingConfig, history_size: usize) -> Self {
        Self::with_messages(drawing, history_size, Box::new(ConsoleMessages))
    }

    pub fn with_messages(
        drawing: &DrawingConfig,
        history_size: usize,
        messages: Box<dyn MessageSurface>,
    ) -> Self {
        let mut scene = Scene::new();
        scene.set_active_layer(drawing.active_layer.clone());
        scene.set_active_pen(Pen {
            color: drawing.pen.color,
            width: drawing.pen.width,
            line_type: drawing.pen.line_type.clone(),
        });
        scene.set_pick_tolerance(drawing.pick_tolerance);

        Self {
            scene,
            canvas: PreviewCanvas::new(),
            action: RadialDimensionAction::new(messages),
            bus: CommandBus::new(),
            history: RecentItems::new(history_size),
            grid_snap: drawing.grid_snap,
            precision: drawing.dimension_precision,
        }
    }

    pub fn populate_demo(&mut self) -> DemoEntities {
        self.scene.populate_demo()
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn state(&self) -> InteractionState {
        self.action.state()
    }

    pub fn history(&self) -> &RecentItems<String> {
        &self.history
    }

    /// 执行一行脚本，返回本行提交的标注（如有）。
    pub fn execute(&mut self, line: &str) -> Result<Option<CommittedDimension>, FrontendError> {
        let verbatim = grammar::consumes_verbatim(self.action.state());
        let Some(parsed) = parse_line(line, verbatim, &self.bus)? else {
            return Ok(None);
        };
        if parsed != ScriptLine::History {
            self.history.add(line.trim().to_string());
        }
        debug!(?parsed, "执行脚本行");

        match parsed {
            ScriptLine::Restart => {
                self.action.restart();
                return Ok(None);
            }
            ScriptLine::History => {
                self.print_history();
                return Ok(None);
            }
            ScriptLine::Scene(name) => {
                self.dispatch_scene_command(&name);
                return Ok(None);
            }
            _ => {}
        }

        let snapper = ViewportSnapper::new(self.scene.viewport()).with_grid(self.grid_snap);
        let mut ctx = ActionContext {
            drawing: &mut self.scene,
            snapper: &snapper,
            view: &mut self.canvas,
        };

        let committed = match parsed {
            ScriptLine::Move(screen) => {
                self.action
                    .pointer_move(&mut ctx, &PointerEvent::at(screen.x(), screen.y()));
                None
            }
            ScriptLine::Click(button, screen) => self.action.pointer_click(
                &mut ctx,
                button,
                &PointerEvent::at(screen.x(), screen.y()),
            ),
            ScriptLine::Coordinate(coordinate) => {
                self.action.coordinate_event(&mut ctx, coordinate)
            }
            ScriptLine::Cancel => {
                self.action.cancel(&mut ctx);
                None
            }
            ScriptLine::Keyboard(input) => self.action.command(&mut ctx, &input),
            ScriptLine::Restart | ScriptLine::History | ScriptLine::Scene(_) => None,
        };

        if let Some(committed) = &committed {
            println!(
                "[标注] #{} 标签={} 引线端点={}",
                committed.id.get(),
                committed.dimension.label(self.precision),
                format_point(committed.dimension.leader_endpoint)
            );
        }
        Ok(committed)
    }

    /// 逐行执行脚本；单行出错只记录，不中断后续行。
    pub fn run_script(&mut self, script: &str) -> Vec<CommittedDimension> {
        let mut committed = Vec::new();
        for line in script.lines() {
            // 注释与空行在任何状态下都不是输入，文字输入状态也一样
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            println!("> {line}");
            match self.execute(line) {
                Ok(Some(dimension)) => committed.push(dimension),
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "脚本行执行失败");
                    println!("[错误] {err}");
                }
            }
        }
        committed
    }

    fn dispatch_scene_command(&mut self, name: &str) {
        let mut context = CommandContext {
            scene: &mut self.scene,
        };
        let response = self.bus.dispatch(&CommandRequest::named(name), &mut context);
        let message = response.message.unwrap_or_default();
        if response.success {
            println!("[命令] {message}");
        } else {
            println!("[错误] {message}");
        }
    }

    fn print_history(&self) {
        println!("最近输入 ({}/{}):", self.history.len(), self.history.capacity());
        for (index, item) in self.history.iter().enumerate() {
            println!("  {index}: {item}");
        }
    }

    /// 打印图层与实体概览。
    pub fn print_summary(&self) {
        let document = self.scene.document();
        let viewport = self.scene.viewport();
        info!(
            layer_count = document.layers().count(),
            entity_count = document.entity_count(),
            "文档统计"
        );

        println!(
            "视口中心={}, 缩放={:.3}, 当前图层={}",
            format_point(viewport.center),
            viewport.zoom,
            self.scene.active_layer_name()
        );
        println!("当前文档图层：");
        for layer in document.layers() {
            println!(
                "  - {} (可见: {}, 锁定: {})",
                layer.name, layer.is_visible, layer.is_locked
            );
        }
        println!("当前文档实体：");
        for (id, entity) in document.entities() {
            println!("  - {}", describe_entity(*id, entity, self.precision));
        }
    }
}

fn describe_entity(id: EntityId, entity: &Entity, precision: usize) -> String {
    match entity {
        Entity::Line(line) => format!(
            "线段 #{}, Layer={}, 起点={}, 终点={}",
            id.get(),
            line.layer,
            format_point(line.start),
            format_point(line.end)
        ),
        Entity::Circle(circle) => format!(
            "圆 #{}, Layer={}, 圆心={}, 半径={:.2}",
            id.get(),
            circle.layer,
            format_point(circle.center),
            circle.radius
        ),
        Entity::Arc(arc) => format!(
            "圆弧 #{}, Layer={}, 圆心={}, 半径={:.2}, 起始角={:.1}°, 结束角={:.1}°",
            id.get(),
            arc.layer,
            format_point(arc.center),
            arc.radius,
            arc.start_angle.to_degrees(),
            arc.end_angle.to_degrees()
        ),
        Entity::Text(text) => format!(
            "文字 #{}, Layer={}, 内容=\"{}\", 插入点={}",
            id.get(),
            text.layer,
            text.content,
            format_point(text.insert)
        ),
        Entity::RadialDimension(dimension) => format!(
            "半径标注 #{}, Layer={}, 标签={}, 圆心={}, 引线端点={}, 角度={:.1}°",
            id.get(),
            dimension.layer,
            dimension.label(precision),
            format_point(dimension.definition_point),
            format_point(dimension.leader_endpoint),
            dimension.angle.to_degrees()
        ),
    }
}

fn format_point(point: Point2) -> String {
    format!("({:.2}, {:.2})", point.x(), point.y())
}
