//! 半径标注的交互动作及其协作者接口。

pub mod collab;
pub mod commit;
pub mod grammar;
pub mod pending;
pub mod radial;

pub use collab::{
    CoordinateSnapper, Drawing, DrawingContainer, EntityResolver, EntityShape, GraphicView,
    Message, MessageLog, MessageSurface, MouseButton, PointerEvent, PreviewCanvas,
    ResolvedEntity, UndoLedger, ViewportSnapper,
};
pub use commit::{CommittedDimension, commit};
pub use grammar::TypedCommand;
pub use pending::{BaseEntityRef, PendingDimension, recompute};
pub use radial::{ActionContext, Hint, InteractionState, RadialDimensionAction};
