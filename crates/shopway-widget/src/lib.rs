pub mod cluster;
pub mod error;
pub mod events;
pub mod map;
pub mod orchestrator;
pub mod rotation;
pub mod sheet;
pub mod state;
pub mod view_model;
pub mod widget;

pub use cluster::{ActiveIds, ClusterConfig, ClusterManager, MarkerKey, MarkerKind, MarkerView};
pub use error::{MapError, WidgetError};
pub use events::{Effect, EventBus, Signal, WidgetCommand};
pub use map::{HeadlessMap, MapBackend, MapController, MapHandle, Viewport};
pub use orchestrator::{Completion, OrchestratorOptions, PendingRequest, Phase, RouteOrchestrator};
pub use sheet::{BottomSheet, BottomSheetState, DrawerHeight, SheetConfig, SheetInput, SheetView};
pub use state::{AppState, Field, FieldError};
pub use view_model::{plan_route, RoutePlan, RouteSummary};
pub use widget::Widget;
