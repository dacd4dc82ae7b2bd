pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;
pub mod selection;
pub mod settings;
pub mod surface;

pub use canvas::{Color, PixelBuffer, Rect};
pub use components::dialogs::{HostDialogs, SaveFormat};
pub use components::history::HistoryManager;
pub use components::tools::{Tool, ToolConfig, ToolKind};
pub use error::{EditorError, EditorResult};
pub use project::EditorSession;
pub use selection::{Selection, SelectionState};
pub use settings::EditorSettings;
pub use surface::{DisplaySurface, FrameRecorder, NullSurface};
