// List-view action buttons

pub mod allowed;
pub mod button;
pub mod renderer;

pub use allowed::AllowedActions;
pub use button::{ButtonEvent, ButtonMachine};
pub use renderer::{
    filter_actions, ActionButton, ClickOutcome, ListActionRenderer, ListView, RenderedRow,
    ASSIGNEE_REQUIRED_TOOLTIP,
};
